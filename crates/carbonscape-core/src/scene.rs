//! The assembled scene: timeline, compositor, animals and ambient pulse.
//!
//! [`Scene`] is driven from three schedules that never block each other:
//!
//! - [`Scene::frame`] on every render tick,
//! - [`Scene::tick_timeline`] on the year-advance schedule,
//! - [`Scene::tick_ambient`] on the ambient schedule.
//!
//! Each touches only its own state; the active year is the only value the
//! render tick reads from the timeline.

use std::sync::Arc;
use std::time::Duration;

use carbonscape_types::{ProjectionDataset, YearLabel, YearSnapshot};
use tracing::{debug, info, trace};

use crate::ambient::AmbientPulse;
use crate::compositor::{Environment, SceneCompositor, SceneTargets};
use crate::config::SceneConfig;
use crate::entity::{EntityController, EntityKind, EntityPose, EntityProfile};
use crate::forest::TreeSlot;
use crate::timeline::{TimelineError, YearTimeline};

/// One animal's reading in the health panel.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct HealthReading {
    /// Animal name as it appears in the dataset.
    pub animal: &'static str,
    /// Health fraction for the current year.
    pub health: f64,
}

/// Everything a renderer needs for one frame, borrowed from the scene.
#[derive(Debug, Clone, PartialEq)]
pub struct SceneFrame<'a> {
    /// Active year, if a dataset is loaded.
    pub year: Option<YearLabel>,
    /// Whether autoplay and orbits are paused.
    pub paused: bool,
    /// `(index, len)` of the active year.
    pub progress: Option<(usize, usize)>,
    /// Smoothed sky, fog, ground and lake.
    pub environment: Environment,
    /// Every tree slot, including faded ones.
    pub trees: &'a [TreeSlot],
    /// One pose per animal.
    pub entities: &'a [EntityPose],
    /// Ambient emission level.
    pub emission: f64,
}

/// The running scene.
#[derive(Debug)]
pub struct Scene {
    dataset: Option<Arc<ProjectionDataset>>,
    timeline: YearTimeline,
    compositor: SceneCompositor,
    entities: Vec<EntityController>,
    poses: Vec<EntityPose>,
    /// Targets for `targets_year`, rebuilt only when the year or dataset changes.
    active_targets: SceneTargets,
    targets_year: Option<YearLabel>,
    ambient: AmbientPulse,
    forest_capacity: u32,
    keep_moving: bool,
    frame_log_every: u64,
    frames: u64,
}

impl Scene {
    /// Build an empty scene showing the default snapshot.
    ///
    /// # Errors
    ///
    /// Returns [`TimelineError`] if the timeline configuration is invalid.
    pub fn new(config: &SceneConfig) -> Result<Self, TimelineError> {
        let timeline = YearTimeline::new(&config.timeline)?;
        let initial = SceneTargets::from_snapshot(
            &YearSnapshot::default(),
            config.forest.capacity,
            config.render.keep_moving,
        );
        let compositor = SceneCompositor::new(&initial, &config.smoothing, &config.forest);
        let entities: Vec<EntityController> = EntityKind::ALL
            .into_iter()
            .map(|kind| {
                let health = initial.entity_health(kind).unwrap_or(1.0);
                EntityController::new(EntityProfile::for_kind(kind), health, config.smoothing.entity)
            })
            .collect();

        Ok(Self {
            dataset: None,
            timeline,
            compositor,
            poses: Vec::with_capacity(entities.len()),
            entities,
            active_targets: initial,
            targets_year: None,
            ambient: AmbientPulse::new(&config.ambient),
            forest_capacity: config.forest.capacity,
            keep_moving: config.render.keep_moving,
            frame_log_every: config.logging.frame_log_every,
            frames: 0,
        })
    }

    /// Replace the active dataset and refresh the year list.
    pub fn set_dataset(&mut self, dataset: Arc<ProjectionDataset>) {
        self.timeline.set_years(dataset.years().cloned());
        info!(
            years = dataset.len(),
            current = ?self.timeline.current_year().map(YearLabel::as_str),
            "scene dataset replaced"
        );
        self.dataset = Some(dataset);
        self.reload_targets();
    }

    /// Flip autoplay and orbit motion on or off.
    pub fn toggle_pause(&mut self) {
        self.timeline.toggle_pause();
        debug!(state = ?self.timeline.state(), "pause toggled");
    }

    /// Jump to `year`; unknown years are ignored.
    pub fn select_year(&mut self, year: &YearLabel) -> bool {
        self.timeline.select_year(year)
    }

    /// Year-advance schedule. Returns `true` if the year changed.
    pub fn tick_timeline(&mut self, elapsed: Duration) -> bool {
        self.timeline.tick(elapsed)
    }

    /// Ambient schedule. Returns the new emission level.
    pub fn tick_ambient(&mut self) -> f64 {
        self.ambient.pulse()
    }

    /// Snapshot for the active year, or the default when none is loaded.
    pub fn active_snapshot(&self) -> YearSnapshot {
        self.dataset
            .as_deref()
            .zip(self.timeline.current_year())
            .and_then(|(dataset, year)| dataset.get(year))
            .cloned()
            .unwrap_or_default()
    }

    /// Targets derived from the active snapshot.
    pub fn targets(&self) -> SceneTargets {
        SceneTargets::from_snapshot(&self.active_snapshot(), self.forest_capacity, self.keep_moving)
    }

    /// Run one render tick.
    pub fn frame(&mut self, elapsed: Duration) -> SceneFrame<'_> {
        let elapsed_secs = elapsed.as_secs_f64();
        if self.timeline.current_year() != self.targets_year.as_ref() {
            self.reload_targets();
        }
        let targets = &self.active_targets;
        let paused = self.timeline.is_paused();

        let environment = self.compositor.tick(targets, elapsed_secs);
        self.poses.clear();
        for controller in &mut self.entities {
            let target = targets.entity_health(controller.profile().kind);
            self.poses.push(controller.tick(target, paused, elapsed_secs));
        }

        self.frames = self.frames.wrapping_add(1);
        if self.frame_log_every > 0 && self.frames.checked_rem(self.frame_log_every) == Some(0) {
            trace!(
                frames = self.frames,
                year = ?self.timeline.current_year().map(YearLabel::as_str),
                trees = self.active_targets.forest_count,
                "render heartbeat"
            );
        }

        SceneFrame {
            year: self.timeline.current_year().cloned(),
            paused,
            progress: self.timeline.progress(),
            environment,
            trees: self.compositor.forest().slots(),
            entities: &self.poses,
            emission: self.ambient.level(),
        }
    }

    fn reload_targets(&mut self) {
        self.active_targets = self.targets();
        self.targets_year = self.timeline.current_year().cloned();
    }

    /// Per-animal health for the current year; empty without data.
    pub fn health_report(&self) -> Vec<HealthReading> {
        let Some(snapshot) = self
            .dataset
            .as_deref()
            .zip(self.timeline.current_year())
            .and_then(|(dataset, year)| dataset.get(year))
        else {
            return Vec::new();
        };
        snapshot
            .animals
            .readings()
            .into_iter()
            .map(|(animal, health)| HealthReading { animal, health })
            .collect()
    }

    /// The year timeline.
    pub const fn timeline(&self) -> &YearTimeline {
        &self.timeline
    }

    /// The active dataset, if one has been set.
    pub fn dataset(&self) -> Option<&ProjectionDataset> {
        self.dataset.as_deref()
    }
}
