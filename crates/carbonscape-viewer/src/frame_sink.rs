//! Frame consumers.
//!
//! The scene core produces a [`SceneFrame`] per render tick; a
//! [`FrameSink`] decides what to do with it. The stock [`LogSink`] emits a
//! structured summary every N frames and whenever the year changes, which
//! is enough to watch a headless run.

use carbonscape_core::entity::Tint;
use carbonscape_core::scene::SceneFrame;
use carbonscape_types::YearLabel;
use tracing::{debug, info};

/// Receives every rendered frame.
pub trait FrameSink {
    /// Consume one frame.
    fn present(&mut self, frame: &SceneFrame<'_>);
}

/// Sink that logs frame summaries through `tracing`.
pub struct LogSink {
    every: u64,
    frames: u64,
    last_year: Option<YearLabel>,
}

impl LogSink {
    /// Log a summary every `every` frames (`0` logs year changes only).
    pub const fn new(every: u64) -> Self {
        Self {
            every,
            frames: 0,
            last_year: None,
        }
    }
}

impl FrameSink for LogSink {
    fn present(&mut self, frame: &SceneFrame<'_>) {
        self.frames = self.frames.wrapping_add(1);

        if frame.year != self.last_year {
            info!(
                year = frame.year.as_ref().map_or("-", YearLabel::as_str),
                progress = ?frame.progress,
                paused = frame.paused,
                "year shown"
            );
            self.last_year.clone_from(&frame.year);
        }

        if self.every == 0 || self.frames.checked_rem(self.every) != Some(0) {
            return;
        }

        let visible_trees = frame.trees.iter().filter(|t| t.scale() > 0.5).count();
        let critical: Vec<&str> = frame
            .entities
            .iter()
            .filter(|pose| pose.critical)
            .map(|pose| pose.kind.as_str())
            .collect();
        debug!(
            frames = self.frames,
            sky = %frame.environment.background,
            ground = %frame.environment.ground,
            lake = %frame.environment.lake_color,
            fog = frame.environment.fog_density,
            visible_trees,
            emission = frame.emission,
            critical = ?critical,
            "frame"
        );
        for pose in frame.entities {
            let tint = match pose.tint {
                Tint::Material => "material".to_owned(),
                Tint::Color(color) => color.to_hex(),
            };
            debug!(
                entity = pose.kind.as_str(),
                health = pose.health,
                x = pose.position.x,
                y = pose.position.y,
                z = pose.position.z,
                tint,
                "entity"
            );
        }
    }
}
