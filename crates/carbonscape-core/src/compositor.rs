//! Derives the visual environment from the active year's snapshot.
//!
//! [`SceneTargets`] is a pure function of a [`YearSnapshot`]: sky band,
//! fog, ground tint, lake, forest size and per-animal health targets.
//! [`SceneCompositor`] owns the smoothed values that ease toward those
//! targets every render tick.

use std::collections::BTreeMap;

use carbonscape_types::{Rgb, YearSnapshot};

use crate::config::{ForestConfig, SmoothingConfig};
use crate::entity::EntityKind;
use crate::forest::{ForestPool, forest_density};
use crate::smoothing::{Blend, SmoothedValue};

/// Minimum health fed to controllers when the keep-moving policy is on.
pub const HEALTH_FLOOR: f64 = 0.1;

const LUSH_GROUND: Rgb = Rgb::new(34.0 / 255.0, 139.0 / 255.0, 34.0 / 255.0);
const DULL_GROUND: Rgb = Rgb::new(107.0 / 255.0, 142.0 / 255.0, 35.0 / 255.0);

/// Apply the keep-moving floor to a health reading.
pub const fn floor_health(health: f64) -> f64 {
    health.max(HEALTH_FLOOR)
}

/// Sky color band for a carbon score.
pub fn sky_color(carbon_score: f64) -> Rgb {
    if carbon_score > 80.0 {
        Rgb::new(0.0, 0.0, 1.0)
    } else if carbon_score > 60.0 {
        Rgb::from_u8(0x5D, 0xAD, 0xE2)
    } else if carbon_score > 40.0 {
        Rgb::from_u8(0x46, 0x82, 0xB4)
    } else if carbon_score > 20.0 {
        Rgb::from_u8(0x3C, 0x67, 0x67)
    } else {
        Rgb::from_u8(0x25, 0x58, 0x58)
    }
}

/// Ground tint: lush green dulled by lost tree coverage.
pub fn ground_target(tree_coverage: f64) -> Rgb {
    let health = (tree_coverage / 100.0).clamp(0.0, 1.0);
    LUSH_GROUND.lerp(DULL_GROUND, 1.0 - health)
}

/// Everything the scene eases toward for one year.
#[derive(Debug, Clone, PartialEq)]
pub struct SceneTargets {
    /// Background and fog color.
    pub sky: Rgb,
    /// Fog density.
    pub fog_density: f64,
    /// Ground tint.
    pub ground: Rgb,
    /// Lake color.
    pub lake_color: Rgb,
    /// Lake opacity.
    pub lake_clarity: f64,
    /// Number of visible trees.
    pub forest_count: usize,
    /// Health target per animal.
    pub entities: BTreeMap<EntityKind, f64>,
}

impl SceneTargets {
    /// Derive targets from a snapshot.
    ///
    /// With `keep_moving`, animal health is floored at [`HEALTH_FLOOR`].
    pub fn from_snapshot(snapshot: &YearSnapshot, forest_capacity: u32, keep_moving: bool) -> Self {
        let entities = EntityKind::ALL
            .into_iter()
            .map(|kind| {
                let health = kind.health_from(&snapshot.animals);
                let health = if keep_moving {
                    floor_health(health)
                } else {
                    health
                };
                (kind, health)
            })
            .collect();

        Self {
            sky: sky_color(snapshot.carbon_score),
            fog_density: snapshot.sky.fog,
            ground: ground_target(snapshot.tree_coverage),
            lake_color: snapshot.lake.color,
            lake_clarity: snapshot.lake.clarity,
            forest_count: forest_density(snapshot.tree_coverage, forest_capacity),
            entities,
        }
    }

    /// Health target for one animal.
    pub fn entity_health(&self, kind: EntityKind) -> Option<f64> {
        self.entities.get(&kind).copied()
    }
}

/// Smoothed environment values for one frame.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Environment {
    /// Background color.
    pub background: Rgb,
    /// Fog color.
    pub fog_color: Rgb,
    /// Fog density.
    pub fog_density: f64,
    /// Ground tint.
    pub ground: Rgb,
    /// Lake color.
    pub lake_color: Rgb,
    /// Lake opacity.
    pub lake_clarity: f64,
}

/// Owner of the environment's smoothed values and the forest.
#[derive(Debug, Clone)]
pub struct SceneCompositor {
    background: SmoothedValue<Rgb>,
    fog_color: SmoothedValue<Rgb>,
    fog_density: SmoothedValue<f64>,
    ground: SmoothedValue<Rgb>,
    lake_color: SmoothedValue<Rgb>,
    lake_clarity: SmoothedValue<f64>,
    forest: ForestPool,
    sky_blend: Blend,
    entity_blend: Blend,
}

impl SceneCompositor {
    /// Start at rest on `initial`, with the ground at full lushness.
    pub fn new(initial: &SceneTargets, smoothing: &SmoothingConfig, forest: &ForestConfig) -> Self {
        let mut pool = ForestPool::new(forest, smoothing.entity);
        pool.set_target_count(initial.forest_count);
        Self {
            background: SmoothedValue::new(initial.sky),
            fog_color: SmoothedValue::new(initial.sky),
            fog_density: SmoothedValue::new(initial.fog_density),
            ground: SmoothedValue::new(LUSH_GROUND),
            lake_color: SmoothedValue::new(initial.lake_color),
            lake_clarity: SmoothedValue::new(initial.lake_clarity),
            forest: pool,
            sky_blend: smoothing.sky,
            entity_blend: smoothing.entity,
        }
    }

    /// Ease every value one tick toward `targets`.
    pub fn tick(&mut self, targets: &SceneTargets, elapsed_secs: f64) -> Environment {
        let sky = self.sky_blend.factor(elapsed_secs);
        let near = self.entity_blend.factor(elapsed_secs);

        if self.forest.target_count() != targets.forest_count {
            self.forest.set_target_count(targets.forest_count);
        }
        self.forest.tick(elapsed_secs);

        Environment {
            background: self.background.update(targets.sky, sky),
            fog_color: self.fog_color.update(targets.sky, sky),
            fog_density: self.fog_density.update(targets.fog_density, sky),
            ground: self.ground.update(targets.ground, near),
            lake_color: self.lake_color.update(targets.lake_color, near),
            lake_clarity: self.lake_clarity.update(targets.lake_clarity, near),
        }
    }

    /// The forest arena.
    pub const fn forest(&self) -> &ForestPool {
        &self.forest
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use carbonscape_types::AnimalHealth;

    fn close(a: Rgb, b: Rgb) -> bool {
        (a.r - b.r).abs() < 1e-3 && (a.g - b.g).abs() < 1e-3 && (a.b - b.b).abs() < 1e-3
    }

    #[test]
    fn sky_ladder_bands() {
        assert!(close(sky_color(95.0), Rgb::parse("blue").unwrap()));
        assert!(close(sky_color(80.0), Rgb::parse("#5DADE2").unwrap()));
        assert!(close(sky_color(65.0), Rgb::parse("#5DADE2").unwrap()));
        assert!(close(sky_color(60.0), Rgb::parse("#4682B4").unwrap()));
        assert!(close(sky_color(40.0), Rgb::parse("#3C6767").unwrap()));
        assert!(close(sky_color(20.0), Rgb::parse("#255858").unwrap()));
        assert!(close(sky_color(-5.0), Rgb::parse("#255858").unwrap()));
    }

    #[test]
    fn ground_dulls_with_lost_coverage() {
        assert!(close(ground_target(100.0), Rgb::parse("#228B22").unwrap()));
        assert!(close(ground_target(0.0), Rgb::parse("#6B8E23").unwrap()));
        assert!(close(ground_target(150.0), ground_target(100.0)));
    }

    #[test]
    fn targets_from_default_snapshot() {
        let targets = SceneTargets::from_snapshot(&YearSnapshot::default(), 100, false);
        assert_eq!(targets.forest_count, 0);
        assert!(close(targets.sky, Rgb::parse("#4682B4").unwrap()));
        for kind in EntityKind::ALL {
            assert!((targets.entity_health(kind).unwrap() - 1.0).abs() < f64::EPSILON);
        }
    }

    #[test]
    fn keep_moving_floors_entity_targets() {
        let snapshot = YearSnapshot {
            animals: AnimalHealth::uniform(0.0),
            ..YearSnapshot::default()
        };
        let raw = SceneTargets::from_snapshot(&snapshot, 100, false);
        let floored = SceneTargets::from_snapshot(&snapshot, 100, true);
        assert!(raw.entity_health(EntityKind::Deer).unwrap().abs() < f64::EPSILON);
        assert!(
            (floored.entity_health(EntityKind::Deer).unwrap() - HEALTH_FLOOR).abs() < f64::EPSILON
        );
    }

    #[test]
    fn compositor_eases_toward_new_year() {
        let calm = SceneTargets::from_snapshot(&YearSnapshot::default(), 100, false);
        let mut compositor =
            SceneCompositor::new(&calm, &SmoothingConfig::default(), &ForestConfig::default());

        let degraded = SceneTargets::from_snapshot(
            &YearSnapshot {
                carbon_score: 10.0,
                tree_coverage: 30.0,
                ..YearSnapshot::default()
            },
            100,
            false,
        );
        let first = compositor.tick(&degraded, 1.0 / 60.0);
        assert!(!close(first.background, degraded.sky));
        for _ in 0..1000 {
            compositor.tick(&degraded, 1.0 / 60.0);
        }
        let settled = compositor.tick(&degraded, 1.0 / 60.0);
        assert!(close(settled.background, degraded.sky));
        assert!(close(settled.fog_color, degraded.sky));
        assert!(close(settled.ground, degraded.ground));
        assert_eq!(compositor.forest().target_count(), 30);
        assert_eq!(compositor.forest().slots().len(), 30);
    }
}
