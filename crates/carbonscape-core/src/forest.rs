//! Persistent forest of tree slots.
//!
//! The forest is an arena: slots are appended when the visible count grows
//! and are never removed. Shrinking only lowers the visibility target of the
//! slots past the count, so trees fade out in place and fade back in at the
//! same spot when the count recovers.

use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};

use crate::config::ForestConfig;
use crate::smoothing::{Blend, SmoothedValue};

/// Number of visible trees for a coverage percentage.
///
/// Coverage is clamped to `[0, 100]` before scaling to `capacity`.
pub fn forest_density(coverage: f64, capacity: u32) -> usize {
    let fraction = coverage.clamp(0.0, 100.0) / 100.0;
    let count = (fraction * f64::from(capacity)).round();
    // Bounded to [0, capacity] by the clamp above; NaN casts to zero.
    #[allow(clippy::cast_possible_truncation, clippy::cast_sign_loss)]
    let count = count as u32;
    usize::try_from(count).unwrap_or(usize::MAX)
}

/// One tree in the arena.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct TreeSlot {
    /// Ground-plane x.
    pub x: f64,
    /// Ground-plane z.
    pub z: f64,
    scale: SmoothedValue<f64>,
}

impl TreeSlot {
    /// Uniform scale, also used as opacity.
    pub const fn scale(&self) -> f64 {
        self.scale.current()
    }

    /// Whether the slot is easing toward full size.
    pub fn is_visible_target(&self) -> bool {
        self.scale.target() > 0.5
    }
}

/// Arena of tree slots on a ring around the lake.
#[derive(Debug, Clone)]
pub struct ForestPool {
    slots: Vec<TreeSlot>,
    target_count: usize,
    inner_radius: f64,
    ring_width: f64,
    blend: Blend,
    rng: StdRng,
}

impl ForestPool {
    /// Empty pool placing trees per `config`.
    pub fn new(config: &ForestConfig, blend: Blend) -> Self {
        Self {
            slots: Vec::new(),
            target_count: 0,
            inner_radius: config.inner_radius,
            ring_width: config.ring_width,
            blend,
            rng: StdRng::seed_from_u64(config.seed),
        }
    }

    /// Set how many slots should be visible.
    ///
    /// Appends fresh slots at scale zero when the arena is too small and
    /// retargets every slot's visibility.
    pub fn set_target_count(&mut self, count: usize) {
        while self.slots.len() < count {
            let slot = self.spawn_slot();
            self.slots.push(slot);
        }
        self.target_count = count;
        for (index, slot) in self.slots.iter_mut().enumerate() {
            let target = if index < count { 1.0 } else { 0.0 };
            slot.scale.set_target(target);
        }
    }

    /// Ease every slot toward its visibility target.
    pub fn tick(&mut self, elapsed_secs: f64) {
        let factor = self.blend.factor(elapsed_secs);
        for slot in &mut self.slots {
            slot.scale.step(factor);
        }
    }

    /// All slots, visible or not, in creation order.
    pub fn slots(&self) -> &[TreeSlot] {
        &self.slots
    }

    /// Current visibility target.
    pub const fn target_count(&self) -> usize {
        self.target_count
    }

    fn spawn_slot(&mut self) -> TreeSlot {
        let angle = self.rng.random::<f64>() * core::f64::consts::TAU;
        let radius = self.ring_width.mul_add(self.rng.random::<f64>(), self.inner_radius);
        TreeSlot {
            x: radius * angle.cos(),
            z: radius * angle.sin(),
            scale: SmoothedValue::new(0.0),
        }
    }
}
