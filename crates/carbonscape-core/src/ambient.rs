//! Ambient emission pulse, independent of the year timeline.

use crate::config::AmbientConfig;

/// Sawtooth level that rises by a fixed step each period and wraps to zero.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct AmbientPulse {
    level: f64,
    step: f64,
}

impl AmbientPulse {
    /// Start at level zero.
    pub const fn new(config: &AmbientConfig) -> Self {
        Self::with_step(config.step)
    }

    /// Start at level zero with an explicit step.
    pub const fn with_step(step: f64) -> Self {
        Self { level: 0.0, step }
    }

    /// One ambient period: wrap to zero once at or past 1, otherwise rise.
    pub fn pulse(&mut self) -> f64 {
        self.level = if self.level >= 1.0 {
            0.0
        } else {
            self.level + self.step
        };
        self.level
    }

    /// Current level.
    pub const fn level(&self) -> f64 {
        self.level
    }
}
