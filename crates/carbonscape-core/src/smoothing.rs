//! Exponential smoothing toward a moving target.
//!
//! A [`SmoothedValue`] holds a current value and the last requested target,
//! and closes a fraction of the remaining gap on every update. Scalars and
//! [`Rgb`] colors are supported through the [`Lerp`] trait.
//!
//! # Frame coupling
//!
//! The stock policy, [`Blend::PerTick`], closes a fixed fraction per call
//! regardless of elapsed time, so perceived smoothing speed depends on the
//! tick rate. [`Blend::TimeConstant`] converts to a true exponential decay
//! `1 - exp(-dt / tau)` and must be opted into through configuration.

use carbonscape_types::Rgb;
use serde::Deserialize;

/// Values that can be linearly interpolated.
pub trait Lerp: Copy {
    /// Interpolate from `self` toward `target` by `t` (unclamped).
    #[must_use]
    fn lerp(self, target: Self, t: f64) -> Self;
}

impl Lerp for f64 {
    fn lerp(self, target: Self, t: f64) -> Self {
        lerp(self, target, t)
    }
}

impl Lerp for Rgb {
    fn lerp(self, target: Self, t: f64) -> Self {
        Self::lerp(self, target, t)
    }
}

/// Scalar linear interpolation.
pub fn lerp(a: f64, b: f64, t: f64) -> f64 {
    (b - a).mul_add(t, a)
}

/// How much of the remaining distance a single update closes.
#[derive(Debug, Clone, Copy, PartialEq, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Blend {
    /// Fixed fraction per update, independent of elapsed time.
    PerTick(f64),
    /// Time-based decay with time constant `tau_secs`.
    TimeConstant {
        /// Seconds for the gap to shrink to `1/e` of its size.
        tau_secs: f64,
    },
}

impl Blend {
    /// Blend factor for an update covering `elapsed_secs`.
    ///
    /// A non-positive time constant snaps straight to the target.
    pub fn factor(self, elapsed_secs: f64) -> f64 {
        match self {
            Self::PerTick(factor) => factor,
            Self::TimeConstant { tau_secs } => {
                if tau_secs <= 0.0 {
                    1.0
                } else {
                    1.0 - (-elapsed_secs.max(0.0) / tau_secs).exp()
                }
            }
        }
    }
}

impl Default for Blend {
    fn default() -> Self {
        Self::PerTick(0.05)
    }
}

/// A value that eases toward its target.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct SmoothedValue<T: Lerp> {
    current: T,
    target: T,
}

impl<T: Lerp> SmoothedValue<T> {
    /// Start at rest: current and target both `initial`.
    pub const fn new(initial: T) -> Self {
        Self {
            current: initial,
            target: initial,
        }
    }

    /// Set a new target and step toward it by `factor`.
    ///
    /// Returns the new current value.
    pub fn update(&mut self, target: T, factor: f64) -> T {
        self.target = target;
        self.step(factor)
    }

    /// Step toward the last requested target by `factor`.
    pub fn step(&mut self, factor: f64) -> T {
        self.current = self.current.lerp(self.target, factor);
        self.current
    }

    /// Change the target without moving.
    pub fn set_target(&mut self, target: T) {
        self.target = target;
    }

    /// Jump to `value` and make it the target.
    pub fn snap(&mut self, value: T) {
        self.current = value;
        self.target = value;
    }

    /// Current value.
    pub const fn current(&self) -> T {
        self.current
    }

    /// Last requested target.
    pub const fn target(&self) -> T {
        self.target
    }
}
