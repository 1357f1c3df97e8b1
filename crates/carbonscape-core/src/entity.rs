//! Animated animals orbiting the scene.
//!
//! Each animal is driven by its own [`EntityController`], holding an explicit
//! [`EntitySmoothState`]. Health smooths toward the current year's reading;
//! the smoothed value sets orbital speed and, below the critical threshold,
//! switches the tint to red.

use carbonscape_types::{AnimalHealth, Rgb};

use crate::smoothing::{Blend, SmoothedValue};

/// Smoothed health below this is rendered as critical.
pub const CRITICAL_THRESHOLD: f64 = 0.05;

/// The animated animals in the scene.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum EntityKind {
    /// Land animal circling the lake.
    Deer,
    /// Flying animal bobbing above the lake.
    Bird,
    /// Small inner-orbit fish.
    Fish,
    /// Outer-orbit fish.
    Fish2,
}

impl EntityKind {
    /// Every kind in render order.
    pub const ALL: [Self; 4] = [Self::Deer, Self::Bird, Self::Fish, Self::Fish2];

    /// Stable lowercase name.
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Deer => "deer",
            Self::Bird => "bird",
            Self::Fish => "fish",
            Self::Fish2 => "fish2",
        }
    }

    /// The health reading this kind follows. Both fish share `fish`.
    pub const fn health_from(self, animals: &AnimalHealth) -> f64 {
        match self {
            Self::Deer => animals.deer,
            Self::Bird => animals.bird,
            Self::Fish | Self::Fish2 => animals.fish,
        }
    }
}

impl core::fmt::Display for EntityKind {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Vertical placement along the orbit.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum HeightProfile {
    /// Constant height.
    Fixed(f64),
    /// `base + amplitude * sin(frequency * angle)`.
    Bob {
        /// Mean height.
        base: f64,
        /// Peak deviation from `base`.
        amplitude: f64,
        /// Oscillations per radian of orbit.
        frequency: f64,
    },
}

impl HeightProfile {
    /// Height at the given orbit angle.
    pub fn at(self, angle: f64) -> f64 {
        match self {
            Self::Fixed(y) => y,
            Self::Bob {
                base,
                amplitude,
                frequency,
            } => amplitude.mul_add((frequency * angle).sin(), base),
        }
    }
}

/// How a healthy animal is tinted.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TintPolicy {
    /// Blend from brown toward pale with health.
    HealthBlend,
    /// Neutral white emission.
    Neutral,
    /// No override; the model keeps its own material.
    Aquatic,
}

/// Tint instruction for the renderer.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum Tint {
    /// Keep the model's own material.
    Material,
    /// Override with this color.
    Color(Rgb),
}

impl Tint {
    /// The override color, if any.
    pub const fn color(self) -> Option<Rgb> {
        match self {
            Self::Material => None,
            Self::Color(color) => Some(color),
        }
    }
}

impl TintPolicy {
    /// Tint for a healthy animal with smoothed health `health`.
    pub fn tint(self, health: f64) -> Tint {
        match self {
            Self::HealthBlend => Tint::Color(Rgb::new(
                0.6_f64.mul_add(health, 0.4),
                0.8_f64.mul_add(health, 0.2),
                0.5_f64.mul_add(health, 0.2),
            )),
            Self::Neutral => Tint::Color(Rgb::WHITE),
            Self::Aquatic => Tint::Material,
        }
    }
}

/// Static motion parameters of one animal.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct EntityProfile {
    /// Which animal this is.
    pub kind: EntityKind,
    /// Orbital radius around the scene origin.
    pub radius: f64,
    /// Angular speed at full health, radians per second.
    pub base_speed: f64,
    /// Vertical placement.
    pub height: HeightProfile,
    /// Tint when not critical.
    pub tint: TintPolicy,
}

impl EntityProfile {
    /// Stock profile for `kind`.
    pub const fn for_kind(kind: EntityKind) -> Self {
        match kind {
            EntityKind::Deer => Self {
                kind,
                radius: 6.0,
                base_speed: 0.6,
                height: HeightProfile::Fixed(0.3),
                tint: TintPolicy::HealthBlend,
            },
            EntityKind::Bird => Self {
                kind,
                radius: 6.0,
                base_speed: 0.7,
                height: HeightProfile::Bob {
                    base: 3.0,
                    amplitude: 0.5,
                    frequency: 1.2,
                },
                tint: TintPolicy::Neutral,
            },
            EntityKind::Fish => Self {
                kind,
                radius: 1.0,
                base_speed: 1.0,
                height: HeightProfile::Fixed(-0.01),
                tint: TintPolicy::Aquatic,
            },
            EntityKind::Fish2 => Self {
                kind,
                radius: 1.5,
                base_speed: 1.2,
                height: HeightProfile::Fixed(-0.01),
                tint: TintPolicy::Aquatic,
            },
        }
    }
}

/// A point in scene space.
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct Position {
    /// East-west.
    pub x: f64,
    /// Up.
    pub y: f64,
    /// North-south.
    pub z: f64,
}

/// Mutable per-animal state.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct EntitySmoothState {
    /// Health easing toward the year's reading.
    pub smoothed_health: SmoothedValue<f64>,
    /// Orbit angle in radians.
    pub angle: f64,
    /// Whether smoothed health is below [`CRITICAL_THRESHOLD`].
    pub critical: bool,
}

/// Result of one controller tick.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct EntityPose {
    /// Which animal.
    pub kind: EntityKind,
    /// Position on the orbit.
    pub position: Position,
    /// Yaw in radians.
    pub facing: f64,
    /// Renderer tint.
    pub tint: Tint,
    /// Current smoothed health.
    pub health: f64,
    /// Whether the critical tint is active.
    pub critical: bool,
}

/// Drives one animal from its health target.
#[derive(Debug, Clone, PartialEq)]
pub struct EntityController {
    profile: EntityProfile,
    state: EntitySmoothState,
    blend: Blend,
}

impl EntityController {
    /// Start at angle zero with smoothed health equal to `initial_health`.
    pub fn new(profile: EntityProfile, initial_health: f64, blend: Blend) -> Self {
        Self {
            profile,
            state: EntitySmoothState {
                smoothed_health: SmoothedValue::new(initial_health),
                angle: 0.0,
                critical: initial_health < CRITICAL_THRESHOLD,
            },
            blend,
        }
    }

    /// Advance one render tick.
    ///
    /// `target` of `None` keeps easing toward the last target. Orbit motion
    /// stops while `paused`; health smoothing continues.
    pub fn tick(&mut self, target: Option<f64>, paused: bool, elapsed_secs: f64) -> EntityPose {
        let factor = self.blend.factor(elapsed_secs);
        let health = match target {
            Some(target) => self.state.smoothed_health.update(target, factor),
            None => self.state.smoothed_health.step(factor),
        };

        if !paused {
            let speed = self.profile.base_speed * health.clamp(0.0, 1.0);
            self.state.angle = speed.mul_add(elapsed_secs, self.state.angle);
        }

        self.state.critical = health < CRITICAL_THRESHOLD;
        self.pose()
    }

    /// Pose for the current state without advancing.
    pub fn pose(&self) -> EntityPose {
        let angle = self.state.angle;
        let health = self.state.smoothed_health.current();
        let tint = if self.state.critical {
            Tint::Color(Rgb::RED)
        } else {
            self.profile.tint.tint(health)
        };
        EntityPose {
            kind: self.profile.kind,
            position: Position {
                x: self.profile.radius * angle.cos(),
                y: self.profile.height.at(angle),
                z: self.profile.radius * angle.sin(),
            },
            facing: -angle,
            tint,
            health,
            critical: self.state.critical,
        }
    }

    /// Motion parameters.
    pub const fn profile(&self) -> &EntityProfile {
        &self.profile
    }

    /// Mutable state snapshot.
    pub const fn state(&self) -> &EntitySmoothState {
        &self.state
    }
}
