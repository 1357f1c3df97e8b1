//! RGB colors as exchanged with the backend and handed to the renderer.
//!
//! The backend sends lake colors as `#RRGGBB` strings and a handful of
//! scene constants are CSS color names. Internally a color is three linear
//! channels in `[0, 1]` so it can be interpolated component-wise.

use serde::{Deserialize, Serialize};

/// Errors produced while parsing a color string.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum ColorParseError {
    /// The string is neither `#RRGGBB`/`#RGB` nor a supported color name.
    #[error("unrecognized color: {0}")]
    Unrecognized(String),

    /// A hex digit pair could not be parsed.
    #[error("invalid hex digits in color: {0}")]
    InvalidHex(String),
}

/// An RGB color with channels in `[0, 1]`.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct Rgb {
    /// Red channel.
    pub r: f64,
    /// Green channel.
    pub g: f64,
    /// Blue channel.
    pub b: f64,
}

impl Rgb {
    /// Pure red, used as the critical-health alarm tint.
    pub const RED: Self = Self::new(1.0, 0.0, 0.0);

    /// Pure white, the neutral tint.
    pub const WHITE: Self = Self::new(1.0, 1.0, 1.0);

    /// Build a color from channel values.
    pub const fn new(r: f64, g: f64, b: f64) -> Self {
        Self { r, g, b }
    }

    /// Build a color from 8-bit channel values.
    pub fn from_u8(r: u8, g: u8, b: u8) -> Self {
        Self::new(
            f64::from(r) / 255.0,
            f64::from(g) / 255.0,
            f64::from(b) / 255.0,
        )
    }

    /// Parse `#RRGGBB`, `#RGB`, or one of the supported color names.
    ///
    /// # Errors
    ///
    /// Returns [`ColorParseError`] if the string is not a recognized color.
    pub fn parse(input: &str) -> Result<Self, ColorParseError> {
        let trimmed = input.trim();
        if let Some(hex) = trimmed.strip_prefix('#') {
            return parse_hex(hex, input);
        }
        match trimmed.to_ascii_lowercase().as_str() {
            "blue" => Ok(Self::from_u8(0, 0, 255)),
            "green" => Ok(Self::from_u8(0, 128, 0)),
            "white" => Ok(Self::WHITE),
            "red" => Ok(Self::RED),
            "black" => Ok(Self::new(0.0, 0.0, 0.0)),
            _ => Err(ColorParseError::Unrecognized(input.to_owned())),
        }
    }

    /// Linear interpolation toward `target`, component-wise.
    ///
    /// `t` is not clamped: values outside `[0, 1]` extrapolate.
    pub fn lerp(self, target: Self, t: f64) -> Self {
        Self::new(
            (target.r - self.r).mul_add(t, self.r),
            (target.g - self.g).mul_add(t, self.g),
            (target.b - self.b).mul_add(t, self.b),
        )
    }

    /// Format as `#RRGGBB`, clamping each channel into range.
    pub fn to_hex(self) -> String {
        format!(
            "#{:02X}{:02X}{:02X}",
            channel_to_u8(self.r),
            channel_to_u8(self.g),
            channel_to_u8(self.b)
        )
    }
}

impl TryFrom<String> for Rgb {
    type Error = ColorParseError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        Self::parse(&value)
    }
}

impl From<Rgb> for String {
    fn from(color: Rgb) -> Self {
        color.to_hex()
    }
}

impl core::fmt::Display for Rgb {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.write_str(&self.to_hex())
    }
}

fn parse_hex(hex: &str, original: &str) -> Result<Rgb, ColorParseError> {
    let invalid = || ColorParseError::InvalidHex(original.to_owned());
    let expanded: String = match hex.len() {
        6 => hex.to_owned(),
        3 => hex.chars().flat_map(|c| [c, c]).collect(),
        _ => return Err(ColorParseError::Unrecognized(original.to_owned())),
    };
    let channel = |range: core::ops::Range<usize>| -> Result<u8, ColorParseError> {
        let digits = expanded.get(range).ok_or_else(invalid)?;
        u8::from_str_radix(digits, 16).map_err(|_err| invalid())
    };
    Ok(Rgb::from_u8(channel(0..2)?, channel(2..4)?, channel(4..6)?))
}

#[allow(clippy::cast_possible_truncation, clippy::cast_sign_loss)]
fn channel_to_u8(value: f64) -> u8 {
    // Clamped to [0, 255] before the cast, so truncation cannot occur.
    (value.clamp(0.0, 1.0) * 255.0).round() as u8
}
