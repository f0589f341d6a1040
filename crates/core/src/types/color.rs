//! RGB colors and their `#rrggbb` representation.

use core::fmt;
use core::str::FromStr;

use serde::{Deserialize, Serialize};

/// Errors that can occur when parsing a [`HexColor`].
#[derive(thiserror::Error, Debug, Clone, PartialEq, Eq)]
pub enum ColorError {
    /// Missing leading `#`.
    #[error("color must start with '#'")]
    MissingHash,
    /// Not 3 or 6 hex digits.
    #[error("color must have 3 or 6 hex digits")]
    InvalidLength,
    /// A non-hex character was found.
    #[error("color contains a non-hex digit")]
    InvalidDigit,
}

/// An 8-bit-per-channel RGB color.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Rgb {
    pub r: u8,
    pub g: u8,
    pub b: u8,
}

impl Rgb {
    /// Pure white.
    pub const WHITE: Self = Self::new(255, 255, 255);
    /// Pure black.
    pub const BLACK: Self = Self::new(0, 0, 0);

    /// Create a color from its channels.
    #[must_use]
    pub const fn new(r: u8, g: u8, b: u8) -> Self {
        Self { r, g, b }
    }

    /// Perceived luminance in `[0, 1]` using `0.299R + 0.587G + 0.114B`.
    #[must_use]
    pub fn luminance(&self) -> f64 {
        (0.114_f64.mul_add(
            f64::from(self.b),
            0.299_f64.mul_add(f64::from(self.r), 0.587 * f64::from(self.g)),
        )) / 255.0
    }

    /// Whether the color reads as a light background.
    #[must_use]
    pub fn is_light(&self) -> bool {
        self.luminance() > 0.5
    }

    /// Raise each channel by `percent` of its own value, clamped to 255.
    #[must_use]
    pub fn brighten(&self, percent: u8) -> Self {
        let adjust = |c: u8| -> u8 {
            let raised = u32::from(c) + u32::from(c) * u32::from(percent) / 100;
            u8::try_from(raised.min(255)).unwrap_or(u8::MAX)
        };
        Self::new(adjust(self.r), adjust(self.g), adjust(self.b))
    }

    /// Channel-wise complement (`255 - channel`).
    #[must_use]
    pub const fn complement(&self) -> Self {
        Self::new(255 - self.r, 255 - self.g, 255 - self.b)
    }

    /// Convert to a hex color.
    #[must_use]
    pub fn to_hex(&self) -> HexColor {
        HexColor(format!("#{:02x}{:02x}{:02x}", self.r, self.g, self.b))
    }
}

/// A CSS color in normalized lowercase `#rrggbb` form.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct HexColor(String);

impl HexColor {
    /// Parse `#rgb` or `#rrggbb` (case-insensitive).
    ///
    /// # Errors
    ///
    /// Returns a `ColorError` describing the malformed input.
    pub fn parse(s: &str) -> Result<Self, ColorError> {
        Ok(Self::parse_rgb(s)?.to_hex())
    }

    /// Parse straight to channels.
    ///
    /// # Errors
    ///
    /// Returns a `ColorError` describing the malformed input.
    pub fn parse_rgb(s: &str) -> Result<Rgb, ColorError> {
        let digits = s.trim().strip_prefix('#').ok_or(ColorError::MissingHash)?;
        if !digits.chars().all(|c| c.is_ascii_hexdigit()) {
            return Err(ColorError::InvalidDigit);
        }
        let expanded: String = match digits.len() {
            3 => digits.chars().flat_map(|c| [c, c]).collect(),
            6 => digits.to_owned(),
            _ => return Err(ColorError::InvalidLength),
        };
        let channel = |range: core::ops::Range<usize>| {
            expanded
                .get(range)
                .and_then(|hex| u8::from_str_radix(hex, 16).ok())
                .ok_or(ColorError::InvalidDigit)
        };
        Ok(Rgb::new(channel(0..2)?, channel(2..4)?, channel(4..6)?))
    }

    /// The channels of this color.
    #[must_use]
    pub fn rgb(&self) -> Rgb {
        // Always valid: constructed through `parse` or `Rgb::to_hex`.
        Self::parse_rgb(&self.0).unwrap_or(Rgb::BLACK)
    }

    /// The `#rrggbb` string.
    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for HexColor {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl FromStr for HexColor {
    type Err = ColorError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::parse(s)
    }
}

impl TryFrom<String> for HexColor {
    type Error = ColorError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        Self::parse(&value)
    }
}

impl From<HexColor> for String {
    fn from(color: HexColor) -> Self {
        color.0
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_short_and_long_forms() {
        assert_eq!(HexColor::parse("#FFF").unwrap().as_str(), "#ffffff");
        assert_eq!(HexColor::parse("#1A2b3C").unwrap().as_str(), "#1a2b3c");
    }

    #[test]
    fn test_parse_errors() {
        assert_eq!(HexColor::parse("fff"), Err(ColorError::MissingHash));
        assert_eq!(HexColor::parse("#ffff"), Err(ColorError::InvalidLength));
        assert_eq!(HexColor::parse("#gggggg"), Err(ColorError::InvalidDigit));
    }

    #[test]
    fn test_luminance_extremes() {
        assert!((Rgb::WHITE.luminance() - 1.0).abs() < 1e-9);
        assert!(Rgb::BLACK.luminance().abs() < 1e-9);
        assert!(Rgb::WHITE.is_light());
        assert!(!Rgb::BLACK.is_light());
    }

    #[test]
    fn test_brighten_clamps() {
        assert_eq!(Rgb::new(100, 250, 0).brighten(20), Rgb::new(120, 255, 0));
    }

    #[test]
    fn test_complement() {
        assert_eq!(Rgb::new(255, 0, 10).complement(), Rgb::new(0, 255, 245));
    }

    #[test]
    fn test_hex_roundtrip() {
        let rgb = Rgb::new(18, 52, 86);
        assert_eq!(rgb.to_hex().as_str(), "#123456");
        assert_eq!(rgb.to_hex().rgb(), rgb);
    }
}
