//! # Colors
//!
//! `#rrggbb` colors used by the palette, the brush and the canvas background.
//! They serialize as hex strings so config files stay readable.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::errors::PlaypenError;

/// An opaque 8-bit RGB color.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct Rgb {
    pub r: u8,
    pub g: u8,
    pub b: u8,
}

impl Rgb {
    pub const WHITE: Rgb = Rgb::new(0xff, 0xff, 0xff);

    pub const fn new(r: u8, g: u8, b: u8) -> Self {
        Rgb { r, g, b }
    }

    /// Parse `#rrggbb` (the leading `#` is optional).
    ///
    /// ```rust
    /// use playpen_core::color::Rgb;
    ///
    /// assert_eq!(Rgb::parse("#1e1e1e").unwrap(), Rgb::new(0x1e, 0x1e, 0x1e));
    /// assert!(Rgb::parse("#12345").is_err());
    /// ```
    pub fn parse(value: &str) -> Result<Self, PlaypenError> {
        let hex = value.trim().trim_start_matches('#');
        if hex.len() != 6 || !hex.chars().all(|c| c.is_ascii_hexdigit()) {
            return Err(PlaypenError::invalid_color(value, "expected #rrggbb"));
        }

        let channel = |range: std::ops::Range<usize>| {
            u8::from_str_radix(&hex[range], 16)
                .map_err(|e| PlaypenError::invalid_color(value, e.to_string()))
        };

        Ok(Rgb::new(channel(0..2)?, channel(2..4)?, channel(4..6)?))
    }

    /// Channels as floats in `0.0..=1.0`
    pub fn to_f32(self) -> [f32; 3] {
        [
            f32::from(self.r) / 255.0,
            f32::from(self.g) / 255.0,
            f32::from(self.b) / 255.0,
        ]
    }
}

impl fmt::Display for Rgb {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "#{:02x}{:02x}{:02x}", self.r, self.g, self.b)
    }
}

impl FromStr for Rgb {
    type Err = PlaypenError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Rgb::parse(s)
    }
}

impl TryFrom<String> for Rgb {
    type Error = PlaypenError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        Rgb::parse(&value)
    }
}

impl From<Rgb> for String {
    fn from(color: Rgb) -> Self {
        color.to_string()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_and_display() {
        let color = Rgb::parse("#FF00ff").unwrap();
        assert_eq!(color, Rgb::new(255, 0, 255));
        assert_eq!(color.to_string(), "#ff00ff");
    }

    #[test]
    fn test_parse_rejects_garbage() {
        assert!(Rgb::parse("red").is_err());
        assert!(Rgb::parse("#gg0000").is_err());
        assert!(Rgb::parse("").is_err());
    }

    #[test]
    fn test_serializes_as_hex_string() {
        let json = serde_json::to_string(&Rgb::new(0, 255, 255)).unwrap();
        assert_eq!(json, "\"#00ffff\"");

        let parsed: Rgb = serde_json::from_str("\"#1e1e1e\"").unwrap();
        assert_eq!(parsed, Rgb::new(0x1e, 0x1e, 0x1e));

        assert!(serde_json::from_str::<Rgb>("\"blue\"").is_err());
    }
}
