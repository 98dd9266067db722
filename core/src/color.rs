use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Deserializer, Serialize, Serializer};

/// A sanitized `#rrggbb` / `#rgb` color as stored by the admin settings.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct HexColor {
    pub r: u8,
    pub g: u8,
    pub b: u8,
}

impl HexColor {
    pub const fn rgb(r: u8, g: u8, b: u8) -> Self {
        Self { r, g, b }
    }

    /// Default accent color of the widget
    pub const ACCENT: Self = Self::rgb(0xfd, 0xba, 0x74);
    /// Default switch-button text color
    pub const BUTTON_TEXT: Self = Self::rgb(0x1a, 0x1a, 0x1a);
    /// Default switch-button hover background
    pub const BUTTON_HOVER_BG: Self = Self::rgb(0xfb, 0x92, 0x3c);
    /// Default switch-button hover text
    pub const BUTTON_HOVER_TEXT: Self = Self::rgb(0x00, 0x00, 0x00);

    /// Parse a color, falling back to `default` when the value is not a
    /// 3- or 6-digit hex color.
    pub fn sanitize(value: &str, default: Self) -> Self {
        value.parse().unwrap_or(default)
    }
}

impl FromStr for HexColor {
    type Err = ();

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let hex = s.trim().trim_start_matches('#');
        if !hex.chars().all(|c| c.is_ascii_hexdigit()) {
            return Err(());
        }

        let channel = |range: std::ops::Range<usize>| u8::from_str_radix(&hex[range], 16).map_err(|_| ());

        match hex.len() {
            6 => Ok(Self::rgb(channel(0..2)?, channel(2..4)?, channel(4..6)?)),
            3 => {
                // #abc expands to #aabbcc
                let short = |i: usize| channel(i..i + 1).map(|v| v * 17);
                Ok(Self::rgb(short(0)?, short(1)?, short(2)?))
            }
            _ => Err(()),
        }
    }
}

impl fmt::Display for HexColor {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "#{:02x}{:02x}{:02x}", self.r, self.g, self.b)
    }
}

impl Serialize for HexColor {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.collect_str(self)
    }
}

impl<'de> Deserialize<'de> for HexColor {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let raw = String::deserialize(deserializer)?;
        raw.parse()
            .map_err(|_| serde::de::Error::custom(format!("invalid hex color: {raw}")))
    }
}
