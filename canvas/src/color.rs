//! RGBA colors parsed from CSS-style hex strings.

#[cfg(test)]
#[path = "color_test.rs"]
mod color_test;

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::error::RenderError;

/// Straight (non-premultiplied) RGBA color.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct Color {
    pub r: u8,
    pub g: u8,
    pub b: u8,
    pub a: u8,
}

impl Color {
    pub const BLACK: Self = Self::rgb(0, 0, 0);
    pub const WHITE: Self = Self::rgb(255, 255, 255);

    #[must_use]
    pub const fn rgb(r: u8, g: u8, b: u8) -> Self {
        Self { r, g, b, a: 255 }
    }

    #[must_use]
    pub const fn rgba(r: u8, g: u8, b: u8, a: u8) -> Self {
        Self { r, g, b, a }
    }

    #[must_use]
    pub fn to_skia(self) -> tiny_skia::Color {
        tiny_skia::Color::from_rgba8(self.r, self.g, self.b, self.a)
    }
}

impl Default for Color {
    fn default() -> Self {
        Self::BLACK
    }
}

fn hex_nibble(c: u8) -> Option<u8> {
    match c {
        b'0'..=b'9' => Some(c - b'0'),
        b'a'..=b'f' => Some(c - b'a' + 10),
        b'A'..=b'F' => Some(c - b'A' + 10),
        _ => None,
    }
}

impl FromStr for Color {
    type Err = RenderError;

    /// Accepts `#rgb`, `#rrggbb`, and `#rrggbbaa`.
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let invalid = || RenderError::InvalidColor(s.to_owned());
        let hex = s.trim().strip_prefix('#').ok_or_else(invalid)?;
        let nibbles = hex.bytes().map(hex_nibble).collect::<Option<Vec<u8>>>().ok_or_else(invalid)?;

        match *nibbles.as_slice() {
            [r, g, b] => Ok(Self::rgb(r * 17, g * 17, b * 17)),
            [r1, r2, g1, g2, b1, b2] => Ok(Self::rgb((r1 << 4) | r2, (g1 << 4) | g2, (b1 << 4) | b2)),
            [r1, r2, g1, g2, b1, b2, a1, a2] => Ok(Self::rgba((r1 << 4) | r2, (g1 << 4) | g2, (b1 << 4) | b2, (a1 << 4) | a2)),
            _ => Err(invalid()),
        }
    }
}

impl fmt::Display for Color {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.a == 255 {
            write!(f, "#{:02x}{:02x}{:02x}", self.r, self.g, self.b)
        } else {
            write!(f, "#{:02x}{:02x}{:02x}{:02x}", self.r, self.g, self.b, self.a)
        }
    }
}

impl TryFrom<String> for Color {
    type Error = RenderError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        value.parse()
    }
}

impl From<Color> for String {
    fn from(color: Color) -> Self {
        color.to_string()
    }
}
