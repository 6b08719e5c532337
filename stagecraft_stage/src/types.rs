// Copyright 2025 the Stagecraft Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Small value types shared across the model.

use serde::{Deserialize, Serialize};

/// An RGBA color with 8-bit channels and a floating-point alpha.
///
/// Serialized as a `[r, g, b, a]` array.
#[derive(Copy, Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(from = "[f64; 4]", into = "[f64; 4]")]
pub struct Color {
    /// Red channel.
    pub r: u8,
    /// Green channel.
    pub g: u8,
    /// Blue channel.
    pub b: u8,
    /// Alpha in `[0, 1]`.
    pub a: f32,
}

impl Color {
    /// Fully transparent black; "no color set" for nodes and edges.
    pub const TRANSPARENT: Self = Self::new(0, 0, 0, 0.0);

    /// Creates a color from its channels.
    pub const fn new(r: u8, g: u8, b: u8, a: f32) -> Self {
        Self { r, g, b, a }
    }

    /// Whether the alpha channel is zero.
    pub fn is_transparent(&self) -> bool {
        self.a == 0.0
    }
}

impl Default for Color {
    fn default() -> Self {
        Self::TRANSPARENT
    }
}

#[allow(
    clippy::cast_possible_truncation,
    reason = "channels are clamped into range before narrowing"
)]
impl From<[f64; 4]> for Color {
    fn from([r, g, b, a]: [f64; 4]) -> Self {
        let channel = |v: f64| v.round().clamp(0.0, 255.0) as u8;
        Self::new(channel(r), channel(g), channel(b), a.clamp(0.0, 1.0) as f32)
    }
}

impl From<Color> for [f64; 4] {
    fn from(c: Color) -> Self {
        [c.r.into(), c.g.into(), c.b.into(), c.a.into()]
    }
}

/// One of the four sides of a rectangle.
#[derive(Copy, Clone, Debug, Eq, PartialEq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Direction {
    /// Toward negative x.
    Left,
    /// Toward positive x.
    Right,
    /// Toward negative y.
    Up,
    /// Toward positive y.
    Down,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn color_array_conversion_clamps() {
        let c = Color::from([300.0, -4.0, 12.4, 2.0]);
        assert_eq!(c, Color::new(255, 0, 12, 1.0));
        let back: [f64; 4] = Color::new(1, 2, 3, 0.5).into();
        assert_eq!(back, [1.0, 2.0, 3.0, 0.5]);
    }

    #[test]
    fn default_color_is_transparent() {
        assert!(Color::default().is_transparent());
    }
}
