use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};
use thiserror::Error;

#[derive(Error, Debug, Clone, PartialEq)]
pub enum ColorError {
    #[error("Unrecognized color syntax: '{0}'")]
    Syntax(String),

    #[error("Color component out of range in '{0}'")]
    OutOfRange(String),
}

/// An sRGB color with straight (non-premultiplied) alpha in `[0, 1]`.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Rgba {
    pub r: u8,
    pub g: u8,
    pub b: u8,
    pub a: f32,
}

impl Rgba {
    pub const fn new(r: u8, g: u8, b: u8, a: f32) -> Self {
        Self { r, g, b, a }
    }

    pub const fn opaque(r: u8, g: u8, b: u8) -> Self {
        Self::new(r, g, b, 1.0)
    }

    pub fn with_alpha(self, a: f32) -> Self {
        Self { a, ..self }
    }

    /// Alpha quantized to a byte, clamped to the valid range.
    pub fn alpha_u8(&self) -> u8 {
        (self.a.clamp(0.0, 1.0) * 255.0).round() as u8
    }

    pub fn to_rgba8(&self) -> [u8; 4] {
        [self.r, self.g, self.b, self.alpha_u8()]
    }

    pub fn to_f32_array(&self) -> [f32; 4] {
        [
            self.r as f32 / 255.0,
            self.g as f32 / 255.0,
            self.b as f32 / 255.0,
            self.a.clamp(0.0, 1.0),
        ]
    }
}

impl fmt::Display for Rgba {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "rgba({}, {}, {}, {})", self.r, self.g, self.b, self.a)
    }
}

/// Parses `#rrggbb`, `#rrggbbaa`, `rgb(r, g, b)` and `rgba(r, g, b, a)`.
impl FromStr for Rgba {
    type Err = ColorError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let s = s.trim();
        if let Some(hex) = s.strip_prefix('#') {
            return parse_hex(hex).ok_or_else(|| ColorError::Syntax(s.to_string()));
        }

        let (body, has_alpha) = if let Some(rest) = s.strip_prefix("rgba(") {
            (rest, true)
        } else if let Some(rest) = s.strip_prefix("rgb(") {
            (rest, false)
        } else {
            return Err(ColorError::Syntax(s.to_string()));
        };
        let body = body
            .strip_suffix(')')
            .ok_or_else(|| ColorError::Syntax(s.to_string()))?;

        let parts: Vec<&str> = body.split(',').map(str::trim).collect();
        let expected = if has_alpha { 4 } else { 3 };
        if parts.len() != expected {
            return Err(ColorError::Syntax(s.to_string()));
        }

        let mut channels = [0u8; 3];
        for (slot, part) in channels.iter_mut().zip(&parts) {
            let value: u16 = part.parse().map_err(|_| ColorError::Syntax(s.to_string()))?;
            *slot = u8::try_from(value).map_err(|_| ColorError::OutOfRange(s.to_string()))?;
        }

        let a = if has_alpha {
            let a: f32 = parts[3]
                .parse()
                .map_err(|_| ColorError::Syntax(s.to_string()))?;
            if !(0.0..=1.0).contains(&a) {
                return Err(ColorError::OutOfRange(s.to_string()));
            }
            a
        } else {
            1.0
        };

        Ok(Rgba::new(channels[0], channels[1], channels[2], a))
    }
}

fn parse_hex(hex: &str) -> Option<Rgba> {
    if !hex.is_ascii() {
        return None;
    }
    let byte = |i: usize| u8::from_str_radix(hex.get(i..i + 2)?, 16).ok();
    match hex.len() {
        6 => Some(Rgba::opaque(byte(0)?, byte(2)?, byte(4)?)),
        8 => Some(Rgba::new(
            byte(0)?,
            byte(2)?,
            byte(4)?,
            byte(6)? as f32 / 255.0,
        )),
        _ => None,
    }
}

/// Fill and outline paint for an overlay polygon.
///
/// Fill and stroke carry independent alpha; the usual pairing is a
/// translucent fill under an opaque outline.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Style {
    pub fill: Rgba,
    pub stroke: Rgba,
    /// Outline width in surface pixels. Zero disables the outline.
    pub stroke_width: f32,
}

impl Style {
    pub fn new(fill: Rgba, stroke: Rgba, stroke_width: f32) -> Self {
        Self {
            fill,
            stroke,
            stroke_width,
        }
    }

    /// A translucent fill of `color` outlined by the opaque `color`.
    pub fn tinted(r: u8, g: u8, b: u8, fill_alpha: f32) -> Self {
        Self::new(
            Rgba::new(r, g, b, fill_alpha),
            Rgba::opaque(r, g, b),
            Self::DEFAULT_STROKE_WIDTH,
        )
    }

    pub fn with_stroke_width(mut self, width: f32) -> Self {
        self.stroke_width = width;
        self
    }

    pub const DEFAULT_STROKE_WIDTH: f32 = 3.0;
}

impl Default for Style {
    fn default() -> Self {
        Self::tinted(255, 0, 0, 0.3)
    }
}
