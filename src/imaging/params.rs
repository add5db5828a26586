//! Parameter types for composition operations.
//!
//! These structs describe *what* to draw, not *how* to draw it. They are the
//! interface between the components ([`crop`](crate::crop),
//! [`overlay`](crate::overlay)) and the [`surface`](super::surface) that does
//! the pixel work.
//!
//! ## Types
//!
//! - [`TargetRatio`]: Positive, finite width/height ratio. Validated on construction.
//! - [`PercentRect`]: A rectangle in percent of the source dimensions.
//! - [`PixelRect`]: A rectangle in source pixels.
//! - [`FontWeight`]: CSS-style weight (`normal`, `bold`, `100`..`900`).
//! - [`FontSpec`]: Family list + weight + pixel size, as handed to a surface.
//! - [`Shadow`]: Drop shadow color and blur radius.
//! - [`TextAlign`]: Horizontal anchoring of a text run.

use image::Rgba;
use std::fmt;
use std::str::FromStr;
use thiserror::Error;

/// A style or geometry value that failed to parse or is out of range.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum ParamError {
    #[error("invalid target ratio {0}: must be a positive, finite number")]
    Ratio(f64),
    #[error("invalid color {0:?}: expected #rgb, #rrggbb or #rrggbbaa")]
    Color(String),
    #[error("invalid font weight {0:?}: expected normal, bold or 100-900")]
    Weight(String),
    #[error("{name} must be within {min}..={max}, got {value}")]
    OutOfRange {
        name: &'static str,
        value: f64,
        min: f64,
        max: f64,
    },
    #[error("font family must not be empty")]
    EmptyFamily,
}

/// Width/height ratio required of a crop.
#[derive(Debug, Clone, Copy, PartialEq, PartialOrd)]
pub struct TargetRatio(f64);

impl TargetRatio {
    pub fn new(value: f64) -> Result<Self, ParamError> {
        if value.is_finite() && value > 0.0 {
            Ok(Self(value))
        } else {
            Err(ParamError::Ratio(value))
        }
    }

    /// Ratio from an aspect pair such as `(16, 9)`.
    pub fn from_aspect(width: u32, height: u32) -> Result<Self, ParamError> {
        if height == 0 {
            return Err(ParamError::Ratio(f64::INFINITY));
        }
        Self::new(width as f64 / height as f64)
    }

    pub fn value(self) -> f64 {
        self.0
    }
}

impl FromStr for TargetRatio {
    type Err = ParamError;

    /// Accepts `"16:9"`, `"16/9"` or a plain decimal like `"1.91"`.
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let s = s.trim();
        let parsed = match s.split_once([':', '/']) {
            Some((w, h)) => match (w.trim().parse::<f64>(), h.trim().parse::<f64>()) {
                (Ok(w), Ok(h)) if h != 0.0 => w / h,
                _ => f64::NAN,
            },
            None => s.parse::<f64>().unwrap_or(f64::NAN),
        };
        Self::new(parsed)
    }
}

impl fmt::Display for TargetRatio {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{:.4}", self.0)
    }
}

/// Rectangle in percent (0..=100) of the source image dimensions.
#[derive(Debug, Clone, Copy, PartialEq, serde::Serialize)]
pub struct PercentRect {
    pub x: f64,
    pub y: f64,
    pub width: f64,
    pub height: f64,
}

/// Rectangle in source pixels.
#[derive(Debug, Clone, Copy, PartialEq, Eq, serde::Serialize)]
pub struct PixelRect {
    pub x: u32,
    pub y: u32,
    pub width: u32,
    pub height: u32,
}

impl PixelRect {
    /// Right edge (exclusive).
    pub fn right(&self) -> u32 {
        self.x + self.width
    }

    /// Bottom edge (exclusive).
    pub fn bottom(&self) -> u32 {
        self.y + self.height
    }
}

/// CSS-style numeric font weight.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct FontWeight(pub u16);

impl FontWeight {
    pub const NORMAL: FontWeight = FontWeight(400);
    pub const BOLD: FontWeight = FontWeight(700);

    pub fn value(self) -> u16 {
        self.0
    }
}

impl Default for FontWeight {
    fn default() -> Self {
        Self::NORMAL
    }
}

impl FromStr for FontWeight {
    type Err = ParamError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let trimmed = s.trim();
        match trimmed.to_ascii_lowercase().as_str() {
            "normal" | "regular" => Ok(Self::NORMAL),
            "bold" => Ok(Self::BOLD),
            other => match other.parse::<u16>() {
                Ok(n) if (100..=900).contains(&n) => Ok(Self(n)),
                _ => Err(ParamError::Weight(trimmed.to_string())),
            },
        }
    }
}

/// Parse `#rgb`, `#rrggbb` or `#rrggbbaa` into an RGBA color.
pub fn parse_hex_color(s: &str) -> Result<Rgba<u8>, ParamError> {
    let err = || ParamError::Color(s.to_string());
    let hex = s.trim().strip_prefix('#').ok_or_else(err)?;
    if !hex.chars().all(|c| c.is_ascii_hexdigit()) {
        return Err(err());
    }
    let byte = |i: usize| u8::from_str_radix(&hex[i..i + 2], 16).map_err(|_| err());
    match hex.len() {
        3 => {
            let nib = |i: usize| u8::from_str_radix(&hex[i..i + 1], 16).map_err(|_| err());
            Ok(Rgba([nib(0)? * 17, nib(1)? * 17, nib(2)? * 17, 255]))
        }
        6 => Ok(Rgba([byte(0)?, byte(2)?, byte(4)?, 255])),
        8 => Ok(Rgba([byte(0)?, byte(2)?, byte(4)?, byte(6)?])),
        _ => Err(err()),
    }
}

/// Font request handed to a surface: a CSS-like family list, weight and size.
#[derive(Debug, Clone, PartialEq)]
pub struct FontSpec {
    /// Comma-separated family list, first match wins (`"Inter, sans-serif"`).
    pub family: String,
    pub weight: FontWeight,
    /// Pixel size (em height) at source resolution.
    pub size_px: f32,
}

impl FontSpec {
    /// Family names in priority order, surrounding quotes stripped.
    pub fn families(&self) -> Vec<&str> {
        split_families(&self.family)
    }
}

pub(crate) fn split_families(list: &str) -> Vec<&str> {
    list.split(',')
        .map(|f| f.trim().trim_matches(|c| c == '"' || c == '\''))
        .filter(|f| !f.is_empty())
        .collect()
}

/// Drop shadow drawn under text.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Shadow {
    pub color: Rgba<u8>,
    /// Blur radius in output pixels; the Gaussian sigma is half of it.
    pub blur: f32,
}

impl Shadow {
    /// `rgba(0, 0, 0, 0.5)` with a blur of 10.
    pub fn soft() -> Self {
        Self {
            color: Rgba([0, 0, 0, 128]),
            blur: 10.0,
        }
    }
}

/// Horizontal anchor of a text run relative to its x coordinate.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum TextAlign {
    #[default]
    Left,
    Center,
    Right,
}
