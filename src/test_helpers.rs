//! Shared test utilities for the brandkit test suite.
//!
//! Provides synthetic source images, geometry assertions, and a vendored
//! font for text-rendering tests.
//!
//! # Usage
//!
//! ```rust
//! use crate::test_helpers::*;
//!
//! let img = gradient_image(1000, 1000);
//! let fonts = test_font_book();
//! ```

use crate::imaging::{FontBook, FontWeight, PercentRect, RasterImage};
use ab_glyph::FontArc;
use image::{Rgba, RgbaImage};
use std::path::PathBuf;

// =========================================================================
// Fixture images
// =========================================================================

/// Opaque image whose pixels encode their own coordinates, so any shifted or
/// resampled copy is detectable.
pub fn gradient_image(width: u32, height: u32) -> RasterImage {
    RasterImage::from_rgba(RgbaImage::from_fn(width, height, |x, y| {
        Rgba([(x % 256) as u8, (y % 256) as u8, ((x / 256 + y / 256) % 256) as u8, 255])
    }))
}

// =========================================================================
// Geometry assertions
// =========================================================================

/// Assert the rectangle lies inside 0..=100 on both axes (1e-9 tolerance).
pub fn assert_contained(rect: &PercentRect) {
    const EPS: f64 = 1e-9;
    assert!(rect.x >= 0.0, "x < 0: {rect:?}");
    assert!(rect.y >= 0.0, "y < 0: {rect:?}");
    assert!(rect.x + rect.width <= 100.0 + EPS, "right edge out: {rect:?}");
    assert!(rect.y + rect.height <= 100.0 + EPS, "bottom edge out: {rect:?}");
}

// =========================================================================
// Fonts: DejaVu Sans Mono, vendored under tests/fixtures/
// =========================================================================

const TEST_FONT_BYTES: &[u8] = include_bytes!("../tests/fixtures/DejaVuSansMono.ttf");

/// On-disk path of the vendored test font.
pub fn test_font_path() -> PathBuf {
    PathBuf::from(env!("CARGO_MANIFEST_DIR")).join("tests/fixtures/DejaVuSansMono.ttf")
}

pub fn test_font() -> FontArc {
    FontArc::try_from_slice(TEST_FONT_BYTES).expect("vendored test font parses")
}

/// Font book with the test font registered as "Test Sans" at 400 and 700.
pub fn test_font_book() -> FontBook {
    let font = test_font();
    let mut book = FontBook::new();
    book.add_face("Test Sans", FontWeight::NORMAL, font.clone());
    book.add_face("Test Sans", FontWeight::BOLD, font);
    book
}
