//! Pure calculation functions for crop geometry and overlay layout.
//!
//! All functions here are pure and testable without any pixels. Percent values
//! are in the 0..=100 range and relative to the source image dimensions.

use super::params::{PercentRect, PixelRect};

/// Source width the overlay font size is calibrated against.
pub const REFERENCE_WIDTH: f64 = 500.0;

/// Width and height (in percent) of a selection box of nominal `width` whose
/// top edge sits at `y`.
///
/// The height derived from the ratio is clamped to the space left below `y`,
/// then the width is re-derived from the clamped height, so a tall ratio near
/// the bottom edge shrinks the box in both directions.
///
/// # Examples
/// ```
/// # use brandkit::imaging::selection_extent;
/// // 80% wide at 16:9 → 45% tall, fits below y=10
/// let (w, h) = selection_extent(80.0, 10.0, 16.0 / 9.0);
/// assert!((w - 80.0).abs() < 1e-9 && (h - 45.0).abs() < 1e-9);
/// ```
pub fn selection_extent(width: f64, y: f64, ratio: f64) -> (f64, f64) {
    let height = width / ratio;
    let clamped_height = height.min(100.0 - y).max(0.0);
    (clamped_height * ratio, clamped_height)
}

/// Offset that centers a span of `size` on `pointer`, kept inside 0..=100.
pub fn center_on(pointer: f64, size: f64) -> f64 {
    (pointer - size / 2.0).clamp(0.0, (100.0 - size).max(0.0))
}

/// Map a percent rectangle onto a `(width, height)` pixel grid.
///
/// Width and height are rounded independently of the origin, and the origin is
/// pulled back if rounding would push the far edge past the image.
pub fn percent_to_pixels(rect: &PercentRect, dims: (u32, u32)) -> PixelRect {
    let (img_w, img_h) = dims;
    let scale = |pct: f64, full: u32| (pct / 100.0 * full as f64).round().max(0.0) as u32;

    let width = scale(rect.width, img_w).min(img_w);
    let height = scale(rect.height, img_h).min(img_h);
    let x = scale(rect.x, img_w).min(img_w - width);
    let y = scale(rect.y, img_h).min(img_h - height);

    PixelRect {
        x,
        y,
        width,
        height,
    }
}

/// Overlay font size at source resolution.
///
/// Keeps the apparent text size constant relative to the image width.
///
/// # Examples
/// ```
/// # use brandkit::imaging::effective_font_size;
/// assert_eq!(effective_font_size(32, 1000), 64.0);
/// ```
pub fn effective_font_size(font_size_px: u32, source_width: u32) -> f32 {
    (font_size_px as f64 * (source_width as f64 / REFERENCE_WIDTH)) as f32
}

/// Anchor point of the overlay text: horizontal center, baseline at
/// `position_y` percent of the height.
pub fn text_anchor(dims: (u32, u32), position_y: u32) -> (f32, f32) {
    let (w, h) = dims;
    (w as f32 / 2.0, h as f32 * position_y as f32 / 100.0)
}

/// Gaussian sigma for a shadow blur radius.
pub fn shadow_sigma(blur: f32) -> f32 {
    blur / 2.0
}

#[cfg(test)]
mod tests {
    use super::*;

    const EPS: f64 = 1e-9;

    // =========================================================================
    // selection_extent
    // =========================================================================

    #[test]
    fn extent_unclamped_landscape() {
        let (w, h) = selection_extent(80.0, 10.0, 16.0 / 9.0);
        assert!((w - 80.0).abs() < EPS);
        assert!((h - 45.0).abs() < EPS);
    }

    #[test]
    fn extent_clamped_by_bottom_edge_shrinks_width() {
        // 9:16 at 80% wide wants 142.2% height, only 90% available
        let ratio = 9.0 / 16.0;
        let (w, h) = selection_extent(80.0, 10.0, ratio);
        assert!((h - 90.0).abs() < EPS);
        assert!((w - 90.0 * ratio).abs() < EPS);
        assert!(w < 80.0);
    }

    #[test]
    fn extent_at_bottom_is_empty() {
        assert_eq!(selection_extent(80.0, 100.0, 1.0), (0.0, 0.0));
    }

    // =========================================================================
    // center_on
    // =========================================================================

    #[test]
    fn center_on_clamps_low() {
        assert_eq!(center_on(5.0, 80.0), 0.0);
        assert_eq!(center_on(5.0, 45.0), 0.0);
    }

    #[test]
    fn center_on_clamps_high() {
        assert_eq!(center_on(99.0, 80.0), 20.0);
        assert_eq!(center_on(99.0, 45.0), 55.0);
    }

    #[test]
    fn center_on_middle() {
        assert_eq!(center_on(50.0, 40.0), 30.0);
    }

    #[test]
    fn center_on_full_span() {
        assert_eq!(center_on(70.0, 100.0), 0.0);
    }

    // =========================================================================
    // percent_to_pixels
    // =========================================================================

    #[test]
    fn pixels_square_source() {
        let rect = PercentRect {
            x: 10.0,
            y: 10.0,
            width: 80.0,
            height: 45.0,
        };
        let px = percent_to_pixels(&rect, (1000, 1000));
        assert_eq!(
            px,
            PixelRect {
                x: 100,
                y: 100,
                width: 800,
                height: 450
            }
        );
        assert_eq!((px.right(), px.bottom()), (900, 550));
    }

    #[test]
    fn pixels_rounding_never_exceeds_bounds() {
        // 50% of 3px rounds up for both origin and width: 2 + 2 > 3
        let rect = PercentRect {
            x: 50.0,
            y: 0.0,
            width: 50.0,
            height: 100.0,
        };
        let px = percent_to_pixels(&rect, (3, 3));
        assert_eq!(px.width, 2);
        assert_eq!(px.x, 1);
        assert_eq!(px.right(), 3);
    }

    #[test]
    fn pixels_non_square_source() {
        let rect = PercentRect {
            x: 0.0,
            y: 50.0,
            width: 50.0,
            height: 50.0,
        };
        let px = percent_to_pixels(&rect, (640, 480));
        assert_eq!((px.x, px.y, px.width, px.height), (0, 240, 320, 240));
    }

    // =========================================================================
    // overlay layout
    // =========================================================================

    #[test]
    fn font_size_scales_with_width() {
        assert_eq!(effective_font_size(32, 1000), 64.0);
        assert_eq!(effective_font_size(32, 500), 32.0);
        assert_eq!(effective_font_size(10, 250), 5.0);
    }

    #[test]
    fn anchor_is_centered_at_position() {
        assert_eq!(text_anchor((1000, 800), 50), (500.0, 400.0));
        assert_eq!(text_anchor((301, 200), 0), (150.5, 0.0));
        assert_eq!(text_anchor((300, 200), 100), (150.0, 200.0));
    }

    #[test]
    fn sigma_is_half_blur() {
        assert_eq!(shadow_sigma(10.0), 5.0);
    }
}
