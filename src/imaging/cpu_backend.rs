//! Pure Rust raster backend on top of `image` buffers.
//!
//! ## Crate mapping
//!
//! | Operation | Crate / function |
//! |---|---|
//! | Surface | `image::RgbaImage`, transparent on creation |
//! | Blit | `image::imageops::crop_imm` + `imageops::replace` |
//! | Glyph layout | `ab_glyph` advances + kerning, single line |
//! | Glyph coverage | `ab_glyph::OutlinedGlyph::draw` |
//! | Drop shadow | coverage mask → `image::imageops::blur` (sigma = blur / 2) |
//! | Compositing | straight-alpha source-over, per pixel |

use super::calculations::shadow_sigma;
use super::fonts::FontBook;
use super::params::{FontSpec, PixelRect, Shadow, TextAlign};
use super::raster::RasterImage;
use super::surface::{RasterBackend, RasterSurface, RenderError};
use ab_glyph::{Font, FontArc, GlyphId, OutlinedGlyph, ScaleFont, point};
use image::{GrayImage, Luma, Rgba, RgbaImage};
use std::sync::Arc;

/// Largest surface edge allocated by default.
pub const DEFAULT_MAX_DIMENSION: u32 = 16384;

/// CPU backend handing out [`CpuSurface`]s.
pub struct CpuBackend {
    fonts: Arc<FontBook>,
    max_dimension: u32,
}

impl CpuBackend {
    pub fn new(fonts: Arc<FontBook>) -> Self {
        Self {
            fonts,
            max_dimension: DEFAULT_MAX_DIMENSION,
        }
    }

    /// Refuse surfaces with an edge longer than `max_dimension`.
    pub fn with_max_dimension(mut self, max_dimension: u32) -> Self {
        self.max_dimension = max_dimension;
        self
    }

    pub fn fonts(&self) -> &FontBook {
        &self.fonts
    }
}

impl Default for CpuBackend {
    fn default() -> Self {
        Self::new(Arc::new(FontBook::new()))
    }
}

impl RasterBackend for CpuBackend {
    type Surface = CpuSurface;

    fn create_surface(&self, width: u32, height: u32) -> Result<CpuSurface, RenderError> {
        let refuse = |reason: String| RenderError::SurfaceUnavailable {
            width,
            height,
            reason,
        };
        if width == 0 || height == 0 {
            return Err(refuse("zero-sized surface".into()));
        }
        if width.max(height) > self.max_dimension {
            return Err(refuse(format!(
                "edge exceeds the {}px limit",
                self.max_dimension
            )));
        }
        Ok(CpuSurface {
            canvas: RgbaImage::new(width, height),
            fill: Rgba([0, 0, 0, 255]),
            font: None,
            align: TextAlign::Left,
            shadow: None,
            fonts: Arc::clone(&self.fonts),
        })
    }
}

/// Drawing surface over an RGBA buffer.
pub struct CpuSurface {
    canvas: RgbaImage,
    fill: Rgba<u8>,
    font: Option<FontSpec>,
    align: TextAlign,
    shadow: Option<Shadow>,
    fonts: Arc<FontBook>,
}

impl RasterSurface for CpuSurface {
    fn draw_image(
        &mut self,
        image: &RasterImage,
        src: PixelRect,
        dest: (u32, u32),
    ) -> Result<(), RenderError> {
        let (w, h) = image.dimensions();
        if src.right() > w || src.bottom() > h {
            return Err(RenderError::RegionOutOfBounds {
                region: src,
                width: w,
                height: h,
            });
        }
        let region =
            image::imageops::crop_imm(image.pixels(), src.x, src.y, src.width, src.height)
                .to_image();
        image::imageops::replace(&mut self.canvas, &region, dest.0 as i64, dest.1 as i64);
        Ok(())
    }

    fn set_fill(&mut self, color: Rgba<u8>) {
        self.fill = color;
    }

    fn set_font(&mut self, font: FontSpec) {
        self.font = Some(font);
    }

    fn set_text_align(&mut self, align: TextAlign) {
        self.align = align;
    }

    fn set_shadow(&mut self, shadow: Option<Shadow>) {
        self.shadow = shadow;
    }

    fn fill_text(&mut self, text: &str, x: f32, y: f32) -> Result<(), RenderError> {
        let spec = self
            .font
            .clone()
            .ok_or_else(|| RenderError::FontUnavailable("<no font set>".into()))?;
        let font = self.fonts.resolve(&spec)?;

        let Some(mask) = rasterize_line(
            &font,
            text,
            spec.size_px,
            self.align,
            (x, y),
            self.pad(),
            self.canvas.dimensions(),
        ) else {
            // Nothing visible (whitespace only or no outlines).
            return Ok(());
        };

        if let Some(shadow) = self.shadow {
            let sigma = shadow_sigma(shadow.blur);
            let blurred = if sigma > 0.0 {
                image::imageops::blur(&mask.coverage, sigma)
            } else {
                mask.coverage.clone()
            };
            let alpha_scale = shadow.color[3] as f32 / 255.0 * self.fill[3] as f32 / 255.0;
            paint_mask(&mut self.canvas, &blurred, mask.origin, shadow.color, alpha_scale);
        }
        let alpha_scale = self.fill[3] as f32 / 255.0;
        paint_mask(&mut self.canvas, &mask.coverage, mask.origin, self.fill, alpha_scale);
        Ok(())
    }

    fn finish(self) -> Result<RasterImage, RenderError> {
        Ok(RasterImage::from_rgba(self.canvas))
    }
}

impl CpuSurface {
    /// Margin around the text so the shadow blur is not clipped.
    fn pad(&self) -> u32 {
        self.shadow
            .map(|s| (shadow_sigma(s.blur) * 3.0).ceil().max(0.0) as u32)
            .unwrap_or(0)
    }
}

/// Glyph coverage of a text line, positioned in surface coordinates.
struct CoverageMask {
    coverage: GrayImage,
    /// Surface position of the mask's top-left pixel.
    origin: (i64, i64),
}

/// Lay out `text` on one line and rasterize its coverage.
///
/// `anchor` is the aligned x position and the baseline y. Only the part of the
/// line within `pad` pixels of the `canvas` is rasterized, so the mask never
/// exceeds the canvas plus its padding. Returns `None` when no glyph with an
/// outline lands there.
fn rasterize_line(
    font: &FontArc,
    text: &str,
    size_px: f32,
    align: TextAlign,
    anchor: (f32, f32),
    pad: u32,
    canvas: (u32, u32),
) -> Option<CoverageMask> {
    let scaled = font.as_scaled(size_px);

    let mut positioned: Vec<(GlyphId, f32, f32)> = Vec::new();
    let mut cursor_x = 0.0f32;
    let mut last: Option<GlyphId> = None;
    for ch in text.chars() {
        let id = font.glyph_id(ch);
        if let Some(prev) = last {
            cursor_x += scaled.kern(prev, id);
        }
        let advance = scaled.h_advance(id);
        positioned.push((id, cursor_x, advance));
        cursor_x += advance;
        last = Some(id);
    }

    let offset = match align {
        TextAlign::Left => 0.0,
        TextAlign::Center => -cursor_x * 0.5,
        TextAlign::Right => -cursor_x,
    };

    // Visible window in surface coordinates.
    let pad = pad as i64;
    let (win_x0, win_y0) = (-pad, -pad);
    let (win_x1, win_y1) = (canvas.0 as i64 + pad, canvas.1 as i64 + pad);
    // Glyph outlines can overhang their advance; one em of slack is plenty.
    let slack = size_px.ceil();

    let outlined: Vec<OutlinedGlyph> = positioned
        .into_iter()
        .filter(|&(_, gx, advance)| {
            let left = anchor.0 + offset + gx;
            left + advance + slack >= win_x0 as f32 && left - slack <= win_x1 as f32
        })
        .filter_map(|(id, gx, _)| {
            let glyph = id.with_scale_and_position(size_px, point(anchor.0 + offset + gx, anchor.1));
            font.outline_glyph(glyph)
        })
        .filter(|g| {
            let b = g.px_bounds();
            b.max.x as i64 > win_x0
                && (b.min.x as i64) < win_x1
                && b.max.y as i64 > win_y0
                && (b.min.y as i64) < win_y1
        })
        .collect();
    if outlined.is_empty() {
        return None;
    }

    let (mut min_x, mut min_y) = (f32::MAX, f32::MAX);
    let (mut max_x, mut max_y) = (f32::MIN, f32::MIN);
    for g in &outlined {
        let b = g.px_bounds();
        min_x = min_x.min(b.min.x);
        min_y = min_y.min(b.min.y);
        max_x = max_x.max(b.max.x);
        max_y = max_y.max(b.max.y);
    }

    let x0 = (min_x.floor() as i64 - pad).max(win_x0);
    let y0 = (min_y.floor() as i64 - pad).max(win_y0);
    let x1 = (max_x.ceil() as i64 + pad).min(win_x1);
    let y1 = (max_y.ceil() as i64 + pad).min(win_y1);
    let width = (x1 - x0).max(1) as u32;
    let height = (y1 - y0).max(1) as u32;

    let mut coverage = GrayImage::new(width, height);
    for g in &outlined {
        let b = g.px_bounds();
        let gx = b.min.x as i64 - x0;
        let gy = b.min.y as i64 - y0;
        g.draw(|px, py, c| {
            let cx = gx + px as i64;
            let cy = gy + py as i64;
            if cx < 0 || cy < 0 || cx >= width as i64 || cy >= height as i64 {
                return;
            }
            let value = (c.clamp(0.0, 1.0) * 255.0).round() as u8;
            let pixel = coverage.get_pixel_mut(cx as u32, cy as u32);
            pixel[0] = pixel[0].max(value);
        });
    }

    Some(CoverageMask {
        coverage,
        origin: (x0, y0),
    })
}

/// Source-over `color` onto `canvas` through `mask`, clipped to the canvas.
fn paint_mask(
    canvas: &mut RgbaImage,
    mask: &GrayImage,
    origin: (i64, i64),
    color: Rgba<u8>,
    alpha_scale: f32,
) {
    let (cw, ch) = (canvas.width() as i64, canvas.height() as i64);
    for (mx, my, Luma([cov])) in mask.enumerate_pixels() {
        if *cov == 0 {
            continue;
        }
        let x = origin.0 + mx as i64;
        let y = origin.1 + my as i64;
        if x < 0 || y < 0 || x >= cw || y >= ch {
            continue;
        }
        let alpha = *cov as f32 / 255.0 * alpha_scale;
        let dst = canvas.get_pixel_mut(x as u32, y as u32);
        *dst = blend_over(*dst, color, alpha);
    }
}

/// Straight-alpha source-over of `color` at coverage `alpha` onto `dst`.
fn blend_over(dst: Rgba<u8>, color: Rgba<u8>, alpha: f32) -> Rgba<u8> {
    let sa = alpha.clamp(0.0, 1.0);
    let da = dst[3] as f32 / 255.0;
    let out_a = sa + da * (1.0 - sa);
    if out_a <= 0.0 {
        return Rgba([0, 0, 0, 0]);
    }
    let channel = |i: usize| {
        let v = (color[i] as f32 * sa + dst[i] as f32 * da * (1.0 - sa)) / out_a;
        v.round().clamp(0.0, 255.0) as u8
    };
    Rgba([
        channel(0),
        channel(1),
        channel(2),
        (out_a * 255.0).round().clamp(0.0, 255.0) as u8,
    ])
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::imaging::params::FontWeight;
    use crate::test_helpers::{gradient_image, test_font_book};

    fn full(img: &RasterImage) -> PixelRect {
        PixelRect {
            x: 0,
            y: 0,
            width: img.width(),
            height: img.height(),
        }
    }

    #[test]
    fn zero_sized_surface_is_refused() {
        let backend = CpuBackend::default();
        assert!(matches!(
            backend.create_surface(0, 10),
            Err(RenderError::SurfaceUnavailable { .. })
        ));
    }

    #[test]
    fn oversized_surface_is_refused() {
        let backend = CpuBackend::default().with_max_dimension(64);
        assert!(backend.create_surface(64, 64).is_ok());
        assert!(matches!(
            backend.create_surface(65, 10),
            Err(RenderError::SurfaceUnavailable { width: 65, .. })
        ));
    }

    #[test]
    fn new_surface_is_transparent() {
        let backend = CpuBackend::default();
        let out = backend.create_surface(3, 2).unwrap().finish().unwrap();
        assert!(out.pixels().pixels().all(|p| p[3] == 0));
    }

    #[test]
    fn draw_image_copies_full_source_exactly() {
        let img = gradient_image(40, 30);
        let backend = CpuBackend::default();
        let mut surface = backend.create_surface(40, 30).unwrap();
        surface.draw_image(&img, full(&img), (0, 0)).unwrap();
        assert_eq!(surface.finish().unwrap(), img);
    }

    #[test]
    fn draw_image_copies_sub_region() {
        let img = gradient_image(40, 30);
        let src = PixelRect {
            x: 5,
            y: 7,
            width: 10,
            height: 4,
        };
        let backend = CpuBackend::default();
        let mut surface = backend.create_surface(10, 4).unwrap();
        surface.draw_image(&img, src, (0, 0)).unwrap();
        let out = surface.finish().unwrap();
        for (x, y, p) in out.pixels().enumerate_pixels() {
            assert_eq!(p, img.pixels().get_pixel(x + 5, y + 7));
        }
    }

    #[test]
    fn draw_image_rejects_region_outside_source() {
        let img = gradient_image(10, 10);
        let src = PixelRect {
            x: 5,
            y: 0,
            width: 6,
            height: 10,
        };
        let backend = CpuBackend::default();
        let mut surface = backend.create_surface(6, 10).unwrap();
        assert!(matches!(
            surface.draw_image(&img, src, (0, 0)),
            Err(RenderError::RegionOutOfBounds { .. })
        ));
    }

    #[test]
    fn fill_text_without_font_errors() {
        let backend = CpuBackend::default();
        let mut surface = backend.create_surface(10, 10).unwrap();
        assert!(matches!(
            surface.fill_text("x", 5.0, 5.0),
            Err(RenderError::FontUnavailable(_))
        ));
    }

    #[test]
    fn fill_text_unknown_family_errors() {
        let backend = CpuBackend::default();
        let mut surface = backend.create_surface(10, 10).unwrap();
        surface.set_font(FontSpec {
            family: "No Such Family".into(),
            weight: FontWeight::NORMAL,
            size_px: 8.0,
        });
        assert!(matches!(
            surface.fill_text("x", 5.0, 5.0),
            Err(RenderError::FontUnavailable(f)) if f == "No Such Family"
        ));
    }

    #[test]
    fn blend_over_opaque_and_transparent() {
        let red = Rgba([255, 0, 0, 255]);
        let blue = Rgba([0, 0, 255, 255]);
        assert_eq!(blend_over(blue, red, 1.0), red);
        assert_eq!(blend_over(blue, red, 0.0), blue);
        assert_eq!(blend_over(Rgba([0, 0, 0, 0]), red, 0.5), Rgba([255, 0, 0, 128]));
        assert_eq!(blend_over(blue, red, 0.5), Rgba([128, 0, 128, 255]));
    }

    fn text_surface(
        backend: &CpuBackend,
        img: &RasterImage,
        shadow: Option<Shadow>,
    ) -> RasterImage {
        let mut surface = backend.create_surface(img.width(), img.height()).unwrap();
        surface.draw_image(img, full(img), (0, 0)).unwrap();
        surface.set_fill(Rgba([255, 255, 255, 255]));
        surface.set_font(FontSpec {
            family: "Test Sans".into(),
            weight: FontWeight::BOLD,
            size_px: 40.0,
        });
        surface.set_text_align(TextAlign::Center);
        surface.set_shadow(shadow);
        surface.fill_text("Hello", 100.0, 60.0).unwrap();
        surface.finish().unwrap()
    }

    #[test]
    fn text_changes_pixels_around_anchor_only() {
        let fonts = test_font_book();
        let backend = CpuBackend::new(Arc::new(fonts));
        let img = RasterImage::from_rgba(RgbaImage::from_pixel(200, 100, Rgba([0, 0, 0, 255])));
        let out = text_surface(&backend, &img, None);

        let changed: Vec<(u32, u32)> = out
            .pixels()
            .enumerate_pixels()
            .filter(|(x, y, p)| *p != img.pixels().get_pixel(*x, *y))
            .map(|(x, y, _)| (x, y))
            .collect();
        assert!(!changed.is_empty());
        // Baseline at y=60: glyphs sit above it (plus a little antialiasing).
        assert!(changed.iter().all(|&(_, y)| y <= 62));
        // Centered on x=100.
        let min_x = changed.iter().map(|c| c.0).min().unwrap();
        let max_x = changed.iter().map(|c| c.0).max().unwrap();
        let center = (min_x + max_x) as f32 / 2.0;
        assert!((center - 100.0).abs() < 6.0, "center was {center}");
    }

    #[test]
    fn shadow_darkens_beyond_glyph_coverage() {
        let fonts = test_font_book();
        let backend = CpuBackend::new(Arc::new(fonts));
        let img = RasterImage::from_rgba(RgbaImage::from_pixel(200, 100, Rgba([200, 200, 200, 255])));
        let plain = text_surface(&backend, &img, None);
        let shadowed = text_surface(&backend, &img, Some(Shadow::soft()));

        let darker = plain
            .pixels()
            .pixels()
            .zip(shadowed.pixels().pixels())
            .filter(|(a, b)| b[0] < a[0])
            .count();
        assert!(darker > 0, "shadow left no trace");
    }

    #[test]
    fn text_rendering_is_deterministic() {
        let fonts = test_font_book();
        let backend = CpuBackend::new(Arc::new(fonts));
        let img = gradient_image(200, 100);
        let a = text_surface(&backend, &img, Some(Shadow::soft()));
        let b = text_surface(&backend, &img, Some(Shadow::soft()));
        assert_eq!(a, b);
    }

    #[test]
    fn whitespace_text_draws_nothing() {
        let fonts = test_font_book();
        let backend = CpuBackend::new(Arc::new(fonts));
        let img = gradient_image(50, 50);
        let mut surface = backend.create_surface(50, 50).unwrap();
        surface.draw_image(&img, full(&img), (0, 0)).unwrap();
        surface.set_font(FontSpec {
            family: "Test Sans".into(),
            weight: FontWeight::NORMAL,
            size_px: 12.0,
        });
        surface.fill_text("   ", 25.0, 25.0).unwrap();
        assert_eq!(surface.finish().unwrap(), img);
    }

    #[test]
    fn long_line_mask_is_bounded_by_canvas() {
        let font = crate::test_helpers::test_font();
        let text = "W".repeat(20_000);
        let pad = 15;
        let mask = rasterize_line(
            &font,
            &text,
            200.0,
            TextAlign::Center,
            (500.0, 150.0),
            pad,
            (1000, 300),
        )
        .unwrap();
        assert!(mask.coverage.width() <= 1000 + 2 * pad);
        assert!(mask.coverage.height() <= 300 + 2 * pad);
        assert!(mask.origin.0 >= -(pad as i64) && mask.origin.1 >= -(pad as i64));
    }

    #[test]
    fn long_line_renders_across_the_whole_canvas() {
        let backend = CpuBackend::new(Arc::new(test_font_book()));
        let img = RasterImage::from_rgba(RgbaImage::from_pixel(400, 120, Rgba([0, 0, 0, 255])));
        let mut surface = backend.create_surface(400, 120).unwrap();
        surface.draw_image(&img, full(&img), (0, 0)).unwrap();
        surface.set_fill(Rgba([255, 255, 255, 255]));
        surface.set_font(FontSpec {
            family: "Test Sans".into(),
            weight: FontWeight::BOLD,
            size_px: 80.0,
        });
        surface.set_text_align(TextAlign::Center);
        surface.set_shadow(Some(Shadow::soft()));
        surface.fill_text(&"W".repeat(20_000), 200.0, 90.0).unwrap();
        let out = surface.finish().unwrap();

        assert_eq!(out.dimensions(), (400, 120));
        // Text overflows both edges, so ink reaches both sides.
        let lit = |xs: std::ops::Range<u32>| {
            xs.flat_map(|x| (0..120).map(move |y| (x, y)))
                .any(|(x, y)| out.pixels().get_pixel(x, y)[0] > 0)
        };
        assert!(lit(0..10) && lit(390..400));
    }
}
