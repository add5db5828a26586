//! Single-line text overlays.
//!
//! [`OverlayCompositor::render`] copies the source onto a fresh surface of the
//! same size and draws one line of styled text on top:
//!
//! - horizontally centered on the image
//! - alphabetic baseline at `position_y` percent of the height
//! - font size scaled by `width / 500`, so a 32px style reads the same on a
//!   500px preview and a 4000px export
//! - soft black drop shadow (`rgba(0,0,0,0.5)`, blur 10)
//!
//! Every render starts from the untouched source, so rendering again with a
//! new style replaces the text instead of stacking it.

use crate::imaging::{
    FontSpec, FontWeight, ParamError, PixelRect, RasterBackend, RasterImage, RasterSurface,
    Shadow, TextAlign, effective_font_size, parse_hex_color, text_anchor,
};
use crate::imaging::params::split_families;
use crate::types::{ComposeError, Result};
use image::Rgba;
use serde::{Deserialize, Serialize};

/// Smallest and largest accepted `font_size`.
pub const FONT_SIZE_RANGE: (u32, u32) = (10, 100);

/// Typography and placement of one text layer.
///
/// Values are kept as the user typed them and checked on render.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct OverlayStyle {
    /// Text to draw. Empty means no overlay.
    pub text: String,
    /// CSS-like family list, first available wins.
    pub font_family: String,
    /// `normal`, `bold` or `100`..`900`.
    pub font_weight: String,
    /// `#rgb`, `#rrggbb` or `#rrggbbaa`.
    pub color: String,
    /// Size in px relative to a 500px-wide image (10-100).
    pub font_size: u32,
    /// Baseline position in percent of the image height (0-100).
    pub position_y: u32,
}

impl Default for OverlayStyle {
    fn default() -> Self {
        Self {
            text: String::new(),
            font_family: "Inter, DejaVu Sans, sans-serif".to_string(),
            font_weight: "bold".to_string(),
            color: "#ffffff".to_string(),
            font_size: 32,
            position_y: 50,
        }
    }
}

/// An [`OverlayStyle`] whose values all parsed.
#[derive(Debug, Clone, PartialEq)]
pub struct ResolvedStyle {
    pub color: Rgba<u8>,
    pub weight: FontWeight,
    pub family: String,
    pub font_size: u32,
    pub position_y: u32,
}

impl OverlayStyle {
    /// Parse and range-check every style value except the text.
    pub fn resolve(&self) -> std::result::Result<ResolvedStyle, ParamError> {
        let color = parse_hex_color(&self.color)?;
        let weight: FontWeight = self.font_weight.parse()?;
        if split_families(&self.font_family).is_empty() {
            return Err(ParamError::EmptyFamily);
        }
        let (min, max) = FONT_SIZE_RANGE;
        if !(min..=max).contains(&self.font_size) {
            return Err(ParamError::OutOfRange {
                name: "font_size",
                value: self.font_size as f64,
                min: min as f64,
                max: max as f64,
            });
        }
        if self.position_y > 100 {
            return Err(ParamError::OutOfRange {
                name: "position_y",
                value: self.position_y as f64,
                min: 0.0,
                max: 100.0,
            });
        }
        Ok(ResolvedStyle {
            color,
            weight,
            family: self.font_family.trim().to_string(),
            font_size: self.font_size,
            position_y: self.position_y,
        })
    }
}

/// Flattens text overlays onto images through a [`RasterBackend`].
pub struct OverlayCompositor<B> {
    backend: B,
    shadow: Shadow,
}

impl<B: RasterBackend> OverlayCompositor<B> {
    pub fn new(backend: B) -> Self {
        Self {
            backend,
            shadow: Shadow::soft(),
        }
    }

    /// Render `style` over `image` and return the flattened result.
    ///
    /// Empty text returns a copy of the source without touching a surface.
    #[tracing::instrument(skip_all, fields(width = image.width(), height = image.height()))]
    pub fn render(&self, image: &RasterImage, style: &OverlayStyle) -> Result<RasterImage> {
        if image.is_empty() {
            return Err(ComposeError::InvalidInput(
                "source image has zero dimensions".into(),
            ));
        }
        if style.text.is_empty() {
            tracing::debug!("no overlay text, returning source");
            return Ok(image.clone());
        }
        let resolved = style.resolve()?;

        let (width, height) = image.dimensions();
        let mut surface = self.backend.create_surface(width, height)?;
        surface.draw_image(
            image,
            PixelRect {
                x: 0,
                y: 0,
                width,
                height,
            },
            (0, 0),
        )?;

        let size_px = effective_font_size(resolved.font_size, width);
        surface.set_fill(resolved.color);
        surface.set_font(FontSpec {
            family: resolved.family,
            weight: resolved.weight,
            size_px,
        });
        surface.set_text_align(TextAlign::Center);
        surface.set_shadow(Some(self.shadow));

        let (x, y) = text_anchor((width, height), resolved.position_y);
        surface.fill_text(&single_line(&style.text), x, y)?;
        let output = surface.finish()?;

        tracing::info!(size_px, x, y, "overlay rendered");
        Ok(output)
    }
}

/// Control characters (newlines, tabs) are drawn as spaces.
fn single_line(text: &str) -> String {
    text.chars()
        .map(|c| if c.is_control() { ' ' } else { c })
        .collect()
}
