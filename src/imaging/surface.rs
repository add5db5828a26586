//! Raster surface abstraction and shared error type.
//!
//! A [`RasterSurface`] is a 2D pixel canvas with a small, canvas-like drawing
//! state: blit a region of an image, set fill/font/shadow/alignment, draw a
//! line of text, and finish into a [`RasterImage`]. A [`RasterBackend`] hands
//! out fresh surfaces.
//!
//! The production implementation is
//! [`CpuBackend`](super::cpu_backend::CpuBackend), `image` buffers plus
//! `ab_glyph` glyph coverage. The components in [`crop`](crate::crop) and
//! [`overlay`](crate::overlay) only talk to these traits, so their drawing
//! sequences can be checked against a recording mock.

use super::params::{FontSpec, PixelRect, Shadow, TextAlign};
use super::raster::RasterImage;
use image::Rgba;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum RenderError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
    #[error("Failed to decode image: {0}")]
    Decode(String),
    #[error("Failed to encode image: {0}")]
    Encode(String),
    #[error("Cannot create a {width}x{height} surface: {reason}")]
    SurfaceUnavailable {
        width: u32,
        height: u32,
        reason: String,
    },
    #[error("Region {region:?} lies outside the {width}x{height} source")]
    RegionOutOfBounds {
        region: PixelRect,
        width: u32,
        height: u32,
    },
    #[error("No font face found for family list {0:?}")]
    FontUnavailable(String),
    #[error(
        "No font face found for family list {0:?}: system font lookup is configured \
         but this build lacks the `system-fonts` feature"
    )]
    SystemFontsUnavailable(String),
    #[error("Failed to parse font {path}: {reason}")]
    FontParse { path: String, reason: String },
}

/// A drawable pixel canvas.
///
/// State set through the `set_*` methods applies to every following
/// [`fill_text`](Self::fill_text) call, like a 2D canvas context.
pub trait RasterSurface {
    /// Copy `src` out of `image` onto the surface with its top-left at `dest`.
    ///
    /// Pixels are copied as-is, no blending and no resampling.
    fn draw_image(
        &mut self,
        image: &RasterImage,
        src: PixelRect,
        dest: (u32, u32),
    ) -> Result<(), RenderError>;

    fn set_fill(&mut self, color: Rgba<u8>);

    fn set_font(&mut self, font: FontSpec);

    fn set_text_align(&mut self, align: TextAlign);

    /// `None` turns the shadow off.
    fn set_shadow(&mut self, shadow: Option<Shadow>);

    /// Draw one line of text with its alphabetic baseline at `y`.
    fn fill_text(&mut self, text: &str, x: f32, y: f32) -> Result<(), RenderError>;

    /// Flatten the surface into an image.
    fn finish(self) -> Result<RasterImage, RenderError>;
}

/// Factory for surfaces.
///
/// `Sync` so one backend can serve parallel crops.
pub trait RasterBackend: Sync {
    type Surface: RasterSurface;

    /// Acquire a transparent surface of the given size.
    fn create_surface(&self, width: u32, height: u32) -> Result<Self::Surface, RenderError>;
}

impl<B: RasterBackend> RasterBackend for &B {
    type Surface = B::Surface;

    fn create_surface(&self, width: u32, height: u32) -> Result<Self::Surface, RenderError> {
        (**self).create_surface(width, height)
    }
}
