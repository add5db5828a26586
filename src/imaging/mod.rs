//! Raster imaging in pure Rust, no system libraries required.
//!
//! | Operation | Crate / function |
//! |---|---|
//! | **Decode / encode** | `image` (PNG, JPEG, WebP in; PNG out) |
//! | **Blit** | `image::imageops::crop_imm` + `replace` |
//! | **Text** | `ab_glyph` layout and coverage |
//! | **Shadow** | `image::imageops::blur` |
//! | **Fonts** | registered files, optional `font-kit` system lookup |
//!
//! The module is split into:
//! - **Calculations**: Pure functions for selection geometry and text layout (unit testable)
//! - **Parameters**: Value types describing drawing requests
//! - **Surface**: [`RasterSurface`] / [`RasterBackend`] traits + [`RenderError`]
//! - **CPU backend**: [`CpuBackend`], the production surface
//! - **Raster**: [`RasterImage`], the decoded image passed between components

mod calculations;
pub mod cpu_backend;
pub mod fonts;
pub mod params;
pub mod raster;
pub mod surface;

pub use calculations::{
    REFERENCE_WIDTH, center_on, effective_font_size, percent_to_pixels, selection_extent,
    shadow_sigma, text_anchor,
};
pub use cpu_backend::CpuBackend;
pub use fonts::FontBook;
pub use params::{
    FontSpec, FontWeight, ParamError, PercentRect, PixelRect, Shadow, TargetRatio, TextAlign,
    parse_hex_color,
};
pub use raster::RasterImage;
pub use surface::{RasterBackend, RasterSurface, RenderError};
