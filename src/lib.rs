//! # brandkit
//!
//! Crop and caption campaign images for social platforms.
//!
//! Two independent components do the work, and the output of one can feed the
//! other:
//!
//! ```text
//! CropEngine          image + ratio  →  session → drag → apply  →  cropped image
//! OverlayCompositor   image + style  →  render                   →  flattened image
//! ```
//!
//! # Module Map
//!
//! | Module | Role |
//! |--------|------|
//! | [`crop`] | Ratio-locked crop selection, drag repositioning, pixel extraction |
//! | [`overlay`] | Single-line styled text with a soft shadow over an image |
//! | [`imaging`] | Raster surface traits, CPU backend, fonts, geometry calculations |
//! | [`config`] | Layered `config.toml` loading, validation and stock defaults |
//! | [`types`] | [`ComposeError`](types::ComposeError), shared by both components |
//! | [`output`] | CLI output formatting |
//!
//! # Design Decisions
//!
//! ## Percent Space
//!
//! Selections live in percent of the source image, so a drag recorded on a
//! preview replays unchanged on the full-resolution file. Pixels only appear
//! in [`crop::CropEngine::apply_crop`], where the rectangle is rounded once.
//!
//! ## Surfaces Behind a Trait
//!
//! Both components draw through [`imaging::RasterSurface`], obtained from an
//! [`imaging::RasterBackend`]. Production uses the pure-Rust
//! [`imaging::CpuBackend`]; unit tests use a recording mock and assert the
//! exact draw sequence without rasterizing anything.
//!
//! ## Explicit Sessions
//!
//! A [`crop::CropSession`] is a value. Dragging returns a new session and the
//! old one stays valid, so undo and parallel per-platform crops need no
//! coordination.
//!
//! ## Resolution-Independent Text
//!
//! Overlay font sizes are specified for a 500px-wide image and scaled by the
//! real width, so a style tuned on a preview renders at the same proportions
//! on the export.

pub mod config;
pub mod crop;
pub mod imaging;
pub mod output;
pub mod overlay;
pub mod types;

#[cfg(test)]
pub(crate) mod test_helpers;
