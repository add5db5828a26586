//! Aspect-locked cropping.
//!
//! A crop goes through three steps, each an explicit value handed back to the
//! caller:
//!
//! ```text
//! begin_crop(image, ratio)        → CropSession   (selection at 10,10 / 80% wide)
//! session.update_selection(x, y)  → CropSession   (once per pointer move)
//! apply_crop(session)             → RasterImage   (source-resolution pixels)
//! ```
//!
//! The selection stores its top-left corner and nominal width in percent of the
//! source. Its height is derived from the width and the target ratio, clamped
//! to the space below the top edge, and the effective width is re-derived from
//! that clamped height. Every selection therefore has exactly the target ratio
//! (in percent units) and stays inside the image, including the very first one.

use crate::imaging::{
    ParamError, PercentRect, PixelRect, RasterBackend, RasterImage, RasterSurface, TargetRatio,
    center_on, percent_to_pixels, selection_extent,
};
use crate::types::{ComposeError, Result};
use serde::{Deserialize, Serialize};
use std::sync::Arc;

/// Top-left corner and nominal width of a crop box, in percent of the source.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct CropSelection {
    pub x: f64,
    pub y: f64,
    pub width: f64,
}

impl CropSelection {
    /// Selection a new crop session starts from.
    pub const INITIAL: CropSelection = CropSelection {
        x: 10.0,
        y: 10.0,
        width: 80.0,
    };

    /// Check that the selection lies inside the image and has a visible size.
    pub fn validate(&self) -> std::result::Result<(), ParamError> {
        let check = |name: &'static str, value: f64, ok: bool, min: f64, max: f64| {
            if value.is_finite() && ok {
                Ok(())
            } else {
                Err(ParamError::OutOfRange {
                    name,
                    value,
                    min,
                    max,
                })
            }
        };
        let (x, y, width) = (self.x, self.y, self.width);
        check("selection width", width, width > 0.0 && width <= 100.0, 0.0, 100.0)?;
        check("selection x", x, (0.0..=100.0 - width).contains(&x), 0.0, 100.0 - width)?;
        // Half-open: a box whose top edge sits on the bottom has no height.
        check("selection y", y, (0.0..100.0).contains(&y), 0.0, 100.0)?;
        Ok(())
    }

    /// The effective crop box for `ratio`.
    pub fn rect(&self, ratio: TargetRatio) -> PercentRect {
        let (width, height) = selection_extent(self.width, self.y, ratio.value());
        PercentRect {
            x: self.x,
            y: self.y,
            width,
            height,
        }
    }
}

impl Default for CropSelection {
    fn default() -> Self {
        Self::INITIAL
    }
}

/// An in-progress crop: the source, its target ratio and the current selection.
///
/// Sessions are immutable; [`update_selection`](Self::update_selection) returns
/// a new one. The source is shared, so stepping a session is cheap.
#[derive(Debug, Clone)]
pub struct CropSession {
    image: Arc<RasterImage>,
    ratio: TargetRatio,
    selection: CropSelection,
}

impl CropSession {
    pub fn image(&self) -> &RasterImage {
        &self.image
    }

    pub fn ratio(&self) -> TargetRatio {
        self.ratio
    }

    pub fn selection(&self) -> CropSelection {
        self.selection
    }

    /// Effective crop box in percent of the source.
    pub fn rect(&self) -> PercentRect {
        self.selection.rect(self.ratio)
    }

    /// Effective crop box in source pixels.
    pub fn pixel_region(&self) -> PixelRect {
        percent_to_pixels(&self.rect(), self.image.dimensions())
    }

    /// Recenter the selection on a pointer position (percent of the source).
    ///
    /// The width never changes. The height used for centering is clamped
    /// against the current top edge before the box moves. Non-finite pointer
    /// coordinates leave the selection where it is.
    pub fn update_selection(&self, pointer_x: f64, pointer_y: f64) -> CropSession {
        if !pointer_x.is_finite() || !pointer_y.is_finite() {
            tracing::debug!(pointer_x, pointer_y, "ignoring non-finite pointer");
            return self.clone();
        }
        let CropSelection { y, width, .. } = self.selection;
        let (_, clamped_height) = selection_extent(width, y, self.ratio.value());

        CropSession {
            image: Arc::clone(&self.image),
            ratio: self.ratio,
            selection: CropSelection {
                x: center_on(pointer_x, width),
                y: center_on(pointer_y, clamped_height),
                width,
            },
        }
    }
}

/// Starts crop sessions and rasterizes them through a [`RasterBackend`].
pub struct CropEngine<B> {
    backend: B,
    initial: CropSelection,
}

impl<B: RasterBackend> CropEngine<B> {
    pub fn new(backend: B) -> Self {
        Self {
            backend,
            initial: CropSelection::INITIAL,
        }
    }

    /// Start sessions from `initial` instead of the stock 10,10 / 80%.
    pub fn with_initial(mut self, initial: CropSelection) -> Result<Self> {
        initial.validate()?;
        self.initial = initial;
        Ok(self)
    }

    /// Open a crop session over `image` locked to `target_ratio` (width/height).
    pub fn begin_crop(
        &self,
        image: impl Into<Arc<RasterImage>>,
        target_ratio: f64,
    ) -> Result<CropSession> {
        let ratio = TargetRatio::new(target_ratio)?;
        let image = image.into();
        if image.is_empty() {
            let (w, h) = image.dimensions();
            return Err(ComposeError::InvalidInput(format!(
                "source image has zero dimensions ({w}x{h})"
            )));
        }
        tracing::debug!(
            width = image.width(),
            height = image.height(),
            ratio = ratio.value(),
            "crop session started"
        );
        Ok(CropSession {
            image,
            ratio,
            selection: self.initial,
        })
    }

    /// Extract the selected region at source resolution.
    ///
    /// The output is exactly [`CropSession::pixel_region`] in size; no pixel
    /// is resampled.
    #[tracing::instrument(skip_all, fields(ratio = %session.ratio()))]
    pub fn apply_crop(&self, session: CropSession) -> Result<RasterImage> {
        let region = session.pixel_region();
        if region.width == 0 || region.height == 0 {
            return Err(ComposeError::InvalidInput(format!(
                "crop region {}x{} px is empty at this image size",
                region.width, region.height
            )));
        }

        let mut surface = self.backend.create_surface(region.width, region.height)?;
        surface.draw_image(session.image(), region, (0, 0))?;
        let output = surface.finish()?;

        tracing::info!(
            x = region.x,
            y = region.y,
            width = region.width,
            height = region.height,
            "crop applied"
        );
        Ok(output)
    }
}
