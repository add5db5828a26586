//! Decoded RGBA raster images and their PNG encoding.

use super::surface::RenderError;
use image::{ImageFormat, ImageReader, RgbaImage};
use std::io::Cursor;
use std::path::Path;

/// A decoded image: RGBA8 pixels plus natural width/height.
///
/// Components never mutate a `RasterImage` in place; every operation returns a
/// new one.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RasterImage {
    pixels: RgbaImage,
}

impl RasterImage {
    pub fn from_rgba(pixels: RgbaImage) -> Self {
        Self { pixels }
    }

    /// Decode an encoded image (PNG, JPEG, WebP), sniffing the format.
    pub fn decode(bytes: &[u8]) -> Result<Self, RenderError> {
        let img = ImageReader::new(Cursor::new(bytes))
            .with_guessed_format()
            .map_err(RenderError::Io)?
            .decode()
            .map_err(|e| RenderError::Decode(e.to_string()))?;
        Ok(Self {
            pixels: img.into_rgba8(),
        })
    }

    /// Load and decode an image from disk.
    pub fn open(path: &Path) -> Result<Self, RenderError> {
        let img = ImageReader::open(path)
            .map_err(RenderError::Io)?
            .with_guessed_format()
            .map_err(RenderError::Io)?
            .decode()
            .map_err(|e| RenderError::Decode(format!("{}: {}", path.display(), e)))?;
        Ok(Self {
            pixels: img.into_rgba8(),
        })
    }

    pub fn width(&self) -> u32 {
        self.pixels.width()
    }

    pub fn height(&self) -> u32 {
        self.pixels.height()
    }

    pub fn dimensions(&self) -> (u32, u32) {
        self.pixels.dimensions()
    }

    pub fn is_empty(&self) -> bool {
        self.width() == 0 || self.height() == 0
    }

    pub fn pixels(&self) -> &RgbaImage {
        &self.pixels
    }

    pub fn into_rgba(self) -> RgbaImage {
        self.pixels
    }

    /// Lossless PNG encoding of the pixels.
    pub fn encode_png(&self) -> Result<Vec<u8>, RenderError> {
        let mut buffer = Vec::new();
        self.pixels
            .write_to(&mut Cursor::new(&mut buffer), ImageFormat::Png)
            .map_err(|e| RenderError::Encode(format!("PNG encode failed: {}", e)))?;
        Ok(buffer)
    }

    /// Encode as PNG and write to `path`.
    pub fn save_png(&self, path: &Path) -> Result<(), RenderError> {
        let bytes = self.encode_png()?;
        std::fs::write(path, bytes)?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_helpers::gradient_image;

    #[test]
    fn png_roundtrip_is_lossless() {
        let img = gradient_image(37, 21);
        let bytes = img.encode_png().unwrap();
        assert_eq!(&bytes[1..4], b"PNG");
        assert_eq!(RasterImage::decode(&bytes).unwrap(), img);
    }

    #[test]
    fn decode_garbage_is_decode_error() {
        let err = RasterImage::decode(b"definitely not an image").unwrap_err();
        assert!(matches!(err, RenderError::Decode(_)), "got {err:?}");
    }

    #[test]
    fn open_missing_file_errors() {
        assert!(RasterImage::open(Path::new("/nonexistent/source.png")).is_err());
    }

    #[test]
    fn save_and_open_from_disk() {
        let tmp = tempfile::TempDir::new().unwrap();
        let path = tmp.path().join("out.png");
        let img = gradient_image(16, 9);
        img.save_png(&path).unwrap();
        assert_eq!(RasterImage::open(&path).unwrap(), img);
    }

    #[test]
    fn empty_when_a_dimension_is_zero() {
        assert!(RasterImage::from_rgba(RgbaImage::new(0, 10)).is_empty());
        assert!(!gradient_image(1, 1).is_empty());
    }
}
