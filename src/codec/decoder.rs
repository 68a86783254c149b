//! Raster decoding.
//!
//! Input bytes are decoded with the decoder of their declared format only.
//! GIF input yields its first frame. The `image` crate's default limits apply,
//! so a hostile header cannot request an unbounded allocation.

use std::io::Cursor;

use image::{DynamicImage, ImageReader};

use crate::error::CodecError;
use crate::format::ImageMime;

// =============================================================================
// DecodedRaster
// =============================================================================

/// An in-memory pixel buffer with its natural dimensions.
///
/// Owned by a single compression call and dropped once encoding is done.
#[derive(Debug, Clone)]
pub struct DecodedRaster {
    pixels: DynamicImage,
}

impl DecodedRaster {
    /// Wrap an already decoded image.
    pub fn new(pixels: DynamicImage) -> Self {
        Self { pixels }
    }

    /// Width in pixels.
    pub fn width(&self) -> u32 {
        self.pixels.width()
    }

    /// Height in pixels.
    pub fn height(&self) -> u32 {
        self.pixels.height()
    }

    /// `(width, height)` in pixels.
    pub fn dimensions(&self) -> (u32, u32) {
        (self.width(), self.height())
    }

    /// Borrow the pixel buffer.
    pub fn pixels(&self) -> &DynamicImage {
        &self.pixels
    }

    /// Take the pixel buffer.
    pub fn into_pixels(self) -> DynamicImage {
        self.pixels
    }

    /// Convert the buffer to the colour layout the encoder for `mime` consumes.
    ///
    /// JPEG and WebP take 8-bit RGB (alpha is dropped), GIF takes 8-bit RGBA,
    /// PNG keeps whatever layout was decoded. Converting once up front keeps
    /// the per-attempt encode free of conversions.
    pub fn into_layout_for(self, mime: ImageMime) -> Self {
        let pixels = match (mime, self.pixels) {
            (ImageMime::Jpeg | ImageMime::Webp, rgb @ DynamicImage::ImageRgb8(_)) => rgb,
            (ImageMime::Jpeg | ImageMime::Webp, other) => DynamicImage::ImageRgb8(other.to_rgb8()),
            (ImageMime::Gif, rgba @ DynamicImage::ImageRgba8(_)) => rgba,
            (ImageMime::Gif, other) => DynamicImage::ImageRgba8(other.to_rgba8()),
            (ImageMime::Png, any) => any,
        };
        Self { pixels }
    }
}

// =============================================================================
// Decoding
// =============================================================================

/// Decode `source` as the declared `mime` format.
///
/// # Errors
///
/// Returns [`CodecError::Decode`] if the bytes are empty, truncated, or not
/// in the declared format.
pub fn decode(source: &[u8], mime: ImageMime) -> Result<DecodedRaster, CodecError> {
    let cursor = Cursor::new(source);
    let reader = ImageReader::with_format(cursor, mime.image_format());

    let pixels = reader.decode().map_err(|e| CodecError::Decode {
        message: e.to_string(),
    })?;

    Ok(DecodedRaster::new(pixels))
}

/// Read image dimensions without decoding the pixel data.
pub fn dimensions(source: &[u8], mime: ImageMime) -> Result<(u32, u32), CodecError> {
    let cursor = Cursor::new(source);
    let reader = ImageReader::with_format(cursor, mime.image_format());

    reader.into_dimensions().map_err(|e| CodecError::Decode {
        message: e.to_string(),
    })
}

// =============================================================================
// Tests
// =============================================================================
