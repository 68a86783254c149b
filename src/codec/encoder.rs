//! Raster encoders.
//!
//! [`RasterEncoder`] is the seam between the quality search and the actual
//! codecs. [`CodecEncoder`] is the production implementation:
//!
//! - **JPEG**: `image`'s baseline JPEG encoder, quality mapped 1:1 to percent.
//! - **WebP**: lossy `libwebp` through the `webp` crate, same quality mapping.
//!   The `image` crate only writes lossless WebP.
//! - **GIF**: `image`'s GIF encoder. GIF has no lossy quality knob, so the
//!   quality level picks the NeuQuant sampling speed instead (lower quality,
//!   coarser palette search).
//! - **PNG**: lossless, quality ignored. Only reached when a caller asks for
//!   PNG output explicitly; the compression pipeline re-encodes PNG as JPEG.

use std::borrow::Cow;
use std::io::Cursor;

use bytes::Bytes;
use image::codecs::gif::GifEncoder;
use image::codecs::jpeg::JpegEncoder;
use image::codecs::png::{CompressionType, FilterType, PngEncoder};
use image::{DynamicImage, ExtendedColorType, RgbImage, RgbaImage};

use crate::compress::Quality;
use crate::error::CodecError;
use crate::format::ImageMime;

use super::decoder::DecodedRaster;

/// Slowest (best palette) NeuQuant speed accepted by the GIF encoder.
const GIF_SPEED_BEST: i32 = 1;

/// Fastest (coarsest palette) NeuQuant speed accepted by the GIF encoder.
const GIF_SPEED_FASTEST: i32 = 30;

// =============================================================================
// RasterEncoder
// =============================================================================

/// Encodes a raster into a compressed byte stream at a quality level.
///
/// Implementations must be deterministic enough that the search makes
/// progress: lowering the quality should not grow the output.
pub trait RasterEncoder: Send + Sync {
    /// Encode `raster` as `mime` at `quality`.
    fn encode(
        &self,
        raster: &DecodedRaster,
        mime: ImageMime,
        quality: Quality,
    ) -> Result<Bytes, CodecError>;
}

// =============================================================================
// CodecEncoder
// =============================================================================

/// Encoder backed by the `image` and `webp` codecs.
#[derive(Debug, Clone, Copy, Default)]
pub struct CodecEncoder;

impl CodecEncoder {
    /// Create a new codec encoder.
    pub fn new() -> Self {
        Self
    }

    fn encode_jpeg(&self, pixels: &DynamicImage, quality: Quality) -> Result<Bytes, CodecError> {
        let rgb = rgb_view(pixels);

        let mut output = Vec::new();
        let mut encoder = JpegEncoder::new_with_quality(&mut output, quality.percent());

        encoder.encode_image(&*rgb).map_err(encode_error)?;

        Ok(Bytes::from(output))
    }

    fn encode_webp(&self, pixels: &DynamicImage, quality: Quality) -> Result<Bytes, CodecError> {
        let rgb = rgb_view(pixels);
        let (width, height) = rgb.dimensions();

        let encoder = webp::Encoder::from_rgb(rgb.as_raw(), width, height);
        let memory = encoder
            .encode_simple(false, f32::from(quality.percent()))
            .map_err(|e| CodecError::Encode {
                message: format!("WebP encode failed: {e:?}"),
            })?;

        Ok(Bytes::copy_from_slice(&memory))
    }

    fn encode_gif(&self, pixels: &DynamicImage, quality: Quality) -> Result<Bytes, CodecError> {
        let rgba = rgba_view(pixels);
        let (width, height) = rgba.dimensions();

        let mut output = Vec::new();
        {
            // The trailer is written when the encoder drops
            let mut encoder = GifEncoder::new_with_speed(&mut output, gif_speed(quality));
            encoder
                .encode(rgba.as_raw(), width, height, ExtendedColorType::Rgba8)
                .map_err(encode_error)?;
        }

        Ok(Bytes::from(output))
    }

    fn encode_png(&self, pixels: &DynamicImage) -> Result<Bytes, CodecError> {
        let mut output = Cursor::new(Vec::new());
        let encoder =
            PngEncoder::new_with_quality(&mut output, CompressionType::Best, FilterType::Adaptive);

        pixels.write_with_encoder(encoder).map_err(encode_error)?;

        Ok(Bytes::from(output.into_inner()))
    }
}

impl RasterEncoder for CodecEncoder {
    fn encode(
        &self,
        raster: &DecodedRaster,
        mime: ImageMime,
        quality: Quality,
    ) -> Result<Bytes, CodecError> {
        let pixels = raster.pixels();

        match mime {
            ImageMime::Jpeg => self.encode_jpeg(pixels, quality),
            ImageMime::Webp => self.encode_webp(pixels, quality),
            ImageMime::Gif => self.encode_gif(pixels, quality),
            ImageMime::Png => self.encode_png(pixels),
        }
    }
}

// =============================================================================
// Helpers
// =============================================================================

fn encode_error(e: image::ImageError) -> CodecError {
    CodecError::Encode {
        message: e.to_string(),
    }
}

/// Borrow the buffer as RGB8 when it already is, convert otherwise.
fn rgb_view(pixels: &DynamicImage) -> Cow<'_, RgbImage> {
    match pixels {
        DynamicImage::ImageRgb8(rgb) => Cow::Borrowed(rgb),
        other => Cow::Owned(other.to_rgb8()),
    }
}

/// Borrow the buffer as RGBA8 when it already is, convert otherwise.
fn rgba_view(pixels: &DynamicImage) -> Cow<'_, RgbaImage> {
    match pixels {
        DynamicImage::ImageRgba8(rgba) => Cow::Borrowed(rgba),
        other => Cow::Owned(other.to_rgba8()),
    }
}

/// Map quality 100 to the best palette search and quality 1 to the fastest.
fn gif_speed(quality: Quality) -> i32 {
    let loss = 100 - i32::from(quality.percent());
    let span = GIF_SPEED_FASTEST - GIF_SPEED_BEST;
    (GIF_SPEED_BEST + loss * span / 99).clamp(GIF_SPEED_BEST, GIF_SPEED_FASTEST)
}

// =============================================================================
// Tests
// =============================================================================
