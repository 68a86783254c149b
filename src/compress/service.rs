//! Compression orchestrator.
//!
//! [`ImageCompressor`] is the single entry point consumed by the upload flow.
//! It composes the pipeline stages:
//!
//! ```text
//! ┌───────────────────────────────────────────────────────────────────┐
//! │                         ImageCompressor                           │
//! │  ┌─────────────────────────────────────────────────────────────┐  │
//! │  │                      compress()                             │  │
//! │  │  1. Decode          3. Resize to tier cap                   │  │
//! │  │  2. Pick tier       4. Quality search (encode until fit)    │  │
//! │  └─────────────────────────────────────────────────────────────┘  │
//! │        │                  │                     │                 │
//! │        ▼                  ▼                     ▼                 │
//! │   ┌─────────┐      ┌─────────────┐      ┌────────────────┐        │
//! │   │ decoder │      │ tier/resize │      │ QualitySearch  │        │
//! │   └─────────┘      └─────────────┘      └────────────────┘        │
//! └───────────────────────────────────────────────────────────────────┘
//! ```
//!
//! Every call is independent: no state is shared between calls beyond the
//! immutable tier table, so one compressor can serve many threads at once.

use bytes::Bytes;
use serde::Serialize;
use tracing::info;

use crate::cancel::CancelFlag;
use crate::codec::{decode, CodecEncoder, RasterEncoder};
use crate::error::{CodecError, CompressionError};
use crate::format::ImageMime;

use super::quality::Quality;
use super::resize::resize_to_fit;
use super::search::{QualitySearch, SearchError, SearchSettings, Termination};
use super::tier::max_dimension_for;

/// Default byte budget (500 KiB).
pub const DEFAULT_BUDGET_BYTES: usize = 500 * 1024;

// =============================================================================
// Source & Result
// =============================================================================

/// A caller-supplied image. Never mutated.
#[derive(Debug, Clone)]
pub struct SourceImage {
    bytes: Bytes,
    mime_type: String,
    file_name: String,
}

impl SourceImage {
    /// Create a source image from raw bytes and its declared metadata.
    pub fn new(
        bytes: impl Into<Bytes>,
        mime_type: impl Into<String>,
        file_name: impl Into<String>,
    ) -> Self {
        Self {
            bytes: bytes.into(),
            mime_type: mime_type.into(),
            file_name: file_name.into(),
        }
    }

    /// Raw bytes.
    pub fn bytes(&self) -> &Bytes {
        &self.bytes
    }

    /// Declared mime type, as supplied.
    pub fn mime_type(&self) -> &str {
        &self.mime_type
    }

    /// File name, as supplied.
    pub fn file_name(&self) -> &str {
        &self.file_name
    }

    /// Size of the raw bytes.
    pub fn byte_size(&self) -> usize {
        self.bytes.len()
    }
}

/// How a [`CompressedImage`] was produced.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct CompressionReport {
    /// Size of the source in bytes
    pub original_byte_size: usize,

    /// Budget the call ran with
    pub budget_bytes: usize,

    /// Decoded source width
    pub original_width: u32,

    /// Decoded source height
    pub original_height: u32,

    /// Output width
    pub width: u32,

    /// Output height
    pub height: u32,

    /// Quality of the returned encode
    pub quality: Quality,

    /// Encodes performed
    pub attempts: u32,

    /// Why the search stopped
    pub termination: Termination,
}

/// A compressed image, ready to attach to an upload.
#[derive(Debug, Clone)]
pub struct CompressedImage {
    /// Encoded bytes
    pub bytes: Bytes,

    /// Mime type of `bytes`; JPEG whenever the source was PNG
    pub mime_type: ImageMime,

    /// Source file name, unchanged
    pub file_name: String,

    /// Details of the run
    pub report: CompressionReport,
}

impl CompressedImage {
    /// Size of the encoded bytes.
    pub fn byte_size(&self) -> usize {
        self.bytes.len()
    }

    /// True when the best-effort result still exceeds the budget.
    pub fn is_shortfall(&self) -> bool {
        self.byte_size() > self.report.budget_bytes
    }
}

// =============================================================================
// Settings
// =============================================================================

/// Settings for an [`ImageCompressor`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CompressionSettings {
    /// Default byte budget; files at or under it are not re-encoded
    pub budget_bytes: usize,

    /// Bounds of the quality search
    pub search: SearchSettings,
}

impl Default for CompressionSettings {
    fn default() -> Self {
        Self {
            budget_bytes: DEFAULT_BUDGET_BYTES,
            search: SearchSettings::default(),
        }
    }
}

// =============================================================================
// ImageCompressor
// =============================================================================

/// Re-encodes images so they fit a byte budget.
///
/// # Type Parameters
///
/// * `E` - The encoder used by the quality search; [`CodecEncoder`] in
///   production.
///
/// # Example
///
/// ```no_run
/// use evidence_shrink::{CompressionSettings, ImageCompressor, SourceImage};
///
/// let compressor = ImageCompressor::new(CompressionSettings::default());
/// let source = SourceImage::new(std::fs::read("photo.jpg").unwrap(), "image/jpeg", "photo.jpg");
///
/// let image = compressor.compress(&source, 500 * 1024).unwrap();
/// println!("{} bytes, shortfall: {}", image.byte_size(), image.is_shortfall());
/// ```
#[derive(Debug, Clone)]
pub struct ImageCompressor<E: RasterEncoder = CodecEncoder> {
    settings: CompressionSettings,
    search: QualitySearch,
    encoder: E,
}

impl ImageCompressor<CodecEncoder> {
    /// Create a compressor backed by the real codecs.
    pub fn new(settings: CompressionSettings) -> Self {
        Self::with_encoder(settings, CodecEncoder::new())
    }
}

impl Default for ImageCompressor<CodecEncoder> {
    fn default() -> Self {
        Self::new(CompressionSettings::default())
    }
}

impl<E: RasterEncoder> ImageCompressor<E> {
    /// Create a compressor with a custom encoder.
    pub fn with_encoder(settings: CompressionSettings, encoder: E) -> Self {
        Self {
            settings,
            search: QualitySearch::new(settings.search),
            encoder,
        }
    }

    /// Settings this compressor was built with.
    pub fn settings(&self) -> &CompressionSettings {
        &self.settings
    }

    /// Compress `source` to fit `budget` bytes.
    ///
    /// See [`compress_with_cancel`](Self::compress_with_cancel).
    pub fn compress(
        &self,
        source: &SourceImage,
        budget: usize,
    ) -> Result<CompressedImage, CompressionError> {
        self.compress_with_cancel(source, budget, &CancelFlag::new())
    }

    /// Compress `source` to fit `budget` bytes, checking `cancel` between
    /// attempts.
    ///
    /// Every stage always runs: a source already within the budget is still
    /// capped to its tier, resized if needed and re-encoded, so the first
    /// attempt at the initial quality normally fits. Skipping such files is
    /// the caller's decision. The result either fits the budget or is a
    /// best-effort shortfall; see [`CompressedImage::is_shortfall`].
    ///
    /// # Errors
    ///
    /// - [`CompressionError::DecodeFailed`] for unsupported or malformed input
    /// - [`CompressionError::EncodeFailed`] if the encoder rejects the raster
    /// - [`CompressionError::Cancelled`] if `cancel` is raised
    pub fn compress_with_cancel(
        &self,
        source: &SourceImage,
        budget: usize,
        cancel: &CancelFlag,
    ) -> Result<CompressedImage, CompressionError> {
        let file_name = source.file_name();

        if cancel.is_cancelled() {
            return Err(cancelled(file_name));
        }

        let mime = ImageMime::parse(source.mime_type()).ok_or_else(|| {
            decode_failed(
                file_name,
                CodecError::UnsupportedMime {
                    mime: source.mime_type().to_string(),
                },
            )
        })?;

        let raster = decode(source.bytes(), mime).map_err(|e| decode_failed(file_name, e))?;
        let (original_width, original_height) = raster.dimensions();

        let max_dimension = max_dimension_for(source.byte_size() as u64);
        let target = mime.encode_target();
        let raster = resize_to_fit(raster, max_dimension).into_layout_for(target);
        let (width, height) = raster.dimensions();

        let outcome = self
            .search
            .run(&self.encoder, &raster, target, budget, cancel)
            .map_err(|e| match e {
                SearchError::Cancelled => cancelled(file_name),
                SearchError::Codec(e) => CompressionError::EncodeFailed {
                    file_name: file_name.to_string(),
                    reason: e.to_string(),
                },
            })?;

        info!(
            "Compressed {}: {} -> {} bytes, {}x{} -> {}x{}, quality {}, {} attempt(s)",
            file_name,
            source.byte_size(),
            outcome.bytes.len(),
            original_width,
            original_height,
            width,
            height,
            outcome.quality,
            outcome.attempts
        );

        let report = CompressionReport {
            original_byte_size: source.byte_size(),
            budget_bytes: budget,
            original_width,
            original_height,
            width,
            height,
            quality: outcome.quality,
            attempts: outcome.attempts,
            termination: outcome.termination,
        };

        Ok(CompressedImage {
            bytes: outcome.bytes,
            mime_type: target,
            file_name: file_name.to_string(),
            report,
        })
    }
}

/// Compress one image with the default settings.
///
/// Convenience wrapper over [`ImageCompressor::compress`].
pub fn compress(
    bytes: impl Into<Bytes>,
    mime_type: &str,
    file_name: &str,
    budget: usize,
) -> Result<CompressedImage, CompressionError> {
    let source = SourceImage::new(bytes, mime_type, file_name);
    ImageCompressor::default().compress(&source, budget)
}

fn decode_failed(file_name: &str, error: CodecError) -> CompressionError {
    CompressionError::DecodeFailed {
        file_name: file_name.to_string(),
        reason: error.to_string(),
    }
}

fn cancelled(file_name: &str) -> CompressionError {
    CompressionError::Cancelled {
        file_name: file_name.to_string(),
    }
}

// =============================================================================
// Tests
// =============================================================================
