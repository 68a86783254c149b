//! # evidence-shrink
//!
//! Adaptive re-encoding of user-supplied photos so they fit an upload byte
//! budget.
//!
//! Report forms accept a few photos as attachments, and the upload endpoint
//! limits how large each one may be. Phone cameras produce files many times
//! that size. This library decodes each photo, downscales it to a cap chosen
//! from the original file size, and walks the encoder quality down until the
//! output fits the budget or the search runs out of room.
//!
//! ## Features
//!
//! - **Size tiers**: the larger the original, the smaller the longer-side cap
//! - **Bounded quality search**: at most ten encodes, bigger steps when far over
//! - **Best effort**: an over-budget result is still returned, never dropped silently
//! - **Formats**: JPEG, PNG (re-encoded as JPEG), GIF and WEBP
//! - **Per-file isolation**: one bad file never fails its siblings
//!
//! ## Architecture
//!
//! The library is organized into several modules:
//!
//! - [`mod@format`] - Supported mime types and their codecs
//! - [`codec`] - Decoding and quality-parameterized encoding
//! - [`compress`] - Tier selection, resizing, quality search and the orchestrator
//! - [`submission`] - Attachment validation and concurrent batch preparation
//! - [`config`] - CLI and configuration types
//!
//! ## Example
//!
//! ```rust,no_run
//! use evidence_shrink::{CompressionSettings, ImageCompressor, SourceImage};
//!
//! let bytes = std::fs::read("site-photo.jpg").unwrap();
//! let source = SourceImage::new(bytes, "image/jpeg", "site-photo.jpg");
//!
//! let compressor = ImageCompressor::new(CompressionSettings::default());
//! let image = compressor.compress(&source, 500 * 1024).unwrap();
//!
//! println!(
//!     "{} -> {} bytes at quality {}",
//!     image.report.original_byte_size,
//!     image.byte_size(),
//!     image.report.quality
//! );
//! ```

pub mod cancel;
pub mod codec;
pub mod compress;
pub mod config;
pub mod error;
pub mod format;
pub mod submission;

// Re-export commonly used types
pub use cancel::CancelFlag;
pub use codec::{decode, CodecEncoder, DecodedRaster, RasterEncoder};
pub use compress::{
    compress, max_dimension_for, quality_step, resize_to_fit, select_tier, target_dimensions,
    CompressedImage, CompressionAttempt, CompressionReport, CompressionSettings, ImageCompressor,
    Quality, QualitySearch, SearchSettings, SourceImage, Termination, DEFAULT_BUDGET_BYTES,
};
pub use config::Config;
pub use error::{AttachmentError, CodecError, CompressionError};
pub use format::{ImageMime, SUPPORTED_MIMES};
pub use submission::{
    format_file_size, prepare_submission, PreparedAttachment, PreparedSubmission,
    RejectedAttachment, ShortfallPolicy, SubmissionPolicy,
};
