//! Adaptive re-encoding pipeline.
//!
//! This module turns an arbitrary user-supplied image into one that fits a
//! byte budget:
//!
//! - [`tier`] - Picks a longer-side cap from the original file size
//! - [`resize`] - Proportional downscale to that cap
//! - [`search`] - Bounded quality descent over the encoder
//! - [`service`] - [`ImageCompressor`], which composes the stages
//!
//! # Design Decisions
//!
//! - **Byte size is the only metric**: no perceptual quality model, the
//!   search optimizes output size and keeps the highest quality that fits.
//!
//! - **Best effort**: the search gives up at the quality floor or the attempt
//!   ceiling and returns what it has; callers decide what to do with an
//!   over-budget result.
//!
//! - **One output format per input**: PNG becomes JPEG, everything else keeps
//!   its own codec.

pub mod quality;
pub mod resize;
pub mod search;
pub mod service;
pub mod tier;

pub use quality::{Quality, DEFAULT_INITIAL_QUALITY, DEFAULT_QUALITY_FLOOR};
pub use resize::{resize_to_fit, target_dimensions};
pub use search::{
    quality_step, CompressionAttempt, QualitySearch, SearchError, SearchOutcome, SearchSettings,
    Termination, DEFAULT_MAX_ATTEMPTS,
};
pub use service::{
    compress, CompressedImage, CompressionReport, CompressionSettings, ImageCompressor,
    SourceImage, DEFAULT_BUDGET_BYTES,
};
pub use tier::{max_dimension_for, select_tier, Tier, MIB, TIERS};
