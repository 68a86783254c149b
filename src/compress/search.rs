//! Bounded quality search.
//!
//! The search encodes the raster at a trial quality, measures the output, and
//! lowers the quality by a step proportional to the overshoot until one of
//! three hard stops is reached:
//!
//! 1. the output fits the budget,
//! 2. the quality reached the floor,
//! 3. the attempt ceiling was hit.
//!
//! Stops 2 and 3 return the last (over-budget) output as a best-effort result.
//! Both are independent of image content, so the loop always terminates after
//! at most `max_attempts` encodes.
//!
//! | Overshoot            | Step |
//! |----------------------|------|
//! | `> 3 × budget`       | 0.20 |
//! | `> 2 × budget`       | 0.15 |
//! | otherwise            | 0.10 |

use bytes::Bytes;
use serde::Serialize;
use thiserror::Error;
use tracing::{debug, warn};

use crate::cancel::CancelFlag;
use crate::codec::{DecodedRaster, RasterEncoder};
use crate::error::CodecError;
use crate::format::ImageMime;

use super::quality::{Quality, DEFAULT_INITIAL_QUALITY, DEFAULT_QUALITY_FLOOR};

/// Default attempt ceiling.
pub const DEFAULT_MAX_ATTEMPTS: u32 = 10;

/// Step (percent) when the output is more than three times the budget.
const LARGE_STEP: u8 = 20;

/// Step (percent) when the output is more than twice the budget.
const MEDIUM_STEP: u8 = 15;

/// Step (percent) for any smaller overshoot.
const SMALL_STEP: u8 = 10;

// =============================================================================
// Settings & Results
// =============================================================================

/// Bounds of the quality search.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SearchSettings {
    /// Quality of the first attempt
    pub initial_quality: Quality,

    /// Quality the search never goes below
    pub min_quality: Quality,

    /// Maximum number of encode attempts
    pub max_attempts: u32,
}

impl Default for SearchSettings {
    fn default() -> Self {
        Self {
            initial_quality: DEFAULT_INITIAL_QUALITY,
            min_quality: DEFAULT_QUALITY_FLOOR,
            max_attempts: DEFAULT_MAX_ATTEMPTS,
        }
    }
}

/// Why the search stopped.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum Termination {
    /// Output fits the budget
    BudgetMet,

    /// Quality floor reached; output may still exceed the budget
    QualityFloor,

    /// Attempt ceiling reached; output may still exceed the budget
    AttemptCeiling,
}

/// A single trial encode. Only lives for one loop iteration.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CompressionAttempt {
    /// 1-based attempt number
    pub attempt_index: u32,

    /// Quality the raster was encoded at
    pub tried_quality: Quality,

    /// Size of the encoded output in bytes
    pub produced_byte_size: usize,
}

/// Result of a finished search.
#[derive(Debug, Clone)]
pub struct SearchOutcome {
    /// Output of the last attempt
    pub bytes: Bytes,

    /// Quality of the last attempt
    pub quality: Quality,

    /// Number of encodes performed
    pub attempts: u32,

    /// Which hard stop ended the search
    pub termination: Termination,
}

/// Ways a search can fail. Over-budget output is not one of them.
#[derive(Debug, Clone, Error)]
pub enum SearchError {
    /// The encoder rejected the raster or quality
    #[error(transparent)]
    Codec(#[from] CodecError),

    /// The cancel flag was raised
    #[error("quality search cancelled")]
    Cancelled,
}

// =============================================================================
// Search
// =============================================================================

/// Overshoot-proportional step, in percent, for the next attempt.
pub fn quality_step(produced: usize, budget: usize) -> u8 {
    let produced = produced as u64;
    let budget = budget as u64;

    if produced > budget.saturating_mul(3) {
        LARGE_STEP
    } else if produced > budget.saturating_mul(2) {
        MEDIUM_STEP
    } else {
        SMALL_STEP
    }
}

/// Linear descent over the encoder quality.
#[derive(Debug, Clone, Copy, Default)]
pub struct QualitySearch {
    settings: SearchSettings,
}

impl QualitySearch {
    /// Create a search with the given bounds.
    pub fn new(settings: SearchSettings) -> Self {
        Self { settings }
    }

    /// The bounds this search runs with.
    pub fn settings(&self) -> &SearchSettings {
        &self.settings
    }

    /// Encode `raster` as `mime` until it fits `budget` or a hard stop hits.
    ///
    /// `raster` should already be in the colour layout `mime` needs (see
    /// [`DecodedRaster::into_layout_for`]); encoders convert otherwise, once
    /// per attempt.
    ///
    /// # Errors
    ///
    /// - [`SearchError::Codec`] if any attempt fails to encode
    /// - [`SearchError::Cancelled`] if `cancel` is raised before an attempt
    pub fn run<E: RasterEncoder + ?Sized>(
        &self,
        encoder: &E,
        raster: &DecodedRaster,
        mime: ImageMime,
        budget: usize,
        cancel: &CancelFlag,
    ) -> Result<SearchOutcome, SearchError> {
        let floor = self.settings.min_quality;
        let ceiling = self.settings.max_attempts.max(1);

        let mut quality = self.settings.initial_quality.max(floor);
        let mut attempt_index = 1;

        loop {
            if cancel.is_cancelled() {
                return Err(SearchError::Cancelled);
            }

            let bytes = encoder.encode(raster, mime, quality)?;
            let attempt = CompressionAttempt {
                attempt_index,
                tried_quality: quality,
                produced_byte_size: bytes.len(),
            };

            debug!(
                attempt = attempt.attempt_index,
                quality = %attempt.tried_quality,
                size = attempt.produced_byte_size,
                budget,
                "Compression attempt"
            );

            if let Some(termination) = self.termination(&attempt, budget, ceiling) {
                if termination != Termination::BudgetMet {
                    warn!(
                        "Stopped at {:?} after {} attempts: {} bytes, over the {} byte budget",
                        termination, attempt.attempt_index, attempt.produced_byte_size, budget
                    );
                }

                return Ok(SearchOutcome {
                    bytes,
                    quality,
                    attempts: attempt.attempt_index,
                    termination,
                });
            }

            let step = quality_step(attempt.produced_byte_size, budget);
            quality = quality.step_down(step, floor);
            attempt_index += 1;
        }
    }

    fn termination(
        &self,
        attempt: &CompressionAttempt,
        budget: usize,
        ceiling: u32,
    ) -> Option<Termination> {
        if attempt.produced_byte_size <= budget {
            Some(Termination::BudgetMet)
        } else if attempt.tried_quality <= self.settings.min_quality {
            Some(Termination::QualityFloor)
        } else if attempt.attempt_index >= ceiling {
            Some(Termination::AttemptCeiling)
        } else {
            None
        }
    }
}

// =============================================================================
// Tests
// =============================================================================
