//! Encoder quality levels.
//!
//! Quality is conceptually a scalar in `0.0..=1.0`. It is stored as an integer
//! percentage so the search descends in exact steps (0.9, 0.7, 0.5, ...)
//! instead of accumulating floating-point drift, and so it maps directly onto
//! the 1-100 quality parameter the JPEG and WebP encoders take.

use std::fmt;

use serde::Serialize;

/// Lowest representable quality (1%).
pub const MIN_QUALITY_PERCENT: u8 = 1;

/// Highest representable quality (100%).
pub const MAX_QUALITY_PERCENT: u8 = 100;

/// An encoder quality level, 1-100 percent.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize)]
#[serde(into = "f32")]
pub struct Quality(u8);

/// Quality the search starts from (0.9).
pub const DEFAULT_INITIAL_QUALITY: Quality = Quality(90);

/// Quality floor the search never goes below (0.1).
pub const DEFAULT_QUALITY_FLOOR: Quality = Quality(10);

impl Quality {
    /// Build from a percentage, clamped to 1-100.
    pub const fn from_percent(percent: u8) -> Self {
        if percent < MIN_QUALITY_PERCENT {
            Quality(MIN_QUALITY_PERCENT)
        } else if percent > MAX_QUALITY_PERCENT {
            Quality(MAX_QUALITY_PERCENT)
        } else {
            Quality(percent)
        }
    }

    /// Build from the `0.0..=1.0` scale, rounding to the nearest percent.
    ///
    /// Returns `None` for NaN or values outside `(0.0, 1.0]`.
    pub fn from_fraction(fraction: f32) -> Option<Self> {
        if !(fraction > 0.0 && fraction <= 1.0) {
            return None;
        }
        let percent = (fraction * 100.0).round() as u8;
        Some(Self::from_percent(percent))
    }

    /// Quality as a percentage.
    pub const fn percent(&self) -> u8 {
        self.0
    }

    /// Quality on the `0.0..=1.0` scale.
    pub fn as_fraction(&self) -> f32 {
        f32::from(self.0) / 100.0
    }

    /// Lower the quality by `step` percent, never going below `floor`.
    pub fn step_down(self, step: u8, floor: Quality) -> Quality {
        Quality(self.0.saturating_sub(step)).max(floor)
    }
}

impl Default for Quality {
    fn default() -> Self {
        DEFAULT_INITIAL_QUALITY
    }
}

impl From<Quality> for f32 {
    fn from(quality: Quality) -> Self {
        quality.as_fraction()
    }
}

impl fmt::Display for Quality {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{:.2}", self.as_fraction())
    }
}
