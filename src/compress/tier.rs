//! Size tiers that pick an up-front dimension cap.
//!
//! Heavier files are downscaled more aggressively before the quality search
//! starts, so the search begins close to the budget instead of burning
//! attempts on a pixel count that could never fit.

/// One mebibyte.
pub const MIB: u64 = 1024 * 1024;

/// A `(threshold, cap)` pair: files strictly larger than `threshold_bytes` get
/// their longer side capped at `max_dimension` pixels.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Tier {
    /// Original file size the tier applies above, in bytes
    pub threshold_bytes: u64,

    /// Cap on the longer side, in pixels
    pub max_dimension: u32,
}

impl Tier {
    /// Whether a file of `byte_size` bytes falls into this tier.
    ///
    /// The catch-all tier (threshold 0) admits every size, including 0.
    pub const fn admits(&self, byte_size: u64) -> bool {
        self.threshold_bytes == 0 || byte_size > self.threshold_bytes
    }
}

/// The tier table, largest threshold first, ending in the catch-all.
pub const TIERS: [Tier; 4] = [
    Tier {
        threshold_bytes: 10 * MIB,
        max_dimension: 800,
    },
    Tier {
        threshold_bytes: 5 * MIB,
        max_dimension: 1200,
    },
    Tier {
        threshold_bytes: 2 * MIB,
        max_dimension: 1600,
    },
    Tier {
        threshold_bytes: 0,
        max_dimension: 1920,
    },
];

/// Pick the tier for an original file size.
pub fn select_tier(byte_size: u64) -> &'static Tier {
    let catch_all = &TIERS[TIERS.len() - 1];
    TIERS
        .iter()
        .find(|tier| tier.admits(byte_size))
        .unwrap_or(catch_all)
}

/// Longer-side pixel cap for an original file size.
pub fn max_dimension_for(byte_size: u64) -> u32 {
    select_tier(byte_size).max_dimension
}
