//! Configuration management for evidence-shrink.
//!
//! This module provides the command-line configuration, which supports:
//! - Command-line arguments via clap
//! - Environment variables with `SHRINK_` prefix
//! - Defaults matching the upload portal's limits
//!
//! # Example
//!
//! ```ignore
//! use evidence_shrink::config::Config;
//!
//! let config = Config::parse();
//! let settings = config.compression_settings();
//! println!("Budget: {} bytes", settings.budget_bytes);
//! ```
//!
//! # Environment Variables
//!
//! - `SHRINK_OUTPUT_DIR` - Where compressed files are written (default: compressed)
//! - `SHRINK_BUDGET_KB` - Byte budget per image in KiB (default: 500)
//! - `SHRINK_INITIAL_QUALITY` - First quality tried, percent (default: 90)
//! - `SHRINK_MIN_QUALITY` - Quality floor, percent (default: 10)
//! - `SHRINK_MAX_ATTEMPTS` - Encode attempts per image (default: 10)
//! - `SHRINK_MAX_UPLOAD_MB` - Upload hard cap per raw file in MiB (default: 5)
//! - `SHRINK_MAX_FILES` - Attachments per submission (default: 3)
//! - `SHRINK_REJECT_SHORTFALL` - Drop files still over budget (default: false)
//! - `SHRINK_CONCURRENCY` - Files compressed at once (default: CPU count)

use std::path::PathBuf;

use clap::Parser;

use crate::compress::{
    CompressionSettings, Quality, SearchSettings, DEFAULT_BUDGET_BYTES, DEFAULT_INITIAL_QUALITY,
    DEFAULT_MAX_ATTEMPTS, DEFAULT_QUALITY_FLOOR,
};
use crate::submission::{
    default_concurrency, ShortfallPolicy, SubmissionPolicy, DEFAULT_MAX_FILES,
    DEFAULT_MAX_FILE_NAME_CHARS, DEFAULT_MAX_UPLOAD_BYTES,
};

// =============================================================================
// Default Values
// =============================================================================

/// Default output directory.
pub const DEFAULT_OUTPUT_DIR: &str = "compressed";

/// Default budget in KiB.
pub const DEFAULT_BUDGET_KB: usize = DEFAULT_BUDGET_BYTES / 1024;

/// Default upload cap in MiB.
pub const DEFAULT_MAX_UPLOAD_MB: usize = DEFAULT_MAX_UPLOAD_BYTES / (1024 * 1024);

// =============================================================================
// CLI Arguments
// =============================================================================

/// evidence-shrink - Fit report photos into an upload byte budget.
///
/// Downscales and re-encodes JPEG, PNG, GIF and WEBP images until each one
/// fits the budget, the quality floor is reached, or the attempt limit runs
/// out. PNG input is re-encoded as JPEG.
#[derive(Parser, Debug, Clone)]
#[command(name = "evidence-shrink")]
#[command(author, version, about, long_about = None)]
pub struct Config {
    /// Image files to prepare for upload.
    #[arg(required = true)]
    pub files: Vec<PathBuf>,

    /// Directory the prepared files are written to.
    #[arg(short, long, default_value = DEFAULT_OUTPUT_DIR, env = "SHRINK_OUTPUT_DIR")]
    pub output_dir: PathBuf,

    // =========================================================================
    // Compression Configuration
    // =========================================================================
    /// Byte budget per image, in KiB. Files at or under it are copied as-is.
    #[arg(short, long, default_value_t = DEFAULT_BUDGET_KB, env = "SHRINK_BUDGET_KB")]
    pub budget_kb: usize,

    /// Quality of the first encode attempt (1-100).
    #[arg(
        long,
        default_value_t = DEFAULT_INITIAL_QUALITY.percent(),
        env = "SHRINK_INITIAL_QUALITY"
    )]
    pub initial_quality: u8,

    /// Quality floor the search never goes below (1-100).
    #[arg(long, default_value_t = DEFAULT_QUALITY_FLOOR.percent(), env = "SHRINK_MIN_QUALITY")]
    pub min_quality: u8,

    /// Maximum encode attempts per image.
    #[arg(long, default_value_t = DEFAULT_MAX_ATTEMPTS, env = "SHRINK_MAX_ATTEMPTS")]
    pub max_attempts: u32,

    // =========================================================================
    // Submission Configuration
    // =========================================================================
    /// Raw files larger than this many MiB are refused before compression.
    #[arg(long, default_value_t = DEFAULT_MAX_UPLOAD_MB, env = "SHRINK_MAX_UPLOAD_MB")]
    pub max_upload_mb: usize,

    /// Maximum number of files per submission.
    #[arg(long, default_value_t = DEFAULT_MAX_FILES, env = "SHRINK_MAX_FILES")]
    pub max_files: usize,

    /// Drop files that are still over budget after compression.
    ///
    /// By default they are kept and the upload endpoint decides.
    #[arg(long, default_value_t = false, env = "SHRINK_REJECT_SHORTFALL")]
    pub reject_shortfall: bool,

    /// Number of files compressed at the same time.
    ///
    /// Defaults to the number of available CPU cores.
    #[arg(long, env = "SHRINK_CONCURRENCY")]
    pub concurrency: Option<usize>,

    // =========================================================================
    // Output Configuration
    // =========================================================================
    /// Print a JSON summary of the prepared submission to stdout.
    #[arg(long, default_value_t = false)]
    pub json: bool,

    /// Enable verbose logging (debug level, shows every attempt).
    #[arg(short, long, default_value_t = false)]
    pub verbose: bool,
}

impl Config {
    /// Validate the configuration and return an error message if invalid.
    pub fn validate(&self) -> Result<(), String> {
        if self.files.is_empty() {
            return Err("At least one image file is required".to_string());
        }

        if self.budget_kb == 0 {
            return Err("budget_kb must be greater than 0".to_string());
        }

        if self.initial_quality == 0 || self.initial_quality > 100 {
            return Err("initial_quality must be between 1 and 100".to_string());
        }
        if self.min_quality == 0 || self.min_quality > 100 {
            return Err("min_quality must be between 1 and 100".to_string());
        }
        if self.min_quality > self.initial_quality {
            return Err("min_quality must not exceed initial_quality".to_string());
        }

        if self.max_attempts == 0 {
            return Err("max_attempts must be greater than 0".to_string());
        }

        if self.max_upload_mb == 0 {
            return Err("max_upload_mb must be greater than 0".to_string());
        }
        if self.max_files == 0 {
            return Err("max_files must be greater than 0".to_string());
        }
        if self.concurrency == Some(0) {
            return Err("concurrency must be greater than 0".to_string());
        }

        Ok(())
    }

    /// Budget in bytes.
    pub fn budget_bytes(&self) -> usize {
        self.budget_kb.saturating_mul(1024)
    }

    /// Settings for the compressor.
    pub fn compression_settings(&self) -> CompressionSettings {
        CompressionSettings {
            budget_bytes: self.budget_bytes(),
            search: SearchSettings {
                initial_quality: Quality::from_percent(self.initial_quality),
                min_quality: Quality::from_percent(self.min_quality),
                max_attempts: self.max_attempts,
            },
        }
    }

    /// Limits for the submission flow.
    pub fn submission_policy(&self) -> SubmissionPolicy {
        SubmissionPolicy {
            max_upload_bytes: self.max_upload_mb.saturating_mul(1024 * 1024),
            max_files: self.max_files,
            max_file_name_chars: DEFAULT_MAX_FILE_NAME_CHARS,
            shortfall: if self.reject_shortfall {
                ShortfallPolicy::Reject
            } else {
                ShortfallPolicy::Accept
            },
            max_concurrency: self.concurrency.unwrap_or_else(default_concurrency),
        }
    }
}

// =============================================================================
// Tests
// =============================================================================
