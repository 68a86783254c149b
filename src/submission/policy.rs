//! Attachment rules enforced before any compression work starts.

use crate::compress::SourceImage;
use crate::error::AttachmentError;
use crate::format::ImageMime;

/// Default upload hard cap on a raw attachment (5 MiB).
pub const DEFAULT_MAX_UPLOAD_BYTES: usize = 5 * 1024 * 1024;

/// Default maximum number of attachments per submission.
pub const DEFAULT_MAX_FILES: usize = 3;

/// Default maximum file name length, in characters.
pub const DEFAULT_MAX_FILE_NAME_CHARS: usize = 100;

/// What to do with a best-effort result that is still over budget.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum ShortfallPolicy {
    /// Attach it anyway and let the upload endpoint decide
    #[default]
    Accept,

    /// Exclude it from the submission with [`AttachmentError::OverBudget`]
    Reject,
}

/// Limits applied to a submission's attachments.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SubmissionPolicy {
    /// Raw size above which a file is refused outright
    pub max_upload_bytes: usize,

    /// Attachments allowed per submission
    pub max_files: usize,

    /// Longest accepted file name, in characters
    pub max_file_name_chars: usize,

    /// Handling of over-budget results
    pub shortfall: ShortfallPolicy,

    /// Files compressed at the same time
    pub max_concurrency: usize,
}

impl Default for SubmissionPolicy {
    fn default() -> Self {
        Self {
            max_upload_bytes: DEFAULT_MAX_UPLOAD_BYTES,
            max_files: DEFAULT_MAX_FILES,
            max_file_name_chars: DEFAULT_MAX_FILE_NAME_CHARS,
            shortfall: ShortfallPolicy::default(),
            max_concurrency: default_concurrency(),
        }
    }
}

/// Number of worker tasks to run by default: one per available core.
pub fn default_concurrency() -> usize {
    std::thread::available_parallelism()
        .map(|n| n.get())
        .unwrap_or(1)
}

impl SubmissionPolicy {
    /// Refuse the whole batch when it holds too many attachments.
    pub fn validate_batch(&self, count: usize) -> Result<(), AttachmentError> {
        if count > self.max_files {
            return Err(AttachmentError::TooManyFiles {
                count,
                limit: self.max_files,
            });
        }
        Ok(())
    }

    /// Check one attachment and return its parsed mime type.
    ///
    /// Rules, in order: supported mime type, raw size within the upload cap,
    /// file name length.
    pub fn validate_attachment(&self, source: &SourceImage) -> Result<ImageMime, AttachmentError> {
        let mime = ImageMime::parse(source.mime_type()).ok_or_else(|| {
            AttachmentError::UnsupportedType {
                file_name: source.file_name().to_string(),
                mime: source.mime_type().to_string(),
            }
        })?;

        if source.byte_size() > self.max_upload_bytes {
            return Err(AttachmentError::TooLarge {
                file_name: source.file_name().to_string(),
                size: source.byte_size(),
                limit: self.max_upload_bytes,
            });
        }

        if source.file_name().chars().count() > self.max_file_name_chars {
            return Err(AttachmentError::NameTooLong {
                file_name: source.file_name().to_string(),
                limit: self.max_file_name_chars,
            });
        }

        Ok(mime)
    }
}
