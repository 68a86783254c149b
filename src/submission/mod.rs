//! The upload flow's side of compression.
//!
//! A report can carry a few photos. Before the multipart upload is built,
//! every selected file goes through [`prepare_submission`]:
//!
//! 1. The batch size is checked (`max_files`); too many refuses the batch.
//! 2. Each file is validated: supported type, upload cap, name length.
//! 3. Files within the budget are forwarded unchanged.
//! 4. Larger files are compressed on worker tasks.
//! 5. Over-budget results follow the [`ShortfallPolicy`].
//!
//! Failures are per file: a rejected file is reported by name and the rest of
//! the submission goes ahead.

pub mod policy;
pub mod prepare;
pub mod size;

pub use policy::{
    default_concurrency, ShortfallPolicy, SubmissionPolicy, DEFAULT_MAX_FILES,
    DEFAULT_MAX_FILE_NAME_CHARS, DEFAULT_MAX_UPLOAD_BYTES,
};
pub use prepare::{
    compress_on_worker, prepare_submission, PreparedAttachment, PreparedSubmission,
    RejectedAttachment,
};
pub use size::format_file_size;
