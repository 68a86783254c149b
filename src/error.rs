use thiserror::Error;

/// Codec-level failures raised while decoding or encoding a raster.
///
/// These carry no file name; [`crate::compress::ImageCompressor`] maps them to
/// [`CompressionError`] at the orchestration boundary.
#[derive(Debug, Clone, Error)]
pub enum CodecError {
    /// Declared mime type is not one of the supported raster formats
    #[error("Unsupported image type: {mime}")]
    UnsupportedMime { mime: String },

    /// Bytes could not be parsed as the declared format
    #[error("Decode error: {message}")]
    Decode { message: String },

    /// Encoder rejected the raster or the quality parameters
    #[error("Encode error: {message}")]
    Encode { message: String },
}

/// Failure to compress a single file.
///
/// Errors are local to one file: a batch keeps processing its other files
/// when one of them fails.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum CompressionError {
    /// Input bytes are malformed or not a supported raster format
    #[error("Failed to decode {file_name}: {reason}")]
    DecodeFailed { file_name: String, reason: String },

    /// The encoder rejected the resize/quality parameters
    #[error("Failed to encode {file_name}: {reason}")]
    EncodeFailed { file_name: String, reason: String },

    /// Compression was abandoned through a [`crate::CancelFlag`]
    #[error("Compression of {file_name} was cancelled")]
    Cancelled { file_name: String },
}

impl CompressionError {
    /// Name of the file this error refers to.
    pub fn file_name(&self) -> &str {
        match self {
            CompressionError::DecodeFailed { file_name, .. }
            | CompressionError::EncodeFailed { file_name, .. }
            | CompressionError::Cancelled { file_name } => file_name,
        }
    }

    /// Short machine-readable tag for summaries.
    pub const fn kind(&self) -> &'static str {
        match self {
            CompressionError::DecodeFailed { .. } => "decode_failed",
            CompressionError::EncodeFailed { .. } => "encode_failed",
            CompressionError::Cancelled { .. } => "cancelled",
        }
    }
}

/// Reasons an attachment is excluded from a submission.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum AttachmentError {
    /// Mime type outside the allow-list
    #[error("Unsupported image type {mime} for {file_name}; use JPG, PNG, GIF or WEBP")]
    UnsupportedType { file_name: String, mime: String },

    /// Raw size exceeds the upload hard cap, checked before compression
    #[error("{file_name} is {size} bytes, larger than the {limit} byte upload limit")]
    TooLarge {
        file_name: String,
        size: usize,
        limit: usize,
    },

    /// File name longer than the allowed number of characters
    #[error("File name {file_name} is longer than {limit} characters")]
    NameTooLong { file_name: String, limit: usize },

    /// Batch holds more attachments than allowed; refuses the whole batch
    #[error("At most {limit} images can be attached, got {count}")]
    TooManyFiles { count: usize, limit: usize },

    /// Best-effort result still exceeds the budget and the policy rejects it
    #[error("{file_name} is still {size} bytes after compression, over the {budget} byte budget")]
    OverBudget {
        file_name: String,
        size: usize,
        budget: usize,
    },

    /// Compression itself failed
    #[error(transparent)]
    Compression(#[from] CompressionError),
}

impl AttachmentError {
    /// Short machine-readable tag for summaries.
    pub const fn kind(&self) -> &'static str {
        match self {
            AttachmentError::UnsupportedType { .. } => "unsupported_type",
            AttachmentError::TooLarge { .. } => "too_large",
            AttachmentError::NameTooLong { .. } => "name_too_long",
            AttachmentError::TooManyFiles { .. } => "too_many_files",
            AttachmentError::OverBudget { .. } => "over_budget",
            AttachmentError::Compression(e) => e.kind(),
        }
    }
}
