//! Preparing a submission's attachments for upload.
//!
//! Each attachment is an independent unit of work. Files at or under the
//! budget are forwarded unchanged without being decoded; larger files are
//! compressed on tokio's blocking pool, one task per file, bounded by the
//! policy's concurrency. All tasks are joined, in input order, before the
//! payload is returned. A failing file never affects its siblings.

use std::collections::HashSet;
use std::path::{Path, PathBuf};
use std::sync::Arc;

use bytes::Bytes;
use serde::Serialize;
use tokio::sync::Semaphore;
use tokio::task::JoinHandle;
use tracing::{info, warn};

use crate::cancel::CancelFlag;
use crate::codec::RasterEncoder;
use crate::compress::{CompressedImage, CompressionReport, ImageCompressor, SourceImage};
use crate::error::{AttachmentError, CompressionError};
use crate::format::ImageMime;

use super::policy::{ShortfallPolicy, SubmissionPolicy};
use super::size::format_file_size;

// =============================================================================
// Results
// =============================================================================

/// An attachment ready for the multipart upload.
#[derive(Debug, Clone, Serialize)]
pub struct PreparedAttachment {
    /// Original file name
    pub file_name: String,

    /// Mime type of `bytes`
    pub mime_type: ImageMime,

    /// Payload
    #[serde(skip)]
    pub bytes: Bytes,

    /// Size of the payload
    pub byte_size: usize,

    /// Size of the file as selected
    pub original_byte_size: usize,

    /// Present when the file went through compression
    pub compressed: Option<CompressionReport>,
}

impl PreparedAttachment {
    fn unchanged(source: SourceImage, mime_type: ImageMime) -> Self {
        Self {
            file_name: source.file_name().to_string(),
            mime_type,
            byte_size: source.byte_size(),
            original_byte_size: source.byte_size(),
            bytes: source.bytes().clone(),
            compressed: None,
        }
    }

    fn compressed(image: CompressedImage) -> Self {
        Self {
            byte_size: image.byte_size(),
            original_byte_size: image.report.original_byte_size,
            file_name: image.file_name,
            mime_type: image.mime_type,
            bytes: image.bytes,
            compressed: Some(image.report),
        }
    }

    /// True when the payload is the selected file, byte for byte.
    pub fn is_unchanged(&self) -> bool {
        self.compressed.is_none()
    }
}

/// An attachment excluded from the submission.
#[derive(Debug, Clone, Serialize)]
pub struct RejectedAttachment {
    /// Original file name
    pub file_name: String,

    /// Machine-readable reason, e.g. `decode_failed`
    pub kind: &'static str,

    /// Human-readable reason
    pub message: String,

    /// The underlying error
    #[serde(skip)]
    pub error: AttachmentError,
}

impl RejectedAttachment {
    fn new(file_name: String, error: AttachmentError) -> Self {
        Self {
            file_name,
            kind: error.kind(),
            message: error.to_string(),
            error,
        }
    }
}

/// Outcome of preparing every attachment of one submission.
#[derive(Debug, Clone, Default, Serialize)]
pub struct PreparedSubmission {
    /// Attachments to upload, in input order
    pub ready: Vec<PreparedAttachment>,

    /// Attachments left out, in input order
    pub rejected: Vec<RejectedAttachment>,
}

impl PreparedSubmission {
    /// Total payload size of the ready attachments.
    pub fn total_bytes(&self) -> usize {
        self.ready.iter().map(|a| a.byte_size).sum()
    }

    /// Write every ready attachment into `dir` under its file name.
    ///
    /// Only the final path component of a file name is used, so names cannot
    /// escape `dir`. A PNG re-encoded as JPEG is written with a `.jpg`
    /// extension. When two attachments end up with the same name, later
    /// ones get a `-2`, `-3`, ... suffix before the extension; names are
    /// compared case-insensitively. Returns the written paths in order.
    pub fn write_to_dir(&self, dir: &Path) -> std::io::Result<Vec<PathBuf>> {
        std::fs::create_dir_all(dir)?;

        let mut taken = HashSet::with_capacity(self.ready.len());
        let mut written = Vec::with_capacity(self.ready.len());
        for (index, attachment) in self.ready.iter().enumerate() {
            let name = Path::new(&attachment.file_name)
                .file_name()
                .map(|n| n.to_os_string())
                .unwrap_or_else(|| format!("attachment-{}", index + 1).into());

            let mut path = dir.join(name);
            if ImageMime::from_path(&path) != Some(attachment.mime_type) {
                path.set_extension(attachment.mime_type.extension());
            }

            let path = unique_path(path, &mut taken);
            std::fs::write(&path, &attachment.bytes)?;
            written.push(path);
        }

        Ok(written)
    }
}

/// Claim `path`, or the first free `stem-N.ext` variant of it.
fn unique_path(path: PathBuf, taken: &mut HashSet<String>) -> PathBuf {
    let key = |p: &Path| p.to_string_lossy().to_lowercase();

    if taken.insert(key(&path)) {
        return path;
    }

    let stem = path
        .file_stem()
        .map(|s| s.to_string_lossy().into_owned())
        .unwrap_or_default();
    let extension = path
        .extension()
        .map(|e| e.to_string_lossy().into_owned());

    let mut suffix = 2;
    loop {
        let name = match &extension {
            Some(ext) => format!("{stem}-{suffix}.{ext}"),
            None => format!("{stem}-{suffix}"),
        };
        let candidate = path.with_file_name(name);
        if taken.insert(key(&candidate)) {
            return candidate;
        }
        suffix += 1;
    }
}

// =============================================================================
// Preparation
// =============================================================================

enum Slot {
    Done(Result<PreparedAttachment, AttachmentError>),
    Pending(JoinHandle<Result<CompressedImage, CompressionError>>),
}

/// Validate, bypass or compress every attachment of a submission.
///
/// The budget is the compressor's [`budget_bytes`]: files at or under it are
/// forwarded unchanged.
///
/// # Errors
///
/// Returns [`AttachmentError::TooManyFiles`] when the batch exceeds
/// `policy.max_files`; nothing is processed in that case. Every other failure
/// is reported per file in [`PreparedSubmission::rejected`].
///
/// [`budget_bytes`]: crate::compress::CompressionSettings::budget_bytes
pub async fn prepare_submission<E>(
    compressor: Arc<ImageCompressor<E>>,
    sources: Vec<SourceImage>,
    policy: &SubmissionPolicy,
    cancel: &CancelFlag,
) -> Result<PreparedSubmission, AttachmentError>
where
    E: RasterEncoder + 'static,
{
    policy.validate_batch(sources.len())?;

    let budget = compressor.settings().budget_bytes;
    let permits = Arc::new(Semaphore::new(policy.max_concurrency.max(1)));

    let mut slots = Vec::with_capacity(sources.len());
    for source in sources {
        let file_name = source.file_name().to_string();

        let slot = match policy.validate_attachment(&source) {
            Err(e) => Slot::Done(Err(e)),
            Ok(mime) if source.byte_size() <= budget => {
                Slot::Done(Ok(PreparedAttachment::unchanged(source, mime)))
            }
            Ok(_) => {
                let compressor = Arc::clone(&compressor);
                let permits = Arc::clone(&permits);
                let cancel = cancel.clone();

                Slot::Pending(tokio::spawn(async move {
                    // The semaphore is never closed, so acquiring cannot fail
                    let _permit = permits.acquire_owned().await.ok();
                    compress_on_worker(compressor, source, budget, cancel).await
                }))
            }
        };

        slots.push((file_name, slot));
    }

    let mut prepared = PreparedSubmission::default();
    for (file_name, slot) in slots {
        let result = match slot {
            Slot::Done(result) => result,
            Slot::Pending(handle) => {
                let compressed = match handle.await {
                    Ok(result) => result,
                    Err(e) => Err(worker_failed(&file_name, &e.to_string())),
                };
                compressed
                    .map_err(AttachmentError::from)
                    .and_then(|image| apply_shortfall_policy(image, policy.shortfall))
            }
        };

        match result {
            Ok(attachment) => prepared.ready.push(attachment),
            Err(e) => {
                warn!("Skipping {}: {}", file_name, e);
                prepared.rejected.push(RejectedAttachment::new(file_name, e));
            }
        }
    }

    info!(
        "Prepared {} attachment(s), {} rejected, {} total",
        prepared.ready.len(),
        prepared.rejected.len(),
        format_file_size(prepared.total_bytes() as u64)
    );

    Ok(prepared)
}

/// Run one compression on tokio's blocking pool.
///
/// The call is CPU-bound; this keeps it off the async worker threads.
pub async fn compress_on_worker<E>(
    compressor: Arc<ImageCompressor<E>>,
    source: SourceImage,
    budget: usize,
    cancel: CancelFlag,
) -> Result<CompressedImage, CompressionError>
where
    E: RasterEncoder + 'static,
{
    let file_name = source.file_name().to_string();

    tokio::task::spawn_blocking(move || compressor.compress_with_cancel(&source, budget, &cancel))
        .await
        .map_err(|e| worker_failed(&file_name, &e.to_string()))?
}

fn apply_shortfall_policy(
    image: CompressedImage,
    policy: ShortfallPolicy,
) -> Result<PreparedAttachment, AttachmentError> {
    if image.is_shortfall() {
        if policy == ShortfallPolicy::Reject {
            return Err(AttachmentError::OverBudget {
                size: image.byte_size(),
                budget: image.report.budget_bytes,
                file_name: image.file_name,
            });
        }

        warn!(
            "{} is still {} after compression (budget {}), attaching anyway",
            image.file_name,
            format_file_size(image.byte_size() as u64),
            format_file_size(image.report.budget_bytes as u64)
        );
    }

    Ok(PreparedAttachment::compressed(image))
}

fn worker_failed(file_name: &str, reason: &str) -> CompressionError {
    CompressionError::EncodeFailed {
        file_name: file_name.to_string(),
        reason: format!("worker task failed: {reason}"),
    }
}

// =============================================================================
// Tests
// =============================================================================
