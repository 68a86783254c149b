//! Submission flow integration tests.
//!
//! Tests verify:
//! - A corrupt file is rejected while its siblings are prepared
//! - Validation rules run before any compression work
//! - The shortfall policy decides over-budget results
//! - Prepared files are written to disk with the right extension

use std::sync::Arc;

use evidence_shrink::{
    prepare_submission, AttachmentError, CancelFlag, CompressionSettings, ImageCompressor,
    ImageMime, ShortfallPolicy, SourceImage, SubmissionPolicy,
};

use super::test_utils::{encode_jpeg, encode_png, gradient_rgb, is_jpeg, noise_rgb};

const KB: usize = 1024;

fn compressor(budget: usize) -> Arc<ImageCompressor> {
    Arc::new(ImageCompressor::new(CompressionSettings {
        budget_bytes: budget,
        ..CompressionSettings::default()
    }))
}

fn policy() -> SubmissionPolicy {
    SubmissionPolicy {
        max_concurrency: 2,
        ..SubmissionPolicy::default()
    }
}

// =============================================================================
// Failure Isolation
// =============================================================================

#[tokio::test]
async fn test_corrupt_sibling_is_rejected_alone() {
    let budget = 40 * KB;
    let photo = encode_jpeg(&noise_rgb(480, 360, 11), 100);
    let diagram = encode_png(&gradient_rgb(32, 32));
    assert!(photo.len() > budget);

    let sources = vec![
        SourceImage::new(photo, "image/jpeg", "front.jpg"),
        SourceImage::new(vec![0x42u8; 64 * KB], "image/jpeg", "corrupt.jpg"),
        SourceImage::new(diagram.clone(), "image/png", "diagram.png"),
    ];

    let prepared = prepare_submission(compressor(budget), sources, &policy(), &CancelFlag::new())
        .await
        .unwrap();

    assert_eq!(prepared.ready.len(), 2);
    assert_eq!(prepared.ready[0].file_name, "front.jpg");
    assert!(!prepared.ready[0].is_unchanged());
    assert!(is_jpeg(&prepared.ready[0].bytes));
    assert_eq!(prepared.ready[1].file_name, "diagram.png");
    assert_eq!(prepared.ready[1].bytes.as_ref(), diagram.as_slice());

    assert_eq!(prepared.rejected.len(), 1);
    assert_eq!(prepared.rejected[0].file_name, "corrupt.jpg");
    assert_eq!(prepared.rejected[0].kind, "decode_failed");
}

// =============================================================================
// Validation
// =============================================================================

#[tokio::test]
async fn test_too_many_files_refuses_batch() {
    let sources = (0..4)
        .map(|i| SourceImage::new(encode_png(&gradient_rgb(8, 8)), "image/png", format!("{i}.png")))
        .collect();

    let err = prepare_submission(compressor(500 * KB), sources, &policy(), &CancelFlag::new())
        .await
        .unwrap_err();

    assert_eq!(err, AttachmentError::TooManyFiles { count: 4, limit: 3 });
}

#[tokio::test]
async fn test_validation_rejections() {
    let limits = SubmissionPolicy {
        max_upload_bytes: 2 * KB,
        ..policy()
    };
    let sources = vec![
        SourceImage::new(vec![0u8; 100], "image/bmp", "scan.bmp"),
        SourceImage::new(vec![0u8; 3 * KB], "image/jpeg", "huge.jpg"),
        SourceImage::new(vec![0u8; 100], "image/jpeg", format!("{}.jpg", "n".repeat(120))),
    ];

    let prepared = prepare_submission(compressor(KB), sources, &limits, &CancelFlag::new())
        .await
        .unwrap();

    assert!(prepared.ready.is_empty());
    let kinds: Vec<_> = prepared.rejected.iter().map(|r| r.kind).collect();
    assert_eq!(kinds, vec!["unsupported_type", "too_large", "name_too_long"]);
}

// =============================================================================
// Shortfall Policy
// =============================================================================

#[tokio::test]
async fn test_shortfall_accepted_by_default() {
    let photo = encode_jpeg(&noise_rgb(200, 200, 12), 95);
    let sources = vec![SourceImage::new(photo, "image/jpeg", "noise.jpg")];

    let prepared = prepare_submission(compressor(128), sources, &policy(), &CancelFlag::new())
        .await
        .unwrap();

    assert_eq!(prepared.ready.len(), 1);
    assert!(prepared.ready[0].byte_size > 128);
    assert!(prepared.ready[0].compressed.is_some());
}

#[tokio::test]
async fn test_shortfall_rejected_when_configured() {
    let photo = encode_jpeg(&noise_rgb(200, 200, 12), 95);
    let sources = vec![SourceImage::new(photo, "image/jpeg", "noise.jpg")];
    let strict = SubmissionPolicy {
        shortfall: ShortfallPolicy::Reject,
        ..policy()
    };

    let prepared = prepare_submission(compressor(128), sources, &strict, &CancelFlag::new())
        .await
        .unwrap();

    assert!(prepared.ready.is_empty());
    assert_eq!(prepared.rejected[0].kind, "over_budget");
}

// =============================================================================
// Cancellation
// =============================================================================

#[tokio::test]
async fn test_cancelled_submission_skips_compression_only() {
    let cancel = CancelFlag::new();
    cancel.cancel();

    let small = encode_png(&gradient_rgb(16, 16));
    let sources = vec![
        SourceImage::new(encode_jpeg(&noise_rgb(200, 200, 13), 95), "image/jpeg", "big.jpg"),
        SourceImage::new(small, "image/png", "small.png"),
    ];

    let prepared = prepare_submission(compressor(4 * KB), sources, &policy(), &cancel)
        .await
        .unwrap();

    assert_eq!(prepared.ready.len(), 1);
    assert_eq!(prepared.ready[0].file_name, "small.png");
    assert_eq!(prepared.rejected[0].kind, "cancelled");
}

// =============================================================================
// Output
// =============================================================================

#[tokio::test]
async fn test_written_png_becomes_jpg() {
    let budget = 20 * KB;
    let png = encode_png(&noise_rgb(160, 120, 14));
    assert!(png.len() > budget);

    let prepared = prepare_submission(
        compressor(budget),
        vec![SourceImage::new(png, "image/png", "board.png")],
        &policy(),
        &CancelFlag::new(),
    )
    .await
    .unwrap();

    assert_eq!(prepared.ready[0].mime_type, ImageMime::Jpeg);

    let dir = tempfile::tempdir().unwrap();
    let written = prepared.write_to_dir(dir.path()).unwrap();

    assert_eq!(written, vec![dir.path().join("board.jpg")]);
    assert!(is_jpeg(&std::fs::read(&written[0]).unwrap()));
}

#[tokio::test]
async fn test_summary_json() {
    let prepared = prepare_submission(
        compressor(500 * KB),
        vec![SourceImage::new(encode_png(&gradient_rgb(8, 8)), "image/png", "tiny.png")],
        &policy(),
        &CancelFlag::new(),
    )
    .await
    .unwrap();

    let json = serde_json::to_value(&prepared).unwrap();
    assert_eq!(json["ready"][0]["file_name"], "tiny.png");
    assert_eq!(json["ready"][0]["mime_type"], "image/png");
    assert!(json["ready"][0]["compressed"].is_null());
    assert!(json["ready"][0].get("bytes").is_none());
}
