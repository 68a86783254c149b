//! Orchestrator integration tests.
//!
//! Tests verify:
//! - Tier caps and proportional resizing for large photos
//! - The quality search converges or stops within its bounds
//! - Files within the budget still go through every stage
//! - Corrupt and unsupported input fails with DecodeFailed

use image::ImageFormat;

use evidence_shrink::{
    compress, select_tier, target_dimensions, CancelFlag, CompressionError, CompressionSettings,
    ImageCompressor, ImageMime, Quality, SourceImage, Termination, DEFAULT_BUDGET_BYTES,
};

use super::test_utils::{
    decoded_dimensions, encode_gif, encode_jpeg, encode_png, encode_webp, gradient_rgb, is_jpeg,
    noise_rgb, noise_rgba, RecordingEncoder,
};

const KB: usize = 1024;
const MIB: u64 = 1024 * 1024;

fn compressor(budget: usize) -> ImageCompressor {
    ImageCompressor::new(CompressionSettings {
        budget_bytes: budget,
        ..CompressionSettings::default()
    })
}

// =============================================================================
// Tier And Resize
// =============================================================================

#[test]
fn test_large_phone_photo_plan() {
    // An 8 MB, 6000x4000 camera JPEG is capped at 1200 px
    let tier = select_tier(8 * MIB);
    assert_eq!(tier.max_dimension, 1200);
    assert_eq!(target_dimensions(6000, 4000, tier.max_dimension), (1200, 800));
}

#[test]
fn test_file_over_five_megabytes_is_capped_at_1200() {
    // Incompressible 2400x1000 PNG lands between 5 MiB and 10 MiB
    let png = encode_png(&noise_rgb(2400, 1000, 21));
    assert!(png.len() as u64 > 5 * MIB && (png.len() as u64) <= 10 * MIB);

    let recorder = RecordingEncoder::new(10);
    let compressor =
        ImageCompressor::with_encoder(CompressionSettings::default(), recorder.clone());
    let source = SourceImage::new(png, "image/png", "site.png");

    let result = compressor.compress(&source, DEFAULT_BUDGET_BYTES).unwrap();

    let calls = recorder.calls();
    assert_eq!(calls.len(), 1);
    assert_eq!(calls[0].dimensions, (1200, 500));
    assert_eq!(calls[0].mime, ImageMime::Jpeg);
    assert_eq!((result.report.width, result.report.height), (1200, 500));
    assert_eq!(result.report.attempts, 1);
    assert_eq!(result.report.quality, Quality::from_percent(90));
    assert_eq!(result.report.termination, Termination::BudgetMet);
    assert_eq!(result.mime_type, ImageMime::Jpeg);
}

#[test]
fn test_capped_file_descends_to_the_floor() {
    let png = encode_png(&noise_rgb(2400, 1000, 22));
    let recorder = RecordingEncoder::new(4 * DEFAULT_BUDGET_BYTES);
    let compressor =
        ImageCompressor::with_encoder(CompressionSettings::default(), recorder.clone());

    let result = compressor
        .compress(&SourceImage::new(png, "image/png", "dense.png"), DEFAULT_BUDGET_BYTES)
        .unwrap();

    // More than 3x over budget on every attempt: 0.20 steps down to 0.10
    let qualities: Vec<u8> = recorder.calls().iter().map(|c| c.quality).collect();
    assert_eq!(qualities, vec![90, 70, 50, 30, 10]);
    assert!(recorder.calls().iter().all(|c| c.dimensions == (1200, 500)));
    assert_eq!(result.report.termination, Termination::QualityFloor);
    assert_eq!(result.report.attempts, 5);
    assert!(result.is_shortfall());
    assert_eq!(result.report.quality, Quality::from_percent(10));
}

#[test]
fn test_file_over_ten_megabytes_is_capped_at_800() {
    // Incompressible 2400x1600 PNG is larger than 10 MiB
    let png = encode_png(&noise_rgb(2400, 1600, 23));
    assert!(png.len() as u64 > 10 * MIB);

    let recorder = RecordingEncoder::new(10);
    let compressor =
        ImageCompressor::with_encoder(CompressionSettings::default(), recorder.clone());
    let source = SourceImage::new(png, "image/png", "huge.png");

    let result = compressor.compress(&source, DEFAULT_BUDGET_BYTES).unwrap();

    assert_eq!(recorder.calls()[0].dimensions, (800, 533));
    assert_eq!((result.report.width, result.report.height), (800, 533));
    assert_eq!(
        (result.report.original_width, result.report.original_height),
        (2400, 1600)
    );
}

#[test]
fn test_tier_boundaries() {
    assert_eq!(select_tier(2 * MIB).max_dimension, 1920);
    assert_eq!(select_tier(2 * MIB + 1).max_dimension, 1600);
    assert_eq!(select_tier(5 * MIB + 1).max_dimension, 1200);
    assert_eq!(select_tier(10 * MIB + 1).max_dimension, 800);
}

#[test]
fn test_png_over_two_megabytes_is_resized_and_reencoded() {
    // Incompressible 2000x600 PNG lands between 2 MiB and 5 MiB
    let png = encode_png(&noise_rgb(2000, 600, 1));
    assert!(png.len() as u64 > 2 * MIB && (png.len() as u64) <= 5 * MIB);

    let result = compress(png, "image/png", "wall.png", DEFAULT_BUDGET_BYTES).unwrap();

    assert_eq!(result.mime_type, ImageMime::Jpeg);
    assert!(is_jpeg(&result.bytes));
    assert_eq!((result.report.width, result.report.height), (1600, 480));
    assert_eq!(
        decoded_dimensions(&result.bytes, ImageFormat::Jpeg),
        (1600, 480)
    );
    assert_eq!(result.file_name, "wall.png");
}

#[test]
fn test_small_file_is_never_upscaled() {
    let jpeg = encode_jpeg(&noise_rgb(300, 200, 2), 95);
    let budget = jpeg.len() / 4;

    let result = compressor(budget)
        .compress(&SourceImage::new(jpeg, "image/jpeg", "small.jpg"), budget)
        .unwrap();

    assert_eq!((result.report.width, result.report.height), (300, 200));
    assert_eq!(
        decoded_dimensions(&result.bytes, ImageFormat::Jpeg),
        (300, 200)
    );
}

// =============================================================================
// Quality Search
// =============================================================================

#[test]
fn test_jpeg_converges_under_budget() {
    let jpeg = encode_jpeg(&noise_rgb(640, 480, 3), 100);
    let budget = 80 * KB;
    assert!(jpeg.len() > budget);

    let result = compressor(budget)
        .compress(&SourceImage::new(jpeg.clone(), "image/jpeg", "site.jpg"), budget)
        .unwrap();

    assert_eq!(result.mime_type, ImageMime::Jpeg);
    assert!(result.report.attempts >= 1 && result.report.attempts <= 10);
    assert!(result.report.quality >= Quality::from_percent(10));
    assert!(result.report.quality <= Quality::from_percent(90));
    assert!(result.byte_size() < jpeg.len());

    match result.report.termination {
        Termination::BudgetMet => assert!(result.byte_size() <= budget),
        _ => assert!(result.is_shortfall()),
    }
}

#[test]
fn test_unreachable_budget_returns_best_effort() {
    let jpeg = encode_jpeg(&noise_rgb(320, 240, 4), 95);

    let result = compressor(64)
        .compress(&SourceImage::new(jpeg, "image/jpeg", "noise.jpg"), 64)
        .unwrap();

    assert!(result.is_shortfall());
    assert!(result.byte_size() > 0);
    assert_ne!(result.report.termination, Termination::BudgetMet);
    assert!(result.report.attempts <= 10);
    assert_eq!(result.report.quality, Quality::from_percent(10));
}

#[test]
fn test_gif_keeps_its_format() {
    let gif = encode_gif(&noise_rgba(200, 150, 5));
    let budget = gif.len() / 2;

    let result = compressor(budget)
        .compress(&SourceImage::new(gif, "image/gif", "anim.gif"), budget)
        .unwrap();

    assert_eq!(result.mime_type, ImageMime::Gif);
    assert!(result.bytes.starts_with(b"GIF8"));
    assert!(result.report.attempts >= 1 && result.report.attempts <= 10);
    assert_eq!(
        decoded_dimensions(&result.bytes, ImageFormat::Gif),
        (200, 150)
    );
}

#[test]
fn test_webp_reencoded_lossy() {
    let webp = encode_webp(&noise_rgb(320, 240, 6));
    let budget = webp.len() / 4;

    let result = compressor(budget)
        .compress(&SourceImage::new(webp, "image/webp", "shot.webp"), budget)
        .unwrap();

    assert_eq!(result.mime_type, ImageMime::Webp);
    assert_eq!(&result.bytes[0..4], b"RIFF");
    assert_eq!(&result.bytes[8..12], b"WEBP");
    assert_eq!(
        decoded_dimensions(&result.bytes, ImageFormat::WebP),
        (320, 240)
    );
    if result.report.termination == Termination::BudgetMet {
        assert!(result.byte_size() <= budget);
    }
}

// =============================================================================
// Already Within Budget
// =============================================================================

#[test]
fn test_small_png_called_directly_is_reencoded() {
    // The submission flow would forward this file untouched; a direct call
    // still runs every stage
    let png = encode_png(&gradient_rgb(2400, 600));
    assert!(png.len() < DEFAULT_BUDGET_BYTES);

    let result = compress(png, "image/png", "wide.png", DEFAULT_BUDGET_BYTES).unwrap();

    assert_eq!(result.mime_type, ImageMime::Jpeg);
    assert!(is_jpeg(&result.bytes));
    assert_eq!((result.report.width, result.report.height), (1920, 480));
    assert_eq!(result.report.attempts, 1);
    assert_eq!(result.report.quality, Quality::from_percent(90));
    assert_eq!(result.report.termination, Termination::BudgetMet);
    assert!(result.byte_size() <= DEFAULT_BUDGET_BYTES);
}

// =============================================================================
// Failures
// =============================================================================

#[test]
fn test_corrupt_jpeg_fails_to_decode() {
    let garbage = vec![0xABu8; 4096];

    let err = compress(garbage, "image/jpeg", "broken.jpg", 1024).unwrap_err();

    assert_eq!(err.kind(), "decode_failed");
    assert_eq!(err.file_name(), "broken.jpg");
}

#[test]
fn test_truncated_jpeg_fails_to_decode() {
    let jpeg = encode_jpeg(&noise_rgb(64, 64, 8), 90);
    // Cut inside the header, before any frame is declared
    let truncated = jpeg[..20].to_vec();

    let err = compress(truncated, "image/jpeg", "cut.jpg", 16).unwrap_err();
    assert!(matches!(err, CompressionError::DecodeFailed { .. }));
}

#[test]
fn test_unsupported_mime_fails_to_decode() {
    let err = compress(vec![0u8; 64], "image/bmp", "old.bmp", 16).unwrap_err();
    assert!(matches!(
        err,
        CompressionError::DecodeFailed { ref file_name, .. } if file_name == "old.bmp"
    ));
}

#[test]
fn test_cancelled_before_start() {
    let jpeg = encode_jpeg(&noise_rgb(64, 64, 9), 90);
    let cancel = CancelFlag::new();
    cancel.cancel();

    let err = compressor(16)
        .compress_with_cancel(&SourceImage::new(jpeg, "image/jpeg", "c.jpg"), 16, &cancel)
        .unwrap_err();

    assert_eq!(
        err,
        CompressionError::Cancelled {
            file_name: "c.jpg".to_string()
        }
    );
}
