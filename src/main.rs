//! evidence-shrink - Fit report photos into an upload byte budget.
//!
//! This binary reads the selected files, prepares them as one submission and
//! writes the results to the output directory.

use clap::Parser;
use std::path::Path;
use std::process::ExitCode;
use std::sync::Arc;
use tracing::{error, info, warn};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use evidence_shrink::{
    config::Config, format_file_size, prepare_submission, CancelFlag, ImageCompressor, ImageMime,
    PreparedSubmission, SourceImage,
};

/// Mime type reported for files whose extension is not an image type.
const UNKNOWN_MIME: &str = "application/octet-stream";

#[tokio::main]
async fn main() -> ExitCode {
    let config = Config::parse();

    // Initialize logging
    init_logging(config.verbose);

    // Validate configuration
    if let Err(e) = config.validate() {
        error!("Configuration error: {}", e);
        return ExitCode::FAILURE;
    }

    run(config).await
}

async fn run(config: Config) -> ExitCode {
    let settings = config.compression_settings();
    let policy = config.submission_policy();

    info!("Configuration:");
    info!("  Budget: {}", format_file_size(settings.budget_bytes as u64));
    info!(
        "  Quality: {} down to {}, {} attempt(s)",
        settings.search.initial_quality, settings.search.min_quality, settings.search.max_attempts
    );
    info!(
        "  Limits: {} file(s), {} per file",
        policy.max_files,
        format_file_size(policy.max_upload_bytes as u64)
    );
    info!("  Output: {}", config.output_dir.display());

    // Read every selected file up front, like a form picker would
    let mut sources = Vec::with_capacity(config.files.len());
    let mut unreadable = 0usize;
    for path in &config.files {
        match read_source(path).await {
            Ok(source) => sources.push(source),
            Err(e) => {
                error!("Failed to read {}: {}", path.display(), e);
                unreadable += 1;
            }
        }
    }

    let cancel = CancelFlag::new();
    spawn_interrupt_handler(cancel.clone());

    let compressor = Arc::new(ImageCompressor::new(settings));
    let prepared = match prepare_submission(compressor, sources, &policy, &cancel).await {
        Ok(prepared) => prepared,
        Err(e) => {
            error!("Submission refused: {}", e);
            return ExitCode::FAILURE;
        }
    };

    if let Err(e) = prepared.write_to_dir(&config.output_dir) {
        error!(
            "Failed to write attachments to {}: {}",
            config.output_dir.display(),
            e
        );
        return ExitCode::FAILURE;
    }

    if config.json {
        match serde_json::to_string_pretty(&prepared) {
            Ok(json) => println!("{}", json),
            Err(e) => {
                error!("Failed to serialize summary: {}", e);
                return ExitCode::FAILURE;
            }
        }
    } else {
        print_summary(&prepared);
    }

    if prepared.rejected.is_empty() && unreadable == 0 {
        ExitCode::SUCCESS
    } else {
        ExitCode::FAILURE
    }
}

/// Load one file as a submission source.
///
/// The mime type comes from the extension, as a browser file picker would
/// report it. Unknown extensions are passed on and rejected by validation.
async fn read_source(path: &Path) -> std::io::Result<SourceImage> {
    let bytes = tokio::fs::read(path).await?;

    let mime = ImageMime::from_path(path)
        .map(|m| m.as_str())
        .unwrap_or(UNKNOWN_MIME);
    let file_name = path
        .file_name()
        .map(|n| n.to_string_lossy().into_owned())
        .unwrap_or_else(|| path.display().to_string());

    Ok(SourceImage::new(bytes, mime, file_name))
}

/// Cancel outstanding compressions on Ctrl-C.
fn spawn_interrupt_handler(cancel: CancelFlag) {
    tokio::spawn(async move {
        if tokio::signal::ctrl_c().await.is_ok() {
            warn!("Interrupted, cancelling outstanding compressions");
            cancel.cancel();
        }
    });
}

/// Print a human-readable summary of the prepared submission.
fn print_summary(prepared: &PreparedSubmission) {
    for attachment in &prepared.ready {
        match &attachment.compressed {
            Some(report) => println!(
                "✓ {}: {} -> {} ({}x{}, quality {}, {} attempt(s))",
                attachment.file_name,
                format_file_size(attachment.original_byte_size as u64),
                format_file_size(attachment.byte_size as u64),
                report.width,
                report.height,
                report.quality,
                report.attempts
            ),
            None => println!(
                "✓ {}: {} (unchanged)",
                attachment.file_name,
                format_file_size(attachment.byte_size as u64)
            ),
        }
    }

    for rejected in &prepared.rejected {
        println!("✗ {}: {}", rejected.file_name, rejected.message);
    }

    println!();
    println!(
        "Total: {} attachment(s), {}",
        prepared.ready.len(),
        format_file_size(prepared.total_bytes() as u64)
    );
}

/// Initialize the tracing/logging subsystem.
///
/// Logs go to stderr so `--json` output on stdout stays machine-readable.
fn init_logging(verbose: bool) {
    let env_filter = if verbose {
        "evidence_shrink=debug"
    } else {
        "evidence_shrink=info"
    };

    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| env_filter.into()),
        )
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
        .init();
}
