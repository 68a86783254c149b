//! Supported image mime types.
//!
//! The allow-list is fixed: JPEG, PNG, GIF and WEBP. Detection goes by the
//! declared mime type (or, for files on disk, the extension); bytes are never
//! sniffed beyond what the decoder of the declared format requires.

use std::fmt;
use std::path::Path;

use image::ImageFormat;
use serde::Serialize;

// =============================================================================
// ImageMime
// =============================================================================

/// A supported raster mime type.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
pub enum ImageMime {
    #[serde(rename = "image/jpeg")]
    Jpeg,
    #[serde(rename = "image/png")]
    Png,
    #[serde(rename = "image/gif")]
    Gif,
    #[serde(rename = "image/webp")]
    Webp,
}

/// Every supported mime type, in the order they are listed to users.
pub const SUPPORTED_MIMES: [ImageMime; 4] = [
    ImageMime::Jpeg,
    ImageMime::Png,
    ImageMime::Gif,
    ImageMime::Webp,
];

impl ImageMime {
    /// Parse a declared mime type.
    ///
    /// Matching is case-insensitive, ignores parameters (`image/png; q=1`)
    /// and accepts the non-standard `image/jpg` alias. Returns `None` for
    /// anything outside the allow-list.
    pub fn parse(mime: &str) -> Option<Self> {
        let essence = mime.split(';').next().unwrap_or_default().trim();

        match essence.to_ascii_lowercase().as_str() {
            "image/jpeg" | "image/jpg" => Some(ImageMime::Jpeg),
            "image/png" => Some(ImageMime::Png),
            "image/gif" => Some(ImageMime::Gif),
            "image/webp" => Some(ImageMime::Webp),
            _ => None,
        }
    }

    /// Infer the mime type from a file extension.
    pub fn from_path(path: &Path) -> Option<Self> {
        let ext = path.extension()?.to_str()?.to_ascii_lowercase();

        match ext.as_str() {
            "jpg" | "jpeg" | "jpe" | "jfif" => Some(ImageMime::Jpeg),
            "png" => Some(ImageMime::Png),
            "gif" => Some(ImageMime::Gif),
            "webp" => Some(ImageMime::Webp),
            _ => None,
        }
    }

    /// Canonical mime string.
    pub const fn as_str(&self) -> &'static str {
        match self {
            ImageMime::Jpeg => "image/jpeg",
            ImageMime::Png => "image/png",
            ImageMime::Gif => "image/gif",
            ImageMime::Webp => "image/webp",
        }
    }

    /// Usual file extension, without the dot.
    pub const fn extension(&self) -> &'static str {
        match self {
            ImageMime::Jpeg => "jpg",
            ImageMime::Png => "png",
            ImageMime::Gif => "gif",
            ImageMime::Webp => "webp",
        }
    }

    /// Decoder format for this mime type.
    pub const fn image_format(&self) -> ImageFormat {
        match self {
            ImageMime::Jpeg => ImageFormat::Jpeg,
            ImageMime::Png => ImageFormat::Png,
            ImageMime::Gif => ImageFormat::Gif,
            ImageMime::Webp => ImageFormat::WebP,
        }
    }

    /// Mime type the re-encoded output uses.
    ///
    /// PNG is lossless, so it is re-encoded as JPEG; every other type keeps
    /// its own encoder.
    pub const fn encode_target(&self) -> ImageMime {
        match self {
            ImageMime::Png => ImageMime::Jpeg,
            other => *other,
        }
    }
}

impl fmt::Display for ImageMime {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

// =============================================================================
// Tests
// =============================================================================
