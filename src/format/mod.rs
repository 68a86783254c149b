//! Image formats accepted by the portal.
//!
//! The allow-list is closed: JPEG, PNG, GIF (first frame) and WEBP. Use
//! [`ImageMime::parse`] for declared mime types and [`ImageMime::from_path`]
//! for files on disk.

pub mod mime;

pub use mime::{ImageMime, SUPPORTED_MIMES};
