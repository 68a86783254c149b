//! Decoding and encoding of raster images.
//!
//! - [`decoder`] - Declared-format decoding into a [`DecodedRaster`]
//! - [`encoder`] - The [`RasterEncoder`] seam and the codec-backed encoder

pub mod decoder;
pub mod encoder;

pub use decoder::{decode, dimensions, DecodedRaster};
pub use encoder::{CodecEncoder, RasterEncoder};
