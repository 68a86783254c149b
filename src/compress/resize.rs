//! Proportional downscaling.

use image::imageops::FilterType;

use crate::codec::DecodedRaster;

/// Resampling filter for downscaling. Bilinear, as a browser canvas draws.
const RESIZE_FILTER: FilterType = FilterType::Triangle;

/// Compute the output dimensions for a longer-side cap.
///
/// Returns the input unchanged when it already fits; never upscales.
/// Otherwise the longer side becomes exactly `max_dimension` and the shorter
/// side is scaled by the same factor, floored, and kept at least 1 pixel.
pub fn target_dimensions(width: u32, height: u32, max_dimension: u32) -> (u32, u32) {
    let longer = width.max(height);
    if longer <= max_dimension || longer == 0 {
        return (width, height);
    }

    let scale = |side: u32| -> u32 {
        let scaled = u64::from(side) * u64::from(max_dimension) / u64::from(longer);
        (scaled as u32).max(1)
    };

    if width >= height {
        (max_dimension, scale(height))
    } else {
        (scale(width), max_dimension)
    }
}

/// Downscale `raster` so its longer side is at most `max_dimension`.
pub fn resize_to_fit(raster: DecodedRaster, max_dimension: u32) -> DecodedRaster {
    let (width, height) = raster.dimensions();
    let (new_width, new_height) = target_dimensions(width, height, max_dimension);

    if (new_width, new_height) == (width, height) {
        return raster;
    }

    let resized = raster
        .into_pixels()
        .resize_exact(new_width, new_height, RESIZE_FILTER);

    DecodedRaster::new(resized)
}
