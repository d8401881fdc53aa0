use image::GrayImage;
use image::imageops::{self, FilterType};
use tracing::debug;

/// Downsamples `raster` so its longer side is at most `max_side`.
///
/// Aspect ratio is preserved and the raster is never upsampled. Returns the
/// input untouched when no bound is set or it is already satisfied.
pub fn resize_long_side(raster: GrayImage, max_side: Option<u32>) -> GrayImage {
    let Some(max_side) = max_side.filter(|&m| m > 0) else {
        return raster;
    };

    let (width, height) = raster.dimensions();
    let long_side = width.max(height);
    if long_side <= max_side {
        return raster;
    }

    let scale = f64::from(max_side) / f64::from(long_side);
    let new_width = scaled(width, scale);
    let new_height = scaled(height, scale);
    debug!(width, height, new_width, new_height, "Downsampling raster");

    imageops::resize(&raster, new_width, new_height, FilterType::Lanczos3)
}

fn scaled(side: u32, scale: f64) -> u32 {
    ((f64::from(side) * scale).round() as u32).max(1)
}
