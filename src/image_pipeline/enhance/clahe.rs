//! Contrast limited adaptive histogram equalization backed by the `clahe` crate
//!
//! The clip limit is a fraction of the pixels in one tile that a single
//! histogram bin may hold. Values of 1.0 and above never clip, so the default
//! of 2.0 gives plain adaptive equalization.

use image::GrayImage;

/// Histogram resolution used by the backend.
const HIST_BINS: f32 = 256.0;

/// CLAHE implementation selected when the `clahe` feature is enabled.
#[derive(Debug, Clone, Copy, Default)]
pub struct ClaheEqualizer;

impl ClaheEqualizer {
    /// Equalizes `raster` over a `tile_grid` of (columns, rows) tiles.
    ///
    /// The grid is shrunk when the raster has fewer pixels than tiles along
    /// an axis.
    pub fn equalize(&self, raster: &GrayImage, clip_limit: f32, tile_grid: (u32, u32)) -> GrayImage {
        let (width, height) = raster.dimensions();
        let tiles_x = tile_grid.0.min(width) as usize;
        let tiles_y = tile_grid.1.min(height) as usize;
        if tiles_x == 0 || tiles_y == 0 {
            return raster.clone();
        }

        ::clahe::clahe_u8_to_u8(tiles_x, tiles_y, backend_clip_limit(clip_limit), raster)
    }
}

/// Converts a per-tile pixel fraction into the backend's multiple of the
/// mean bin height.
fn backend_clip_limit(clip_limit: f32) -> f32 {
    clip_limit * HIST_BINS
}
