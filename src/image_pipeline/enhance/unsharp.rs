use image::GrayImage;
use imageproc::filter::sharpen_gaussian;

/// Unsharp mask: `(1 + amount) * image - amount * gaussian(image, radius)`.
///
/// A zero radius or amount leaves the raster unchanged.
pub fn unsharp_mask(raster: &GrayImage, radius: f32, amount: f32) -> GrayImage {
    if radius <= 0.0 || amount <= 0.0 {
        return raster.clone();
    }
    sharpen_gaussian(raster, radius, amount)
}
