use std::io::Write;

use image::GrayImage;

use crate::image_pipeline::common::error::Result;
use crate::image_pipeline::config::ConversionConfig;

pub trait RasterWriter {
    fn write_raster(&self, raster: &GrayImage, output: &mut dyn Write, config: &ConversionConfig) -> Result<()>;
}
