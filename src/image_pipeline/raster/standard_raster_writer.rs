use std::io::{Cursor, Write};

use image::codecs::png::{CompressionType, FilterType, PngEncoder};
use image::{ExtendedColorType, GrayImage, ImageEncoder};
use tracing::debug;

use crate::image_pipeline::common::error::{ConversionError, Result};
use crate::image_pipeline::config::ConversionConfig;
use crate::image_pipeline::raster::types::{ChannelLayout, RasterFormat};
use crate::image_pipeline::raster::writer::RasterWriter;

pub struct StandardRasterWriter;

impl StandardRasterWriter {
    fn encode_png(&self, data: &[u8], width: u32, height: u32, channels: ChannelLayout) -> Result<Vec<u8>> {
        let mut buffer = Vec::new();
        let encoder = PngEncoder::new_with_quality(&mut buffer, CompressionType::Best, FilterType::Adaptive);
        let color = match channels {
            ChannelLayout::Mono => ExtendedColorType::L8,
            ChannelLayout::Replicated => ExtendedColorType::Rgb8,
        };
        encoder
            .write_image(data, width, height, color)
            .map_err(|e| ConversionError::EncodeError(e.to_string()))?;
        Ok(buffer)
    }

    fn encode_tiff(&self, data: &[u8], width: u32, height: u32, channels: ChannelLayout) -> Result<Vec<u8>> {
        let mut buffer = Vec::new();

        let mut encoder = tiff::encoder::TiffEncoder::new(Cursor::new(&mut buffer))
            .map_err(|e| ConversionError::EncodeError(e.to_string()))?
            .with_compression(tiff::encoder::Compression::Deflate(
                tiff::encoder::compression::DeflateLevel::Best,
            ))
            .with_predictor(tiff::tags::Predictor::Horizontal);

        match channels {
            ChannelLayout::Mono => encoder.write_image::<tiff::encoder::colortype::Gray8>(width, height, data),
            ChannelLayout::Replicated => encoder.write_image::<tiff::encoder::colortype::RGB8>(width, height, data),
        }
        .map_err(|e| ConversionError::EncodeError(e.to_string()))?;

        Ok(buffer)
    }
}

impl RasterWriter for StandardRasterWriter {
    fn write_raster(&self, raster: &GrayImage, output: &mut dyn Write, config: &ConversionConfig) -> Result<()> {
        let (width, height) = raster.dimensions();
        debug!("Encoding {:?} raster: {}x{} {:?}", config.format, width, height, config.channels);

        let gray = raster.as_raw();
        let replicated;
        let data: &[u8] = match config.channels {
            ChannelLayout::Mono => gray,
            ChannelLayout::Replicated => {
                let channels = config.channels.channels();
                let mut samples = Vec::with_capacity(gray.len() * channels);
                for &v in gray {
                    samples.extend(std::iter::repeat_n(v, channels));
                }
                replicated = samples;
                &replicated
            }
        };

        let buffer = match config.format {
            RasterFormat::Png => self.encode_png(data, width, height, config.channels)?,
            RasterFormat::Tiff => self.encode_tiff(data, width, height, config.channels)?,
        };

        output.write_all(&buffer)?;

        debug!("Raster encoding complete, {} bytes", buffer.len());
        Ok(())
    }
}
