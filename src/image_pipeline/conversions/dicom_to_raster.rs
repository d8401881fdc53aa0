use image::GrayImage;
use std::io::Write;
use std::path::Path;
use tracing::{debug, info, instrument};

use crate::image_pipeline::{
    calibration::{calibrate, CalibrationReport},
    common::error::{ConversionError, Result},
    common::outcome::ConversionOutcome,
    config::ConversionConfig,
    dicom::{DicomObjectReader, DicomReader, SourceImage},
    enhance::Enhancer,
    normalize::normalize,
    raster::{RasterWriter, StandardRasterWriter},
    resample::resize_long_side,
};

pub struct DicomToRasterPipeline<R: DicomReader, W: RasterWriter> {
    reader: R,
    writer: W,
    config: ConversionConfig,
    enhancer: Enhancer,
}

impl DicomToRasterPipeline<DicomObjectReader, StandardRasterWriter> {
    pub fn new(config: ConversionConfig) -> Result<Self> {
        Self::with_custom(DicomObjectReader, StandardRasterWriter, config)
    }
}

impl<R: DicomReader, W: RasterWriter> DicomToRasterPipeline<R, W> {
    pub fn with_custom(reader: R, writer: W, config: ConversionConfig) -> Result<Self> {
        config.validate()?;
        let enhancer = Enhancer::new(config.enhance);
        Ok(Self {
            reader,
            writer,
            config,
            enhancer,
        })
    }

    fn validate_dimensions(&self, width: usize, height: usize) -> Result<()> {
        if !self.config.validate_dimensions {
            return Ok(());
        }

        if width == 0 || height == 0 {
            return Err(ConversionError::InvalidDimensions(width, height));
        }

        Ok(())
    }

    /// Calibrates, normalizes, resizes and enhances a decoded image.
    pub fn render(&self, source: &SourceImage) -> Result<(GrayImage, CalibrationReport)> {
        let (height, width) = source.pixels.dim();
        {
            let _span = tracing::info_span!("validate_dimensions", width, height).entered();
            self.validate_dimensions(width, height)?;
        }

        let frame = {
            let _span = tracing::info_span!("calibrate").entered();
            calibrate(source, self.config.apply_voi)
        };

        let raster = {
            let _span = tracing::info_span!("normalize").entered();
            normalize(&frame, self.config.percentiles)
        };

        let raster = {
            let _span = tracing::info_span!("resample").entered();
            resize_long_side(raster, self.config.max_side)
        };

        let raster = {
            let _span = tracing::info_span!("enhance").entered();
            self.enhancer.apply(raster)
        };

        Ok((raster, frame.report))
    }

    /// Renders `source` and encodes the raster into `output`.
    #[instrument(skip(self, source, output), fields(path = %source.path.display()))]
    pub fn convert(&self, source: &SourceImage, output: &mut dyn Write) -> Result<CalibrationReport> {
        let (raster, report) = self.render(source)?;

        {
            let _span = tracing::info_span!("encode_raster").entered();
            self.writer.write_raster(&raster, output, &self.config)?;
        }

        debug!(
            width = raster.width(),
            height = raster.height(),
            "Conversion complete"
        );
        Ok(report)
    }

    /// Converts one DICOM file into a raster at `output_path`.
    ///
    /// With overwriting disabled an existing destination is left untouched and
    /// the source is not decoded. The raster is encoded in memory first, so a
    /// failed conversion never leaves a partial file behind.
    #[instrument(skip(self, input_path, output_path))]
    pub fn convert_file<P: AsRef<Path>, Q: AsRef<Path>>(
        &self,
        input_path: P,
        output_path: Q,
    ) -> Result<ConversionOutcome> {
        let input_path = input_path.as_ref();
        let output_path = output_path.as_ref();

        if !self.config.overwrite && output_path.exists() {
            debug!(output = %output_path.display(), "Destination exists, skipping");
            return Ok(ConversionOutcome::Skipped);
        }

        info!(
            input = %input_path.display(),
            output = %output_path.display(),
            "Converting file"
        );

        let source = {
            let _span = tracing::info_span!("decode_dicom").entered();
            self.reader.read_dicom(input_path)?
        };

        let mut encoded = Vec::new();
        let report = self.convert(&source, &mut encoded)?;

        {
            let _span = tracing::info_span!("write_output_file").entered();
            if let Some(parent) = output_path.parent() {
                std::fs::create_dir_all(parent).map_err(|e| {
                    ConversionError::OutputWriteError(format!("{}: {}", parent.display(), e))
                })?;
            }
            std::fs::write(output_path, &encoded).map_err(|e| {
                ConversionError::OutputWriteError(format!("{}: {}", output_path.display(), e))
            })?;
        }

        Ok(ConversionOutcome::Converted {
            instance_uid: source.instance_uid,
            report,
        })
    }

    /// Like [`convert_file`](Self::convert_file), with errors folded into a
    /// `Failed` outcome so one bad file does not stop a batch.
    pub fn process_file(&self, input_path: &Path, output_path: &Path) -> ConversionOutcome {
        match self.convert_file(input_path, output_path) {
            Ok(outcome) => outcome,
            Err(e) => ConversionOutcome::Failed {
                transfer_syntax: e.transfer_syntax().map(str::to_string),
                message: e.to_string(),
            },
        }
    }

    pub fn config(&self) -> &ConversionConfig {
        &self.config
    }

    pub fn set_config(&mut self, config: ConversionConfig) -> Result<()> {
        config.validate()?;
        self.enhancer = Enhancer::new(config.enhance);
        self.config = config;
        Ok(())
    }
}
