//! Image processing pipeline module
//!
//! This module provides a structured approach to DICOM to raster conversion,
//! with separate modules for decoding, calibration, normalization, resampling,
//! enhancement, raster writing and conversion orchestration.

pub mod calibration;
pub mod common;
pub mod config;
pub mod conversions;
pub mod dicom;
pub mod enhance;
pub mod manifest;
pub mod normalize;
pub mod raster;
pub mod resample;

pub use common::{
    BatchSummary,
    ConversionError,
    ConversionOutcome,
    Result,
};

pub use config::{
    ConversionConfig,
    ConversionConfigBuilder,
    EnhanceConfig,
    PercentileBounds,
};

pub use dicom::{
    DicomObjectReader,
    DicomReader,
    SourceImage,
};

pub use raster::{
    ChannelLayout,
    RasterFormat,
    RasterWriter,
    StandardRasterWriter,
};

pub use manifest::{
    Manifest,
    ManifestEntry,
};

pub use conversions::{
    DicomToRasterPipeline,
    output_path_for,
    run_batch,
};
