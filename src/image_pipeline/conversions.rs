//! Pipeline conversions module
//!
//! This module contains the per-file DICOM to raster pipeline and the
//! directory batch driver built on top of it.

mod batch;
mod dicom_to_raster;


pub use batch::{output_path_for, run_batch};
pub use dicom_to_raster::DicomToRasterPipeline;
