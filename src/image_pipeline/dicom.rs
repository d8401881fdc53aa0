//! DICOM reading module
//!
//! This module detects DICOM files and decodes them into a grayscale sample
//! plane plus the radiometric metadata the calibrator needs.

mod reader;
mod dicom_object_reader;
mod shape;
mod sniff;
pub mod types;

pub use reader::DicomReader;
pub use dicom_object_reader::DicomObjectReader;
pub use shape::reduce_to_plane;
pub use sniff::is_dicom;
pub use types::{
    Attribute, Photometric, Rescale, SourceImage, VoiLut, VoiLutFunction, WindowLevel,
};
