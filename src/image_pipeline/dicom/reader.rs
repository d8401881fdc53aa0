use std::path::Path;

use crate::image_pipeline::common::error::Result;
use crate::image_pipeline::dicom::types::SourceImage;

pub trait DicomReader {
    fn read_dicom(&self, path: &Path) -> Result<SourceImage>;
}
