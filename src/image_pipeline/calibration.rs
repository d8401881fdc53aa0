//! Radiometric calibration module
//!
//! Turns decoded samples into calibrated intensities: modality rescale first,
//! then (optionally) the VOI transform. Each step is best-effort and reports
//! its own status instead of aborting the conversion.

mod rescale;
pub mod types;
mod voi;

pub use rescale::apply_rescale;
pub use types::{CalibratedFrame, CalibrationReport, StepStatus};
pub use voi::apply_voi;

use tracing::debug;

use crate::image_pipeline::dicom::SourceImage;

/// Calibrates the sample plane of `source`.
pub fn calibrate(source: &SourceImage, use_voi: bool) -> CalibratedFrame {
    let mut values = source.pixels.clone();

    let (rescale, applied_rescale) = apply_rescale(&mut values, &source.rescale);
    let voi = if use_voi {
        apply_voi(&mut values, source, applied_rescale)
    } else {
        StepStatus::Disabled
    };

    let report = CalibrationReport { rescale, voi };
    if report.is_degraded() {
        debug!(path = %source.path.display(), ?report, "Calibration degraded");
    }

    CalibratedFrame {
        values: values.mapv(|v| v as f32),
        inverted: source.photometric.is_inverted(),
        report,
    }
}
