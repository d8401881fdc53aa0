//! VOI (value of interest) transforms
//!
//! An explicit VOI LUT takes precedence over window center/width. Window
//! functions follow DICOM PS3.3 C.11.2.1.2: LINEAR, LINEAR_EXACT and SIGMOID.
//! The output range is the stored sample range, carried through the modality
//! rescale when one was applied.

use ndarray::Array2;

use crate::image_pipeline::calibration::types::StepStatus;
use crate::image_pipeline::dicom::{
    Attribute, Rescale, SourceImage, VoiLut, VoiLutFunction, WindowLevel,
};

/// Applies the first VOI transform described by `source`, in place.
pub fn apply_voi(
    values: &mut Array2<f64>,
    source: &SourceImage,
    applied_rescale: Option<Rescale>,
) -> StepStatus {
    match &source.voi_lut {
        Attribute::Present(lut) => return apply_lut(values, lut),
        Attribute::Malformed(reason) => return StepStatus::Degraded(format!("VOI LUT: {}", reason)),
        Attribute::Absent => {}
    }

    let window = match &source.windows {
        Attribute::Absent => return StepStatus::NotPresent,
        Attribute::Malformed(reason) => return StepStatus::Degraded(format!("window: {}", reason)),
        Attribute::Present(windows) => match windows.first() {
            Some(window) => *window,
            None => return StepStatus::NotPresent,
        },
    };

    if !source.photometric.is_monochrome() {
        return StepStatus::Degraded(format!(
            "windowing requires MONOCHROME1/2, found {:?}",
            source.photometric
        ));
    }

    let (y_min, y_max) = output_range(source, applied_rescale);
    match window_function(window, source.voi_lut_function, y_min, y_max) {
        Ok(transform) => {
            values.mapv_inplace(transform);
            StepStatus::Applied
        }
        Err(reason) => StepStatus::Degraded(reason),
    }
}

fn output_range(source: &SourceImage, applied_rescale: Option<Rescale>) -> (f64, f64) {
    let (lo, hi) = source.stored_range();
    match applied_rescale {
        Some(rescale) => {
            let (a, b) = (rescale.apply(lo), rescale.apply(hi));
            (a.min(b), a.max(b))
        }
        None => (lo, hi),
    }
}

fn window_function(
    window: WindowLevel,
    function: VoiLutFunction,
    y_min: f64,
    y_max: f64,
) -> Result<impl Fn(f64) -> f64, String> {
    let y_range = y_max - y_min;
    let WindowLevel { center, width } = window;

    let (c, w) = match function {
        VoiLutFunction::Linear if width < 1.0 => {
            return Err(format!("window width {} must be >= 1 for LINEAR", width));
        }
        VoiLutFunction::Linear => (center - 0.5, width - 1.0),
        _ if width <= 0.0 => {
            return Err(format!("window width {} must be > 0", width));
        }
        _ => (center, width),
    };

    Ok(move |x: f64| match function {
        VoiLutFunction::Sigmoid => y_range / (1.0 + (-4.0 * (x - c) / w).exp()) + y_min,
        _ if x <= c - w / 2.0 => y_min,
        _ if x > c + w / 2.0 => y_max,
        _ => ((x - c) / w + 0.5) * y_range + y_min,
    })
}

fn apply_lut(values: &mut Array2<f64>, lut: &VoiLut) -> StepStatus {
    let Some(last_index) = lut.data.len().checked_sub(1) else {
        return StepStatus::Degraded("VOI LUT: no entries".to_string());
    };
    let first = lut.first_mapped;
    let last = first + last_index as f64;

    values.mapv_inplace(|x| {
        let index = (x.clamp(first, last) - first).round() as usize;
        lut.data[index.min(last_index)]
    });
    StepStatus::Applied
}
