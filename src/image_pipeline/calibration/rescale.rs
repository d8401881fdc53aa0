use ndarray::Array2;

use crate::image_pipeline::calibration::types::StepStatus;
use crate::image_pipeline::dicom::{Attribute, Rescale};

/// Applies the modality rescale in place.
///
/// Returns the status plus the rescale that was actually applied, which the
/// windowing step needs to map its output range.
pub fn apply_rescale(
    values: &mut Array2<f64>,
    rescale: &Attribute<Rescale>,
) -> (StepStatus, Option<Rescale>) {
    let rescale = match rescale {
        Attribute::Absent => return (StepStatus::NotPresent, None),
        Attribute::Malformed(reason) => {
            return (StepStatus::Degraded(format!("rescale: {}", reason)), None);
        }
        Attribute::Present(rescale) => *rescale,
    };

    let rescaled = values.mapv(|v| rescale.apply(v));
    if rescaled.iter().any(|v| !v.is_finite()) {
        return (
            StepStatus::Degraded(format!(
                "rescale slope={} intercept={} produced non-finite values",
                rescale.slope, rescale.intercept
            )),
            None,
        );
    }

    *values = rescaled;
    (StepStatus::Applied, Some(rescale))
}
