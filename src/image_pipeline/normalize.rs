//! Dynamic range normalization
//!
//! Maps calibrated intensities onto 8 bits using robust percentile clipping,
//! falling back to the true min/max when the percentiles collapse. A
//! constant image is a defined degenerate case and yields an all-zero
//! raster.

use image::{GrayImage, Luma};
use ndarray::Array2;
use tracing::debug;

use crate::image_pipeline::calibration::CalibratedFrame;
use crate::image_pipeline::config::PercentileBounds;

/// Normalizes a calibrated frame into an 8-bit raster.
pub fn normalize(frame: &CalibratedFrame, bounds: PercentileBounds) -> GrayImage {
    normalize_to_u8(&frame.values, frame.inverted, bounds)
}

/// Normalizes `values` (rows × columns) into an 8-bit raster.
pub fn normalize_to_u8(values: &Array2<f32>, invert: bool, bounds: PercentileBounds) -> GrayImage {
    let (rows, cols) = values.dim();
    let mut values = values.clone();
    sanitize(&mut values);

    let Some((lo, hi)) = clip_range(&values, bounds) else {
        debug!(rows, cols, "Constant image, emitting all-zero raster");
        return GrayImage::new(cols as u32, rows as u32);
    };

    let scale = hi - lo;
    GrayImage::from_fn(cols as u32, rows as u32, |x, y| {
        let v = f64::from(values[[y as usize, x as usize]]);
        let mut unit = ((v - lo) / scale).clamp(0.0, 1.0);
        if invert {
            unit = 1.0 - unit;
        }
        Luma([(unit * 255.0 + 0.5) as u8])
    })
}

/// Replaces non-finite values: `+inf` with the finite maximum, `-inf` with
/// the finite minimum and NaN with zero. Everything becomes zero when no
/// finite value exists.
pub fn sanitize(values: &mut Array2<f32>) {
    if values.iter().all(|v| v.is_finite()) {
        return;
    }

    let finite = values.iter().copied().filter(|v| v.is_finite());
    let (min, max) = finite.fold((None, None), |(min, max): (Option<f32>, Option<f32>), v| {
        (
            Some(min.map_or(v, |m| m.min(v))),
            Some(max.map_or(v, |m| m.max(v))),
        )
    });

    values.mapv_inplace(|v| {
        if v.is_nan() {
            0.0
        } else if v == f32::INFINITY {
            max.unwrap_or(0.0)
        } else if v == f32::NEG_INFINITY {
            min.unwrap_or(0.0)
        } else {
            v
        }
    });
}

/// Picks the `[lo, hi]` clipping range, or `None` for a constant image.
fn clip_range(values: &Array2<f32>, bounds: PercentileBounds) -> Option<(f64, f64)> {
    if values.is_empty() {
        return None;
    }

    let mut scratch: Vec<f32> = values.iter().copied().collect();
    let lo = percentile(&mut scratch, bounds.low);
    let hi = percentile(&mut scratch, bounds.high);
    if lo.is_finite() && hi.is_finite() && hi > lo {
        return Some((lo, hi));
    }

    let (min, max) = scratch
        .iter()
        .fold((f32::INFINITY, f32::NEG_INFINITY), |(min, max), &v| (min.min(v), max.max(v)));
    let (lo, hi) = (f64::from(min), f64::from(max));
    debug!(lo, hi, "Percentile range collapsed, using min/max");
    (hi > lo).then_some((lo, hi))
}

/// Percentile `p` (0–100) with linear interpolation between closest ranks.
///
/// Reorders `data`; callers pass a scratch copy.
pub fn percentile(data: &mut [f32], p: f64) -> f64 {
    if data.is_empty() {
        return f64::NAN;
    }

    let rank = (p / 100.0).clamp(0.0, 1.0) * (data.len() - 1) as f64;
    let lower = rank.floor() as usize;
    let frac = rank - lower as f64;

    let (_, lower_value, above) = data.select_nth_unstable_by(lower, f32::total_cmp);
    let lower_value = f64::from(*lower_value);
    if frac == 0.0 || above.is_empty() {
        return lower_value;
    }

    let upper_value = above
        .iter()
        .copied()
        .min_by(f32::total_cmp)
        .map_or(lower_value, f64::from);
    lower_value + (upper_value - lower_value) * frac
}
