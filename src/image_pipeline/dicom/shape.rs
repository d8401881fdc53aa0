//! Reduction of decoded sample arrays to a single grayscale plane

use ndarray::{Array2, ArrayD, Axis, Ix2};

/// Leading axis sizes up to this value are treated as a frame axis.
const MAX_FRAME_AXIS: usize = 4;

/// Reduces a decoded sample array to one rows × columns plane.
///
/// A 3-D array whose leading axis is small is read as a frame stack and only
/// frame 0 is kept. Otherwise a trailing axis of 3 or 4 is read as color
/// channels, averaged over the first three. The frame check always wins, so
/// a tiny color image may be mistaken for a stack. A 4-D array
/// (frames × rows × columns × channels) with a small leading axis keeps
/// frame 0 and averages channels.
pub fn reduce_to_plane(samples: ArrayD<f64>) -> std::result::Result<Array2<f64>, String> {
    let shape = samples.shape().to_vec();
    let plane = match shape.len() {
        2 => samples,
        3 if shape[0] <= MAX_FRAME_AXIS => samples.index_axis_move(Axis(0), 0),
        3 if is_channel_axis(shape[2]) => average_channels(samples),
        4 if shape[0] <= MAX_FRAME_AXIS => average_channels(samples.index_axis_move(Axis(0), 0)),
        _ => return Err(format!("unsupported pixel array shape {:?}", shape)),
    };

    plane
        .into_dimensionality::<Ix2>()
        .map_err(|_| format!("unsupported pixel array shape {:?}", shape))
}

fn is_channel_axis(len: usize) -> bool {
    len == 3 || len == 4
}

fn average_channels(samples: ArrayD<f64>) -> ArrayD<f64> {
    let last = samples.ndim() - 1;
    let channels = samples.shape()[last].min(3);
    let color = samples.slice_axis(Axis(last), (0..channels).into());
    match color.mean_axis(Axis(last)) {
        Some(mean) => mean,
        None => samples.index_axis(Axis(last), 0).to_owned(),
    }
}
