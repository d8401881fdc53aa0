//! Decoded DICOM image types

use std::path::PathBuf;

use ndarray::Array2;

/// A metadata attribute read leniently from the data set.
#[derive(Debug, Clone, PartialEq)]
pub enum Attribute<T> {
    /// The data set does not carry the attribute
    Absent,
    Present(T),
    /// The attribute exists but could not be interpreted
    Malformed(String),
}

impl<T> Attribute<T> {
    pub fn present(&self) -> Option<&T> {
        match self {
            Attribute::Present(value) => Some(value),
            _ => None,
        }
    }
}

impl<T> Default for Attribute<T> {
    fn default() -> Self {
        Attribute::Absent
    }
}

/// Linear transform from stored values to physical units.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Rescale {
    pub slope: f64,
    pub intercept: f64,
}

impl Rescale {
    pub fn apply(&self, value: f64) -> f64 {
        value * self.slope + self.intercept
    }
}

/// Window center and width, in rescaled units.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct WindowLevel {
    pub center: f64,
    pub width: f64,
}

/// VOI LUT Function (0028,1056)
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum VoiLutFunction {
    #[default]
    Linear,
    LinearExact,
    Sigmoid,
}

/// First item of the VOI LUT Sequence (0028,3010).
#[derive(Debug, Clone, PartialEq)]
pub struct VoiLut {
    /// Input value mapped to the first LUT entry
    pub first_mapped: f64,
    pub data: Vec<f64>,
}

/// Photometric Interpretation (0028,0004)
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub enum Photometric {
    /// Minimum value displayed as white
    Monochrome1,
    /// Minimum value displayed as black
    Monochrome2,
    Other(String),
    #[default]
    Unknown,
}

impl Photometric {
    pub fn parse(value: &str) -> Self {
        match value.trim().to_ascii_uppercase().as_str() {
            "MONOCHROME1" => Photometric::Monochrome1,
            "MONOCHROME2" => Photometric::Monochrome2,
            "" => Photometric::Unknown,
            other => Photometric::Other(other.to_string()),
        }
    }

    pub fn is_inverted(&self) -> bool {
        matches!(self, Photometric::Monochrome1)
    }

    pub fn is_monochrome(&self) -> bool {
        matches!(self, Photometric::Monochrome1 | Photometric::Monochrome2)
    }
}

/// One DICOM file after pixel decoding.
///
/// `pixels` holds the samples after multi-frame/channel reduction (rows × columns).
#[derive(Debug, Clone)]
pub struct SourceImage {
    pub path: PathBuf,
    pub pixels: Array2<f64>,
    pub photometric: Photometric,
    pub rescale: Attribute<Rescale>,
    pub windows: Attribute<Vec<WindowLevel>>,
    pub voi_lut: Attribute<VoiLut>,
    pub voi_lut_function: VoiLutFunction,
    pub bits_stored: u16,
    pub signed: bool,
    pub number_of_frames: u32,
    pub instance_uid: Option<String>,
    pub transfer_syntax: Option<String>,
}

impl SourceImage {
    /// A bare monochrome image with no calibration metadata.
    pub fn from_pixels(path: impl Into<PathBuf>, pixels: Array2<f64>) -> Self {
        Self {
            path: path.into(),
            pixels,
            photometric: Photometric::Monochrome2,
            rescale: Attribute::Absent,
            windows: Attribute::Absent,
            voi_lut: Attribute::Absent,
            voi_lut_function: VoiLutFunction::Linear,
            bits_stored: 16,
            signed: false,
            number_of_frames: 1,
            instance_uid: None,
            transfer_syntax: None,
        }
    }

    /// Range of values representable with the stored bit depth.
    pub fn stored_range(&self) -> (f64, f64) {
        let bits = i32::from(self.bits_stored.clamp(1, 32));
        if self.signed {
            (-(2f64.powi(bits - 1)), 2f64.powi(bits - 1) - 1.0)
        } else {
            (0.0, 2f64.powi(bits) - 1.0)
        }
    }
}
