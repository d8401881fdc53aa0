//! Calibration result types

use ndarray::Array2;

/// What happened to one best-effort calibration step.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub enum StepStatus {
    /// The transform ran and its output replaced the samples
    Applied,
    /// The data set carries nothing for this step
    #[default]
    NotPresent,
    /// Turned off by configuration
    Disabled,
    /// The transform could not run; samples were left as they were
    Degraded(String),
}

impl StepStatus {
    pub fn is_degraded(&self) -> bool {
        matches!(self, StepStatus::Degraded(_))
    }
}

/// Per-step record of a calibration run.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct CalibrationReport {
    pub rescale: StepStatus,
    pub voi: StepStatus,
}

impl CalibrationReport {
    /// True when any step fell back to less-calibrated data.
    pub fn is_degraded(&self) -> bool {
        self.rescale.is_degraded() || self.voi.is_degraded()
    }
}

/// Calibrated intensities of a single frame.
#[derive(Debug, Clone)]
pub struct CalibratedFrame {
    /// Intensities, rows × columns
    pub values: Array2<f32>,
    /// Whether low values should render bright (MONOCHROME1)
    pub inverted: bool,
    pub report: CalibrationReport,
}

