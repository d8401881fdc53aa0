//! Per-file and per-batch conversion results

use std::path::PathBuf;

use crate::image_pipeline::calibration::CalibrationReport;

/// Result of pushing one source file through the pipeline.
#[derive(Debug, Clone)]
pub enum ConversionOutcome {
    /// The raster was written.
    Converted {
        /// SOP Instance UID of the source, when the file carries one
        instance_uid: Option<String>,
        /// Which calibration steps ran, were skipped or degraded
        report: CalibrationReport,
    },
    /// The destination already exists and overwriting is disabled.
    Skipped,
    /// Decoding, encoding or writing failed for this file only.
    Failed {
        message: String,
        /// Transfer syntax UID of the payload, when the failure happened while decoding it
        transfer_syntax: Option<String>,
    },
}

impl ConversionOutcome {
    pub fn is_converted(&self) -> bool {
        matches!(self, ConversionOutcome::Converted { .. })
    }

    pub fn is_skipped(&self) -> bool {
        matches!(self, ConversionOutcome::Skipped)
    }

    pub fn is_failed(&self) -> bool {
        matches!(self, ConversionOutcome::Failed { .. })
    }
}

/// Aggregate counts for a directory run.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct BatchSummary {
    pub total: usize,
    pub converted: usize,
    pub skipped: usize,
    pub failed: usize,
    /// Location of the manifest, if one was written
    pub manifest: Option<PathBuf>,
}

impl BatchSummary {
    pub fn record(&mut self, outcome: &ConversionOutcome) {
        self.total += 1;
        match outcome {
            ConversionOutcome::Converted { .. } => self.converted += 1,
            ConversionOutcome::Skipped => self.skipped += 1,
            ConversionOutcome::Failed { .. } => self.failed += 1,
        }
    }
}
