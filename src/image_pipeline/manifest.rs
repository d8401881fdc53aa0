//! Manifest of converted files
//!
//! One row per written raster, correlating it with the SOP Instance UID of
//! its source. Rows are collected during a batch and flushed once at the end.

use std::path::{Path, PathBuf};

use serde::Serialize;
use tracing::debug;

use crate::image_pipeline::common::error::{ConversionError, Result};

pub const MANIFEST_FILE_NAME: &str = "manifest.csv";

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ManifestEntry {
    /// Empty when the source carries no SOP Instance UID
    pub sop_instance_uid: String,
    pub png_path: String,
    /// Source path relative to the input root
    pub src_rel: String,
}

impl ManifestEntry {
    pub fn new(instance_uid: Option<&str>, raster_path: &Path, source_rel: &Path) -> Self {
        Self {
            sop_instance_uid: instance_uid.unwrap_or_default().to_string(),
            png_path: raster_path.display().to_string(),
            src_rel: source_rel.display().to_string(),
        }
    }
}

#[derive(Debug, Default)]
pub struct Manifest {
    entries: Vec<ManifestEntry>,
}

impl Manifest {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn push(&mut self, entry: ManifestEntry) {
        self.entries.push(entry);
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Writes `manifest.csv` into `output_root` and returns its path.
    pub fn write_to_dir(&self, output_root: &Path) -> Result<PathBuf> {
        let path = output_root.join(MANIFEST_FILE_NAME);
        self.write_csv(&path)?;
        Ok(path)
    }

    pub fn write_csv(&self, path: &Path) -> Result<()> {
        let manifest_err = |e: csv::Error| ConversionError::ManifestError(format!("{}: {}", path.display(), e));

        let mut writer = csv::Writer::from_path(path).map_err(manifest_err)?;
        if self.entries.is_empty() {
            writer
                .write_record(["sop_instance_uid", "png_path", "src_rel"])
                .map_err(manifest_err)?;
        }
        for entry in &self.entries {
            writer.serialize(entry).map_err(manifest_err)?;
        }
        writer
            .flush()
            .map_err(|e| ConversionError::ManifestError(format!("{}: {}", path.display(), e)))?;

        debug!(path = %path.display(), rows = self.entries.len(), "Manifest written");
        Ok(())
    }
}
