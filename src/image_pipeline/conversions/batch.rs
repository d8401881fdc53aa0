use std::path::{Path, PathBuf};

use tracing::{debug, error, info, warn};
use walkdir::WalkDir;

use crate::image_pipeline::{
    common::error::{ConversionError, Result},
    common::outcome::{BatchSummary, ConversionOutcome},
    conversions::DicomToRasterPipeline,
    dicom::{is_dicom, DicomReader},
    manifest::{Manifest, ManifestEntry},
    raster::{RasterFormat, RasterWriter},
};

/// Destination of `relative` under `output_root`.
///
/// The source extension is replaced by the raster extension; names without
/// one get it appended.
pub fn output_path_for(output_root: &Path, relative: &Path, format: RasterFormat) -> PathBuf {
    output_root.join(relative).with_extension(format.extension())
}

/// Converts every DICOM file under `input_root`, mirroring the tree under
/// `output_root`.
///
/// Files are visited sequentially in file name order. Per-file failures are
/// logged and counted; only an unreadable input root or an uncreatable
/// output root abort the run.
pub fn run_batch<R: DicomReader, W: RasterWriter>(
    pipeline: &DicomToRasterPipeline<R, W>,
    input_root: &Path,
    output_root: &Path,
) -> Result<BatchSummary> {
    let config = pipeline.config();

    let metadata = std::fs::metadata(input_root)
        .map_err(|e| ConversionError::WalkError(format!("{}: {}", input_root.display(), e)))?;
    if !metadata.is_dir() {
        return Err(ConversionError::WalkError(format!(
            "{}: not a directory",
            input_root.display()
        )));
    }
    std::fs::create_dir_all(output_root).map_err(|e| {
        ConversionError::OutputWriteError(format!("{}: {}", output_root.display(), e))
    })?;
    // manifest rows carry absolute raster paths
    let output_root = std::path::absolute(output_root).map_err(|e| {
        ConversionError::OutputWriteError(format!("{}: {}", output_root.display(), e))
    })?;
    let output_root = output_root.as_path();

    info!(
        input = %input_root.display(),
        output = %output_root.display(),
        format = ?config.format,
        "Starting batch conversion"
    );

    let mut summary = BatchSummary::default();
    let mut manifest = Manifest::new();

    for entry in WalkDir::new(input_root).sort_by_file_name() {
        let entry = match entry {
            Ok(entry) => entry,
            Err(e) if e.depth() == 0 => return Err(ConversionError::WalkError(e.to_string())),
            Err(e) => {
                warn!("Skipping unreadable entry: {}", e);
                continue;
            }
        };

        // follows symlinks, unlike the entry's own file type
        if !entry.path().is_file() || !is_dicom(entry.path()) {
            continue;
        }

        let source = entry.path();
        let relative = source.strip_prefix(input_root).unwrap_or(source);
        let output = output_path_for(output_root, relative, config.format);

        let outcome = pipeline.process_file(source, &output);
        match &outcome {
            ConversionOutcome::Converted { instance_uid, report } => {
                if report.is_degraded() {
                    debug!(src = %relative.display(), ?report, "Converted with degraded calibration");
                }
                if config.make_manifest {
                    manifest.push(ManifestEntry::new(instance_uid.as_deref(), &output, relative));
                }
            }
            ConversionOutcome::Skipped => debug!(src = %relative.display(), "Skipped"),
            ConversionOutcome::Failed { message, .. } => {
                error!(src = %relative.display(), "{}", message)
            }
        }
        summary.record(&outcome);
    }

    if config.make_manifest && !manifest.is_empty() {
        match manifest.write_to_dir(output_root) {
            Ok(path) => {
                info!(path = %path.display(), rows = manifest.len(), "Manifest written");
                summary.manifest = Some(path);
            }
            Err(e) => warn!("{}", e),
        }
    }

    info!(
        total = summary.total,
        converted = summary.converted,
        skipped = summary.skipped,
        failed = summary.failed,
        "Batch complete"
    );
    Ok(summary)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn dicom_extension_is_replaced() {
        let out = output_path_for(Path::new("/out"), Path::new("a/b/scan.DCM"), RasterFormat::Png);
        assert_eq!(out, PathBuf::from("/out/a/b/scan.png"));

        let out = output_path_for(Path::new("/out"), Path::new("scan.dicom"), RasterFormat::Tiff);
        assert_eq!(out, PathBuf::from("/out/scan.tiff"));
    }

    #[test]
    fn any_extension_is_replaced() {
        let out = output_path_for(Path::new("/out"), Path::new("a/scan.IMA"), RasterFormat::Png);
        assert_eq!(out, PathBuf::from("/out/a/scan.png"));
    }

    #[test]
    fn dotted_uid_names_lose_their_last_component() {
        let out = output_path_for(Path::new("/out"), Path::new("1.2.840.113619.1"), RasterFormat::Png);
        assert_eq!(out, PathBuf::from("/out/1.2.840.113619.png"));
    }

    #[test]
    fn extensionless_names_get_raster_extension() {
        let out = output_path_for(Path::new("out"), Path::new("IM0001"), RasterFormat::Png);
        assert_eq!(out, PathBuf::from("out/IM0001.png"));
    }
}
