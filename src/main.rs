use std::path::PathBuf;

use anyhow::{Context, Result};
use clap::{Parser, ValueEnum};
use dicom_raster_rs::image_pipeline::{
    run_batch, ChannelLayout, ConversionConfig, DicomToRasterPipeline, EnhanceConfig, RasterFormat,
};
use dicom_raster_rs::logger;

use tracing::info;

#[derive(Parser, Debug)]
#[command(
    name = "dicom_raster",
    about = "Convert a tree of DICOM radiographs into normalized 8-bit rasters plus a manifest."
)]
struct Cli {
    /// Directory scanned recursively for DICOM files
    #[arg(value_name = "INPUT")]
    input: PathBuf,

    /// Output root; the input tree is mirrored under it
    #[arg(value_name = "OUTPUT")]
    output: PathBuf,

    /// Skip the VOI LUT / window center-width transform
    #[arg(long)]
    no_voi: bool,

    /// Lower clipping percentile
    #[arg(long, default_value_t = 0.5)]
    p_low: f64,

    /// Upper clipping percentile
    #[arg(long, default_value_t = 99.5)]
    p_high: f64,

    /// Downsample so the longer side is at most this many pixels
    #[arg(long)]
    max_side: Option<u32>,

    /// Keep rasters that already exist
    #[arg(long)]
    no_overwrite: bool,

    /// Write 3-channel RGB with the gray value replicated
    #[arg(long)]
    rgb: bool,

    /// Do not write manifest.csv
    #[arg(long)]
    no_manifest: bool,

    /// Apply contrast limited adaptive histogram equalization
    #[arg(long)]
    clahe: bool,

    /// CLAHE clip limit, as a fraction of the pixels in one tile (>= 1 disables clipping)
    #[arg(long, default_value_t = 2.0)]
    clahe_clip: f32,

    /// CLAHE tile grid, COLSxROWS
    #[arg(long, default_value = "8x8", value_parser = parse_tiles)]
    clahe_tiles: (u32, u32),

    /// Apply an unsharp mask after equalization
    #[arg(long)]
    unsharp: bool,

    /// Unsharp mask Gaussian sigma in pixels
    #[arg(long, default_value_t = 1.0)]
    unsharp_radius: f32,

    /// Unsharp mask strength (1.5 = 150%)
    #[arg(long, default_value_t = 1.5)]
    unsharp_amount: f32,

    /// Output raster format
    #[arg(long, value_enum, default_value = "png")]
    format: FormatArg,
}

#[derive(Copy, Clone, Debug, ValueEnum)]
enum FormatArg {
    Png,
    Tiff,
}

impl From<FormatArg> for RasterFormat {
    fn from(arg: FormatArg) -> Self {
        match arg {
            FormatArg::Png => RasterFormat::Png,
            FormatArg::Tiff => RasterFormat::Tiff,
        }
    }
}

fn parse_tiles(value: &str) -> std::result::Result<(u32, u32), String> {
    let (cols, rows) = value
        .split_once(['x', 'X'])
        .ok_or_else(|| format!("expected COLSxROWS, got {value:?}"))?;
    let cols = cols.trim().parse::<u32>().map_err(|e| e.to_string())?;
    let rows = rows.trim().parse::<u32>().map_err(|e| e.to_string())?;
    Ok((cols, rows))
}

impl Cli {
    fn config(&self) -> ConversionConfig {
        ConversionConfig::builder()
            .apply_voi(!self.no_voi)
            .percentiles(self.p_low, self.p_high)
            .max_side(self.max_side)
            .overwrite(!self.no_overwrite)
            .channels(if self.rgb {
                ChannelLayout::Replicated
            } else {
                ChannelLayout::Mono
            })
            .make_manifest(!self.no_manifest)
            .enhance(EnhanceConfig {
                equalize: self.clahe,
                clip_limit: self.clahe_clip,
                tile_grid: self.clahe_tiles,
                sharpen: self.unsharp,
                sharpen_radius: self.unsharp_radius,
                sharpen_amount: self.unsharp_amount,
            })
            .format(self.format.into())
            .build()
    }
}

fn main() -> Result<()> {
    let cli = Cli::parse();
    logger::init();

    let pipeline = DicomToRasterPipeline::new(cli.config()).context("invalid configuration")?;

    info!("DICOM to raster pipeline initialized");
    info!("Format: {:?}, channels: {:?}", pipeline.config().format, pipeline.config().channels);

    let summary = run_batch(&pipeline, &cli.input, &cli.output)
        .with_context(|| format!("converting {}", cli.input.display()))?;

    println!(
        "Done. total={} converted={} skipped={} failed={}",
        summary.total, summary.converted, summary.skipped, summary.failed
    );
    println!("Raster root: {}", cli.output.display());
    if let Some(manifest) = &summary.manifest {
        println!("Manifest: {}", manifest.display());
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_map_to_default_config() {
        let cli = Cli::parse_from(["dicom_raster", "in", "out"]);
        let config = cli.config();
        let default = ConversionConfig::default();
        assert_eq!(config.apply_voi, default.apply_voi);
        assert_eq!(config.percentiles, default.percentiles);
        assert_eq!(config.max_side, None);
        assert_eq!(config.enhance, default.enhance);
        assert_eq!(config.format, RasterFormat::Png);
    }

    #[test]
    fn flags_map_onto_config() {
        let cli = Cli::parse_from([
            "dicom_raster", "in", "out", "--no-voi", "--max-side", "1024", "--rgb", "--clahe",
            "--clahe-tiles", "4x6", "--format", "tiff", "--no-overwrite",
        ]);
        let config = cli.config();
        assert!(!config.apply_voi);
        assert_eq!(config.max_side, Some(1024));
        assert_eq!(config.channels, ChannelLayout::Replicated);
        assert!(config.enhance.equalize);
        assert_eq!(config.enhance.tile_grid, (4, 6));
        assert_eq!(config.format, RasterFormat::Tiff);
        assert!(!config.overwrite);
    }

    #[test]
    fn malformed_tiles_are_rejected() {
        assert!(parse_tiles("8").is_err());
        assert!(parse_tiles("ax8").is_err());
        assert_eq!(parse_tiles("16X2"), Ok((16, 2)));
    }
}
