//! Conversion configuration types

use crate::image_pipeline::common::error::{ConversionError, Result};
use crate::image_pipeline::raster::types::{ChannelLayout, RasterFormat};

/// Percentiles used as the normalization clipping range
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct PercentileBounds {
    /// Lower percentile, 0–100
    pub low: f64,
    /// Upper percentile, 0–100
    pub high: f64,
}

impl Default for PercentileBounds {
    fn default() -> Self {
        Self {
            low: 0.5,
            high: 99.5,
        }
    }
}

/// Optional contrast enhancement steps. Both are off by default.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct EnhanceConfig {
    /// Apply contrast limited adaptive histogram equalization
    pub equalize: bool,
    /// CLAHE clip limit, as the fraction of a tile's pixels one histogram bin may hold
    pub clip_limit: f32,
    /// CLAHE tile grid (columns, rows)
    pub tile_grid: (u32, u32),
    /// Apply an unsharp mask after equalization
    pub sharpen: bool,
    /// Gaussian sigma of the unsharp mask, in pixels
    pub sharpen_radius: f32,
    /// Unsharp mask strength (1.5 adds 150% of the detail layer)
    pub sharpen_amount: f32,
}

impl Default for EnhanceConfig {
    fn default() -> Self {
        Self {
            equalize: false,
            clip_limit: 2.0,
            tile_grid: (8, 8),
            sharpen: false,
            sharpen_radius: 1.0,
            sharpen_amount: 1.5,
        }
    }
}

/// Configuration for DICOM to raster conversion
#[derive(Debug, Clone)]
pub struct ConversionConfig {
    /// Apply the VOI LUT / window center-width transform
    pub apply_voi: bool,
    /// Normalization clipping percentiles
    pub percentiles: PercentileBounds,
    /// Upper bound on the longer raster side; `None` keeps the original size
    pub max_side: Option<u32>,
    /// Replace rasters that already exist
    pub overwrite: bool,
    /// Single channel or gray replicated into RGB
    pub channels: ChannelLayout,
    /// Record a manifest of converted files
    pub make_manifest: bool,
    pub enhance: EnhanceConfig,
    /// Output raster encoding
    pub format: RasterFormat,
    /// Whether to validate image dimensions before conversion
    pub validate_dimensions: bool,
}

impl Default for ConversionConfig {
    fn default() -> Self {
        Self {
            apply_voi: true,
            percentiles: PercentileBounds::default(),
            max_side: None,
            overwrite: true,
            channels: ChannelLayout::Mono,
            make_manifest: true,
            enhance: EnhanceConfig::default(),
            format: RasterFormat::Png,
            validate_dimensions: true,
        }
    }
}

impl ConversionConfig {
    pub fn builder() -> ConversionConfigBuilder {
        ConversionConfigBuilder::default()
    }

    /// Rejects settings the pipeline cannot honor.
    pub fn validate(&self) -> Result<()> {
        let PercentileBounds { low, high } = self.percentiles;
        if !(0.0..=100.0).contains(&low) || !(0.0..=100.0).contains(&high) || low >= high {
            return Err(ConversionError::InvalidConfig(format!(
                "percentiles must satisfy 0 <= low < high <= 100, got low={} high={}",
                low, high
            )));
        }

        if self.max_side == Some(0) {
            return Err(ConversionError::InvalidConfig(
                "max_side must be positive".to_string(),
            ));
        }

        let enhance = &self.enhance;
        if enhance.equalize {
            if !(enhance.clip_limit > 0.0) {
                return Err(ConversionError::InvalidConfig(format!(
                    "CLAHE clip limit must be positive, got {}",
                    enhance.clip_limit
                )));
            }
            if enhance.tile_grid.0 == 0 || enhance.tile_grid.1 == 0 {
                return Err(ConversionError::InvalidConfig(format!(
                    "CLAHE tile grid must be non-zero, got {:?}",
                    enhance.tile_grid
                )));
            }
        }

        if enhance.sharpen && !(enhance.sharpen_radius >= 0.0 && enhance.sharpen_amount >= 0.0) {
            return Err(ConversionError::InvalidConfig(format!(
                "unsharp radius and amount must be non-negative, got radius={} amount={}",
                enhance.sharpen_radius, enhance.sharpen_amount
            )));
        }

        Ok(())
    }
}

/// Builder for ConversionConfig
#[derive(Default)]
pub struct ConversionConfigBuilder {
    apply_voi: Option<bool>,
    percentiles: Option<PercentileBounds>,
    max_side: Option<Option<u32>>,
    overwrite: Option<bool>,
    channels: Option<ChannelLayout>,
    make_manifest: Option<bool>,
    enhance: Option<EnhanceConfig>,
    format: Option<RasterFormat>,
    validate_dimensions: Option<bool>,
}

impl ConversionConfigBuilder {
    pub fn apply_voi(mut self, enable: bool) -> Self {
        self.apply_voi = Some(enable);
        self
    }

    pub fn percentiles(mut self, low: f64, high: f64) -> Self {
        self.percentiles = Some(PercentileBounds { low, high });
        self
    }

    pub fn max_side(mut self, max_side: Option<u32>) -> Self {
        self.max_side = Some(max_side);
        self
    }

    pub fn overwrite(mut self, overwrite: bool) -> Self {
        self.overwrite = Some(overwrite);
        self
    }

    pub fn channels(mut self, channels: ChannelLayout) -> Self {
        self.channels = Some(channels);
        self
    }

    pub fn make_manifest(mut self, enable: bool) -> Self {
        self.make_manifest = Some(enable);
        self
    }

    pub fn enhance(mut self, enhance: EnhanceConfig) -> Self {
        self.enhance = Some(enhance);
        self
    }

    pub fn format(mut self, format: RasterFormat) -> Self {
        self.format = Some(format);
        self
    }

    pub fn validate_dimensions(mut self, validate: bool) -> Self {
        self.validate_dimensions = Some(validate);
        self
    }

    pub fn build(self) -> ConversionConfig {
        let default = ConversionConfig::default();
        ConversionConfig {
            apply_voi: self.apply_voi.unwrap_or(default.apply_voi),
            percentiles: self.percentiles.unwrap_or(default.percentiles),
            max_side: self.max_side.unwrap_or(default.max_side),
            overwrite: self.overwrite.unwrap_or(default.overwrite),
            channels: self.channels.unwrap_or(default.channels),
            make_manifest: self.make_manifest.unwrap_or(default.make_manifest),
            enhance: self.enhance.unwrap_or(default.enhance),
            format: self.format.unwrap_or(default.format),
            validate_dimensions: self.validate_dimensions.unwrap_or(default.validate_dimensions),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_match_reference_settings() {
        let config = ConversionConfig::default();
        assert!(config.apply_voi);
        assert_eq!(config.percentiles, PercentileBounds { low: 0.5, high: 99.5 });
        assert_eq!(config.max_side, None);
        assert!(config.overwrite);
        assert_eq!(config.channels, ChannelLayout::Mono);
        assert!(config.make_manifest);
        assert!(!config.enhance.equalize);
        assert!(!config.enhance.sharpen);
        assert!(config.validate().is_ok());
    }

    #[test]
    fn builder_overrides_fields() {
        let config = ConversionConfig::builder()
            .apply_voi(false)
            .percentiles(1.0, 99.0)
            .max_side(Some(2048))
            .overwrite(false)
            .channels(ChannelLayout::Replicated)
            .format(RasterFormat::Tiff)
            .build();

        assert!(!config.apply_voi);
        assert_eq!(config.percentiles.low, 1.0);
        assert_eq!(config.max_side, Some(2048));
        assert!(!config.overwrite);
        assert_eq!(config.channels, ChannelLayout::Replicated);
        assert_eq!(config.format, RasterFormat::Tiff);
        // untouched fields keep their defaults
        assert!(config.make_manifest);
    }

    #[test]
    fn rejects_inverted_percentiles() {
        let config = ConversionConfig::builder().percentiles(99.0, 1.0).build();
        assert!(matches!(config.validate(), Err(ConversionError::InvalidConfig(_))));

        let config = ConversionConfig::builder().percentiles(-1.0, 50.0).build();
        assert!(config.validate().is_err());
    }

    #[test]
    fn rejects_zero_max_side_and_tiles() {
        let config = ConversionConfig::builder().max_side(Some(0)).build();
        assert!(config.validate().is_err());

        let config = ConversionConfig::builder()
            .enhance(EnhanceConfig {
                equalize: true,
                tile_grid: (0, 8),
                ..EnhanceConfig::default()
            })
            .build();
        assert!(config.validate().is_err());
    }
}
