//! Optional contrast enhancement
//!
//! Adaptive histogram equalization is only compiled in with the `clahe`
//! feature. Whether it is available is resolved once, when the enhancer is
//! built, and a missing capability downgrades the step to a warning.

#[cfg(feature = "clahe")]
pub mod clahe;
pub mod unsharp;

#[cfg(feature = "clahe")]
pub use self::clahe::ClaheEqualizer;
pub use unsharp::unsharp_mask;

use image::GrayImage;
use tracing::{debug, warn};

use crate::image_pipeline::config::EnhanceConfig;

/// Adaptive equalization support in this build.
#[derive(Debug, Clone, Copy)]
pub enum EqualizerCapability {
    #[cfg(feature = "clahe")]
    Available(ClaheEqualizer),
    Unavailable,
}

impl EqualizerCapability {
    pub fn detect() -> Self {
        #[cfg(feature = "clahe")]
        {
            EqualizerCapability::Available(ClaheEqualizer)
        }
        #[cfg(not(feature = "clahe"))]
        {
            EqualizerCapability::Unavailable
        }
    }

    pub fn is_available(&self) -> bool {
        !matches!(self, EqualizerCapability::Unavailable)
    }
}

/// Runs the configured enhancement steps: equalization, then sharpening.
#[derive(Debug, Clone)]
pub struct Enhancer {
    config: EnhanceConfig,
    equalizer: EqualizerCapability,
}

impl Enhancer {
    pub fn new(config: EnhanceConfig) -> Self {
        Self::with_capability(config, EqualizerCapability::detect())
    }

    pub fn with_capability(config: EnhanceConfig, equalizer: EqualizerCapability) -> Self {
        if config.equalize && !equalizer.is_available() {
            warn!("Adaptive equalization requested but not built in (feature `clahe`); skipping it");
        }
        Self { config, equalizer }
    }

    pub fn config(&self) -> &EnhanceConfig {
        &self.config
    }

    pub fn apply(&self, raster: GrayImage) -> GrayImage {
        let mut out = raster;

        if self.config.equalize {
            match &self.equalizer {
                #[cfg(feature = "clahe")]
                EqualizerCapability::Available(equalizer) => {
                    let _span = tracing::info_span!("clahe").entered();
                    out = equalizer.equalize(&out, self.config.clip_limit, self.config.tile_grid);
                }
                EqualizerCapability::Unavailable => debug!("Skipping adaptive equalization"),
            }
        }

        if self.config.sharpen {
            let _span = tracing::info_span!("unsharp_mask").entered();
            out = unsharp_mask(&out, self.config.sharpen_radius, self.config.sharpen_amount);
        }

        out
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use image::Luma;

    fn ramp() -> GrayImage {
        GrayImage::from_fn(40, 30, |x, y| Luma([(100 + (x + y) % 30) as u8]))
    }

    #[test]
    fn disabled_steps_are_identity() {
        let enhancer = Enhancer::new(EnhanceConfig::default());
        assert_eq!(enhancer.apply(ramp()), ramp());
    }

    #[test]
    fn unavailable_equalizer_is_skipped() {
        let config = EnhanceConfig {
            equalize: true,
            ..EnhanceConfig::default()
        };
        let enhancer = Enhancer::with_capability(config, EqualizerCapability::Unavailable);
        assert_eq!(enhancer.apply(ramp()), ramp());
    }

    #[test]
    fn sharpening_runs_without_equalization() {
        let config = EnhanceConfig {
            sharpen: true,
            ..EnhanceConfig::default()
        };
        let enhancer = Enhancer::with_capability(config, EqualizerCapability::Unavailable);
        let raster = GrayImage::from_fn(32, 8, |x, _| Luma([if x < 16 { 80 } else { 170 }]));
        let out = enhancer.apply(raster.clone());
        assert_eq!(out.dimensions(), raster.dimensions());
        assert_ne!(out, raster);
    }

    #[cfg(feature = "clahe")]
    #[test]
    fn equalization_runs_before_sharpening() {
        let config = EnhanceConfig {
            equalize: true,
            sharpen: true,
            ..EnhanceConfig::default()
        };
        let enhancer = Enhancer::new(config);
        let expected = unsharp_mask(
            &ClaheEqualizer.equalize(&ramp(), config.clip_limit, config.tile_grid),
            config.sharpen_radius,
            config.sharpen_amount,
        );
        assert_eq!(enhancer.apply(ramp()), expected);
    }
}
