//! Raster output types

/// Output raster encodings
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RasterFormat {
    /// PNG, best compression with adaptive filtering (default)
    Png,
    /// TIFF, Deflate with horizontal predictor
    Tiff,
}

impl RasterFormat {
    /// File extension without the leading dot
    pub fn extension(&self) -> &'static str {
        match self {
            RasterFormat::Png => "png",
            RasterFormat::Tiff => "tiff",
        }
    }
}

/// Channel layout of the written raster
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ChannelLayout {
    /// Single gray channel
    Mono,
    /// Gray copied into R, G and B, for consumers that expect 3 channels
    Replicated,
}

impl ChannelLayout {
    pub fn channels(&self) -> usize {
        match self {
            ChannelLayout::Mono => 1,
            ChannelLayout::Replicated => 3,
        }
    }
}
