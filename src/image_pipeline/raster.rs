//! Raster writing module
//!
//! This module encodes normalized 8-bit rasters as PNG or TIFF, in mono or
//! channel-replicated RGB layout.

mod writer;
mod standard_raster_writer;
pub mod types;

pub use writer::RasterWriter;
pub use standard_raster_writer::StandardRasterWriter;
pub use types::{ChannelLayout, RasterFormat};
