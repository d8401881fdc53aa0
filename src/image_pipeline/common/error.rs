use std::path::PathBuf;

use thiserror::Error;

#[derive(Error, Debug)]
pub enum ConversionError {
    #[error("Failed to write output file: {0}")]
    OutputWriteError(String),

    #[error("Failed to decode DICOM {}: {message} (TS={})", path.display(), transfer_syntax.as_deref().unwrap_or("unknown"))]
    DecodeError {
        path: PathBuf,
        transfer_syntax: Option<String>,
        message: String,
    },

    #[error("Failed to encode raster image: {0}")]
    EncodeError(String),

    #[error("Invalid image dimensions: width={0}, height={1}")]
    InvalidDimensions(usize, usize),

    #[error("Unsupported format: {0}")]
    UnsupportedFormat(String),

    #[error("Invalid configuration: {0}")]
    InvalidConfig(String),

    #[error("Failed to write manifest: {0}")]
    ManifestError(String),

    #[error("Failed to walk input directory: {0}")]
    WalkError(String),

    #[error("IO error: {0}")]
    IoError(#[from] std::io::Error),
}

impl ConversionError {
    /// Transfer syntax of the payload that failed to decode, if known.
    pub fn transfer_syntax(&self) -> Option<&str> {
        match self {
            ConversionError::DecodeError { transfer_syntax, .. } => transfer_syntax.as_deref(),
            _ => None,
        }
    }
}

pub type Result<T> = std::result::Result<T, ConversionError>;
