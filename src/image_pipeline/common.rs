//! Common utilities module
//!
//! This module contains the error type and per-file outcome shared across the pipeline.

pub mod error;
pub mod outcome;

pub use error::{ConversionError, Result};
pub use outcome::{BatchSummary, ConversionOutcome};
