//! Error types for dataset loading

use std::path::PathBuf;
use thiserror::Error;

/// A dataset could not be turned into a RecordSet.
///
/// This is the only failure the pipeline surfaces; callers treat the
/// affected domain as unavailable.
#[derive(Debug, Error)]
pub enum DataLoadError {
    #[error("failed to read {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("malformed CSV: {0}")]
    Csv(#[from] csv::Error),

    #[error("source has no header row")]
    MissingHeader,

    #[error("required column '{column}' is missing")]
    MissingColumn { column: String },

    #[error("line {line}: column '{column}' has non-numeric value '{value}'")]
    InvalidNumber {
        line: u64,
        column: String,
        value: String,
    },
}
