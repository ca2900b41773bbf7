//! Error types for the filtering pipeline

use std::path::PathBuf;

use thiserror::Error;

/// Fatal pipeline errors. Any of these aborts the whole run.
#[derive(Error, Debug)]
pub enum PipelineError {
    #[error("expected file '{}' but it was not found", .path.display())]
    MissingSource { path: PathBuf },

    #[error("file '{}' is missing required columns: {missing:?}. Found columns: {found:?}", .path.display())]
    MissingColumns {
        path: PathBuf,
        missing: Vec<String>,
        found: Vec<String>,
    },

    #[error("file '{}' line {line}: column '{column}' is not an integer identifier: {value:?}", .path.display())]
    MalformedField {
        path: PathBuf,
        line: u64,
        column: String,
        value: String,
    },

    #[error("CSV error: {0}")]
    Csv(#[from] csv::Error),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

/// Result type alias for pipeline operations
pub type Result<T> = std::result::Result<T, PipelineError>;
