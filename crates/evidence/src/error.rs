//! Error types for the evidence library.

use std::path::PathBuf;
use thiserror::Error;

/// Main error type for evidence operations.
#[derive(Debug, Error)]
pub enum EvidenceError {
    /// Empty or malformed argument set (no studies, non-binary treatment, bad SE).
    #[error("Invalid input: {0}")]
    InvalidInput(String),

    /// A named column is not present in the table.
    #[error("Column '{column}' not found")]
    MissingColumn { column: String },

    /// A required fitting capability is not configured.
    #[error("Dependency unavailable: {0}")]
    DependencyUnavailable(String),

    /// A numeric routine could not produce a result (singular system, no convergence).
    #[error("Degenerate computation: {0}")]
    ComputationDegenerate(String),

    /// Error reading or accessing a file.
    #[error("IO error for '{path}': {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// Error parsing CSV/TSV data.
    #[error("Parse error at row {row}, column {column}: {message}")]
    Parse {
        row: usize,
        column: usize,
        message: String,
    },

    /// Error from the CSV library.
    #[error("CSV error: {0}")]
    Csv(#[from] csv::Error),

    /// Empty file or no data to analyze.
    #[error("Empty data: {0}")]
    EmptyData(String),

    /// JSON serialization/deserialization error.
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
}

impl EvidenceError {
    /// Shorthand for a missing column error.
    pub fn missing_column(column: impl Into<String>) -> Self {
        EvidenceError::MissingColumn {
            column: column.into(),
        }
    }
}

/// Result type alias for evidence operations.
pub type Result<T> = std::result::Result<T, EvidenceError>;
