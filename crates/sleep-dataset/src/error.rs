//! Dataset Error Types

use std::path::PathBuf;
use thiserror::Error;

/// Errors while loading, reshaping or grouping a labeled dataset
#[derive(Debug, Error)]
pub enum DatasetError {
    /// Column not present in the table
    #[error("Missing required column: {0}")]
    MissingColumn(String),

    /// Column present but of the wrong kind
    #[error("Column {column} is not {expected}")]
    ColumnType {
        column: String,
        expected: &'static str,
    },

    /// Column length disagrees with the table
    #[error("Column {column} has {actual} rows, expected {expected}")]
    LengthMismatch {
        column: String,
        expected: usize,
        actual: usize,
    },

    /// Two columns share a name
    #[error("Duplicate column: {0}")]
    DuplicateColumn(String),

    /// Tables with different column layouts cannot be concatenated
    #[error("Schema mismatch: {0}")]
    SchemaMismatch(String),

    /// Rows of one file disagree on a per-file value
    #[error("File {file} has more than one value in column {column}")]
    InconsistentGroup { file: String, column: String },

    /// A per-file transform failed
    #[error("Transform failed for file {file}: {message}")]
    Transform { file: String, message: String },

    /// No rows where at least one is required
    #[error("Dataset is empty")]
    Empty,

    /// CSV parse or write failure
    #[error("CSV error: {0}")]
    Csv(#[from] csv::Error),

    /// Filesystem failure with the offending path
    #[error("I/O error at {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
}
