//! Feature Extraction Error Types

use signal_filter::FilterError;
use sleep_dataset::DatasetError;
use thiserror::Error;

/// Errors while extracting features from one signal
#[derive(Debug, Error)]
pub enum FeatureError {
    /// Channel has no band mapping
    #[error("Unsupported channel type for multiband features: {0}")]
    UnsupportedChannel(String),

    /// Nothing to extract from
    #[error("Signal is empty")]
    EmptySignal,

    /// NaN or infinite sample
    #[error("Non-finite sample at index {index}")]
    NonFiniteSignal { index: usize },

    /// Sub-band filtering failed
    #[error("Filtering band {band} failed: {source}")]
    Filter {
        band: String,
        #[source]
        source: FilterError,
    },
}

/// Errors while building a feature matrix from a dataset
#[derive(Debug, Error)]
pub enum BuildError {
    /// Schema or grouping problem in the input table
    #[error(transparent)]
    Dataset(#[from] DatasetError),

    /// Feature extraction failed for one file
    #[error("Feature extraction failed for file {file}: {source}")]
    Group {
        file: String,
        #[source]
        source: FeatureError,
    },

    /// Extractor could not be set up for the sample rate and channel
    #[error("Feature extractor setup failed: {0}")]
    Extractor(#[from] FeatureError),

    /// A file produced a different feature key set
    #[error("File {file} produced a feature set that differs from the first file")]
    SchemaMismatch { file: String },

    /// Requested feature column does not exist
    #[error("Unknown feature column: {0}")]
    UnknownFeature(String),

    /// No file groups to build from
    #[error("Dataset has no file groups")]
    Empty,

    /// Matrix shape error
    #[error("Matrix shape error: {0}")]
    Shape(#[from] ndarray::ShapeError),

    /// CSV output failure
    #[error("CSV error: {0}")]
    Csv(#[from] csv::Error),

    /// Filesystem failure on output
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}
