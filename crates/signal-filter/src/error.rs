//! Filter Error Types

use thiserror::Error;

/// Errors during filter design or application
#[derive(Debug, Clone, PartialEq, Error)]
pub enum FilterError {
    /// Signal is empty or contains non-finite samples
    #[error("Invalid input signal: {0}")]
    InvalidInput(String),

    /// Cutoffs must satisfy 0 < low < high < nyquist
    #[error("Invalid cutoff frequencies [{low}, {high}] Hz for nyquist {nyquist} Hz")]
    InvalidCutoff { low: f64, high: f64, nyquist: f64 },

    /// Filter order must be at least 1
    #[error("Invalid filter order: {0}")]
    InvalidOrder(usize),

    /// Sample rate must be finite and positive
    #[error("Invalid sample rate: {0}")]
    InvalidSampleRate(f64),

    /// Signal too short for the zero-phase padding of this filter
    #[error("Insufficient samples: got {len}, need more than {required}")]
    InsufficientSamples { len: usize, required: usize },
}
