//! Feature Engineering Engine
//!
//! Time-domain statistics and Welch-spectrum shape features for single-channel
//! sleep recordings, optionally repeated over per-channel frequency bands, and
//! a builder that turns a labeled sample table into one feature row per file.

mod bands;
mod builder;
mod error;
mod features;
mod spectral;
mod statistics;
mod welch;

pub use bands::{ChannelType, FrequencyBand};
pub use builder::{build, FeatureMatrix};
pub use error::{BuildError, FeatureError};
pub use features::{
    extract, extract_multiband, FeatureExtractor, FeatureVector, BAND_FILTER_ORDER,
    FEATURES_PER_SIGNAL,
};
pub use spectral::{SpectralFeatures, ROLLOFF_FRACTION, SPECTRAL_EPSILON};
pub use statistics::StatisticalFeatures;
pub use welch::{PowerSpectrum, WelchEstimator, DEFAULT_SEGMENT_LENGTH};
