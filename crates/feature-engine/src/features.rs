//! Feature Vector Assembly

use crate::bands::{ChannelType, FrequencyBand};
use crate::error::FeatureError;
use crate::spectral::SpectralFeatures;
use crate::statistics::StatisticalFeatures;
use crate::welch::WelchEstimator;
use serde::{Deserialize, Serialize};
use signal_filter::{BandpassSpec, ButterworthBandpass};
use tracing::{debug, trace};

/// Number of features computed per (sub-)signal
pub const FEATURES_PER_SIGNAL: usize = StatisticalFeatures::NAMES.len() + SpectralFeatures::NAMES.len();

/// Butterworth order used for sub-band filtering
pub const BAND_FILTER_ORDER: usize = 4;

/// Named scalar features of one recording, in a fixed key order
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct FeatureVector {
    names: Vec<String>,
    values: Vec<f64>,
}

impl FeatureVector {
    /// Create an empty vector
    pub fn new() -> Self {
        Self::default()
    }

    /// Append a named feature
    pub fn push(&mut self, name: impl Into<String>, value: f64) {
        self.names.push(name.into());
        self.values.push(value);
    }

    /// Look up a feature by name
    pub fn get(&self, name: &str) -> Option<f64> {
        self.names
            .iter()
            .position(|n| n == name)
            .map(|idx| self.values[idx])
    }

    /// Feature names, in order
    pub fn names(&self) -> &[String] {
        &self.names
    }

    /// Feature values, in the order of [`Self::names`]
    pub fn values(&self) -> &[f64] {
        &self.values
    }

    /// Number of features
    pub fn len(&self) -> usize {
        self.values.len()
    }

    /// Check if no features are present
    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }

    /// Iterate `(name, value)` pairs
    pub fn iter(&self) -> impl Iterator<Item = (&str, f64)> {
        self.names.iter().map(String::as_str).zip(self.values.iter().copied())
    }

    /// Append the statistical and spectral block of `signal`
    fn append_signal(&mut self, welch: &mut WelchEstimator, prefix: Option<&str>, signal: &[f64]) {
        let stats = StatisticalFeatures::compute(signal);
        let spectral = SpectralFeatures::compute(&welch.estimate(signal));
        self.push_all(prefix, &StatisticalFeatures::NAMES, &stats.values());
        self.push_all(prefix, &SpectralFeatures::NAMES, &spectral.values());
    }

    fn push_all(&mut self, prefix: Option<&str>, names: &[&str], values: &[f64]) {
        for (name, &value) in names.iter().zip(values) {
            match prefix {
                Some(prefix) => self.push(format!("{}_{}", prefix, name), value),
                None => self.push(*name, value),
            }
        }
    }
}

/// Feature extractor for single-channel recordings
pub struct FeatureExtractor {
    /// Welch PSD estimator
    welch: WelchEstimator,
    /// One designed filter per band
    band_filters: Vec<(FrequencyBand, ButterworthBandpass)>,
}

impl FeatureExtractor {
    /// Create a new extractor producing the 14 global features
    pub fn new(sample_rate: f64) -> Self {
        Self {
            welch: WelchEstimator::new(sample_rate),
            band_filters: Vec::new(),
        }
    }

    /// Create an extractor that also computes per-band features for `channel`
    pub fn multiband(sample_rate: f64, channel: ChannelType) -> Result<Self, FeatureError> {
        let band_filters = channel
            .bands()
            .iter()
            .map(|band| {
                let spec = BandpassSpec::new(band.low, band.high).with_order(BAND_FILTER_ORDER);
                ButterworthBandpass::design(spec, sample_rate)
                    .map(|filter| (*band, filter))
                    .map_err(|source| FeatureError::Filter {
                        band: band.name.to_string(),
                        source,
                    })
            })
            .collect::<Result<Vec<_>, _>>()?;

        debug!(
            "Multiband extractor for {} at {} Hz with {} bands",
            channel,
            sample_rate,
            band_filters.len()
        );

        Ok(Self {
            welch: WelchEstimator::new(sample_rate),
            band_filters,
        })
    }

    /// Ordered feature names this extractor produces
    pub fn schema(&self) -> Vec<String> {
        let base = StatisticalFeatures::NAMES
            .iter()
            .chain(SpectralFeatures::NAMES.iter());
        let mut names: Vec<String> = base.clone().map(|n| n.to_string()).collect();
        for (band, _) in &self.band_filters {
            names.extend(base.clone().map(|n| format!("{}_{}", band.name, n)));
        }
        names
    }

    /// Extract features from one recording.
    ///
    /// Global features come first, then one prefixed block per band.
    pub fn extract(&mut self, signal: &[f64]) -> Result<FeatureVector, FeatureError> {
        if signal.is_empty() {
            return Err(FeatureError::EmptySignal);
        }
        if let Some(index) = signal.iter().position(|v| !v.is_finite()) {
            return Err(FeatureError::NonFiniteSignal { index });
        }

        let mut features = FeatureVector::new();
        features.append_signal(&mut self.welch, None, signal);

        for (band, filter) in &self.band_filters {
            let filtered = filter.apply(signal).map_err(|source| FeatureError::Filter {
                band: band.name.to_string(),
                source,
            })?;
            trace!("Band {} ({}-{} Hz) filtered", band.name, band.low, band.high);
            features.append_signal(&mut self.welch, Some(band.name), &filtered);
        }

        Ok(features)
    }
}

/// Extract the 14 global features of `signal`
pub fn extract(signal: &[f64], sample_rate: f64) -> Result<FeatureVector, FeatureError> {
    FeatureExtractor::new(sample_rate).extract(signal)
}

/// Extract global plus per-band features of `signal` for `channel`
pub fn extract_multiband(
    signal: &[f64],
    sample_rate: f64,
    channel: ChannelType,
) -> Result<FeatureVector, FeatureError> {
    FeatureExtractor::multiband(sample_rate, channel)?.extract(signal)
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;
    use signal_filter::FilterError;

    const FS: f64 = 200.0;

    fn sine(freq: f64, n: usize) -> Vec<f64> {
        (0..n)
            .map(|i| (2.0 * std::f64::consts::PI * freq * i as f64 / FS).sin())
            .collect()
    }

    #[test]
    fn test_global_feature_names() {
        let features = extract(&sine(5.0, 600), FS).unwrap();
        assert_eq!(features.len(), FEATURES_PER_SIGNAL);
        assert_eq!(features.names()[0], "mean");
        assert_eq!(features.names()[13], "spectral_flatness");
        assert_eq!(features.names(), FeatureExtractor::new(FS).schema().as_slice());
    }

    #[test]
    fn test_sine_features() {
        let features = extract(&sine(10.0, 2000), FS).unwrap();
        assert!(features.get("mean").unwrap().abs() < 1e-3);
        assert!((features.get("std").unwrap() - std::f64::consts::FRAC_1_SQRT_2).abs() < 1e-3);
        assert!((features.get("dominant_frequency").unwrap() - 10.0).abs() < 1.0);
        assert!(features.get("spectral_rolloff").unwrap() <= 100.0);
        assert!(features.get("absent").is_none());
    }

    #[test]
    fn test_all_zero_signal_is_finite() {
        let features = extract(&vec![0.0; 600], FS).unwrap();
        for (name, value) in features.iter() {
            assert!(value.is_finite(), "{} is {}", name, value);
        }
    }

    #[test]
    fn test_all_zero_multiband_is_finite() {
        let features = extract_multiband(&vec![0.0; 600], FS, ChannelType::Emg).unwrap();
        assert_eq!(features.len(), 84);
        assert!(features.values().iter().all(|v| v.is_finite()));
    }

    #[test]
    fn test_eog_multiband_keys() {
        let features = extract_multiband(&sine(3.0, 600), FS, ChannelType::Eog).unwrap();
        assert_eq!(features.len(), 6 * FEATURES_PER_SIGNAL);
        assert_eq!(features.len(), 84);
        assert!(features.get("mean").is_some());
        assert!(features.get("b1_mean").is_some());
        assert!(features.get("b5_spectral_flatness").is_some());
        assert_eq!(features.names()[14], "b1_mean");
        assert_eq!(features.names()[83], "b5_spectral_flatness");

        // A 3 Hz tone lives in b2 (2-4 Hz)
        let b2 = features.get("b2_energy").unwrap();
        let b5 = features.get("b5_energy").unwrap();
        assert!(b2 > 10.0 * b5);
    }

    #[test]
    fn test_multiband_schema_matches() {
        let mut extractor = FeatureExtractor::multiband(FS, ChannelType::Emg).unwrap();
        let features = extractor.extract(&sine(40.0, 600)).unwrap();
        assert_eq!(features.names(), extractor.schema().as_slice());
    }

    #[test]
    fn test_multiband_short_signal_reports_band() {
        let err = extract_multiband(&sine(3.0, 20), FS, ChannelType::Eog).unwrap_err();
        assert!(matches!(
            err,
            FeatureError::Filter {
                ref band,
                source: FilterError::InsufficientSamples { .. }
            } if band == "b1"
        ));
    }

    #[test]
    fn test_bands_above_nyquist_rejected() {
        // EMG bands reach 99 Hz; a 100 Hz sample rate cannot represent them
        assert!(matches!(
            FeatureExtractor::multiband(100.0, ChannelType::Emg),
            Err(FeatureError::Filter { .. })
        ));
    }

    #[test]
    fn test_empty_and_non_finite_rejected() {
        assert!(matches!(extract(&[], FS), Err(FeatureError::EmptySignal)));
        assert!(matches!(
            extract(&[0.0, f64::INFINITY], FS),
            Err(FeatureError::NonFiniteSignal { index: 1 })
        ));
    }

    proptest! {
        #[test]
        fn schema_is_content_independent(signal in proptest::collection::vec(-1e3f64..1e3, 1..700)) {
            let features = extract(&signal, FS).unwrap();
            let schema = FeatureExtractor::new(FS).schema();
            prop_assert_eq!(features.names(), schema.as_slice());
        }

        #[test]
        fn rolloff_within_spectrum(signal in proptest::collection::vec(-1e3f64..1e3, 1..700)) {
            let features = extract(&signal, FS).unwrap();
            let segment = signal.len().min(256);
            let max_bin = (segment / 2) as f64 * FS / segment as f64;
            prop_assert!(features.get("spectral_rolloff").unwrap() <= max_bin + 1e-9);
            prop_assert!(features.get("spectral_entropy").unwrap().is_finite());
            prop_assert!(features.get("spectral_flatness").unwrap().is_finite());
        }
    }
}
