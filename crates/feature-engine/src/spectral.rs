//! Spectral Shape Features

use crate::welch::PowerSpectrum;

/// Guards log(0) and divide-by-zero for silent or degenerate signals
pub const SPECTRAL_EPSILON: f64 = 1e-10;

/// Fraction of cumulative power that defines the rolloff frequency
pub const ROLLOFF_FRACTION: f64 = 0.85;

/// Scalar summaries of a power spectrum
#[derive(Debug, Clone, Default, PartialEq)]
pub struct SpectralFeatures {
    /// Frequency of the strongest bin (Hz)
    pub dominant_frequency: f64,
    /// Shannon entropy (bits) of the normalized PSD
    pub spectral_entropy: f64,
    /// Power-weighted RMS deviation from the dominant frequency (Hz)
    pub spectral_bandwidth: f64,
    /// Power-weighted mean frequency (Hz)
    pub spectral_centroid: f64,
    /// Frequency below which 85% of the power lies (Hz)
    pub spectral_rolloff: f64,
    /// Geometric over arithmetic mean of the PSD
    pub spectral_flatness: f64,
}

impl SpectralFeatures {
    /// Feature names, in output order
    pub const NAMES: [&'static str; 6] = [
        "dominant_frequency",
        "spectral_entropy",
        "spectral_bandwidth",
        "spectral_centroid",
        "spectral_rolloff",
        "spectral_flatness",
    ];

    /// Compute spectral features from a PSD
    pub fn compute(psd: &PowerSpectrum) -> Self {
        let freqs = &psd.frequencies;
        let power = &psd.density;
        if power.is_empty() {
            return Self::default();
        }

        let total: f64 = power.iter().sum();
        let normalized: Vec<f64> = power.iter().map(|p| p / (total + SPECTRAL_EPSILON)).collect();

        // First maximum wins ties
        let mut dominant_idx = 0;
        for (i, &p) in power.iter().enumerate() {
            if p > power[dominant_idx] {
                dominant_idx = i;
            }
        }
        let dominant_frequency = freqs[dominant_idx];

        let spectral_entropy = -normalized
            .iter()
            .map(|p| p * (p + SPECTRAL_EPSILON).log2())
            .sum::<f64>();

        let spectral_bandwidth = freqs
            .iter()
            .zip(&normalized)
            .map(|(f, p)| (f - dominant_frequency).powi(2) * p)
            .sum::<f64>()
            .sqrt();

        let spectral_centroid = freqs.iter().zip(&normalized).map(|(f, p)| f * p).sum();

        let mut cumulative = 0.0;
        let rolloff_idx = normalized
            .iter()
            .position(|p| {
                cumulative += p;
                cumulative >= ROLLOFF_FRACTION
            })
            .unwrap_or(freqs.len() - 1);
        let spectral_rolloff = freqs[rolloff_idx];

        let n = power.len() as f64;
        let log_mean = power.iter().map(|p| (p + SPECTRAL_EPSILON).ln()).sum::<f64>() / n;
        let arithmetic_mean = power.iter().map(|p| p + SPECTRAL_EPSILON).sum::<f64>() / n;
        let spectral_flatness = log_mean.exp() / arithmetic_mean;

        Self {
            dominant_frequency,
            spectral_entropy,
            spectral_bandwidth,
            spectral_centroid,
            spectral_rolloff,
            spectral_flatness,
        }
    }

    /// Values in the order of [`Self::NAMES`]
    pub fn values(&self) -> [f64; 6] {
        [
            self.dominant_frequency,
            self.spectral_entropy,
            self.spectral_bandwidth,
            self.spectral_centroid,
            self.spectral_rolloff,
            self.spectral_flatness,
        ]
    }
}
