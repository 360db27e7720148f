//! Welch Power Spectral Density

use rustfft::{num_complex::Complex, FftPlanner};

/// Longest segment used for averaging (samples)
pub const DEFAULT_SEGMENT_LENGTH: usize = 256;

/// One-sided power spectral density
#[derive(Debug, Clone, Default, PartialEq)]
pub struct PowerSpectrum {
    /// Bin frequencies (Hz), from 0 to at most nyquist
    pub frequencies: Vec<f64>,
    /// Power density per bin (units²/Hz)
    pub density: Vec<f64>,
}

impl PowerSpectrum {
    /// Highest bin frequency
    pub fn max_frequency(&self) -> f64 {
        self.frequencies.last().copied().unwrap_or(0.0)
    }

    /// Total power over all bins
    pub fn total_power(&self) -> f64 {
        self.density.iter().sum()
    }
}

/// Averaged-periodogram PSD estimator
pub struct WelchEstimator {
    /// FFT planner for efficient computation
    planner: FftPlanner<f64>,
    /// Sampling frequency (Hz)
    sample_rate: f64,
}

impl WelchEstimator {
    /// Create a new estimator with 256-sample segments
    pub fn new(sample_rate: f64) -> Self {
        Self {
            planner: FftPlanner::new(),
            sample_rate,
        }
    }

    /// Periodic Hann window
    fn hann(n: usize) -> Vec<f64> {
        if n == 1 {
            return vec![1.0];
        }
        (0..n)
            .map(|i| 0.5 - 0.5 * (2.0 * std::f64::consts::PI * i as f64 / n as f64).cos())
            .collect()
    }

    /// Estimate the PSD of `signal`.
    ///
    /// Segments of `min(DEFAULT_SEGMENT_LENGTH, len)` samples with 50% overlap are
    /// mean-detrended, Hann-windowed and transformed; their one-sided
    /// density-scaled periodograms are averaged.
    pub fn estimate(&mut self, signal: &[f64]) -> PowerSpectrum {
        if signal.is_empty() {
            return PowerSpectrum::default();
        }

        let segment = DEFAULT_SEGMENT_LENGTH.min(signal.len());
        let overlap = segment / 2;
        let step = segment - overlap;
        let n_segments = (signal.len() - overlap) / step;
        let n_bins = segment / 2 + 1;

        let window = Self::hann(segment);
        let window_power: f64 = window.iter().map(|w| w * w).sum();
        let scale = 1.0 / (self.sample_rate * window_power);

        let fft = self.planner.plan_fft_forward(segment);
        let mut buffer: Vec<Complex<f64>> = vec![Complex::new(0.0, 0.0); segment];
        let mut density = vec![0.0; n_bins];

        for s in 0..n_segments {
            let chunk = &signal[s * step..s * step + segment];
            let mean = chunk.iter().sum::<f64>() / segment as f64;
            for ((slot, &x), &w) in buffer.iter_mut().zip(chunk).zip(&window) {
                *slot = Complex::new((x - mean) * w, 0.0);
            }

            fft.process(&mut buffer);

            for (acc, c) in density.iter_mut().zip(&buffer) {
                *acc += c.norm_sqr() * scale;
            }
        }

        // Fold negative frequencies onto positive ones; DC and an even-length
        // nyquist bin have no mirror.
        let last_doubled = if segment % 2 == 0 { n_bins - 1 } else { n_bins };
        for (k, value) in density.iter_mut().enumerate() {
            *value /= n_segments as f64;
            if k > 0 && k < last_doubled {
                *value *= 2.0;
            }
        }

        let resolution = self.sample_rate / segment as f64;
        let frequencies = (0..n_bins).map(|k| k as f64 * resolution).collect();

        PowerSpectrum {
            frequencies,
            density,
        }
    }
}
