//! Butterworth Bandpass Design

use crate::error::FilterError;
use crate::zero_phase;
use rustfft::num_complex::Complex;
use serde::{Deserialize, Serialize};
use std::f64::consts::PI;
use tracing::trace;

/// Digital-domain sample rate used for prewarping (normalized design at fs = 2)
const DESIGN_FS2: f64 = 4.0;

/// Imaginary parts below this are treated as real poles when pairing
const REAL_POLE_TOLERANCE: f64 = 1e-12;

/// Bandpass parameters, as they appear in configuration
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct BandpassSpec {
    /// Lower cutoff (Hz)
    pub low_cut: f64,
    /// Upper cutoff (Hz)
    pub high_cut: f64,
    /// Butterworth order
    #[serde(default = "default_order")]
    pub order: usize,
}

fn default_order() -> usize {
    4
}

impl BandpassSpec {
    /// Bandpass between `low_cut` and `high_cut` with the default order (4)
    pub fn new(low_cut: f64, high_cut: f64) -> Self {
        Self {
            low_cut,
            high_cut,
            order: default_order(),
        }
    }

    /// Set the filter order
    pub fn with_order(mut self, order: usize) -> Self {
        self.order = order;
        self
    }
}

/// One second-order section, `a[0]` normalized to 1
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Section {
    /// Feedforward coefficients
    pub b: [f64; 3],
    /// Feedback coefficients
    pub a: [f64; 3],
}

impl Section {
    /// Gain at DC (z = 1)
    pub fn dc_gain(&self) -> f64 {
        let den: f64 = self.a.iter().sum();
        if den == 0.0 {
            0.0
        } else {
            self.b.iter().sum::<f64>() / den
        }
    }
}

/// A designed Butterworth bandpass filter, stored as cascaded second-order sections
#[derive(Debug, Clone)]
pub struct ButterworthBandpass {
    sections: Vec<Section>,
}

impl ButterworthBandpass {
    /// Design a bandpass of the given order between `low_cut` and `high_cut` Hz.
    ///
    /// The analog Butterworth prototype is prewarped, shifted to a bandpass and
    /// mapped with the bilinear transform. An order-N design yields N sections.
    pub fn design(spec: BandpassSpec, sample_rate: f64) -> Result<Self, FilterError> {
        if !sample_rate.is_finite() || sample_rate <= 0.0 {
            return Err(FilterError::InvalidSampleRate(sample_rate));
        }
        if spec.order == 0 {
            return Err(FilterError::InvalidOrder(spec.order));
        }

        let nyquist = sample_rate / 2.0;
        let valid = spec.low_cut.is_finite()
            && spec.high_cut.is_finite()
            && spec.low_cut > 0.0
            && spec.low_cut < spec.high_cut
            && spec.high_cut < nyquist;
        if !valid {
            return Err(FilterError::InvalidCutoff {
                low: spec.low_cut,
                high: spec.high_cut,
                nyquist,
            });
        }

        let order = spec.order;
        let low = spec.low_cut / nyquist;
        let high = spec.high_cut / nyquist;

        // Prewarp band edges
        let warped_low = DESIGN_FS2 * (PI * low / 2.0).tan();
        let warped_high = DESIGN_FS2 * (PI * high / 2.0).tan();
        let bandwidth = warped_high - warped_low;
        let center = (warped_low * warped_high).sqrt();

        // Lowpass prototype poles on the unit circle, left half-plane
        let prototype = (0..order).map(|k| {
            let m = 2 * k as i64 - order as i64 + 1;
            -Complex::from_polar(1.0, PI * m as f64 / (2 * order) as f64)
        });

        // Lowpass -> bandpass: every prototype pole splits into two
        let mut analog_poles = Vec::with_capacity(2 * order);
        for p in prototype {
            let scaled = p * (bandwidth / 2.0);
            let offset = (scaled * scaled - center * center).sqrt();
            analog_poles.push(scaled + offset);
            analog_poles.push(scaled - offset);
        }

        // Bilinear transform. The N analog zeros at the origin land on z = +1,
        // the N zeros at infinity on z = -1.
        let fs2 = Complex::new(DESIGN_FS2, 0.0);
        let mut gain_den = Complex::new(1.0, 0.0);
        let digital_poles: Vec<Complex<f64>> = analog_poles
            .iter()
            .map(|&p| {
                gain_den *= fs2 - p;
                (fs2 + p) / (fs2 - p)
            })
            .collect();
        let gain = (Complex::new((bandwidth * DESIGN_FS2).powi(order as i32), 0.0) / gain_den).re;

        let mut sections = pair_poles(&digital_poles);
        if let Some(first) = sections.first_mut() {
            for coeff in first.b.iter_mut() {
                *coeff *= gain;
            }
        }

        trace!(
            "Designed bandpass {:.2}-{:.2} Hz order {} at {} Hz: {} sections, gain {:e}",
            spec.low_cut,
            spec.high_cut,
            order,
            sample_rate,
            sections.len(),
            gain
        );

        Ok(Self { sections })
    }

    /// Apply the filter forward and backward (zero phase)
    pub fn apply(&self, signal: &[f64]) -> Result<Vec<f64>, FilterError> {
        zero_phase::filtfilt(&self.sections, signal, self.padlen())
    }

    /// Number of samples of odd extension used on each side
    pub fn padlen(&self) -> usize {
        3 * (2 * self.sections.len() + 1)
    }

    /// The designed second-order sections
    pub fn sections(&self) -> &[Section] {
        &self.sections
    }
}

/// Group digital poles into conjugate pairs, one section per pair.
///
/// Every section carries zeros at +1 and -1, so `b = [1, 0, -1]` before gain.
fn pair_poles(poles: &[Complex<f64>]) -> Vec<Section> {
    let mut complex: Vec<Complex<f64>> = poles
        .iter()
        .copied()
        .filter(|p| p.im > REAL_POLE_TOLERANCE)
        .collect();
    let mut real: Vec<f64> = poles
        .iter()
        .filter(|p| p.im.abs() <= REAL_POLE_TOLERANCE)
        .map(|p| p.re)
        .collect();

    // Poles furthest from the unit circle first
    complex.sort_by(|a, b| a.norm().total_cmp(&b.norm()));
    real.sort_by(|a, b| a.abs().total_cmp(&b.abs()));

    let mut sections: Vec<Section> = real
        .chunks(2)
        .map(|pair| match pair {
            [p, q] => Section {
                b: [1.0, 0.0, -1.0],
                a: [1.0, -(p + q), p * q],
            },
            [p] => Section {
                b: [1.0, -1.0, 0.0],
                a: [1.0, -p, 0.0],
            },
            _ => unreachable!("chunks(2) yields one or two poles"),
        })
        .collect();

    sections.extend(complex.iter().map(|p| Section {
        b: [1.0, 0.0, -1.0],
        a: [1.0, -2.0 * p.re, p.norm_sqr()],
    }));

    sections
}

/// Zero-phase Butterworth bandpass of `signal`.
///
/// Output has the same length as the input. Fails with
/// [`FilterError::InsufficientSamples`] when the signal is not longer than the
/// padding the filter needs (`3 * (2 * order + 1)` samples).
pub fn bandpass(
    signal: &[f64],
    low_cut: f64,
    high_cut: f64,
    sample_rate: f64,
    order: usize,
) -> Result<Vec<f64>, FilterError> {
    let spec = BandpassSpec::new(low_cut, high_cut).with_order(order);
    ButterworthBandpass::design(spec, sample_rate)?.apply(signal)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sine(freq: f64, fs: f64, n: usize) -> Vec<f64> {
        (0..n)
            .map(|i| (2.0 * PI * freq * i as f64 / fs).sin())
            .collect()
    }

    fn rms(values: &[f64]) -> f64 {
        (values.iter().map(|v| v * v).sum::<f64>() / values.len() as f64).sqrt()
    }

    #[test]
    fn test_design_section_count() {
        let filter = ButterworthBandpass::design(BandpassSpec::new(0.5, 15.0), 200.0).unwrap();
        assert_eq!(filter.sections().len(), 4);
        assert_eq!(filter.padlen(), 27);
    }

    #[test]
    fn test_poles_inside_unit_circle() {
        let filter = ButterworthBandpass::design(BandpassSpec::new(20.0, 99.0), 200.0).unwrap();
        for section in filter.sections() {
            // Stable iff |a2| < 1 and |a1| < 1 + a2
            let [_, a1, a2] = section.a;
            assert!(a2.abs() < 1.0, "a2 = {}", a2);
            assert!(a1.abs() < 1.0 + a2, "a1 = {}", a1);
        }
    }

    #[test]
    fn test_odd_order_design() {
        let filter =
            ButterworthBandpass::design(BandpassSpec::new(2.0, 10.0).with_order(3), 200.0).unwrap();
        assert_eq!(filter.sections().len(), 3);
    }

    #[test]
    fn test_passband_sine_preserved() {
        let input = sine(5.0, 200.0, 2000);
        let output = bandpass(&input, 0.5, 15.0, 200.0, 4).unwrap();
        let ratio = rms(&output[200..1800]) / rms(&input[200..1800]);
        assert!((ratio - 1.0).abs() < 0.05, "passband ratio {}", ratio);
    }

    /// Single-pass magnitude response of the cascade at `freq` Hz
    fn magnitude(filter: &ButterworthBandpass, freq: f64, fs: f64) -> f64 {
        let z = Complex::from_polar(1.0, 2.0 * PI * freq / fs);
        let z2 = z * z;
        filter
            .sections()
            .iter()
            .map(|s| {
                let num = z2 * s.b[0] + z * s.b[1] + s.b[2];
                let den = z2 * s.a[0] + z * s.a[1] + s.a[2];
                (num / den).norm()
            })
            .product()
    }

    #[test]
    fn test_frequency_response() {
        let filter = ButterworthBandpass::design(BandpassSpec::new(0.5, 15.0), 200.0).unwrap();
        let half_power = std::f64::consts::FRAC_1_SQRT_2;

        assert!((magnitude(&filter, 0.5, 200.0) - half_power).abs() < 1e-3);
        assert!((magnitude(&filter, 15.0, 200.0) - half_power).abs() < 1e-3);
        assert!((magnitude(&filter, 5.0, 200.0) - 1.0).abs() < 1e-3);
        assert!(magnitude(&filter, 60.0, 200.0) < 1e-3);
    }

    #[test]
    fn test_stopband_sine_attenuated() {
        // Long enough for the 0.5 Hz edge transient to die out mid-signal
        let input = sine(60.0, 200.0, 12000);
        let output = bandpass(&input, 0.5, 15.0, 200.0, 4).unwrap();
        let ratio = rms(&output[5000..7000]) / rms(&input[5000..7000]);
        assert!(ratio < 0.01, "stopband ratio {}", ratio);
    }

    #[test]
    fn test_constant_signal_removed() {
        let input = vec![3.0; 600];
        let output = bandpass(&input, 0.5, 15.0, 200.0, 4).unwrap();
        assert!(output.iter().all(|v| v.abs() < 1e-6));
    }

    #[test]
    fn test_zero_phase_peaks_aligned() {
        let fs = 200.0;
        let input = sine(4.0, fs, 1200);
        let output = bandpass(&input, 0.5, 15.0, fs, 4).unwrap();

        // One period of 4 Hz is 50 samples; compare the peak in a middle period
        let window = 500..550;
        let argmax = |values: &[f64]| {
            window
                .clone()
                .max_by(|&a, &b| values[a].total_cmp(&values[b]))
                .unwrap()
        };
        let peak_in = argmax(&input);
        let peak_out = argmax(&output);
        assert!(
            (peak_in as i64 - peak_out as i64).abs() <= 1,
            "peak moved from {} to {}",
            peak_in,
            peak_out
        );
    }

    #[test]
    fn test_insufficient_samples() {
        let input = vec![1.0; 27];
        let err = bandpass(&input, 0.5, 15.0, 200.0, 4).unwrap_err();
        assert_eq!(
            err,
            FilterError::InsufficientSamples {
                len: 27,
                required: 27
            }
        );
        assert!(bandpass(&vec![1.0; 28], 0.5, 15.0, 200.0, 4).is_ok());
    }

    #[test]
    fn test_invalid_parameters() {
        let input = vec![0.0; 100];
        assert!(matches!(
            bandpass(&input, 15.0, 0.5, 200.0, 4),
            Err(FilterError::InvalidCutoff { .. })
        ));
        assert!(matches!(
            bandpass(&input, 0.5, 100.0, 200.0, 4),
            Err(FilterError::InvalidCutoff { .. })
        ));
        assert!(matches!(
            bandpass(&input, 0.5, 15.0, 200.0, 0),
            Err(FilterError::InvalidOrder(0))
        ));
        assert!(matches!(
            bandpass(&input, 0.5, 15.0, -1.0, 4),
            Err(FilterError::InvalidSampleRate(_))
        ));
    }
}
