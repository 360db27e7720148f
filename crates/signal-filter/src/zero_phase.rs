//! Forward-Backward (Zero-Phase) Section Filtering

use crate::butterworth::Section;
use crate::error::FilterError;

/// Transposed direct form II state for one section
type State = [f64; 2];

/// Steady-state initial conditions for a unit step, per section.
///
/// Each section's state is scaled by the DC gain of the sections before it.
pub fn steady_state(sections: &[Section]) -> Vec<State> {
    let mut scale = 1.0;
    sections
        .iter()
        .map(|section| {
            let [b0, b1, b2] = section.b;
            let [_, a1, a2] = section.a;
            let rhs0 = b1 - a1 * b0;
            let rhs1 = b2 - a2 * b0;
            let den = 1.0 + a1 + a2;
            let z0 = if den == 0.0 { 0.0 } else { (rhs0 + rhs1) / den };
            let z1 = rhs1 - a2 * z0;
            let state = [scale * z0, scale * z1];
            scale *= section.dc_gain();
            state
        })
        .collect()
}

/// Run the section cascade over `signal` starting from `initial` state
pub fn cascade(sections: &[Section], signal: &[f64], initial: &[State]) -> Vec<f64> {
    let mut states: Vec<State> = initial.to_vec();
    signal
        .iter()
        .map(|&x| {
            sections
                .iter()
                .zip(states.iter_mut())
                .fold(x, |input, (section, z)| {
                    let output = section.b[0] * input + z[0];
                    z[0] = section.b[1] * input - section.a[1] * output + z[1];
                    z[1] = section.b[2] * input - section.a[2] * output;
                    output
                })
        })
        .collect()
}

/// Odd extension of `signal` by `padlen` samples on each side
fn odd_extend(signal: &[f64], padlen: usize) -> Vec<f64> {
    let n = signal.len();
    let first = signal[0];
    let last = signal[n - 1];

    let mut extended = Vec::with_capacity(n + 2 * padlen);
    extended.extend((1..=padlen).rev().map(|i| 2.0 * first - signal[i]));
    extended.extend_from_slice(signal);
    extended.extend((1..=padlen).map(|i| 2.0 * last - signal[n - 1 - i]));
    extended
}

/// Apply `sections` forward then backward with odd-extension padding.
pub fn filtfilt(sections: &[Section], signal: &[f64], padlen: usize) -> Result<Vec<f64>, FilterError> {
    if signal.is_empty() {
        return Err(FilterError::InvalidInput("signal is empty".to_string()));
    }
    if let Some(idx) = signal.iter().position(|v| !v.is_finite()) {
        return Err(FilterError::InvalidInput(format!(
            "non-finite sample at index {}",
            idx
        )));
    }
    if signal.len() <= padlen {
        return Err(FilterError::InsufficientSamples {
            len: signal.len(),
            required: padlen,
        });
    }

    let zi = steady_state(sections);
    let scaled = |x0: f64| -> Vec<State> { zi.iter().map(|z| [z[0] * x0, z[1] * x0]).collect() };

    let extended = odd_extend(signal, padlen);
    let mut forward = cascade(sections, &extended, &scaled(extended[0]));
    forward.reverse();
    let mut backward = cascade(sections, &forward, &scaled(forward[0]));
    backward.reverse();

    Ok(backward[padlen..backward.len() - padlen].to_vec())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn smoother() -> Section {
        // Unit DC gain lowpass
        Section {
            b: [0.25, 0.5, 0.25],
            a: [1.0, -0.2, 0.2],
        }
    }

    #[test]
    fn test_odd_extend() {
        let extended = odd_extend(&[1.0, 2.0, 4.0, 7.0], 2);
        assert_eq!(extended, vec![-2.0, 0.0, 1.0, 2.0, 4.0, 7.0, 10.0, 12.0]);
    }

    #[test]
    fn test_steady_state_step_has_no_transient() {
        let sections = [smoother(), smoother()];
        let step = vec![1.0; 50];
        let output = cascade(&sections, &step, &steady_state(&sections));
        let gain = sections[0].dc_gain() * sections[1].dc_gain();
        for y in output {
            assert!((y - gain).abs() < 1e-12);
        }
    }

    #[test]
    fn test_filtfilt_length() {
        let sections = [smoother()];
        let signal: Vec<f64> = (0..40).map(|i| (i as f64 * 0.3).sin()).collect();
        let output = filtfilt(&sections, &signal, 9).unwrap();
        assert_eq!(output.len(), signal.len());
    }

    #[test]
    fn test_rejects_non_finite() {
        let sections = [smoother()];
        let mut signal = vec![0.0; 40];
        signal[7] = f64::NAN;
        assert!(matches!(
            filtfilt(&sections, &signal, 9),
            Err(FilterError::InvalidInput(_))
        ));
    }

    #[test]
    fn test_rejects_empty() {
        assert!(matches!(
            filtfilt(&[smoother()], &[], 9),
            Err(FilterError::InvalidInput(_))
        ));
    }
}
