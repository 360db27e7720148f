//! Signal Filtering
//!
//! Butterworth bandpass design and zero-phase (forward-backward) filtering
//! for physiological recordings.

mod butterworth;
mod error;
mod zero_phase;

pub use butterworth::{bandpass, BandpassSpec, ButterworthBandpass, Section};
pub use error::FilterError;
pub use zero_phase::filtfilt;
