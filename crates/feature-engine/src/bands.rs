//! Channel Frequency Bands

use crate::error::FeatureError;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// A named frequency band (Hz)
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct FrequencyBand {
    /// Feature key prefix, e.g. `b1`
    pub name: &'static str,
    /// Lower edge (Hz)
    pub low: f64,
    /// Upper edge (Hz)
    pub high: f64,
}

const fn band(name: &'static str, low: f64, high: f64) -> FrequencyBand {
    FrequencyBand { name, low, high }
}

/// Eye-movement bands, slow drifts through saccadic activity (0.5-15 Hz)
const EOG_BANDS: [FrequencyBand; 5] = [
    band("b1", 0.5, 2.0),
    band("b2", 2.0, 4.0),
    band("b3", 4.0, 6.0),
    band("b4", 6.0, 10.0),
    band("b5", 10.0, 15.0),
];

/// Muscle-tone bands (20-99 Hz)
const EMG_BANDS: [FrequencyBand; 5] = [
    band("b1", 20.0, 35.0),
    band("b2", 35.0, 50.0),
    band("b3", 50.0, 65.0),
    band("b4", 65.0, 80.0),
    band("b5", 80.0, 99.0),
];

/// Physiological channel with a defined band mapping
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ChannelType {
    /// Electrooculogram
    Eog,
    /// Electromyogram
    Emg,
}

impl ChannelType {
    /// The five adjacent bands used for multiband features
    pub fn bands(&self) -> &'static [FrequencyBand] {
        match self {
            ChannelType::Eog => &EOG_BANDS,
            ChannelType::Emg => &EMG_BANDS,
        }
    }

    /// Column name of this channel in the recording tables
    pub fn as_str(&self) -> &'static str {
        match self {
            ChannelType::Eog => "eog",
            ChannelType::Emg => "emg",
        }
    }
}

impl fmt::Display for ChannelType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for ChannelType {
    type Err = FeatureError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "eog" => Ok(ChannelType::Eog),
            "emg" => Ok(ChannelType::Emg),
            _ => Err(FeatureError::UnsupportedChannel(s.to_string())),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_bands_are_adjacent() {
        for channel in [ChannelType::Eog, ChannelType::Emg] {
            let bands = channel.bands();
            assert_eq!(bands.len(), 5);
            for pair in bands.windows(2) {
                assert_eq!(pair[0].high, pair[1].low);
            }
        }
        assert_eq!(ChannelType::Eog.bands()[0].low, 0.5);
        assert_eq!(ChannelType::Eog.bands()[4].high, 15.0);
        assert_eq!(ChannelType::Emg.bands()[0].low, 20.0);
        assert_eq!(ChannelType::Emg.bands()[4].high, 99.0);
    }

    #[test]
    fn test_parse_channel() {
        assert_eq!("eog".parse::<ChannelType>().unwrap(), ChannelType::Eog);
        assert_eq!("EMG".parse::<ChannelType>().unwrap(), ChannelType::Emg);
        assert!(matches!(
            "ecg".parse::<ChannelType>(),
            Err(FeatureError::UnsupportedChannel(name)) if name == "ecg"
        ));
    }
}
