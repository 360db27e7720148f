//! Sleep Stages and Partitions

use serde::{Deserialize, Serialize};
use std::fmt;

/// Sleep stage a recording is labeled with
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SleepStage {
    /// Wakefulness
    Awake,
    /// Non-REM sleep
    NonRem,
    /// REM sleep
    Rem,
}

impl SleepStage {
    /// All stages, in archive folder order
    pub const ALL: [SleepStage; 3] = [SleepStage::Awake, SleepStage::NonRem, SleepStage::Rem];

    /// Label as stored in the `stage` column and archive folder names
    pub fn as_str(&self) -> &'static str {
        match self {
            SleepStage::Awake => "awake",
            SleepStage::NonRem => "nonrem",
            SleepStage::Rem => "rem",
        }
    }
}

impl fmt::Display for SleepStage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Train/test partition a recording belongs to
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Partition {
    Train,
    Test,
}

impl Partition {
    /// All partitions, in archive folder order
    pub const ALL: [Partition; 2] = [Partition::Train, Partition::Test];

    /// Value as stored in the `set` column and archive folder names
    pub fn as_str(&self) -> &'static str {
        match self {
            Partition::Train => "Train",
            Partition::Test => "Test",
        }
    }
}

impl fmt::Display for Partition {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_stage_folder_names() {
        let names: Vec<String> = SleepStage::ALL.iter().map(|s| s.to_string()).collect();
        assert_eq!(names, vec!["awake", "nonrem", "rem"]);
    }

    #[test]
    fn test_partition_names() {
        assert_eq!(Partition::Train.to_string(), "Train");
        assert_eq!(Partition::ALL, [Partition::Train, Partition::Test]);
    }
}
