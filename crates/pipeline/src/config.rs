//! Pipeline configuration

use serde::{Deserialize, Serialize};
use signal_filter::BandpassSpec;
use stage_classifier::{ForestParams, ParamGrid, TrainOptions};
use std::path::Path;

/// Environment variable prefix; nested keys are separated by `__`
pub const ENV_PREFIX: &str = "SLEEP_STAGE";

/// Pipeline configuration
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct PipelineConfig {
    /// Recording sample rate (Hz)
    pub sample_rate: f64,

    /// Numeric column holding the signal
    pub signal_column: String,

    /// Text column holding the stage label
    pub label_column: String,

    /// Add per-band features for the signal's channel type
    pub multiband: bool,

    /// Optional per-file bandpass applied before feature extraction
    pub filter: Option<BandpassSpec>,

    /// Forest used for plain training and as the elimination base when tuning
    pub forest: ForestParams,

    /// Held-out share for evaluation
    pub test_fraction: f64,

    /// Split and cross-validation seed
    pub seed: u64,

    /// Stratified cross-validation folds
    pub cv_folds: usize,

    /// Hyperparameter grid for tuning
    pub grid: ParamGrid,
}

impl Default for PipelineConfig {
    fn default() -> Self {
        Self {
            sample_rate: 200.0,
            signal_column: "eog".to_string(),
            label_column: "stage".to_string(),
            multiband: false,
            filter: None,
            forest: ForestParams::default(),
            test_fraction: 0.3,
            seed: 42,
            cv_folds: 5,
            grid: ParamGrid::default(),
        }
    }
}

impl PipelineConfig {
    /// Load from an optional file, then `SLEEP_STAGE__*` environment overrides
    pub fn load(path: Option<&Path>) -> Result<Self, config::ConfigError> {
        let mut builder = config::Config::builder();
        if let Some(path) = path {
            builder = builder.add_source(config::File::from(path));
        }

        let settings = builder
            .add_source(
                config::Environment::with_prefix(ENV_PREFIX)
                    .separator("__")
                    .try_parsing(true),
            )
            .build()?;

        settings.try_deserialize()
    }

    /// Training options derived from this configuration
    pub fn train_options(&self) -> TrainOptions {
        TrainOptions {
            params: self.forest,
            test_fraction: self.test_fraction,
            seed: self.seed,
            cv_folds: self.cv_folds,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    #[test]
    fn test_default_config() {
        let config = PipelineConfig::default();
        assert_eq!(config.sample_rate, 200.0);
        assert_eq!(config.signal_column, "eog");
        assert_eq!(config.label_column, "stage");
        assert!(!config.multiband);
        assert!(config.filter.is_none());
        assert_eq!(config.forest.n_trees, 100);
        assert_eq!(config.test_fraction, 0.3);
        assert_eq!(config.cv_folds, 5);
    }

    #[test]
    fn test_load_from_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("pipeline.toml");
        let mut file = std::fs::File::create(&path).unwrap();
        writeln!(
            file,
            r#"
sample_rate = 256.0
signal_column = "emg"
multiband = true

[filter]
low_cut = 20.0
high_cut = 99.0

[forest]
n_trees = 50
max_depth = 10
"#
        )
        .unwrap();

        let config = PipelineConfig::load(Some(&path)).unwrap();
        assert_eq!(config.sample_rate, 256.0);
        assert_eq!(config.signal_column, "emg");
        assert!(config.multiband);

        let filter = config.filter.unwrap();
        assert_eq!(filter.low_cut, 20.0);
        assert_eq!(filter.order, 4);

        assert_eq!(config.forest.n_trees, 50);
        assert_eq!(config.forest.max_depth, Some(10));
        assert_eq!(config.forest.min_samples_leaf, 1);
    }

    #[test]
    fn test_environment_override() {
        std::env::set_var("SLEEP_STAGE__LABEL_COLUMN", "hypnogram");
        let config = PipelineConfig::load(None).unwrap();
        std::env::remove_var("SLEEP_STAGE__LABEL_COLUMN");
        assert_eq!(config.label_column, "hypnogram");
    }

    #[test]
    fn test_train_options() {
        let config = PipelineConfig {
            seed: 7,
            test_fraction: 0.25,
            ..PipelineConfig::default()
        };
        let options = config.train_options();
        assert_eq!(options.seed, 7);
        assert_eq!(options.test_fraction, 0.25);
        assert_eq!(options.params, ForestParams::default());
    }
}
