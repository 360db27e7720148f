//! Sleep-Stage Pipeline
//!
//! Wires dataset assembly, per-file filtering, feature extraction and
//! classifier training into the `sleep-stage` command-line tool.

mod config;

pub use config::{PipelineConfig, ENV_PREFIX};

use anyhow::{Context, Result};
use feature_engine::{build, ChannelType, FeatureMatrix};
use signal_filter::bandpass;
use sleep_dataset::{apply_filter_per_file, assemble_from_directory, read_csv, write_csv, LabeledDataset};
use stage_classifier::{train_and_evaluate, tune_and_evaluate, Evaluation};
use std::path::Path;
use tracing::{info, warn};
use tracing_subscriber::{EnvFilter, FmtSubscriber};

/// Initialize logging.
///
/// `RUST_LOG` takes precedence; otherwise `info`, or `debug` when verbose.
pub fn init_logging(verbose: bool, json: bool) {
    let default_level = if verbose { "debug" } else { "info" };
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_level));

    let builder = FmtSubscriber::builder()
        .with_env_filter(filter)
        .with_target(true);

    let installed = if json {
        tracing::subscriber::set_global_default(builder.json().finish())
    } else {
        tracing::subscriber::set_global_default(builder.finish())
    };
    if installed.is_err() {
        warn!("Tracing subscriber already installed");
    }
}

/// Assemble the extracted archive tree under `data_dir` into one CSV
pub fn assemble(data_dir: &Path, output: &Path) -> Result<LabeledDataset> {
    let dataset = assemble_from_directory(data_dir)
        .with_context(|| format!("Failed to assemble recordings under {}", data_dir.display()))?;
    write_csv(&dataset, output).with_context(|| format!("Failed to write {}", output.display()))?;

    info!(
        "Assembled {} rows with {} columns into {}",
        dataset.len(),
        dataset.column_names().len(),
        output.display()
    );
    Ok(dataset)
}

/// Channel whose bands are used for multiband features, if enabled
fn multiband_channel(config: &PipelineConfig) -> Result<Option<ChannelType>> {
    if !config.multiband {
        return Ok(None);
    }
    let channel = config
        .signal_column
        .parse::<ChannelType>()
        .with_context(|| format!("Cannot derive bands for column {}", config.signal_column))?;
    Ok(Some(channel))
}

/// Filter (if configured) and extract one feature row per file of `dataset`
pub fn dataset_features(
    config: &PipelineConfig,
    dataset: &LabeledDataset,
) -> Result<(FeatureMatrix, Vec<String>)> {
    let filtered;
    let dataset = match &config.filter {
        Some(spec) => {
            info!(
                "Bandpass {}-{} Hz (order {}) on column {}",
                spec.low_cut, spec.high_cut, spec.order, config.signal_column
            );
            filtered = apply_filter_per_file(dataset, &config.signal_column, |signal| {
                bandpass(signal, spec.low_cut, spec.high_cut, config.sample_rate, spec.order)
            })
            .context("Per-file filtering failed")?;
            &filtered
        }
        None => dataset,
    };

    let multiband = multiband_channel(config)?;
    let (matrix, labels) = build(
        dataset,
        &config.signal_column,
        &config.label_column,
        config.sample_rate,
        multiband,
    )
    .context("Feature extraction failed")?;

    Ok((matrix, labels))
}

/// Read a sample table, extract features and write them as CSV
pub fn extract_features(config: &PipelineConfig, input: &Path, output: &Path) -> Result<FeatureMatrix> {
    let dataset = read_csv(input).with_context(|| format!("Failed to read {}", input.display()))?;
    let (matrix, labels) = dataset_features(config, &dataset)?;
    matrix
        .write_csv(output, &labels, &config.label_column)
        .with_context(|| format!("Failed to write {}", output.display()))?;
    Ok(matrix)
}

/// Read a sample table, extract features, then train and evaluate.
///
/// With `tune`, feature elimination and grid search run on the training rows
/// before the final fit. The evaluation is also written as JSON to `report`.
pub fn train(
    config: &PipelineConfig,
    input: &Path,
    tune: bool,
    report: Option<&Path>,
) -> Result<Evaluation> {
    let dataset = read_csv(input).with_context(|| format!("Failed to read {}", input.display()))?;
    let (matrix, labels) = dataset_features(config, &dataset)?;

    let options = config.train_options();
    let evaluation = if tune {
        tune_and_evaluate(&matrix, &labels, &options, &config.grid).context("Tuning failed")?
    } else {
        train_and_evaluate(&matrix, &labels, &options).context("Training failed")?
    };

    if let Some(path) = report {
        let json = serde_json::to_string_pretty(&evaluation)?;
        std::fs::write(path, json).with_context(|| format!("Failed to write {}", path.display()))?;
        info!("Wrote evaluation report to {}", path.display());
    }

    Ok(evaluation)
}
