//! Sleep-Stage Pipeline - Main Entry Point

use anyhow::{Context, Result};
use clap::{Args, Parser, Subcommand};
use pipeline::{init_logging, PipelineConfig};
use signal_filter::BandpassSpec;
use std::path::PathBuf;
use tracing::info;

#[derive(Parser, Debug)]
#[command(author, version, about = "Sleep-stage classification from EOG/EMG recordings")]
struct Cli {
    /// Configuration file (TOML, JSON or YAML)
    #[arg(short, long, global = true)]
    config: Option<PathBuf>,

    /// Debug-level logging
    #[arg(short, long, global = true)]
    verbose: bool,

    /// Emit logs as JSON lines
    #[arg(long, global = true)]
    json_logs: bool,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Combine the extracted Train/Test stage folders into one CSV
    Assemble {
        /// Directory holding Train/ and Test/
        #[arg(long)]
        data_dir: PathBuf,

        /// Output CSV
        #[arg(short, long)]
        output: PathBuf,
    },

    /// Extract one feature row per recording file
    Features {
        /// Assembled sample CSV
        #[arg(short, long)]
        input: PathBuf,

        /// Output feature CSV
        #[arg(short, long)]
        output: PathBuf,

        #[command(flatten)]
        extraction: ExtractionArgs,
    },

    /// Extract features, train a random forest and report held-out metrics
    Train {
        /// Assembled sample CSV
        #[arg(short, long)]
        input: PathBuf,

        #[command(flatten)]
        extraction: ExtractionArgs,

        /// Run feature elimination and grid search before the final fit
        #[arg(long)]
        tune: bool,

        /// Write the evaluation as JSON
        #[arg(long)]
        report: Option<PathBuf>,

        /// Number of trees
        #[arg(long)]
        trees: Option<u16>,

        /// Held-out share
        #[arg(long)]
        test_fraction: Option<f64>,

        /// Split, bootstrap and cross-validation seed
        #[arg(long)]
        seed: Option<u64>,
    },
}

/// Overrides shared by feature extraction and training
#[derive(Args, Debug)]
struct ExtractionArgs {
    /// Signal column
    #[arg(long)]
    signal: Option<String>,

    /// Label column
    #[arg(long)]
    label: Option<String>,

    /// Sample rate (Hz)
    #[arg(long)]
    sample_rate: Option<f64>,

    /// Add per-band features for the signal's channel
    #[arg(long)]
    multiband: bool,

    /// Per-file bandpass lower cutoff (Hz)
    #[arg(long, requires = "filter_high")]
    filter_low: Option<f64>,

    /// Per-file bandpass upper cutoff (Hz)
    #[arg(long, requires = "filter_low")]
    filter_high: Option<f64>,

    /// Bandpass order
    #[arg(long, default_value = "4")]
    filter_order: usize,
}

impl ExtractionArgs {
    fn apply(&self, config: &mut PipelineConfig) {
        if let Some(signal) = &self.signal {
            config.signal_column = signal.clone();
        }
        if let Some(label) = &self.label {
            config.label_column = label.clone();
        }
        if let Some(sample_rate) = self.sample_rate {
            config.sample_rate = sample_rate;
        }
        if self.multiband {
            config.multiband = true;
        }
        if let (Some(low), Some(high)) = (self.filter_low, self.filter_high) {
            config.filter = Some(BandpassSpec::new(low, high).with_order(self.filter_order));
        }
    }
}

fn main() -> Result<()> {
    let cli = Cli::parse();
    init_logging(cli.verbose, cli.json_logs);

    info!("=== Sleep-Stage Pipeline v{} ===", env!("CARGO_PKG_VERSION"));

    let mut config = PipelineConfig::load(cli.config.as_deref()).context("Failed to load configuration")?;

    match cli.command {
        Command::Assemble { data_dir, output } => {
            let dataset = pipeline::assemble(&data_dir, &output)?;
            println!("Assembled {} rows into {}", dataset.len(), output.display());
        }
        Command::Features {
            input,
            output,
            extraction,
        } => {
            extraction.apply(&mut config);
            let matrix = pipeline::extract_features(&config, &input, &output)?;
            println!(
                "Wrote {} rows x {} features to {}",
                matrix.n_rows(),
                matrix.n_columns(),
                output.display()
            );
        }
        Command::Train {
            input,
            extraction,
            tune,
            report,
            trees,
            test_fraction,
            seed,
        } => {
            extraction.apply(&mut config);
            if let Some(trees) = trees {
                config.forest.n_trees = trees;
            }
            if let Some(test_fraction) = test_fraction {
                config.test_fraction = test_fraction;
            }
            if let Some(seed) = seed {
                config.seed = seed;
                config.forest.seed = seed;
            }

            let evaluation = pipeline::train(&config, &input, tune, report.as_deref())?;

            if let Some(selection) = &evaluation.selection {
                println!(
                    "Selected {} features: {}",
                    selection.selected.len(),
                    selection.selected.join(", ")
                );
            }
            if let Some(search) = &evaluation.search {
                println!(
                    "Best parameters: {:?} (CV accuracy {:.4})",
                    search.best_params, search.best_score
                );
            }
            println!("Accuracy: {:.4}", evaluation.accuracy);
            println!("Classification Report:");
            println!("{}", evaluation.report);
        }
    }

    Ok(())
}
