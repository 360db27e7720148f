//! Sleep-Stage Classifier
//!
//! Random forest training, held-out evaluation and cross-validated model
//! selection over per-recording feature matrices.

mod encoder;
mod evaluate;
mod forest;
mod report;
mod selection;
mod split;

pub use encoder::LabelEncoder;
pub use evaluate::{evaluate, train_and_evaluate, tune_and_evaluate, Evaluation, TrainOptions};
pub use forest::{train, ForestParams, StageClassifier};
pub use report::{ClassMetrics, ClassificationReport, MetricAverages};
pub use selection::{
    grid_search, select_features_rfecv, FeatureSelection, GridSearchResult, ParamGrid,
};
pub use split::{train_test_split, StratifiedKFold};

use thiserror::Error;

/// Errors during training and evaluation
#[derive(Debug, Error)]
pub enum ClassifierError {
    #[error("Unknown label: {0}")]
    UnknownLabel(String),
    #[error("Invalid data: {0}")]
    InvalidData(String),
    #[error("Training failed: {0}")]
    TrainingFailed(String),
    #[error("Prediction failed: {0}")]
    PredictionFailed(String),
    #[error("Not enough samples: need {required}, got {actual}")]
    NotEnoughSamples { required: usize, actual: usize },
}
