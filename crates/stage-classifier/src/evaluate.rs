//! Train/Evaluate Workflows

use crate::encoder::LabelEncoder;
use crate::forest::{train_with_encoder, ForestParams, StageClassifier};
use crate::report::ClassificationReport;
use crate::selection::{grid_search, select_features_rfecv, FeatureSelection, GridSearchResult, ParamGrid};
use crate::split::train_test_split;
use crate::ClassifierError;
use feature_engine::FeatureMatrix;
use serde::{Deserialize, Serialize};
use tracing::info;

/// Split, seed and cross-validation settings for a training run
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct TrainOptions {
    /// Forest used directly, or as the base for feature elimination when tuning
    pub params: ForestParams,
    /// Held-out share of the rows
    pub test_fraction: f64,
    /// Split and cross-validation seed
    pub seed: u64,
    /// Folds for stratified cross-validation
    pub cv_folds: usize,
}

impl Default for TrainOptions {
    fn default() -> Self {
        Self {
            params: ForestParams::default(),
            test_fraction: 0.3,
            seed: 42,
            cv_folds: 5,
        }
    }
}

/// Held-out performance of a trained model
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Evaluation {
    pub accuracy: f64,
    pub report: ClassificationReport,
    /// Forest that produced the predictions
    pub params: ForestParams,
    /// Columns the model was trained on
    pub features: Vec<String>,
    pub n_train: usize,
    pub n_test: usize,
    /// Feature elimination outcome, when tuned
    pub selection: Option<FeatureSelection>,
    /// Grid search outcome, when tuned
    pub search: Option<GridSearchResult>,
}

/// Score `model` on `features` and their true `labels`
pub fn evaluate(
    model: &StageClassifier,
    features: &FeatureMatrix,
    labels: &[String],
) -> Result<Evaluation, ClassifierError> {
    let predicted = model.predict(features)?;
    let report = ClassificationReport::new(labels, &predicted, model.encoder().classes());
    Ok(Evaluation {
        accuracy: report.accuracy,
        report,
        params: *model.params(),
        features: model.feature_names().to_vec(),
        n_train: 0,
        n_test: labels.len(),
        selection: None,
        search: None,
    })
}

struct Split {
    train: FeatureMatrix,
    train_labels: Vec<String>,
    test: FeatureMatrix,
    test_labels: Vec<String>,
    encoder: LabelEncoder,
}

fn split(
    features: &FeatureMatrix,
    labels: &[String],
    options: &TrainOptions,
) -> Result<Split, ClassifierError> {
    if labels.len() != features.n_rows() {
        return Err(ClassifierError::InvalidData(format!(
            "{} feature rows but {} labels",
            features.n_rows(),
            labels.len()
        )));
    }

    // Encode over all labels so a class missing from one side keeps its code
    let encoder = LabelEncoder::fit(labels);
    let (train_idx, test_idx) = train_test_split(labels.len(), options.test_fraction, options.seed)?;
    let pick = |idx: &[usize]| idx.iter().map(|&i| labels[i].clone()).collect::<Vec<_>>();

    info!(
        "Split {} rows into {} train / {} test (seed {})",
        labels.len(),
        train_idx.len(),
        test_idx.len(),
        options.seed
    );

    Ok(Split {
        train: features.take_rows(&train_idx),
        train_labels: pick(&train_idx),
        test: features.take_rows(&test_idx),
        test_labels: pick(&test_idx),
        encoder,
    })
}

/// Encode, split, train with `options.params` and evaluate on the held-out rows
pub fn train_and_evaluate(
    features: &FeatureMatrix,
    labels: &[String],
    options: &TrainOptions,
) -> Result<Evaluation, ClassifierError> {
    let split = split(features, labels, options)?;
    let model = train_with_encoder(&split.train, &split.train_labels, split.encoder, &options.params)?;

    let mut evaluation = evaluate(&model, &split.test, &split.test_labels)?;
    evaluation.n_train = split.train_labels.len();

    info!("Test accuracy: {:.4}", evaluation.accuracy);
    Ok(evaluation)
}

/// Select features, search hyperparameters and evaluate the refit model.
///
/// Elimination and search only see the training rows; the held-out rows are
/// touched once, by the final evaluation.
pub fn tune_and_evaluate(
    features: &FeatureMatrix,
    labels: &[String],
    options: &TrainOptions,
    grid: &ParamGrid,
) -> Result<Evaluation, ClassifierError> {
    let split = split(features, labels, options)?;

    let selection = select_features_rfecv(
        &split.train,
        &split.train_labels,
        &options.params,
        options.cv_folds,
    )?;
    let train = split
        .train
        .select(&selection.selected)
        .map_err(|e| ClassifierError::InvalidData(e.to_string()))?;
    let test = split
        .test
        .select(&selection.selected)
        .map_err(|e| ClassifierError::InvalidData(e.to_string()))?;

    let search = grid_search(&train, &split.train_labels, grid, options.cv_folds, options.seed)?;
    let model = train_with_encoder(&train, &split.train_labels, split.encoder, &search.best_params)?;

    let mut evaluation = evaluate(&model, &test, &split.test_labels)?;
    evaluation.n_train = split.train_labels.len();
    evaluation.selection = Some(selection);
    evaluation.search = Some(search);

    info!("Tuned test accuracy: {:.4}", evaluation.accuracy);
    Ok(evaluation)
}
