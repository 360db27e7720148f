//! Random Forest Stage Classifier

use crate::encoder::LabelEncoder;
use crate::ClassifierError;
use feature_engine::FeatureMatrix;
use serde::{Deserialize, Serialize};
use smartcore::ensemble::random_forest_classifier::{
    RandomForestClassifier, RandomForestClassifierParameters,
};
use smartcore::linalg::basic::matrix::DenseMatrix;
use tracing::{debug, info};

pub(crate) type Forest = RandomForestClassifier<f64, u32, DenseMatrix<f64>, Vec<u32>>;

/// Random forest hyperparameters
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(default)]
pub struct ForestParams {
    /// Number of trees
    pub n_trees: u16,
    /// Maximum tree depth, unlimited when `None`
    pub max_depth: Option<u16>,
    /// Minimum samples required to split a node
    pub min_samples_split: usize,
    /// Minimum samples required in a leaf
    pub min_samples_leaf: usize,
    /// Bootstrap seed
    pub seed: u64,
}

impl Default for ForestParams {
    fn default() -> Self {
        Self {
            n_trees: 100,
            max_depth: None,
            min_samples_split: 2,
            min_samples_leaf: 1,
            seed: 42,
        }
    }
}

impl ForestParams {
    fn to_smartcore(self) -> RandomForestClassifierParameters {
        let mut params = RandomForestClassifierParameters::default()
            .with_n_trees(self.n_trees)
            .with_min_samples_split(self.min_samples_split)
            .with_min_samples_leaf(self.min_samples_leaf);
        params.max_depth = self.max_depth;
        params.seed = self.seed;
        params
    }
}

pub(crate) fn dense(rows: &Vec<Vec<f64>>) -> Result<DenseMatrix<f64>, ClassifierError> {
    DenseMatrix::from_2d_vec(rows)
        .map_err(|e| ClassifierError::InvalidData(format!("Failed to create feature matrix: {:?}", e)))
}

/// Fit a forest on encoded labels
pub(crate) fn fit_forest(
    rows: &Vec<Vec<f64>>,
    codes: &Vec<u32>,
    params: &ForestParams,
) -> Result<Forest, ClassifierError> {
    if rows.is_empty() {
        return Err(ClassifierError::NotEnoughSamples {
            required: 1,
            actual: 0,
        });
    }
    if rows.len() != codes.len() {
        return Err(ClassifierError::InvalidData(format!(
            "{} feature rows but {} labels",
            rows.len(),
            codes.len()
        )));
    }

    let x = dense(rows)?;
    RandomForestClassifier::fit(&x, codes, params.to_smartcore())
        .map_err(|e| ClassifierError::TrainingFailed(format!("{:?}", e)))
}

/// Predict encoded labels
pub(crate) fn predict_codes(forest: &Forest, rows: &Vec<Vec<f64>>) -> Result<Vec<u32>, ClassifierError> {
    if rows.is_empty() {
        return Ok(Vec::new());
    }
    let x = dense(rows)
        .map_err(|e| ClassifierError::PredictionFailed(e.to_string()))?;
    forest
        .predict(&x)
        .map_err(|e| ClassifierError::PredictionFailed(format!("{:?}", e)))
}

/// Fraction of equal entries
pub(crate) fn accuracy(truth: &[u32], predicted: &[u32]) -> f64 {
    if truth.is_empty() {
        return 0.0;
    }
    let correct = truth.iter().zip(predicted).filter(|(t, p)| t == p).count();
    correct as f64 / truth.len() as f64
}

/// Trained forest together with its label encoding and input columns
#[derive(Debug)]
pub struct StageClassifier {
    forest: Forest,
    encoder: LabelEncoder,
    feature_names: Vec<String>,
    params: ForestParams,
}

impl StageClassifier {
    /// Predict stage labels for every row of `features`.
    ///
    /// `features` must carry the training columns in training order.
    pub fn predict(&self, features: &FeatureMatrix) -> Result<Vec<String>, ClassifierError> {
        if features.columns() != self.feature_names.as_slice() {
            return Err(ClassifierError::InvalidData(format!(
                "expected {} training columns, got {} columns in a different layout",
                self.feature_names.len(),
                features.n_columns()
            )));
        }
        let codes = predict_codes(&self.forest, &features.to_rows())?;
        self.encoder.inverse_transform(&codes)
    }

    pub fn encoder(&self) -> &LabelEncoder {
        &self.encoder
    }

    pub fn feature_names(&self) -> &[String] {
        &self.feature_names
    }

    pub fn params(&self) -> &ForestParams {
        &self.params
    }
}

/// Train a forest on `features` and their string `labels`
pub fn train(
    features: &FeatureMatrix,
    labels: &[String],
    params: &ForestParams,
) -> Result<StageClassifier, ClassifierError> {
    let encoder = LabelEncoder::fit(labels);
    train_with_encoder(features, labels, encoder, params)
}

/// Train with a fixed encoding, so codes agree across splits
pub(crate) fn train_with_encoder(
    features: &FeatureMatrix,
    labels: &[String],
    encoder: LabelEncoder,
    params: &ForestParams,
) -> Result<StageClassifier, ClassifierError> {
    let codes = encoder.transform(labels)?;

    info!(
        "Training random forest with {} samples, {} features, {} classes",
        features.n_rows(),
        features.n_columns(),
        encoder.n_classes()
    );
    debug!("Parameters: {:?}", params);

    let forest = fit_forest(&features.to_rows(), &codes, params)?;

    Ok(StageClassifier {
        forest,
        encoder,
        feature_names: features.columns().to_vec(),
        params: *params,
    })
}
