//! Cross-Validated Model Selection
//!
//! Recursive feature elimination and exhaustive hyperparameter search, both
//! scored by mean stratified k-fold accuracy.

use crate::encoder::LabelEncoder;
use crate::forest::{accuracy, fit_forest, predict_codes, ForestParams};
use crate::split::StratifiedKFold;
use crate::ClassifierError;
use feature_engine::FeatureMatrix;
use rand::rngs::StdRng;
use rand::seq::SliceRandom;
use rand::SeedableRng;
use rayon::prelude::*;
use serde::{Deserialize, Serialize};
use tracing::{debug, info};

type Folds = Vec<(Vec<usize>, Vec<usize>)>;

/// Hyperparameter values to search exhaustively
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ParamGrid {
    pub n_trees: Vec<u16>,
    pub max_depth: Vec<Option<u16>>,
    pub min_samples_split: Vec<usize>,
    pub min_samples_leaf: Vec<usize>,
}

impl Default for ParamGrid {
    fn default() -> Self {
        Self {
            n_trees: vec![50, 100, 200],
            max_depth: vec![None, Some(10), Some(20)],
            min_samples_split: vec![2, 5, 10],
            min_samples_leaf: vec![1, 2, 4],
        }
    }
}

impl ParamGrid {
    /// Every combination, varying the last parameter fastest
    pub fn candidates(&self, seed: u64) -> Vec<ForestParams> {
        let mut candidates = Vec::with_capacity(self.len());
        for &n_trees in &self.n_trees {
            for &max_depth in &self.max_depth {
                for &min_samples_split in &self.min_samples_split {
                    for &min_samples_leaf in &self.min_samples_leaf {
                        candidates.push(ForestParams {
                            n_trees,
                            max_depth,
                            min_samples_split,
                            min_samples_leaf,
                            seed,
                        });
                    }
                }
            }
        }
        candidates
    }

    pub fn len(&self) -> usize {
        self.n_trees.len() * self.max_depth.len() * self.min_samples_split.len() * self.min_samples_leaf.len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

/// Outcome of a grid search
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GridSearchResult {
    pub best_params: ForestParams,
    pub best_score: f64,
    /// Mean CV accuracy of every candidate, in grid order
    pub scores: Vec<(ForestParams, f64)>,
}

/// Outcome of recursive feature elimination
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FeatureSelection {
    /// Retained columns, in their original order
    pub selected: Vec<String>,
    /// Mean CV accuracy of the best subset
    pub best_score: f64,
    /// Mean CV accuracy per subset size, ascending by size
    pub scores: Vec<(usize, f64)>,
    /// Columns in elimination order, least important first
    pub eliminated: Vec<String>,
}

fn gather(rows: &[Vec<f64>], indices: &[usize]) -> Vec<Vec<f64>> {
    indices.iter().map(|&i| rows[i].clone()).collect()
}

fn gather_codes(codes: &[u32], indices: &[usize]) -> Vec<u32> {
    indices.iter().map(|&i| codes[i]).collect()
}

fn project(rows: &[Vec<f64>], columns: &[usize]) -> Vec<Vec<f64>> {
    rows.iter()
        .map(|row| columns.iter().map(|&c| row[c]).collect())
        .collect()
}

fn encode(features: &FeatureMatrix, labels: &[String]) -> Result<(Vec<Vec<f64>>, Vec<u32>), ClassifierError> {
    if labels.len() != features.n_rows() {
        return Err(ClassifierError::InvalidData(format!(
            "{} feature rows but {} labels",
            features.n_rows(),
            labels.len()
        )));
    }
    let codes = LabelEncoder::fit(labels).transform(labels)?;
    Ok((features.to_rows(), codes))
}

/// Mean held-out accuracy of `params` over `folds`
fn cv_score(
    rows: &[Vec<f64>],
    codes: &[u32],
    folds: &Folds,
    params: &ForestParams,
) -> Result<f64, ClassifierError> {
    let mut total = 0.0;
    for (train, test) in folds {
        let forest = fit_forest(&gather(rows, train), &gather_codes(codes, train), params)?;
        let predicted = predict_codes(&forest, &gather(rows, test))?;
        total += accuracy(&gather_codes(codes, test), &predicted);
    }
    Ok(total / folds.len() as f64)
}

/// Held-out accuracy of one fold and the accuracy drop caused by shuffling
/// each column of the held-out rows
fn fold_importance(
    rows: &[Vec<f64>],
    codes: &[u32],
    fold: &(Vec<usize>, Vec<usize>),
    params: &ForestParams,
    seed: u64,
) -> Result<(f64, Vec<f64>), ClassifierError> {
    let (train, test) = fold;
    let forest = fit_forest(&gather(rows, train), &gather_codes(codes, train), params)?;

    let test_rows = gather(rows, test);
    let test_codes = gather_codes(codes, test);
    let baseline = accuracy(&test_codes, &predict_codes(&forest, &test_rows)?);

    let n_columns = rows.first().map_or(0, Vec::len);
    let mut rng = StdRng::seed_from_u64(seed);
    let mut drops = Vec::with_capacity(n_columns);
    for column in 0..n_columns {
        let mut values: Vec<f64> = test_rows.iter().map(|row| row[column]).collect();
        values.shuffle(&mut rng);

        let mut permuted = test_rows.clone();
        for (row, value) in permuted.iter_mut().zip(values) {
            row[column] = value;
        }
        let score = accuracy(&test_codes, &predict_codes(&forest, &permuted)?);
        drops.push(baseline - score);
    }

    Ok((baseline, drops))
}

/// Recursive feature elimination with stratified k-fold cross-validation.
///
/// Starting from every column, the column with the smallest mean permutation
/// importance is dropped one at a time. The subset with the best mean CV
/// accuracy is kept; ties favor fewer columns.
pub fn select_features_rfecv(
    features: &FeatureMatrix,
    labels: &[String],
    params: &ForestParams,
    folds: usize,
) -> Result<FeatureSelection, ClassifierError> {
    let (rows, codes) = encode(features, labels)?;
    if features.n_columns() == 0 {
        return Err(ClassifierError::InvalidData("no feature columns".to_string()));
    }
    let splits = StratifiedKFold::new(folds, params.seed).split(&codes)?;

    info!(
        "RFECV over {} features with {}-fold stratified CV",
        features.n_columns(),
        folds
    );

    let mut active: Vec<usize> = (0..features.n_columns()).collect();
    let mut history: Vec<(Vec<usize>, f64)> = Vec::with_capacity(active.len());
    let mut eliminated = Vec::with_capacity(active.len());

    loop {
        let subset = project(&rows, &active);
        let per_fold = splits
            .par_iter()
            .enumerate()
            .map(|(i, fold)| {
                fold_importance(&subset, &codes, fold, params, params.seed.wrapping_add(i as u64))
            })
            .collect::<Result<Vec<_>, _>>()?;

        let score = per_fold.iter().map(|(s, _)| s).sum::<f64>() / per_fold.len() as f64;
        debug!("{} features: CV accuracy {:.4}", active.len(), score);
        history.push((active.clone(), score));

        if active.len() == 1 {
            break;
        }

        let mut weakest = 0;
        let mut weakest_importance = f64::INFINITY;
        for position in 0..active.len() {
            let importance =
                per_fold.iter().map(|(_, d)| d[position]).sum::<f64>() / per_fold.len() as f64;
            if importance < weakest_importance {
                weakest_importance = importance;
                weakest = position;
            }
        }
        let removed = active.remove(weakest);
        eliminated.push(features.columns()[removed].clone());
    }

    let mut best = &history[0];
    for entry in &history[1..] {
        // Later entries are smaller, so >= prefers fewer columns on ties
        if entry.1 >= best.1 {
            best = entry;
        }
    }

    let selected: Vec<String> = best.0.iter().map(|&c| features.columns()[c].clone()).collect();
    info!(
        "RFECV kept {} of {} features (CV accuracy {:.4})",
        selected.len(),
        features.n_columns(),
        best.1
    );

    let mut scores: Vec<(usize, f64)> = history.iter().map(|(cols, s)| (cols.len(), *s)).collect();
    scores.reverse();

    Ok(FeatureSelection {
        selected,
        best_score: best.1,
        scores,
        eliminated,
    })
}

/// Score every grid candidate by mean stratified k-fold accuracy.
///
/// Candidates are fitted in parallel; the first best in grid order wins.
pub fn grid_search(
    features: &FeatureMatrix,
    labels: &[String],
    grid: &ParamGrid,
    folds: usize,
    seed: u64,
) -> Result<GridSearchResult, ClassifierError> {
    let (rows, codes) = encode(features, labels)?;
    let candidates = grid.candidates(seed);
    if candidates.is_empty() {
        return Err(ClassifierError::InvalidData("parameter grid is empty".to_string()));
    }
    let splits = StratifiedKFold::new(folds, seed).split(&codes)?;

    info!(
        "Grid search over {} candidates with {}-fold stratified CV ({} fits)",
        candidates.len(),
        folds,
        candidates.len() * folds
    );

    let scores = candidates
        .par_iter()
        .map(|params| cv_score(&rows, &codes, &splits, params).map(|score| (*params, score)))
        .collect::<Result<Vec<_>, _>>()?;

    let mut best = scores[0];
    for &(params, score) in &scores[1..] {
        if score > best.1 {
            best = (params, score);
        }
    }

    info!("Best parameters: {:?} (CV accuracy {:.4})", best.0, best.1);

    Ok(GridSearchResult {
        best_params: best.0,
        best_score: best.1,
        scores,
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    /// Two informative columns followed by two noise columns
    fn dataset(n_per_class: usize) -> (FeatureMatrix, Vec<String>) {
        let mut rows = Vec::new();
        let mut labels = Vec::new();
        let mut files = Vec::new();
        for i in 0..n_per_class {
            let noise_a = ((i * 7919) % 101) as f64 / 101.0;
            let noise_b = ((i * 104729) % 53) as f64 / 53.0;
            let jitter = (i as f64 * 1.3).sin() * 0.3;
            for (class, offset) in [("awake", 0.0), ("rem", 5.0)] {
                rows.push(vec![offset + jitter, offset - jitter, noise_a, noise_b]);
                labels.push(class.to_string());
                files.push(format!("{}{}", class, i));
            }
        }
        let columns = ["x", "y", "noise_a", "noise_b"].iter().map(|c| c.to_string()).collect();
        (FeatureMatrix::from_rows(columns, files, rows).unwrap(), labels)
    }

    fn small() -> ForestParams {
        ForestParams {
            n_trees: 8,
            ..ForestParams::default()
        }
    }

    #[test]
    fn test_default_grid() {
        let grid = ParamGrid::default();
        assert_eq!(grid.len(), 81);
        let candidates = grid.candidates(42);
        assert_eq!(candidates.len(), 81);
        assert_eq!(candidates[0].n_trees, 50);
        assert_eq!(candidates[0].max_depth, None);
        assert_eq!(candidates[1].min_samples_leaf, 2);
        assert!(candidates.iter().all(|c| c.seed == 42));
    }

    #[test]
    fn test_rfecv_keeps_informative_column() {
        let (features, labels) = dataset(15);
        let selection = select_features_rfecv(&features, &labels, &small(), 5).unwrap();

        assert_eq!(selection.scores.len(), 4);
        assert_eq!(selection.scores[0].0, 1);
        assert_eq!(selection.eliminated.len(), 3);
        assert!(selection.best_score >= 0.9);
        assert!(
            selection.selected.iter().any(|c| c == "x" || c == "y"),
            "selected {:?}",
            selection.selected
        );
    }

    #[test]
    fn test_grid_search_scores_every_candidate() {
        let (features, labels) = dataset(15);
        let grid = ParamGrid {
            n_trees: vec![4, 8],
            max_depth: vec![None, Some(3)],
            min_samples_split: vec![2],
            min_samples_leaf: vec![1],
        };
        let result = grid_search(&features, &labels, &grid, 3, 42).unwrap();
        assert_eq!(result.scores.len(), 4);
        assert!(result.best_score >= 0.9);
        assert!(result.scores.iter().all(|(_, s)| *s <= result.best_score));
    }

    #[test]
    fn test_grid_search_rejects_empty_grid() {
        let (features, labels) = dataset(5);
        let grid = ParamGrid {
            n_trees: vec![],
            ..ParamGrid::default()
        };
        assert!(grid.is_empty());
        assert!(grid_search(&features, &labels, &grid, 3, 42).is_err());
    }

    #[test]
    fn test_label_count_mismatch() {
        let (features, labels) = dataset(5);
        assert!(matches!(
            grid_search(&features, &labels[..4], &ParamGrid::default(), 3, 42),
            Err(ClassifierError::InvalidData(_))
        ));
    }
}
