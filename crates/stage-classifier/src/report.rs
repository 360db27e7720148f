//! Per-Class Classification Report

use serde::{Deserialize, Serialize};
use std::fmt;

/// Precision, recall and F1 for one class
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ClassMetrics {
    pub label: String,
    pub precision: f64,
    pub recall: f64,
    pub f1_score: f64,
    /// True occurrences of the class
    pub support: usize,
}

/// Averaged metrics over all classes
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct MetricAverages {
    pub precision: f64,
    pub recall: f64,
    pub f1_score: f64,
    pub support: usize,
}

/// Per-class metrics with accuracy, macro and support-weighted averages
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ClassificationReport {
    pub classes: Vec<ClassMetrics>,
    pub accuracy: f64,
    pub macro_avg: MetricAverages,
    pub weighted_avg: MetricAverages,
}

/// `num / den`, 0 when the denominator is 0
fn ratio(num: usize, den: usize) -> f64 {
    if den == 0 {
        0.0
    } else {
        num as f64 / den as f64
    }
}

impl ClassificationReport {
    /// Compare `truth` and `predicted` for each of `classes`, in that order
    pub fn new(truth: &[String], predicted: &[String], classes: &[String]) -> Self {
        let total = truth.len();
        let correct = truth
            .iter()
            .zip(predicted)
            .filter(|(t, p)| t == p)
            .count();

        let classes: Vec<ClassMetrics> = classes
            .iter()
            .map(|label| {
                let mut tp = 0;
                let mut predicted_count = 0;
                let mut support = 0;
                for (t, p) in truth.iter().zip(predicted) {
                    let is_true = t == label;
                    let is_pred = p == label;
                    support += is_true as usize;
                    predicted_count += is_pred as usize;
                    tp += (is_true && is_pred) as usize;
                }
                let precision = ratio(tp, predicted_count);
                let recall = ratio(tp, support);
                let f1_score = if precision + recall > 0.0 {
                    2.0 * precision * recall / (precision + recall)
                } else {
                    0.0
                };
                ClassMetrics {
                    label: label.clone(),
                    precision,
                    recall,
                    f1_score,
                    support,
                }
            })
            .collect();

        let n = classes.len().max(1) as f64;
        let macro_avg = MetricAverages {
            precision: classes.iter().map(|c| c.precision).sum::<f64>() / n,
            recall: classes.iter().map(|c| c.recall).sum::<f64>() / n,
            f1_score: classes.iter().map(|c| c.f1_score).sum::<f64>() / n,
            support: total,
        };

        let weight = |f: fn(&ClassMetrics) -> f64| -> f64 {
            if total == 0 {
                return 0.0;
            }
            classes.iter().map(|c| f(c) * c.support as f64).sum::<f64>() / total as f64
        };
        let weighted_avg = MetricAverages {
            precision: weight(|c| c.precision),
            recall: weight(|c| c.recall),
            f1_score: weight(|c| c.f1_score),
            support: total,
        };

        Self {
            accuracy: ratio(correct, total),
            classes,
            macro_avg,
            weighted_avg,
        }
    }

    /// Metrics of one class by label
    pub fn class(&self, label: &str) -> Option<&ClassMetrics> {
        self.classes.iter().find(|c| c.label == label)
    }
}

impl fmt::Display for ClassificationReport {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let width = self
            .classes
            .iter()
            .map(|c| c.label.len())
            .chain(std::iter::once("weighted avg".len()))
            .max()
            .unwrap_or(0);

        writeln!(
            f,
            "{:>width$}  {:>9} {:>9} {:>9} {:>9}",
            "", "precision", "recall", "f1-score", "support"
        )?;
        writeln!(f)?;
        for c in &self.classes {
            writeln!(
                f,
                "{:>width$}  {:>9.2} {:>9.2} {:>9.2} {:>9}",
                c.label, c.precision, c.recall, c.f1_score, c.support
            )?;
        }
        writeln!(f)?;
        writeln!(
            f,
            "{:>width$}  {:>9} {:>9} {:>9.2} {:>9}",
            "accuracy", "", "", self.accuracy, self.macro_avg.support
        )?;
        for (name, avg) in [("macro avg", &self.macro_avg), ("weighted avg", &self.weighted_avg)] {
            writeln!(
                f,
                "{:>width$}  {:>9.2} {:>9.2} {:>9.2} {:>9}",
                name, avg.precision, avg.recall, avg.f1_score, avg.support
            )?;
        }
        Ok(())
    }
}
