//! Seeded Train/Test and Cross-Validation Splits

use crate::ClassifierError;
use rand::rngs::StdRng;
use rand::seq::SliceRandom;
use rand::SeedableRng;
use std::collections::BTreeMap;

/// Shuffle `0..n` and cut it into `(train, test)` index sets.
///
/// The test set holds `ceil(test_fraction * n)` samples; both sets must be
/// non-empty.
pub fn train_test_split(
    n: usize,
    test_fraction: f64,
    seed: u64,
) -> Result<(Vec<usize>, Vec<usize>), ClassifierError> {
    if !(test_fraction > 0.0 && test_fraction < 1.0) {
        return Err(ClassifierError::InvalidData(format!(
            "test fraction must be in (0, 1), got {}",
            test_fraction
        )));
    }

    let n_test = (test_fraction * n as f64).ceil() as usize;
    if n_test == 0 || n_test >= n {
        return Err(ClassifierError::NotEnoughSamples {
            required: 2,
            actual: n,
        });
    }

    let mut indices: Vec<usize> = (0..n).collect();
    indices.shuffle(&mut StdRng::seed_from_u64(seed));

    let train = indices.split_off(n_test);
    Ok((train, indices))
}

/// Stratified k-fold splitter.
///
/// Each class is shuffled and dealt round-robin over the folds, continuing
/// where the previous class stopped, so fold sizes differ by at most one and
/// every class is spread as evenly as possible.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct StratifiedKFold {
    k: usize,
    seed: u64,
}

impl StratifiedKFold {
    pub fn new(k: usize, seed: u64) -> Self {
        Self { k, seed }
    }

    pub fn n_splits(&self) -> usize {
        self.k
    }

    /// `(train, test)` index pairs, one per fold.
    ///
    /// Every sample appears in exactly one test fold.
    pub fn split(&self, labels: &[u32]) -> Result<Vec<(Vec<usize>, Vec<usize>)>, ClassifierError> {
        if self.k < 2 {
            return Err(ClassifierError::InvalidData(format!(
                "cross-validation needs at least 2 folds, got {}",
                self.k
            )));
        }
        if labels.len() < self.k {
            return Err(ClassifierError::NotEnoughSamples {
                required: self.k,
                actual: labels.len(),
            });
        }

        let mut by_class: BTreeMap<u32, Vec<usize>> = BTreeMap::new();
        for (idx, &label) in labels.iter().enumerate() {
            by_class.entry(label).or_default().push(idx);
        }

        let mut rng = StdRng::seed_from_u64(self.seed);
        let mut fold_of = vec![0usize; labels.len()];
        let mut next = 0;
        for members in by_class.values_mut() {
            members.shuffle(&mut rng);
            for &idx in members.iter() {
                fold_of[idx] = next;
                next = (next + 1) % self.k;
            }
        }

        Ok((0..self.k)
            .map(|fold| {
                let (test, train): (Vec<usize>, Vec<usize>) =
                    (0..labels.len()).partition(|&idx| fold_of[idx] == fold);
                (train, test)
            })
            .collect())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    #[test]
    fn test_split_sizes() {
        let (train, test) = train_test_split(10, 0.3, 42).unwrap();
        assert_eq!(train.len(), 7);
        assert_eq!(test.len(), 3);

        let (train, test) = train_test_split(11, 0.3, 42).unwrap();
        assert_eq!(test.len(), 4);
        assert_eq!(train.len(), 7);
    }

    #[test]
    fn test_split_deterministic() {
        assert_eq!(
            train_test_split(50, 0.3, 42).unwrap(),
            train_test_split(50, 0.3, 42).unwrap()
        );
        assert_ne!(
            train_test_split(50, 0.3, 42).unwrap(),
            train_test_split(50, 0.3, 7).unwrap()
        );
    }

    #[test]
    fn test_split_rejects_degenerate() {
        assert!(train_test_split(1, 0.3, 42).is_err());
        assert!(train_test_split(0, 0.3, 42).is_err());
        assert!(train_test_split(10, 0.0, 42).is_err());
        assert!(train_test_split(10, 1.0, 42).is_err());
    }

    #[test]
    fn test_stratified_folds_balance_classes() {
        let labels: Vec<u32> = (0..30).map(|i| (i % 3) as u32).collect();
        let folds = StratifiedKFold::new(5, 42).split(&labels).unwrap();
        assert_eq!(folds.len(), 5);
        for (train, test) in &folds {
            assert_eq!(test.len(), 6);
            assert_eq!(train.len(), 24);
            for class in 0..3 {
                assert_eq!(test.iter().filter(|&&i| labels[i] == class).count(), 2);
            }
        }
    }

    #[test]
    fn test_stratified_rejects_too_few() {
        assert!(StratifiedKFold::new(5, 42).split(&[0, 1, 0]).is_err());
        assert!(StratifiedKFold::new(1, 42).split(&[0, 1, 0]).is_err());
    }

    proptest! {
        #[test]
        fn split_is_a_partition(n in 2usize..200, fraction in 0.05f64..0.95, seed in any::<u64>()) {
            if let Ok((train, test)) = train_test_split(n, fraction, seed) {
                let mut all: Vec<usize> = train.iter().chain(&test).copied().collect();
                all.sort_unstable();
                prop_assert_eq!(all, (0..n).collect::<Vec<_>>());
            }
        }

        #[test]
        fn each_sample_tested_once(labels in proptest::collection::vec(0u32..4, 5..120), seed in any::<u64>()) {
            let folds = StratifiedKFold::new(5, seed).split(&labels).unwrap();
            let mut seen = vec![0usize; labels.len()];
            for (train, test) in &folds {
                prop_assert!(!test.is_empty());
                prop_assert_eq!(train.len() + test.len(), labels.len());
                for &idx in test {
                    seen[idx] += 1;
                }
            }
            prop_assert!(seen.iter().all(|&count| count == 1));
        }
    }
}
