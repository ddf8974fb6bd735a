//! Cross-validation implementations

use crate::error::{Result, StarTypeError};
use ndarray::{Array1, Array2, Axis};
use rand::seq::SliceRandom;
use rand::SeedableRng;
use rand_chacha::ChaCha8Rng;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

use super::models::Classifier;

/// Cross-validation strategy
#[derive(Debug, Clone, Serialize, Deserialize)]
pub enum CVStrategy {
    /// K-Fold cross-validation
    KFold { n_splits: usize, shuffle: bool },
    /// Stratified K-Fold (maintains class distribution, no shuffling)
    StratifiedKFold { n_splits: usize },
}

impl Default for CVStrategy {
    fn default() -> Self {
        CVStrategy::StratifiedKFold { n_splits: 10 }
    }
}

/// A single train/test split
#[derive(Debug, Clone)]
pub struct CVSplit {
    pub train_indices: Vec<usize>,
    pub test_indices: Vec<usize>,
    pub fold_idx: usize,
}

/// Cross-validation splitter
pub struct CrossValidator {
    strategy: CVStrategy,
    random_state: Option<u64>,
}

impl CrossValidator {
    /// Create a new cross-validator
    pub fn new(strategy: CVStrategy) -> Self {
        Self {
            strategy,
            random_state: None,
        }
    }

    /// Set random state for reproducibility
    pub fn with_random_state(mut self, seed: u64) -> Self {
        self.random_state = Some(seed);
        self
    }

    /// Generate train/test splits
    pub fn split(&self, n_samples: usize, y: Option<&Array1<usize>>) -> Result<Vec<CVSplit>> {
        match &self.strategy {
            CVStrategy::KFold { n_splits, shuffle } => {
                Self::check_fold_count(n_samples, *n_splits)?;
                self.k_fold_split(n_samples, *n_splits, *shuffle)
            }
            CVStrategy::StratifiedKFold { n_splits } => {
                let y = y.ok_or_else(|| StarTypeError::InvalidParameter {
                    name: "y".to_string(),
                    value: "None".to_string(),
                    reason: "StratifiedKFold requires target array".to_string(),
                })?;
                if y.len() != n_samples {
                    return Err(StarTypeError::ShapeError {
                        expected: format!("y length = {}", n_samples),
                        actual: format!("y length = {}", y.len()),
                    });
                }
                Self::check_fold_count(n_samples, *n_splits)?;
                Ok(Self::stratified_k_fold_split(y, *n_splits))
            }
        }
    }

    fn check_fold_count(n_samples: usize, n_splits: usize) -> Result<()> {
        if n_splits < 2 {
            return Err(StarTypeError::InvalidParameter {
                name: "n_splits".to_string(),
                value: n_splits.to_string(),
                reason: "must be at least 2".to_string(),
            });
        }
        if n_samples < n_splits {
            return Err(StarTypeError::InsufficientData(format!(
                "n_samples ({}) must be >= n_splits ({})",
                n_samples, n_splits
            )));
        }
        Ok(())
    }

    fn k_fold_split(&self, n_samples: usize, n_splits: usize, shuffle: bool) -> Result<Vec<CVSplit>> {
        let mut indices: Vec<usize> = (0..n_samples).collect();

        if shuffle {
            let mut rng = match self.random_state {
                Some(seed) => ChaCha8Rng::seed_from_u64(seed),
                None => ChaCha8Rng::from_entropy(),
            };
            indices.shuffle(&mut rng);
        }

        let base = n_samples / n_splits;
        let remainder = n_samples % n_splits;

        let mut splits = Vec::with_capacity(n_splits);
        let mut current = 0;

        for fold_idx in 0..n_splits {
            let fold_size = if fold_idx < remainder { base + 1 } else { base };
            let test_indices: Vec<usize> = indices[current..current + fold_size].to_vec();
            let train_indices: Vec<usize> = indices[..current]
                .iter()
                .chain(indices[current + fold_size..].iter())
                .copied()
                .collect();

            splits.push(CVSplit {
                train_indices,
                test_indices,
                fold_idx,
            });

            current += fold_size;
        }

        Ok(splits)
    }

    /// Deal samples to folds round-robin, class by class, carrying the fold
    /// offset across classes so fold sizes differ by at most one.
    fn stratified_k_fold_split(y: &Array1<usize>, n_splits: usize) -> Vec<CVSplit> {
        let mut class_indices: BTreeMap<usize, Vec<usize>> = BTreeMap::new();
        for (idx, &class) in y.iter().enumerate() {
            class_indices.entry(class).or_default().push(idx);
        }

        let mut fold_of = vec![0usize; y.len()];
        let mut position = 0usize;
        for indices in class_indices.values() {
            for &idx in indices {
                fold_of[idx] = position % n_splits;
                position += 1;
            }
        }

        (0..n_splits)
            .map(|fold_idx| {
                let (test_indices, train_indices): (Vec<usize>, Vec<usize>) =
                    (0..y.len()).partition(|&i| fold_of[i] == fold_idx);
                CVSplit {
                    train_indices,
                    test_indices,
                    fold_idx,
                }
            })
            .collect()
    }
}

/// Cross-validation results
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CVResults {
    /// Scores for each fold
    pub scores: Vec<f64>,
    /// Mean score across folds
    pub mean_score: f64,
    /// Standard deviation of scores
    pub std_score: f64,
    /// Number of folds
    pub n_folds: usize,
}

impl CVResults {
    /// Create CV results from fold scores
    pub fn from_scores(scores: Vec<f64>) -> Self {
        let n_folds = scores.len();
        let mean_score = scores.iter().sum::<f64>() / n_folds as f64;
        let variance = scores.iter().map(|s| (s - mean_score).powi(2)).sum::<f64>() / n_folds as f64;
        let std_score = variance.sqrt();

        Self {
            scores,
            mean_score,
            std_score,
            n_folds,
        }
    }
}

/// Accuracy of fresh copies of `estimator` over stratified k-fold splits
pub fn cross_val_score<C: Classifier + Clone>(
    estimator: &C,
    x: &Array2<f64>,
    y: &Array1<usize>,
    n_splits: usize,
) -> Result<CVResults> {
    let splits = CrossValidator::new(CVStrategy::StratifiedKFold { n_splits }).split(x.nrows(), Some(y))?;
    cross_val_score_with_splits(estimator, x, y, &splits)
}

/// Accuracy of fresh copies of `estimator` over precomputed splits
pub fn cross_val_score_with_splits<C: Classifier + Clone>(
    estimator: &C,
    x: &Array2<f64>,
    y: &Array1<usize>,
    splits: &[CVSplit],
) -> Result<CVResults> {
    let scores = splits
        .iter()
        .map(|split| {
            let mut model = estimator.clone();
            model.fit(
                &x.select(Axis(0), &split.train_indices),
                &y.select(Axis(0), &split.train_indices),
            )?;
            model.score(
                &x.select(Axis(0), &split.test_indices),
                &y.select(Axis(0), &split.test_indices),
            )
        })
        .collect::<Result<Vec<f64>>>()?;

    Ok(CVResults::from_scores(scores))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::training::accuracy;

    #[test]
    fn test_k_fold() {
        let cv = CrossValidator::new(CVStrategy::KFold { n_splits: 5, shuffle: false });
        let splits = cv.split(100, None).unwrap();

        assert_eq!(splits.len(), 5);

        // Each test set should have 20 samples
        for split in &splits {
            assert_eq!(split.test_indices.len(), 20);
            assert_eq!(split.train_indices.len(), 80);
        }

        // All indices should be covered exactly once in test sets
        let mut all_test: Vec<usize> = splits.iter().flat_map(|s| s.test_indices.clone()).collect();
        all_test.sort();
        assert_eq!(all_test, (0..100).collect::<Vec<_>>());
    }

    #[test]
    fn test_k_fold_shuffle_seeded() {
        let cv = CrossValidator::new(CVStrategy::KFold { n_splits: 4, shuffle: true }).with_random_state(3);
        let a = cv.split(20, None).unwrap();
        let b = cv.split(20, None).unwrap();
        assert_eq!(a[0].test_indices, b[0].test_indices);
    }

    #[test]
    fn test_stratified_k_fold() {
        let y = Array1::from_vec(vec![
            0, 0, 0, 0, 0, // 5 samples of class 0
            1, 1, 1, 1, 1, // 5 samples of class 1
        ]);

        let cv = CrossValidator::new(CVStrategy::StratifiedKFold { n_splits: 5 });
        let splits = cv.split(10, Some(&y)).unwrap();

        assert_eq!(splits.len(), 5);

        // Each fold should have 1 sample from each class
        for split in &splits {
            assert_eq!(split.test_indices.len(), 2);
            let classes: Vec<usize> = split.test_indices.iter().map(|&i| y[i]).collect();
            assert!(classes.contains(&0) && classes.contains(&1));
        }
    }

    #[test]
    fn test_stratified_uneven_classes_balanced_folds() {
        // 7 of class 0, 3 of class 1, 10 folds of one sample each
        let y = Array1::from_vec(vec![0, 1, 0, 0, 1, 0, 0, 1, 0, 0]);
        let cv = CrossValidator::new(CVStrategy::StratifiedKFold { n_splits: 10 });
        let splits = cv.split(10, Some(&y)).unwrap();
        assert!(splits.iter().all(|s| s.test_indices.len() == 1));
    }

    #[test]
    fn test_too_many_folds() {
        let y = Array1::from_vec(vec![0, 1, 0, 1]);
        let cv = CrossValidator::new(CVStrategy::StratifiedKFold { n_splits: 10 });
        assert!(matches!(cv.split(4, Some(&y)), Err(StarTypeError::InsufficientData(_))));
    }

    #[derive(Clone)]
    struct Majority {
        class: usize,
    }

    impl Classifier for Majority {
        fn fit(&mut self, _x: &Array2<f64>, y: &Array1<usize>) -> Result<()> {
            let mut counts: BTreeMap<usize, usize> = BTreeMap::new();
            for &c in y {
                *counts.entry(c).or_default() += 1;
            }
            self.class = counts.into_iter().max_by_key(|&(_, n)| n).map(|(c, _)| c).unwrap_or(0);
            Ok(())
        }

        fn predict(&self, x: &Array2<f64>) -> Result<Array1<usize>> {
            Ok(Array1::from_elem(x.nrows(), self.class))
        }
    }

    #[test]
    fn test_cross_val_score() {
        let x = Array2::zeros((12, 1));
        let y = Array1::from_vec(vec![0, 0, 0, 0, 0, 0, 0, 0, 0, 1, 1, 1]);
        let results = cross_val_score(&Majority { class: 0 }, &x, &y, 3).unwrap();
        assert_eq!(results.n_folds, 3);
        let expected = accuracy(&y, &Array1::zeros(12)).unwrap();
        assert!((results.mean_score - expected).abs() < 1e-12);
    }
}
