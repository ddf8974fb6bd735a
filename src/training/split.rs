//! Seeded train/holdout partitioning

use crate::error::{Result, StarTypeError};
use ndarray::{Array1, Array2, Axis};
use rand::seq::SliceRandom;
use rand::SeedableRng;
use rand_chacha::ChaCha8Rng;

/// Result of [`train_test_split`]
#[derive(Debug, Clone)]
pub struct TrainTestSplit {
    pub x_train: Array2<f64>,
    pub x_test: Array2<f64>,
    pub y_train: Array1<usize>,
    pub y_test: Array1<usize>,
    /// Row indices of the training partition, in partition order
    pub train_indices: Vec<usize>,
    /// Row indices of the holdout partition, in partition order
    pub test_indices: Vec<usize>,
}

/// Shuffle row indices with a seeded generator and cut off `ceil(test_size * n)`
/// rows as the holdout partition.
///
/// The same inputs and seed always produce the same partition.
pub fn train_test_split(
    x: &Array2<f64>,
    y: &Array1<usize>,
    test_size: f64,
    random_state: u64,
) -> Result<TrainTestSplit> {
    if !(test_size > 0.0 && test_size < 1.0) {
        return Err(StarTypeError::InvalidParameter {
            name: "test_size".to_string(),
            value: test_size.to_string(),
            reason: "must be in the open interval (0, 1)".to_string(),
        });
    }
    let n_samples = x.nrows();
    if n_samples != y.len() {
        return Err(StarTypeError::ShapeError {
            expected: format!("y length = {}", n_samples),
            actual: format!("y length = {}", y.len()),
        });
    }

    let n_test = (test_size * n_samples as f64).ceil() as usize;
    let n_train = n_samples.saturating_sub(n_test);
    if n_test == 0 || n_train == 0 {
        return Err(StarTypeError::InsufficientData(format!(
            "{} samples cannot be split with test_size = {}",
            n_samples, test_size
        )));
    }

    let mut indices: Vec<usize> = (0..n_samples).collect();
    let mut rng = ChaCha8Rng::seed_from_u64(random_state);
    indices.shuffle(&mut rng);

    let test_indices = indices[..n_test].to_vec();
    let train_indices = indices[n_test..].to_vec();

    Ok(TrainTestSplit {
        x_train: x.select(Axis(0), &train_indices),
        x_test: x.select(Axis(0), &test_indices),
        y_train: y.select(Axis(0), &train_indices),
        y_test: y.select(Axis(0), &test_indices),
        train_indices,
        test_indices,
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    fn data(n: usize) -> (Array2<f64>, Array1<usize>) {
        let x = Array2::from_shape_fn((n, 2), |(i, j)| (i * 2 + j) as f64);
        let y = Array1::from_iter((0..n).map(|i| i % 3));
        (x, y)
    }

    #[test]
    fn test_split_sizes() {
        let (x, y) = data(100);
        let split = train_test_split(&x, &y, 0.3, 0).unwrap();
        assert_eq!(split.x_test.nrows(), 30);
        assert_eq!(split.x_train.nrows(), 70);

        let (x, y) = data(15);
        let split = train_test_split(&x, &y, 0.3, 0).unwrap();
        assert_eq!(split.test_indices.len(), 5); // ceil(4.5)
        assert_eq!(split.train_indices.len(), 10);
    }

    #[test]
    fn test_split_is_partition() {
        let (x, y) = data(37);
        let split = train_test_split(&x, &y, 0.3, 0).unwrap();
        let mut all: Vec<usize> = split.train_indices.iter().chain(&split.test_indices).copied().collect();
        all.sort_unstable();
        assert_eq!(all, (0..37).collect::<Vec<_>>());

        // rows follow their indices
        for (row, &idx) in split.train_indices.iter().enumerate() {
            assert_eq!(split.x_train.row(row), x.row(idx));
            assert_eq!(split.y_train[row], y[idx]);
        }
    }

    #[test]
    fn test_split_deterministic() {
        let (x, y) = data(50);
        let a = train_test_split(&x, &y, 0.3, 0).unwrap();
        let b = train_test_split(&x, &y, 0.3, 0).unwrap();
        assert_eq!(a.test_indices, b.test_indices);
        let c = train_test_split(&x, &y, 0.3, 7).unwrap();
        assert_ne!(a.test_indices, c.test_indices);
    }

    #[test]
    fn test_split_too_small() {
        let (x, y) = data(1);
        assert!(matches!(
            train_test_split(&x, &y, 0.3, 0),
            Err(StarTypeError::InsufficientData(_))
        ));
    }

    #[test]
    fn test_split_invalid_fraction() {
        let (x, y) = data(10);
        assert!(matches!(
            train_test_split(&x, &y, 1.0, 0),
            Err(StarTypeError::InvalidParameter { .. })
        ));
    }
}
