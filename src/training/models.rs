//! Classifier trait and scoring helpers

use crate::error::{Result, StarTypeError};
use ndarray::{Array1, Array2};

/// A classifier over dense numeric features and encoded class labels
pub trait Classifier: Send + Sync {
    /// Fit the model, replacing any previous fit
    fn fit(&mut self, x: &Array2<f64>, y: &Array1<usize>) -> Result<()>;

    /// Predict class labels
    fn predict(&self, x: &Array2<f64>) -> Result<Array1<usize>>;

    /// Mean accuracy on the given data
    fn score(&self, x: &Array2<f64>, y: &Array1<usize>) -> Result<f64> {
        let y_pred = self.predict(x)?;
        accuracy(y, &y_pred)
    }
}

/// Fraction of exactly matching labels
pub fn accuracy(y_true: &Array1<usize>, y_pred: &Array1<usize>) -> Result<f64> {
    if y_true.len() != y_pred.len() {
        return Err(StarTypeError::ShapeError {
            expected: format!("{} predictions", y_true.len()),
            actual: format!("{} predictions", y_pred.len()),
        });
    }
    if y_true.is_empty() {
        return Err(StarTypeError::InsufficientData(
            "cannot score an empty set".to_string(),
        ));
    }

    let correct = y_true.iter().zip(y_pred.iter()).filter(|(t, p)| t == p).count();
    Ok(correct as f64 / y_true.len() as f64)
}
