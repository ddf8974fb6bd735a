//! Error types for the star type comparison service

use thiserror::Error;

/// Result type alias for startype operations
pub type Result<T> = std::result::Result<T, StarTypeError>;

/// Main error type for the crate
#[derive(Error, Debug)]
pub enum StarTypeError {
    /// Dataset shape or type violations (too few columns, non-numeric features, nulls)
    #[error("Malformed input: {0}")]
    MalformedInput(String),

    /// Too few rows for the configured split or fold count
    #[error("Insufficient data: {0}")]
    InsufficientData(String),

    /// Every candidate in a hyperparameter search failed
    #[error("Hyperparameter search failed: {0}")]
    HyperparameterSearch(String),

    #[error("Invalid parameter: {name} = {value}, {reason}")]
    InvalidParameter {
        name: String,
        value: String,
        reason: String,
    },

    #[error("Invalid shape: expected {expected}, got {actual}")]
    ShapeError { expected: String, actual: String },

    #[error("Model not fitted")]
    ModelNotFitted,

    #[error("Computation error: {0}")]
    ComputationError(String),

    #[error("Data error: {0}")]
    DataError(String),

    #[error("IO error: {0}")]
    IoError(#[from] std::io::Error),
}

impl StarTypeError {
    /// Whether the error is caused by the caller's data rather than the service
    pub fn is_client_error(&self) -> bool {
        matches!(
            self,
            StarTypeError::MalformedInput(_)
                | StarTypeError::InsufficientData(_)
                | StarTypeError::DataError(_)
        )
    }
}

impl From<polars::error::PolarsError> for StarTypeError {
    fn from(err: polars::error::PolarsError) -> Self {
        StarTypeError::DataError(err.to_string())
    }
}

impl From<ndarray::ShapeError> for StarTypeError {
    fn from(err: ndarray::ShapeError) -> Self {
        StarTypeError::ShapeError {
            expected: "valid shape".to_string(),
            actual: err.to_string(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_display() {
        let err = StarTypeError::MalformedInput("need at least 2 columns".to_string());
        assert_eq!(err.to_string(), "Malformed input: need at least 2 columns");
    }

    #[test]
    fn test_error_from_io() {
        let io_err = std::io::Error::new(std::io::ErrorKind::NotFound, "file not found");
        let err: StarTypeError = io_err.into();
        assert!(matches!(err, StarTypeError::IoError(_)));
        assert!(!err.is_client_error());
    }

    #[test]
    fn test_client_errors() {
        assert!(StarTypeError::InsufficientData("x".into()).is_client_error());
        assert!(!StarTypeError::HyperparameterSearch("x".into()).is_client_error());
    }
}
