//! Star type classifier comparison
//!
//! Compares logistic regression under different preprocessing strategies on
//! a labeled tabular dataset and reports, for each strategy, cross-validated
//! training accuracy, holdout accuracy and a fit verdict.
//!
//! # Modules
//!
//! ## Core
//! - [`data`] - CSV loading and label encoding
//! - [`preprocessing`] - Standard and min-max feature scaling
//! - [`training`] - Splitting, cross-validation, logistic regression
//! - [`optimizer`] - Grid search over logistic regression hyperparameters
//! - [`comparison`] - The four-strategy comparison engine and its report
//!
//! ## Services
//! - [`server`] - HTTP server with the CSV upload endpoint
//! - [`cli`] - Command-line interface

// Core error handling
pub mod error;

// Core modules
pub mod data;
pub mod preprocessing;
pub mod training;
pub mod optimizer;
pub mod comparison;

// Services
pub mod server;
pub mod cli;

pub use error::{Result, StarTypeError};

/// Re-export commonly used types
pub mod prelude {
    // Error handling
    pub use crate::error::{Result, StarTypeError};

    // Data
    pub use crate::data::Dataset;

    // Preprocessing
    pub use crate::preprocessing::{Scaler, ScalerType};

    // Training
    pub use crate::training::{
        accuracy, cross_val_score, train_test_split, Classifier, LogisticRegression, Penalty, Solver,
    };

    // Optimization
    pub use crate::optimizer::{Candidate, GridSearch, GridSearchConfig};

    // Comparison
    pub use crate::comparison::{
        ComparisonConfig, FitVerdict, ModelComparisonEngine, Report, Strategy, StrategyResult,
    };
}
