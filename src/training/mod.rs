//! Model training module
//!
//! Provides the pieces every comparison strategy is built from:
//! - Seeded train/holdout partitioning
//! - K-fold and stratified k-fold cross-validation
//! - Multiclass logistic regression with l1, l2, elastic-net or no penalty
//!   and five solvers (lbfgs, newton-cg, liblinear, sag, saga)

mod models;
mod solvers;
pub mod cross_validation;
pub mod logistic;
pub mod split;

pub use models::{accuracy, Classifier};
pub use cross_validation::{
    cross_val_score, cross_val_score_with_splits, CVResults, CVSplit, CVStrategy, CrossValidator,
};
pub use logistic::{LogisticRegression, Penalty, Solver};
pub use split::{train_test_split, TrainTestSplit};
