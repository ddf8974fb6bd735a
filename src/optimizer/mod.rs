//! Hyperparameter optimization module
//!
//! Exhaustive grid search over logistic regression penalty, inverse
//! regularisation strength and solver, scored by stratified k-fold accuracy.

mod config;
mod grid_search;
mod search_space;

pub use config::{logspace, GridSearchConfig};
pub use grid_search::{CandidateResult, GridSearch};
pub use search_space::{candidates, Candidate};
