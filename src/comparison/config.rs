//! Comparison configuration

use crate::optimizer::GridSearchConfig;
use serde::{Deserialize, Serialize};

/// Settings for one model comparison run
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ComparisonConfig {
    /// Fraction of rows held out for validation
    pub test_size: f64,

    /// Seed for the train/holdout shuffle
    pub random_state: u64,

    /// Folds used for the training accuracy of every strategy
    pub cv_folds: usize,

    /// Accuracy gap beyond which a strategy is called over- or underfitting
    pub fit_threshold: f64,

    /// Search space and settings for the tuned strategy
    pub search: GridSearchConfig,
}

impl Default for ComparisonConfig {
    fn default() -> Self {
        Self {
            test_size: 0.3,
            random_state: 0,
            cv_folds: 10,
            fit_threshold: 0.5,
            search: GridSearchConfig::default(),
        }
    }
}

impl ComparisonConfig {
    /// Create a new configuration
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_test_size(mut self, test_size: f64) -> Self {
        self.test_size = test_size;
        self
    }

    pub fn with_random_state(mut self, seed: u64) -> Self {
        self.random_state = seed;
        self
    }

    /// Set the fold count for both the strategies and the grid search
    pub fn with_cv_folds(mut self, folds: usize) -> Self {
        self.cv_folds = folds;
        self.search.cv_folds = folds;
        self
    }

    pub fn with_fit_threshold(mut self, threshold: f64) -> Self {
        self.fit_threshold = threshold;
        self
    }

    pub fn with_search(mut self, search: GridSearchConfig) -> Self {
        self.search = search;
        self
    }
}
