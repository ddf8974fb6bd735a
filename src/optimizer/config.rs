//! Grid search configuration

use crate::training::{Penalty, Solver};
use serde::{Deserialize, Serialize};

/// `num` values evenly spaced on a log10 scale between `10^start` and `10^stop`
pub fn logspace(start: f64, stop: f64, num: usize) -> Vec<f64> {
    match num {
        0 => Vec::new(),
        1 => vec![10f64.powf(start)],
        _ => {
            let step = (stop - start) / (num - 1) as f64;
            (0..num).map(|i| 10f64.powf(start + step * i as f64)).collect()
        }
    }
}

/// Configuration for exhaustive hyperparameter search
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GridSearchConfig {
    /// Penalties to try
    pub penalties: Vec<Penalty>,

    /// Inverse regularisation strengths to try
    pub c_values: Vec<f64>,

    /// Solvers to try
    pub solvers: Vec<Solver>,

    /// Cross-validation folds used to score each candidate
    pub cv_folds: usize,

    /// Elastic-net mixing parameter handed to every candidate
    pub l1_ratio: Option<f64>,

    /// Number of parallel workers (0 = all cores, 1 = sequential)
    pub n_jobs: usize,

    /// Maximum solver iterations per fit
    pub max_iter: usize,

    /// Solver convergence tolerance
    pub tol: f64,

    /// Seed for the stochastic solvers
    pub random_state: u64,
}

impl Default for GridSearchConfig {
    fn default() -> Self {
        Self {
            penalties: Penalty::ALL.to_vec(),
            c_values: logspace(-4.0, 4.0, 20),
            solvers: Solver::ALL.to_vec(),
            cv_folds: 10,
            l1_ratio: None,
            n_jobs: 0,
            max_iter: 100,
            tol: 1e-4,
            random_state: 0,
        }
    }
}

impl GridSearchConfig {
    /// Create a new configuration
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_penalties(mut self, penalties: Vec<Penalty>) -> Self {
        self.penalties = penalties;
        self
    }

    pub fn with_c_values(mut self, c_values: Vec<f64>) -> Self {
        self.c_values = c_values;
        self
    }

    pub fn with_solvers(mut self, solvers: Vec<Solver>) -> Self {
        self.solvers = solvers;
        self
    }

    /// Builder method to set cross-validation folds
    pub fn with_cv_folds(mut self, folds: usize) -> Self {
        self.cv_folds = folds;
        self
    }

    pub fn with_l1_ratio(mut self, l1_ratio: Option<f64>) -> Self {
        self.l1_ratio = l1_ratio;
        self
    }

    /// Builder method to enable parallel execution
    pub fn with_n_jobs(mut self, n: usize) -> Self {
        self.n_jobs = n;
        self
    }

    pub fn with_max_iter(mut self, max_iter: usize) -> Self {
        self.max_iter = max_iter;
        self
    }

    /// Number of candidates the grid expands to
    pub fn n_candidates(&self) -> usize {
        self.penalties.len() * self.c_values.len() * self.solvers.len()
    }
}
