//! Candidate hyperparameter combinations

use crate::training::{LogisticRegression, Penalty, Solver};
use serde::{Deserialize, Serialize};
use std::fmt;

use super::GridSearchConfig;

/// One point of the search grid
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Candidate {
    #[serde(rename = "C")]
    pub c: f64,
    pub penalty: Penalty,
    pub solver: Solver,
}

impl Candidate {
    /// Unfitted model carrying this candidate's hyperparameters
    pub fn build(&self, config: &GridSearchConfig) -> LogisticRegression {
        LogisticRegression::new()
            .with_c(self.c)
            .with_penalty(self.penalty)
            .with_solver(self.solver)
            .with_l1_ratio(config.l1_ratio)
            .with_max_iter(config.max_iter)
            .with_tol(config.tol)
            .with_random_state(config.random_state)
    }
}

impl fmt::Display for Candidate {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "C={:.6e}, penalty={}, solver={}", self.c, self.penalty, self.solver)
    }
}

/// Expand the grid with C varying slowest, then penalty, then solver
pub fn candidates(config: &GridSearchConfig) -> Vec<Candidate> {
    let mut out = Vec::with_capacity(config.n_candidates());
    for &c in &config.c_values {
        for &penalty in &config.penalties {
            for &solver in &config.solvers {
                out.push(Candidate { c, penalty, solver });
            }
        }
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_candidate_order() {
        let config = GridSearchConfig::default()
            .with_c_values(vec![0.1, 1.0])
            .with_penalties(vec![Penalty::L1, Penalty::L2])
            .with_solvers(vec![Solver::Liblinear, Solver::Saga]);
        let grid = candidates(&config);
        assert_eq!(grid.len(), 8);
        assert_eq!(grid[0], Candidate { c: 0.1, penalty: Penalty::L1, solver: Solver::Liblinear });
        assert_eq!(grid[1].solver, Solver::Saga);
        assert_eq!(grid[2].penalty, Penalty::L2);
        assert_eq!(grid[4].c, 1.0);
    }

    #[test]
    fn test_build_copies_settings() {
        let config = GridSearchConfig::default().with_l1_ratio(Some(0.3)).with_max_iter(7);
        let model = Candidate { c: 2.0, penalty: Penalty::ElasticNet, solver: Solver::Saga }.build(&config);
        assert_eq!(model.c, 2.0);
        assert_eq!(model.l1_ratio, Some(0.3));
        assert_eq!(model.max_iter, 7);
        assert!(model.validate().is_ok());
    }
}
