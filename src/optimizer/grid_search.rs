//! Exhaustive grid search with cross-validated scoring

use crate::error::{Result, StarTypeError};
use crate::training::{cross_val_score_with_splits, CVSplit, CVStrategy, Classifier, CrossValidator, LogisticRegression};
use ndarray::{Array1, Array2};
use rayon::prelude::*;
use serde::{Deserialize, Serialize};
use std::time::Instant;
use tracing::{debug, info};

use super::search_space::{candidates, Candidate};
use super::GridSearchConfig;

/// Outcome of scoring one candidate
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CandidateResult {
    pub params: Candidate,
    /// Mean cross-validated accuracy, absent when the candidate failed
    pub mean_score: Option<f64>,
    /// Per-fold accuracies
    pub fold_scores: Vec<f64>,
    /// Why the candidate could not be scored
    pub error: Option<String>,
}

/// Grid search over logistic regression hyperparameters.
///
/// Candidates that cannot be fitted (incompatible penalty and solver, missing
/// elastic-net ratio, numerical failure) are recorded and skipped. The best
/// candidate is refit on the full input.
#[derive(Debug, Clone)]
pub struct GridSearch {
    config: GridSearchConfig,
    results: Vec<CandidateResult>,
    best_index: Option<usize>,
    best_estimator: Option<LogisticRegression>,
}

impl GridSearch {
    pub fn new(config: GridSearchConfig) -> Self {
        Self {
            config,
            results: Vec::new(),
            best_index: None,
            best_estimator: None,
        }
    }

    pub fn config(&self) -> &GridSearchConfig {
        &self.config
    }

    /// Score every candidate and refit the best one
    pub fn fit(&mut self, x: &Array2<f64>, y: &Array1<usize>) -> Result<&mut Self> {
        let grid = candidates(&self.config);
        if grid.is_empty() {
            return Err(StarTypeError::HyperparameterSearch("the search grid is empty".to_string()));
        }
        if self.config.cv_folds < 2 {
            return Err(StarTypeError::InvalidParameter {
                name: "cv_folds".to_string(),
                value: self.config.cv_folds.to_string(),
                reason: "must be at least 2".to_string(),
            });
        }

        // nested use can hand in fewer rows than folds
        let n_splits = self.config.cv_folds.min(x.nrows());
        if n_splits < 2 {
            return Err(StarTypeError::InsufficientData(format!(
                "grid search needs at least 2 samples, got {}",
                x.nrows()
            )));
        }
        let splits = CrossValidator::new(CVStrategy::StratifiedKFold { n_splits }).split(x.nrows(), Some(y))?;

        let start = Instant::now();
        let results = self.evaluate(&grid, x, y, &splits)?;
        let failed = results.iter().filter(|r| r.mean_score.is_none()).count();

        let mut best_index: Option<usize> = None;
        for (idx, result) in results.iter().enumerate() {
            if let Some(score) = result.mean_score {
                let better = match best_index.and_then(|b| results[b].mean_score) {
                    Some(best) => score > best,
                    None => true,
                };
                if better {
                    best_index = Some(idx);
                }
            }
        }

        let Some(best) = best_index else {
            let reason = results
                .iter()
                .find_map(|r| r.error.clone())
                .unwrap_or_else(|| "no candidate produced a score".to_string());
            return Err(StarTypeError::HyperparameterSearch(format!(
                "all {} candidates failed, first error: {}",
                results.len(),
                reason
            )));
        };

        let mut estimator = results[best].params.build(&self.config);
        estimator.fit(x, y)?;

        info!(
            candidates = results.len(),
            failed,
            folds = n_splits,
            best = %results[best].params,
            best_score = results[best].mean_score.unwrap_or_default(),
            elapsed_ms = start.elapsed().as_millis() as u64,
            "grid search finished"
        );

        self.results = results;
        self.best_index = Some(best);
        self.best_estimator = Some(estimator);
        Ok(self)
    }

    fn evaluate(
        &self,
        grid: &[Candidate],
        x: &Array2<f64>,
        y: &Array1<usize>,
        splits: &[CVSplit],
    ) -> Result<Vec<CandidateResult>> {
        let score = |candidate: &Candidate| self.score_candidate(candidate, x, y, splits);

        let results: Vec<CandidateResult> = match self.config.n_jobs {
            1 => grid.iter().map(score).collect(),
            0 => grid.par_iter().map(score).collect(),
            n => {
                let pool = rayon::ThreadPoolBuilder::new()
                    .num_threads(n)
                    .build()
                    .map_err(|e| StarTypeError::ComputationError(format!("Thread pool error: {}", e)))?;
                pool.install(|| grid.par_iter().map(score).collect())
            }
        };
        Ok(results)
    }

    fn score_candidate(
        &self,
        candidate: &Candidate,
        x: &Array2<f64>,
        y: &Array1<usize>,
        splits: &[CVSplit],
    ) -> CandidateResult {
        let model = candidate.build(&self.config);
        let outcome = model
            .validate()
            .and_then(|_| cross_val_score_with_splits(&model, x, y, splits));

        match outcome {
            Ok(cv) => CandidateResult {
                params: *candidate,
                mean_score: Some(cv.mean_score),
                fold_scores: cv.scores,
                error: None,
            },
            Err(e) => {
                debug!(candidate = %candidate, error = %e, "candidate skipped");
                CandidateResult {
                    params: *candidate,
                    mean_score: None,
                    fold_scores: Vec::new(),
                    error: Some(e.to_string()),
                }
            }
        }
    }

    /// Every scored or failed candidate, in grid order
    pub fn results(&self) -> &[CandidateResult] {
        &self.results
    }

    pub fn best_params(&self) -> Option<&Candidate> {
        self.best_index.map(|i| &self.results[i].params)
    }

    /// Mean cross-validated accuracy of the best candidate
    pub fn best_score(&self) -> Option<f64> {
        self.best_index.and_then(|i| self.results[i].mean_score)
    }

    pub fn best_estimator(&self) -> Option<&LogisticRegression> {
        self.best_estimator.as_ref()
    }
}

impl Classifier for GridSearch {
    fn fit(&mut self, x: &Array2<f64>, y: &Array1<usize>) -> Result<()> {
        GridSearch::fit(self, x, y).map(|_| ())
    }

    fn predict(&self, x: &Array2<f64>) -> Result<Array1<usize>> {
        self.best_estimator
            .as_ref()
            .ok_or(StarTypeError::ModelNotFitted)?
            .predict(x)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::training::{Penalty, Solver};
    use ndarray::array;

    fn data() -> (Array2<f64>, Array1<usize>) {
        let x = array![
            [0.0, 0.1], [0.2, 0.0], [0.1, 0.3], [0.3, 0.2],
            [5.0, 5.1], [5.2, 4.9], [4.8, 5.0], [5.1, 5.3],
        ];
        let y = array![0, 0, 0, 0, 1, 1, 1, 1];
        (x, y)
    }

    fn small_config() -> GridSearchConfig {
        GridSearchConfig::default()
            .with_c_values(vec![0.01, 1.0, 100.0])
            .with_cv_folds(4)
            .with_n_jobs(1)
    }

    #[test]
    fn test_incompatible_candidates_are_skipped() {
        let (x, y) = data();
        let mut search = GridSearch::new(small_config());
        search.fit(&x, &y).unwrap();

        assert_eq!(search.results().len(), 60);
        let lbfgs_l1 = search
            .results()
            .iter()
            .find(|r| r.params.solver == Solver::Lbfgs && r.params.penalty == Penalty::L1)
            .unwrap();
        assert!(lbfgs_l1.mean_score.is_none());
        assert!(lbfgs_l1.error.is_some());
        assert_eq!(search.best_score(), Some(1.0));
    }

    #[test]
    fn test_earliest_best_wins_ties() {
        let (x, y) = data();
        let mut search = GridSearch::new(small_config());
        search.fit(&x, &y).unwrap();
        let first_perfect = search
            .results()
            .iter()
            .position(|r| r.mean_score == Some(1.0))
            .unwrap();
        assert_eq!(search.best_params(), Some(&search.results()[first_perfect].params));
    }

    #[test]
    fn test_all_candidates_failing() {
        let (x, y) = data();
        let config = small_config()
            .with_penalties(vec![Penalty::L1])
            .with_solvers(vec![Solver::Lbfgs, Solver::Sag]);
        let mut search = GridSearch::new(config);
        assert!(matches!(search.fit(&x, &y), Err(StarTypeError::HyperparameterSearch(_))));
    }

    #[test]
    fn test_parallel_matches_sequential() {
        let (x, y) = data();
        let mut sequential = GridSearch::new(small_config());
        sequential.fit(&x, &y).unwrap();
        let mut parallel = GridSearch::new(small_config().with_n_jobs(2));
        parallel.fit(&x, &y).unwrap();

        let a: Vec<Option<f64>> = sequential.results().iter().map(|r| r.mean_score).collect();
        let b: Vec<Option<f64>> = parallel.results().iter().map(|r| r.mean_score).collect();
        assert_eq!(a, b);
        assert_eq!(sequential.best_params(), parallel.best_params());
    }

    #[test]
    fn test_predict_before_fit() {
        let search = GridSearch::new(small_config());
        assert!(matches!(
            Classifier::predict(&search, &array![[0.0, 0.0]]),
            Err(StarTypeError::ModelNotFitted)
        ));
    }

    #[test]
    fn test_folds_clamped_to_sample_count() {
        let (x, y) = data();
        let mut search = GridSearch::new(small_config().with_cv_folds(10));
        search.fit(&x, &y).unwrap();
        let scored = search.results().iter().find(|r| r.mean_score.is_some()).unwrap();
        assert_eq!(scored.fold_scores.len(), 8);
    }
}
