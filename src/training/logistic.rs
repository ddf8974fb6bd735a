//! Regularised multiclass logistic regression

use crate::error::{Result, StarTypeError};
use ndarray::{Array1, Array2, Axis};
use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;
use std::fmt;

use super::models::Classifier;
use super::solvers::{self, Multinomial, SolverOptions};

/// Regularisation penalty
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Penalty {
    L1,
    L2,
    ElasticNet,
    None,
}

impl Penalty {
    pub const ALL: [Penalty; 4] = [Penalty::L1, Penalty::L2, Penalty::ElasticNet, Penalty::None];

    pub fn as_str(&self) -> &'static str {
        match self {
            Penalty::L1 => "l1",
            Penalty::L2 => "l2",
            Penalty::ElasticNet => "elasticnet",
            Penalty::None => "none",
        }
    }
}

impl fmt::Display for Penalty {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Optimisation algorithm used to fit the coefficients
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum Solver {
    Lbfgs,
    NewtonCg,
    Liblinear,
    Sag,
    Saga,
}

impl Solver {
    pub const ALL: [Solver; 5] = [
        Solver::Lbfgs,
        Solver::NewtonCg,
        Solver::Liblinear,
        Solver::Sag,
        Solver::Saga,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            Solver::Lbfgs => "lbfgs",
            Solver::NewtonCg => "newton-cg",
            Solver::Liblinear => "liblinear",
            Solver::Sag => "sag",
            Solver::Saga => "saga",
        }
    }

    /// Whether this solver can optimise the given penalty
    pub fn supports(&self, penalty: Penalty) -> bool {
        match self {
            Solver::Lbfgs | Solver::NewtonCg | Solver::Sag => {
                matches!(penalty, Penalty::L2 | Penalty::None)
            }
            Solver::Liblinear => matches!(penalty, Penalty::L1 | Penalty::L2),
            Solver::Saga => true,
        }
    }
}

impl fmt::Display for Solver {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Logistic regression classifier.
///
/// All solvers except `liblinear` minimise the multinomial log-loss;
/// `liblinear` fits one binary problem per class and predicts the class with
/// the highest decision value.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LogisticRegression {
    /// Regularisation penalty
    pub penalty: Penalty,
    /// Inverse regularisation strength
    pub c: f64,
    /// Optimisation algorithm
    pub solver: Solver,
    /// Elastic-net mixing parameter, required when `penalty` is elasticnet
    pub l1_ratio: Option<f64>,
    /// Maximum solver iterations (epochs for sag/saga)
    pub max_iter: usize,
    /// Convergence tolerance
    pub tol: f64,
    /// Seed for the stochastic solvers
    pub random_state: u64,
    /// Fitted coefficients, one column per class
    pub coefficients: Option<Array2<f64>>,
    /// Fitted intercepts, one per class
    pub intercepts: Option<Array1<f64>>,
    /// Class labels seen during fit, ascending
    pub classes: Vec<usize>,
    /// Iterations used by the last fit
    pub n_iter: usize,
    /// Whether model is fitted
    pub is_fitted: bool,
}

impl Default for LogisticRegression {
    fn default() -> Self {
        Self::new()
    }
}

impl LogisticRegression {
    /// Create a model with an l2 penalty, C = 1 and the lbfgs solver
    pub fn new() -> Self {
        Self {
            penalty: Penalty::L2,
            c: 1.0,
            solver: Solver::Lbfgs,
            l1_ratio: None,
            max_iter: 100,
            tol: 1e-4,
            random_state: 0,
            coefficients: None,
            intercepts: None,
            classes: Vec::new(),
            n_iter: 0,
            is_fitted: false,
        }
    }

    pub fn with_penalty(mut self, penalty: Penalty) -> Self {
        self.penalty = penalty;
        self
    }

    /// Set inverse regularisation strength
    pub fn with_c(mut self, c: f64) -> Self {
        self.c = c;
        self
    }

    pub fn with_solver(mut self, solver: Solver) -> Self {
        self.solver = solver;
        self
    }

    pub fn with_l1_ratio(mut self, l1_ratio: Option<f64>) -> Self {
        self.l1_ratio = l1_ratio;
        self
    }

    /// Set maximum iterations
    pub fn with_max_iter(mut self, max_iter: usize) -> Self {
        self.max_iter = max_iter;
        self
    }

    pub fn with_tol(mut self, tol: f64) -> Self {
        self.tol = tol;
        self
    }

    pub fn with_random_state(mut self, seed: u64) -> Self {
        self.random_state = seed;
        self
    }

    fn invalid(name: &str, value: impl ToString, reason: &str) -> StarTypeError {
        StarTypeError::InvalidParameter {
            name: name.to_string(),
            value: value.to_string(),
            reason: reason.to_string(),
        }
    }

    /// Check the hyperparameter combination before fitting
    pub fn validate(&self) -> Result<()> {
        if !(self.c.is_finite() && self.c > 0.0) {
            return Err(Self::invalid("C", self.c, "must be a positive finite number"));
        }
        if self.max_iter == 0 {
            return Err(Self::invalid("max_iter", self.max_iter, "must be at least 1"));
        }
        if !(self.tol.is_finite() && self.tol > 0.0) {
            return Err(Self::invalid("tol", self.tol, "must be positive"));
        }
        if !self.solver.supports(self.penalty) {
            return Err(Self::invalid(
                "penalty",
                self.penalty,
                &format!("solver {} does not support this penalty", self.solver),
            ));
        }
        if self.penalty == Penalty::ElasticNet {
            match self.l1_ratio {
                Some(r) if (0.0..=1.0).contains(&r) => {}
                Some(r) => return Err(Self::invalid("l1_ratio", r, "must be in [0, 1]")),
                None => return Err(Self::invalid("l1_ratio", "None", "required for the elasticnet penalty")),
            }
        }
        Ok(())
    }

    /// L1 and L2 strengths of the per-sample objective
    fn penalty_strengths(&self, n_samples: usize) -> (f64, f64) {
        let scale = 1.0 / (self.c * n_samples as f64);
        match self.penalty {
            Penalty::L1 => (scale, 0.0),
            Penalty::L2 => (0.0, scale),
            Penalty::ElasticNet => {
                let r = self.l1_ratio.unwrap_or(0.0);
                (r * scale, (1.0 - r) * scale)
            }
            Penalty::None => (0.0, 0.0),
        }
    }

    /// Fit the model
    pub fn fit(&mut self, x: &Array2<f64>, y: &Array1<usize>) -> Result<&mut Self> {
        self.validate()?;

        let n_samples = x.nrows();
        let n_features = x.ncols();
        if n_samples != y.len() {
            return Err(StarTypeError::ShapeError {
                expected: format!("y length = {}", n_samples),
                actual: format!("y length = {}", y.len()),
            });
        }
        if n_samples == 0 {
            return Err(StarTypeError::InsufficientData("cannot fit on zero samples".to_string()));
        }
        if x.iter().any(|v| !v.is_finite()) {
            return Err(StarTypeError::ComputationError("input contains non-finite values".to_string()));
        }

        self.classes = y.iter().copied().collect::<BTreeSet<_>>().into_iter().collect();
        let n_classes = self.classes.len();

        if n_classes == 1 {
            self.coefficients = Some(Array2::zeros((n_features, 1)));
            self.intercepts = Some(Array1::zeros(1));
            self.n_iter = 0;
            self.is_fitted = true;
            return Ok(self);
        }

        let encoded: Vec<usize> = y
            .iter()
            .map(|label| self.classes.partition_point(|c| c < label))
            .collect();

        let (l1, l2) = self.penalty_strengths(n_samples);
        let objective = Multinomial::new(x.view(), &encoded, n_classes, l1, l2);
        let options = SolverOptions {
            max_iter: self.max_iter,
            tol: self.tol,
            random_state: self.random_state,
        };

        let solution = match self.solver {
            Solver::Lbfgs => solvers::lbfgs(&objective, &options)?,
            Solver::NewtonCg => solvers::newton_cg(&objective, &options)?,
            Solver::Liblinear => solvers::one_vs_rest(&objective, &options)?,
            Solver::Sag => solvers::stochastic_average(&objective, &options, false)?,
            Solver::Saga => solvers::stochastic_average(&objective, &options, true)?,
        };

        if solution.theta.iter().any(|v| !v.is_finite()) {
            return Err(StarTypeError::ComputationError(format!(
                "{} produced non-finite coefficients",
                self.solver
            )));
        }
        if !solution.converged {
            tracing::debug!(
                solver = %self.solver,
                penalty = %self.penalty,
                c = self.c,
                max_iter = self.max_iter,
                "logistic regression did not converge"
            );
        }

        let theta = Array2::from_shape_vec((n_features + 1, n_classes), solution.theta)?;
        self.coefficients = Some(theta.slice(ndarray::s![..n_features, ..]).to_owned());
        self.intercepts = Some(theta.row(n_features).to_owned());
        self.n_iter = solution.n_iter;
        self.is_fitted = true;

        Ok(self)
    }

    /// Per-class decision values
    pub fn decision_function(&self, x: &Array2<f64>) -> Result<Array2<f64>> {
        let (coefficients, intercepts) = match (&self.coefficients, &self.intercepts) {
            (Some(c), Some(i)) if self.is_fitted => (c, i),
            _ => return Err(StarTypeError::ModelNotFitted),
        };
        if x.ncols() != coefficients.nrows() {
            return Err(StarTypeError::ShapeError {
                expected: format!("{} features", coefficients.nrows()),
                actual: format!("{} features", x.ncols()),
            });
        }
        Ok(x.dot(coefficients) + intercepts)
    }

    /// Predict class labels
    pub fn predict(&self, x: &Array2<f64>) -> Result<Array1<usize>> {
        let scores = self.decision_function(x)?;
        Ok(scores
            .axis_iter(Axis(0))
            .map(|row| {
                let mut best = 0;
                for (idx, &v) in row.iter().enumerate() {
                    if v > row[best] {
                        best = idx;
                    }
                }
                self.classes[best]
            })
            .collect())
    }
}

impl Classifier for LogisticRegression {
    fn fit(&mut self, x: &Array2<f64>, y: &Array1<usize>) -> Result<()> {
        LogisticRegression::fit(self, x, y).map(|_| ())
    }

    fn predict(&self, x: &Array2<f64>) -> Result<Array1<usize>> {
        LogisticRegression::predict(self, x)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use ndarray::array;

    fn blobs() -> (Array2<f64>, Array1<usize>) {
        let x = array![
            [0.0, 0.1],
            [0.2, 0.0],
            [0.1, 0.3],
            [5.0, 5.1],
            [5.2, 4.9],
            [4.8, 5.0],
            [0.0, 9.8],
            [0.3, 10.1],
            [-0.2, 10.0],
        ];
        let y = array![0, 0, 0, 1, 1, 1, 2, 2, 2];
        (x, y)
    }

    #[test]
    fn test_every_supported_combination_separates_blobs() {
        let (x, y) = blobs();
        for solver in Solver::ALL {
            for penalty in [Penalty::L2, Penalty::None, Penalty::L1] {
                if !solver.supports(penalty) {
                    continue;
                }
                let mut model = LogisticRegression::new()
                    .with_solver(solver)
                    .with_penalty(penalty)
                    .with_c(10.0)
                    .with_max_iter(500);
                model.fit(&x, &y).unwrap();
                let acc = Classifier::score(&model, &x, &y).unwrap();
                assert_eq!(acc, 1.0, "{} / {} accuracy {}", solver, penalty, acc);
            }
        }
    }

    #[test]
    fn test_incompatible_penalty_rejected() {
        let (x, y) = blobs();
        let mut model = LogisticRegression::new().with_solver(Solver::Lbfgs).with_penalty(Penalty::L1);
        assert!(matches!(model.fit(&x, &y), Err(StarTypeError::InvalidParameter { .. })));

        let mut model = LogisticRegression::new().with_solver(Solver::Liblinear).with_penalty(Penalty::None);
        assert!(matches!(model.fit(&x, &y), Err(StarTypeError::InvalidParameter { .. })));
    }

    #[test]
    fn test_elasticnet_needs_l1_ratio() {
        let (x, y) = blobs();
        let mut model = LogisticRegression::new()
            .with_solver(Solver::Saga)
            .with_penalty(Penalty::ElasticNet);
        assert!(matches!(model.fit(&x, &y), Err(StarTypeError::InvalidParameter { .. })));

        let mut model = model.with_l1_ratio(Some(0.5)).with_max_iter(500);
        model.fit(&x, &y).unwrap();
        assert!(model.is_fitted);
    }

    #[test]
    fn test_predict_keeps_original_labels() {
        let x = array![[0.0], [0.1], [3.0], [3.1]];
        let y = array![4, 4, 7, 7];
        let mut model = LogisticRegression::new().with_c(100.0);
        model.fit(&x, &y).unwrap();
        assert_eq!(model.classes, vec![4, 7]);
        assert_eq!(model.predict(&x).unwrap(), y);
    }

    #[test]
    fn test_single_class_is_constant() {
        let x = array![[1.0, 2.0], [3.0, 4.0]];
        let y = array![2, 2];
        let mut model = LogisticRegression::new();
        model.fit(&x, &y).unwrap();
        assert_eq!(model.predict(&array![[100.0, -5.0]]).unwrap(), array![2]);
    }

    #[test]
    fn test_not_fitted() {
        let model = LogisticRegression::new();
        assert!(matches!(model.predict(&array![[1.0]]), Err(StarTypeError::ModelNotFitted)));
    }

    #[test]
    fn test_invalid_c() {
        let (x, y) = blobs();
        let mut model = LogisticRegression::new().with_c(0.0);
        assert!(matches!(model.fit(&x, &y), Err(StarTypeError::InvalidParameter { .. })));
    }
}
