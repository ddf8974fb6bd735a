//! Model comparison engine
//!
//! Trains logistic regression under four strategies on the same seeded
//! train/holdout split and reports cross-validated training accuracy,
//! holdout accuracy and a fit verdict for each:
//! - no feature scaling
//! - z-score scaling fitted on the training partition
//! - min-max scaling fitted on the training partition
//! - grid-searched hyperparameters on unscaled features

mod config;
mod report;

pub use config::ComparisonConfig;
pub use report::{FitVerdict, Report, Strategy, StrategyResult, REPORT_COLUMNS};

use crate::data::Dataset;
use crate::error::{Result, StarTypeError};
use crate::optimizer::GridSearch;
use crate::preprocessing::{Scaler, ScalerType};
use crate::training::{cross_val_score, train_test_split, Classifier, LogisticRegression, TrainTestSplit};
use ndarray::{Array1, Array2};
use std::time::Instant;
use tracing::info;

/// Compares modeling strategies on a labeled dataset
#[derive(Debug, Clone, Default)]
pub struct ModelComparisonEngine {
    config: ComparisonConfig,
}

impl ModelComparisonEngine {
    pub fn new(config: ComparisonConfig) -> Self {
        Self { config }
    }

    pub fn config(&self) -> &ComparisonConfig {
        &self.config
    }

    /// Seeded train/holdout partition used by every strategy
    pub fn split(&self, dataset: &Dataset) -> Result<TrainTestSplit> {
        let split = train_test_split(
            dataset.features(),
            dataset.labels(),
            self.config.test_size,
            self.config.random_state,
        )?;
        if split.train_indices.len() < self.config.cv_folds {
            return Err(StarTypeError::InsufficientData(format!(
                "training partition has {} rows, {}-fold cross-validation needs at least {}",
                split.train_indices.len(),
                self.config.cv_folds,
                self.config.cv_folds
            )));
        }
        Ok(split)
    }

    /// Scaler of the given kind as fitted by [`compare`](Self::compare),
    /// i.e. on the training partition only
    pub fn fitted_scaler(&self, dataset: &Dataset, scaler_type: ScalerType) -> Result<Scaler> {
        let split = self.split(dataset)?;
        let mut scaler = Scaler::new(scaler_type);
        scaler.fit(&split.x_train)?;
        Ok(scaler)
    }

    /// Run all four strategies and return their report
    pub fn compare(&self, dataset: &Dataset) -> Result<Report> {
        self.validate()?;
        let start = Instant::now();
        info!(
            rows = dataset.n_samples(),
            features = dataset.n_features(),
            classes = dataset.n_classes(),
            "starting model comparison"
        );

        let split = self.split(dataset)?;
        let (x_train, y_train) = (&split.x_train, &split.y_train);
        let (x_test, y_test) = (&split.x_test, &split.y_test);

        let mut results = Vec::with_capacity(4);
        results.push(self.run_plain(Strategy::NoScaling, x_train, y_train, x_test, y_test)?);

        for (strategy, scaler_type) in [
            (Strategy::StandardScaling, ScalerType::Standard),
            (Strategy::MinMaxScaling, ScalerType::MinMax),
        ] {
            let mut scaler = Scaler::new(scaler_type);
            let x_train_scaled = scaler.fit_transform(x_train)?;
            let x_test_scaled = scaler.transform(x_test)?;
            results.push(self.run_plain(strategy, &x_train_scaled, y_train, &x_test_scaled, y_test)?);
        }

        let (tuned, tuned_params) = self.run_tuned(x_train, y_train, x_test, y_test)?;
        results.push(tuned);

        let report = Report::new(
            results,
            Some(tuned_params),
            split.train_indices.len(),
            split.test_indices.len(),
        )?;
        info!(elapsed_ms = start.elapsed().as_millis() as u64, "model comparison finished");
        Ok(report)
    }

    fn validate(&self) -> Result<()> {
        if self.config.cv_folds < 2 {
            return Err(StarTypeError::InvalidParameter {
                name: "cv_folds".to_string(),
                value: self.config.cv_folds.to_string(),
                reason: "must be at least 2".to_string(),
            });
        }
        if !(self.config.fit_threshold.is_finite() && self.config.fit_threshold >= 0.0) {
            return Err(StarTypeError::InvalidParameter {
                name: "fit_threshold".to_string(),
                value: self.config.fit_threshold.to_string(),
                reason: "must be a non-negative number".to_string(),
            });
        }
        Ok(())
    }

    fn base_model(&self) -> LogisticRegression {
        LogisticRegression::new().with_random_state(self.config.random_state)
    }

    /// Fresh default logistic regression on the given (possibly scaled) partitions
    fn run_plain(
        &self,
        strategy: Strategy,
        x_train: &Array2<f64>,
        y_train: &Array1<usize>,
        x_test: &Array2<f64>,
        y_test: &Array1<usize>,
    ) -> Result<StrategyResult> {
        let start = Instant::now();
        let mut model = self.base_model();
        model.fit(x_train, y_train)?;
        let holdout_score = Classifier::score(&model, x_test, y_test)?;
        let training_score = cross_val_score(&self.base_model(), x_train, y_train, self.config.cv_folds)?.mean_score;

        let result = StrategyResult::new(strategy, training_score, holdout_score, self.config.fit_threshold);
        info!(
            strategy = %strategy,
            training_score,
            holdout_score,
            verdict = %result.fit_verdict,
            elapsed_ms = start.elapsed().as_millis() as u64,
            "strategy evaluated"
        );
        Ok(result)
    }

    /// Grid search on unscaled features; the training score cross-validates
    /// the whole search procedure
    fn run_tuned(
        &self,
        x_train: &Array2<f64>,
        y_train: &Array1<usize>,
        x_test: &Array2<f64>,
        y_test: &Array1<usize>,
    ) -> Result<(StrategyResult, crate::optimizer::Candidate)> {
        let start = Instant::now();
        let mut search = GridSearch::new(self.config.search.clone());
        search.fit(x_train, y_train)?;
        let holdout_score = Classifier::score(&search, x_test, y_test)?;
        let best = search
            .best_params()
            .copied()
            .ok_or_else(|| StarTypeError::HyperparameterSearch("no best candidate after fit".to_string()))?;

        let training_score = cross_val_score(
            &GridSearch::new(self.config.search.clone()),
            x_train,
            y_train,
            self.config.cv_folds,
        )?
        .mean_score;

        let result = StrategyResult::new(
            Strategy::HyperparameterTuned,
            training_score,
            holdout_score,
            self.config.fit_threshold,
        );
        info!(
            strategy = %Strategy::HyperparameterTuned,
            best = %best,
            training_score,
            holdout_score,
            verdict = %result.fit_verdict,
            elapsed_ms = start.elapsed().as_millis() as u64,
            "strategy evaluated"
        );
        Ok((result, best))
    }
}
