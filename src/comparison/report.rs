//! Comparison report rows and their tabular form

use crate::error::{Result, StarTypeError};
use crate::optimizer::Candidate;
use polars::prelude::*;
use serde::{Deserialize, Serialize};
use std::fmt;

/// Header of the tabular report
pub const REPORT_COLUMNS: [&str; 4] = ["Changes made", "Training accuracy", "Validation Accuracy", "Fitting"];

/// Modeling strategy compared by the engine
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Strategy {
    NoScaling,
    StandardScaling,
    MinMaxScaling,
    HyperparameterTuned,
}

impl Strategy {
    /// Row order of the published report
    pub const REPORT_ORDER: [Strategy; 4] = [
        Strategy::NoScaling,
        Strategy::MinMaxScaling,
        Strategy::StandardScaling,
        Strategy::HyperparameterTuned,
    ];

    /// Label shown in the "Changes made" column
    pub fn label(&self) -> &'static str {
        match self {
            Strategy::NoScaling => "No Scalar",
            Strategy::StandardScaling => "Standard Scalar",
            Strategy::MinMaxScaling => "MinMax Scalar",
            Strategy::HyperparameterTuned => "Hyperparameter Tuning",
        }
    }
}

impl fmt::Display for Strategy {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

/// Verdict comparing training and holdout accuracy
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum FitVerdict {
    #[serde(rename = "overfitting")]
    Overfitting,
    #[serde(rename = "underfitting")]
    Underfitting,
    #[serde(rename = "good fit")]
    GoodFit,
}

impl FitVerdict {
    /// Overfitting when training accuracy exceeds holdout accuracy by more
    /// than `threshold`, underfitting for the reverse, good fit otherwise.
    pub fn classify(training_score: f64, holdout_score: f64, threshold: f64) -> Self {
        if training_score - holdout_score > threshold {
            FitVerdict::Overfitting
        } else if holdout_score - training_score > threshold {
            FitVerdict::Underfitting
        } else {
            FitVerdict::GoodFit
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            FitVerdict::Overfitting => "overfitting",
            FitVerdict::Underfitting => "underfitting",
            FitVerdict::GoodFit => "good fit",
        }
    }
}

impl fmt::Display for FitVerdict {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Scores of one strategy
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StrategyResult {
    pub strategy: Strategy,
    /// Mean cross-validated accuracy on the training partition
    pub training_score: f64,
    /// Accuracy on the holdout partition
    pub holdout_score: f64,
    pub fit_verdict: FitVerdict,
}

impl StrategyResult {
    pub fn new(strategy: Strategy, training_score: f64, holdout_score: f64, threshold: f64) -> Self {
        Self {
            strategy,
            training_score,
            holdout_score,
            fit_verdict: FitVerdict::classify(training_score, holdout_score, threshold),
        }
    }

    pub fn name(&self) -> &'static str {
        self.strategy.label()
    }
}

/// Four strategy rows in report order
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Report {
    rows: Vec<StrategyResult>,
    /// Hyperparameters chosen for the tuned strategy
    pub tuned_params: Option<Candidate>,
    pub n_train: usize,
    pub n_holdout: usize,
}

impl Report {
    /// Assemble a report, placing rows in [`Strategy::REPORT_ORDER`]
    pub fn new(
        mut results: Vec<StrategyResult>,
        tuned_params: Option<Candidate>,
        n_train: usize,
        n_holdout: usize,
    ) -> Result<Self> {
        let mut rows = Vec::with_capacity(Strategy::REPORT_ORDER.len());
        for strategy in Strategy::REPORT_ORDER {
            let pos = results
                .iter()
                .position(|r| r.strategy == strategy)
                .ok_or_else(|| StarTypeError::ComputationError(format!("missing result for {}", strategy)))?;
            rows.push(results.swap_remove(pos));
        }
        Ok(Self {
            rows,
            tuned_params,
            n_train,
            n_holdout,
        })
    }

    pub fn rows(&self) -> &[StrategyResult] {
        &self.rows
    }

    pub fn get(&self, strategy: Strategy) -> Option<&StrategyResult> {
        self.rows.iter().find(|r| r.strategy == strategy)
    }

    /// The report as a four-row table
    pub fn to_dataframe(&self) -> Result<DataFrame> {
        let names: Vec<&str> = self.rows.iter().map(|r| r.name()).collect();
        let training: Vec<f64> = self.rows.iter().map(|r| r.training_score).collect();
        let holdout: Vec<f64> = self.rows.iter().map(|r| r.holdout_score).collect();
        let verdicts: Vec<&str> = self.rows.iter().map(|r| r.fit_verdict.as_str()).collect();

        let df = df!(
            REPORT_COLUMNS[0] => names,
            REPORT_COLUMNS[1] => training,
            REPORT_COLUMNS[2] => holdout,
            REPORT_COLUMNS[3] => verdicts
        )?;
        Ok(df)
    }

    /// CSV text with a header row and no index column
    pub fn to_csv(&self) -> Result<String> {
        let mut df = self.to_dataframe()?;
        let mut buf = Vec::new();
        CsvWriter::new(&mut buf).include_header(true).finish(&mut df)?;
        String::from_utf8(buf).map_err(|e| StarTypeError::ComputationError(e.to_string()))
    }
}
