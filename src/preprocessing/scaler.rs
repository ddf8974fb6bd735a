//! Feature scaling implementations

use crate::error::{Result, StarTypeError};
use ndarray::{Array2, Axis};
use serde::{Deserialize, Serialize};

/// Type of scaler to use
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum ScalerType {
    /// Standard scaling (z-score normalization): (x - mean) / std
    Standard,
    /// Min-Max scaling into the configured feature range
    MinMax,
}

/// Parameters fitted for one feature column
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct ScalerParams {
    /// Mean for standard scaling, minimum for min-max
    pub center: f64,
    /// Standard deviation or range; 1.0 for constant columns
    pub scale: f64,
}

/// Column-wise feature scaler
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Scaler {
    scaler_type: ScalerType,
    feature_range: (f64, f64),
    params: Vec<ScalerParams>,
    is_fitted: bool,
}

impl Scaler {
    /// Create a new scaler
    pub fn new(scaler_type: ScalerType) -> Self {
        Self {
            scaler_type,
            feature_range: (0.0, 1.0),
            params: Vec::new(),
            is_fitted: false,
        }
    }

    /// Target range for min-max scaling
    pub fn with_feature_range(mut self, low: f64, high: f64) -> Self {
        self.feature_range = (low, high);
        self
    }

    pub fn scaler_type(&self) -> ScalerType {
        self.scaler_type
    }

    /// Fitted per-column parameters (empty before `fit`)
    pub fn params(&self) -> &[ScalerParams] {
        &self.params
    }

    pub fn is_fitted(&self) -> bool {
        self.is_fitted
    }

    /// Fit the scaler to the data
    pub fn fit(&mut self, x: &Array2<f64>) -> Result<&mut Self> {
        if x.nrows() == 0 {
            return Err(StarTypeError::InsufficientData(
                "cannot fit a scaler on zero rows".to_string(),
            ));
        }
        let (low, high) = self.feature_range;
        if self.scaler_type == ScalerType::MinMax && !(low < high) {
            return Err(StarTypeError::InvalidParameter {
                name: "feature_range".to_string(),
                value: format!("({}, {})", low, high),
                reason: "minimum must be smaller than maximum".to_string(),
            });
        }

        self.params = x
            .axis_iter(Axis(1))
            .map(|column| self.compute_params(column.iter().copied()))
            .collect();
        self.is_fitted = true;
        Ok(self)
    }

    /// Transform the data with the fitted parameters
    pub fn transform(&self, x: &Array2<f64>) -> Result<Array2<f64>> {
        if !self.is_fitted {
            return Err(StarTypeError::ModelNotFitted);
        }
        if x.ncols() != self.params.len() {
            return Err(StarTypeError::ShapeError {
                expected: format!("{} columns", self.params.len()),
                actual: format!("{} columns", x.ncols()),
            });
        }

        let mut out = x.clone();
        for (mut column, params) in out.axis_iter_mut(Axis(1)).zip(&self.params) {
            column.mapv_inplace(|v| self.scale_value(v, params));
        }
        Ok(out)
    }

    /// Fit and transform in one step
    pub fn fit_transform(&mut self, x: &Array2<f64>) -> Result<Array2<f64>> {
        self.fit(x)?;
        self.transform(x)
    }

    fn compute_params(&self, values: impl Iterator<Item = f64> + Clone) -> ScalerParams {
        match self.scaler_type {
            ScalerType::Standard => {
                let n = values.clone().count() as f64;
                let mean = values.clone().sum::<f64>() / n;
                // population variance, matching the usual StandardScaler definition
                let var = values.map(|v| (v - mean).powi(2)).sum::<f64>() / n;
                let std = var.sqrt();
                ScalerParams {
                    center: mean,
                    scale: if std == 0.0 { 1.0 } else { std },
                }
            }
            ScalerType::MinMax => {
                let min = values.clone().fold(f64::INFINITY, f64::min);
                let max = values.fold(f64::NEG_INFINITY, f64::max);
                let range = max - min;
                ScalerParams {
                    center: min,
                    scale: if range == 0.0 { 1.0 } else { range },
                }
            }
        }
    }

    fn scale_value(&self, v: f64, params: &ScalerParams) -> f64 {
        let unit = (v - params.center) / params.scale;
        match self.scaler_type {
            ScalerType::MinMax => {
                let (low, high) = self.feature_range;
                unit * (high - low) + low
            }
            ScalerType::Standard => unit,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use ndarray::array;

    #[test]
    fn test_standard_scaler() {
        let x = array![[1.0, 10.0], [2.0, 10.0], [3.0, 10.0], [4.0, 10.0], [5.0, 10.0]];

        let mut scaler = Scaler::new(ScalerType::Standard);
        let result = scaler.fit_transform(&x).unwrap();

        let mean = result.column(0).mean().unwrap();
        assert!(mean.abs() < 1e-10); // Mean should be ~0
        let var = result.column(0).mapv(|v| v * v).mean().unwrap();
        assert!((var - 1.0).abs() < 1e-10);
        // constant column keeps unit scale
        assert_eq!(scaler.params()[1].scale, 1.0);
        assert!(result.column(1).iter().all(|&v| v == 0.0));
    }

    #[test]
    fn test_minmax_scaler() {
        let x = array![[1.0], [2.0], [3.0], [4.0], [5.0]];

        let mut scaler = Scaler::new(ScalerType::MinMax);
        let result = scaler.fit_transform(&x).unwrap();

        let col = result.column(0);
        assert!((col.fold(f64::INFINITY, |a, &b| a.min(b)) - 0.0).abs() < 1e-10);
        assert!((col.fold(f64::NEG_INFINITY, |a, &b| a.max(b)) - 1.0).abs() < 1e-10);
    }

    #[test]
    fn test_minmax_custom_range() {
        let x = array![[0.0], [10.0]];
        let mut scaler = Scaler::new(ScalerType::MinMax).with_feature_range(-1.0, 1.0);
        let result = scaler.fit_transform(&x).unwrap();
        assert_eq!(result.column(0).to_vec(), vec![-1.0, 1.0]);
    }

    #[test]
    fn test_transform_uses_fitted_params_only() {
        let train = array![[0.0], [2.0]];
        let unseen = array![[4.0], [-2.0]];
        let mut scaler = Scaler::new(ScalerType::MinMax);
        scaler.fit(&train).unwrap();
        let result = scaler.transform(&unseen).unwrap();
        // values outside the fitted range are not clipped
        assert_eq!(result.column(0).to_vec(), vec![2.0, -1.0]);
    }

    #[test]
    fn test_not_fitted() {
        let scaler = Scaler::new(ScalerType::Standard);
        assert!(matches!(scaler.transform(&array![[1.0]]), Err(StarTypeError::ModelNotFitted)));
    }

    #[test]
    fn test_column_mismatch() {
        let mut scaler = Scaler::new(ScalerType::Standard);
        scaler.fit(&array![[1.0, 2.0], [3.0, 4.0]]).unwrap();
        assert!(matches!(
            scaler.transform(&array![[1.0]]),
            Err(StarTypeError::ShapeError { .. })
        ));
    }
}
