//! Labeled tabular datasets
//!
//! A [`Dataset`] is the in-memory form of an uploaded CSV file: every column
//! but the last is a numeric feature, the last column is the categorical label.
//! Labels are encoded to dense class indices in lexicographic order.

use crate::error::{Result, StarTypeError};
use ndarray::{Array1, Array2};
use polars::prelude::*;
use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;
use std::io::Cursor;
use std::path::Path;
use tracing::debug;

/// Feature matrix plus encoded labels
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Dataset {
    feature_names: Vec<String>,
    label_name: String,
    features: Array2<f64>,
    labels: Array1<usize>,
    classes: Vec<String>,
}

impl Dataset {
    /// Build a dataset from a feature matrix and raw label values
    pub fn new(
        feature_names: Vec<String>,
        label_name: impl Into<String>,
        features: Array2<f64>,
        labels: Vec<String>,
    ) -> Result<Self> {
        if features.ncols() == 0 {
            return Err(StarTypeError::MalformedInput(
                "dataset needs at least one feature column and a label column".to_string(),
            ));
        }
        if feature_names.len() != features.ncols() {
            return Err(StarTypeError::ShapeError {
                expected: format!("{} feature names", features.ncols()),
                actual: format!("{} feature names", feature_names.len()),
            });
        }
        if labels.len() != features.nrows() {
            return Err(StarTypeError::ShapeError {
                expected: format!("{} labels", features.nrows()),
                actual: format!("{} labels", labels.len()),
            });
        }
        if let Some(((row, col), value)) = features.indexed_iter().find(|(_, v)| !v.is_finite()) {
            return Err(StarTypeError::MalformedInput(format!(
                "non-finite value {} in column '{}' at row {}",
                value, feature_names[col], row
            )));
        }

        let classes: Vec<String> = labels
            .iter()
            .cloned()
            .collect::<BTreeSet<_>>()
            .into_iter()
            .collect();
        let encoded: Array1<usize> = labels
            .iter()
            .map(|label| classes.binary_search(label).unwrap_or_default())
            .collect();

        Ok(Self {
            feature_names,
            label_name: label_name.into(),
            features,
            labels: encoded,
            classes,
        })
    }

    /// Parse CSV bytes (header row required, label in the last column).
    ///
    /// Column types are inferred from every row, so a text value anywhere in
    /// a feature column is reported as malformed input.
    pub fn from_csv_bytes(bytes: &[u8]) -> Result<Self> {
        let df = CsvReadOptions::default()
            .with_infer_schema_length(None)
            .with_has_header(true)
            .into_reader_with_file_handle(Cursor::new(bytes))
            .finish()?;
        Self::from_dataframe(&df)
    }

    /// Load a CSV file from disk
    pub fn from_csv_path(path: impl AsRef<Path>) -> Result<Self> {
        let df = CsvReadOptions::default()
            .with_infer_schema_length(None)
            .with_has_header(true)
            .try_into_reader_with_file_path(Some(path.as_ref().to_path_buf()))?
            .finish()?;
        Self::from_dataframe(&df)
    }

    /// Convert a DataFrame whose last column is the label
    pub fn from_dataframe(df: &DataFrame) -> Result<Self> {
        let columns = df.get_columns();
        if columns.len() < 2 {
            return Err(StarTypeError::MalformedInput(format!(
                "expected at least 2 columns (features + label), got {}",
                columns.len()
            )));
        }

        let (feature_cols, label_col) = columns.split_at(columns.len() - 1);
        let label_col = &label_col[0];

        let mut feature_names = Vec::with_capacity(feature_cols.len());
        let mut col_data: Vec<Vec<f64>> = Vec::with_capacity(feature_cols.len());
        for column in feature_cols {
            let name = column.name().to_string();
            if !is_numeric(column.dtype()) {
                return Err(StarTypeError::MalformedInput(format!(
                    "feature column '{}' is not numeric ({})",
                    name,
                    column.dtype()
                )));
            }
            if column.null_count() > 0 {
                return Err(StarTypeError::MalformedInput(format!(
                    "feature column '{}' has {} missing values",
                    name,
                    column.null_count()
                )));
            }
            let values: Vec<f64> = column
                .cast(&DataType::Float64)?
                .f64()?
                .into_iter()
                .map(|v| v.unwrap_or(f64::NAN))
                .collect();
            feature_names.push(name);
            col_data.push(values);
        }

        if label_col.null_count() > 0 {
            return Err(StarTypeError::MalformedInput(format!(
                "label column '{}' has {} missing values",
                label_col.name(),
                label_col.null_count()
            )));
        }
        let labels: Vec<String> = label_col
            .cast(&DataType::String)?
            .str()?
            .into_iter()
            .map(|v| v.unwrap_or_default().to_string())
            .collect();

        let n_rows = df.height();
        let features = Array2::from_shape_fn((n_rows, col_data.len()), |(r, c)| col_data[c][r]);
        debug!(rows = n_rows, features = col_data.len(), "Parsed dataset");

        Self::new(feature_names, label_col.name().to_string(), features, labels)
    }

    pub fn feature_names(&self) -> &[String] {
        &self.feature_names
    }

    pub fn label_name(&self) -> &str {
        &self.label_name
    }

    pub fn features(&self) -> &Array2<f64> {
        &self.features
    }

    /// Encoded labels (indices into [`Dataset::classes`])
    pub fn labels(&self) -> &Array1<usize> {
        &self.labels
    }

    /// Distinct label values in encoding order
    pub fn classes(&self) -> &[String] {
        &self.classes
    }

    pub fn n_samples(&self) -> usize {
        self.features.nrows()
    }

    pub fn n_features(&self) -> usize {
        self.features.ncols()
    }

    pub fn n_classes(&self) -> usize {
        self.classes.len()
    }
}

fn is_numeric(dtype: &DataType) -> bool {
    matches!(
        dtype,
        DataType::Int8
            | DataType::Int16
            | DataType::Int32
            | DataType::Int64
            | DataType::UInt8
            | DataType::UInt16
            | DataType::UInt32
            | DataType::UInt64
            | DataType::Float32
            | DataType::Float64
    )
}

#[cfg(test)]
mod tests {
    use super::*;
    use ndarray::array;

    const STARS: &str = "Temperature (K),Luminosity(L/Lo),Radius(R/Ro),Absolute magnitude(Mv),Star type\n\
3068,0.0024,0.17,16.12,0\n\
25000,0.056,0.0084,10.58,2\n\
39000,204000,10.6,-4.7,3\n\
3600,320000,1324,-10.7,5\n";

    #[test]
    fn test_from_csv_bytes() {
        let ds = Dataset::from_csv_bytes(STARS.as_bytes()).unwrap();
        assert_eq!(ds.n_samples(), 4);
        assert_eq!(ds.n_features(), 4);
        assert_eq!(ds.label_name(), "Star type");
        assert_eq!(ds.classes(), &["0", "2", "3", "5"]);
        assert_eq!(ds.labels().to_vec(), vec![0, 1, 2, 3]);
        assert_eq!(ds.features()[[2, 1]], 204000.0);
    }

    #[test]
    fn test_string_labels_sorted() {
        let ds = Dataset::new(
            vec!["a".into()],
            "kind",
            array![[1.0], [2.0], [3.0]],
            vec!["giant".into(), "dwarf".into(), "giant".into()],
        )
        .unwrap();
        assert_eq!(ds.classes(), &["dwarf", "giant"]);
        assert_eq!(ds.labels().to_vec(), vec![1, 0, 1]);
    }

    #[test]
    fn test_single_column_rejected() {
        let err = Dataset::from_csv_bytes(b"label\na\nb\n").unwrap_err();
        assert!(matches!(err, StarTypeError::MalformedInput(_)));
    }

    #[test]
    fn test_text_feature_rejected() {
        let csv = "temp,color,type\n3000,red,0\n4000,blue,1\n";
        let err = Dataset::from_csv_bytes(csv.as_bytes()).unwrap_err();
        assert!(matches!(err, StarTypeError::MalformedInput(_)), "got {:?}", err);
    }

    #[test]
    fn test_missing_feature_rejected() {
        let csv = "temp,radius,type\n3000,,0\n4000,1.0,1\n";
        let err = Dataset::from_csv_bytes(csv.as_bytes()).unwrap_err();
        assert!(matches!(err, StarTypeError::MalformedInput(_)));
    }

    #[test]
    fn test_label_count_mismatch() {
        let err = Dataset::new(vec!["a".into()], "y", array![[1.0], [2.0]], vec!["x".into()]).unwrap_err();
        assert!(matches!(err, StarTypeError::ShapeError { .. }));
    }

    /// 1200 integer rows followed by one row built from `last`
    fn long_csv(last: &str) -> String {
        let mut csv = String::from("temp,radius,type\n");
        for i in 0..1200 {
            csv.push_str(&format!("{},1.5,{}\n", 3000 + i, i % 3));
        }
        csv.push_str(last);
        csv.push('\n');
        csv
    }

    #[test]
    fn test_late_float_feature_accepted() {
        let ds = Dataset::from_csv_bytes(long_csv("3500.5,1.0,0").as_bytes()).unwrap();
        assert_eq!(ds.n_samples(), 1201);
        assert_eq!(ds.features()[[1200, 0]], 3500.5);
    }

    #[test]
    fn test_late_text_label_accepted() {
        let ds = Dataset::from_csv_bytes(long_csv("4100,1.0,Hypergiant").as_bytes()).unwrap();
        assert_eq!(ds.classes(), &["0", "1", "2", "Hypergiant"]);
        assert_eq!(ds.labels()[1200], 3);
    }

    #[test]
    fn test_late_text_feature_rejected() {
        let err = Dataset::from_csv_bytes(long_csv("abc,1.0,0").as_bytes()).unwrap_err();
        assert!(matches!(err, StarTypeError::MalformedInput(_)), "got {:?}", err);
    }

    #[test]
    fn test_non_finite_feature_rejected() {
        let csv = "temp,radius,type\n3000,inf,0\n4000,1.0,1\n";
        let err = Dataset::from_csv_bytes(csv.as_bytes()).unwrap_err();
        assert!(matches!(err, StarTypeError::MalformedInput(_)), "got {:?}", err);

        let err = Dataset::new(
            vec!["a".into()],
            "y",
            array![[1.0], [f64::NAN]],
            vec!["x".into(), "z".into()],
        )
        .unwrap_err();
        assert!(matches!(err, StarTypeError::MalformedInput(_)));
    }
}
