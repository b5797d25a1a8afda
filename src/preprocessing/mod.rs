//! Preprocessing shared by training and inference.
//!
//! - [`FeatureNormalizer`]: min-max rescaling of a designated column into
//!   [0, 1] using bounds observed at training time
//! - [`fill_missing`]: mean imputation for numeric columns
//! - [`LabelSet`]: the closed set of target labels and their class indices
//!
//! Normalization bounds are fitted once on the training dataset and carried
//! with the model ([`FeatureScaling`]). Refitting them on a single inference
//! record would collapse every value to the same output.
//!
//! # Example
//!
//! ```
//! use vitalis::data::{Column, Dataset};
//! use vitalis::preprocessing::FeatureNormalizer;
//!
//! let ds = Dataset::new(vec![Column::numeric(
//!     "heart_rate",
//!     vec![Some(60.0), None, Some(160.0)],
//! )])
//! .expect("valid dataset");
//!
//! let params = FeatureNormalizer::fit(&ds, "heart_rate").expect("column has values");
//! assert_eq!((params.min, params.max), (60.0, 160.0));
//! assert!((FeatureNormalizer::transform(110.0, &params) - 0.5).abs() < 1e-12);
//! ```

mod labels;

pub use labels::{Label, LabelSet};

use crate::data::Dataset;
use crate::error::{Result, VitalisError};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use tracing::debug;

/// Range below which a column is treated as constant.
const MIN_RANGE: f64 = 1e-12;

/// Bounds observed on a column at training time.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct NormalizationParams {
    /// Smallest non-missing value
    pub min: f64,
    /// Largest non-missing value
    pub max: f64,
}

impl NormalizationParams {
    /// True if `value` lies within the observed training range.
    #[must_use]
    pub fn contains(&self, value: f64) -> bool {
        (self.min..=self.max).contains(&value)
    }

    /// Width of the observed range.
    #[must_use]
    pub fn range(&self) -> f64 {
        self.max - self.min
    }
}

/// Min-max normalizer.
///
/// `transform` does not clamp: a value outside the fitted range maps outside
/// [0, 1]. Callers that feed a model trained on normalized data must reject
/// such values first.
#[derive(Debug, Clone, Copy, Default)]
pub struct FeatureNormalizer;

impl FeatureNormalizer {
    /// Computes min and max of `column`, ignoring missing entries.
    ///
    /// # Errors
    ///
    /// - [`VitalisError::SchemaError`] if the column is absent or not numeric
    /// - [`VitalisError::EmptyColumn`] if every entry is missing
    pub fn fit(dataset: &Dataset, column: &str) -> Result<NormalizationParams> {
        let values = dataset.numeric(column)?;
        let mut present = values.iter().flatten().copied().peekable();
        if present.peek().is_none() {
            return Err(VitalisError::EmptyColumn {
                column: column.to_string(),
            });
        }

        let (min, max) = present.fold((f64::INFINITY, f64::NEG_INFINITY), |(lo, hi), v| {
            (lo.min(v), hi.max(v))
        });
        debug!(column, min, max, "fitted min-max bounds");
        Ok(NormalizationParams { min, max })
    }

    /// Maps `value` to `(value - min) / (max - min)`.
    ///
    /// A constant training column (zero range) maps every value to 0.
    #[must_use]
    pub fn transform(value: f64, params: &NormalizationParams) -> f64 {
        let range = params.range();
        if range.abs() > MIN_RANGE {
            (value - params.min) / range
        } else {
            0.0
        }
    }

    /// Maps a normalized value back to the original scale.
    #[must_use]
    pub fn inverse_transform(scaled: f64, params: &NormalizationParams) -> f64 {
        let range = params.range();
        if range.abs() > MIN_RANGE {
            scaled * range + params.min
        } else {
            params.min
        }
    }

    /// Returns a copy of `dataset` with `column` normalized. Missing entries
    /// stay missing.
    ///
    /// # Errors
    ///
    /// Returns [`VitalisError::SchemaError`] if the column is absent or not numeric.
    pub fn transform_column(
        dataset: &Dataset,
        column: &str,
        params: &NormalizationParams,
    ) -> Result<Dataset> {
        let scaled = dataset
            .numeric(column)?
            .iter()
            .map(|v| v.map(|x| Self::transform(x, params)))
            .collect();
        dataset.with_numeric(column, scaled)
    }
}

/// Normalization bounds for each normalized feature, keyed by column name.
///
/// Stored inside the trained model so inference reuses the training bounds.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct FeatureScaling {
    params: BTreeMap<String, NormalizationParams>,
}

impl FeatureScaling {
    /// Creates an empty scaling (no normalized features).
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Records the bounds for `column`.
    pub fn insert(&mut self, column: impl Into<String>, params: NormalizationParams) {
        self.params.insert(column.into(), params);
    }

    /// Bounds for `column`, if it is normalized.
    #[must_use]
    pub fn get(&self, column: &str) -> Option<&NormalizationParams> {
        self.params.get(column)
    }

    /// Iterates over (column, bounds) pairs in column order.
    pub fn iter(&self) -> impl Iterator<Item = (&str, &NormalizationParams)> {
        self.params.iter().map(|(k, v)| (k.as_str(), v))
    }

    /// True if no feature is normalized.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.params.is_empty()
    }

    /// Normalizes `value` if `column` has bounds, otherwise passes it through.
    #[must_use]
    pub fn apply(&self, column: &str, value: f64) -> f64 {
        self.get(column)
            .map_or(value, |p| FeatureNormalizer::transform(value, p))
    }
}

/// Replaces missing entries of each numeric column with that column's mean
/// over its non-missing entries.
///
/// Columns not listed are copied unchanged.
///
/// # Errors
///
/// - [`VitalisError::SchemaError`] if a column is absent or not numeric
/// - [`VitalisError::EmptyColumn`] if a column has no non-missing entries
pub fn fill_missing(dataset: &Dataset, columns: &[&str]) -> Result<Dataset> {
    let mut out = dataset.clone();
    for &column in columns {
        let values = dataset.numeric(column)?;
        let present: Vec<f64> = values.iter().flatten().copied().collect();
        if present.is_empty() {
            return Err(VitalisError::EmptyColumn {
                column: column.to_string(),
            });
        }

        let n_missing = values.len() - present.len();
        if n_missing == 0 {
            continue;
        }

        let mean = present.iter().sum::<f64>() / present.len() as f64;
        debug!(column, n_missing, mean, "filling missing values with column mean");
        let filled = values.iter().map(|v| Some(v.unwrap_or(mean))).collect();
        out = out.with_numeric(column, filled)?;
    }
    Ok(out)
}

/// Names of all numeric columns in `dataset`, in file order.
#[must_use]
pub fn numeric_columns(dataset: &Dataset) -> Vec<&str> {
    dataset
        .columns()
        .iter()
        .filter(|c| c.is_numeric())
        .map(crate::data::Column::name)
        .collect()
}
