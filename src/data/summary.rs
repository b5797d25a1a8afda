//! Descriptive statistics for a loaded dataset.

use super::{ColumnData, Dataset};
use serde::Serialize;
use std::collections::BTreeMap;
use std::fmt;
use std::path::PathBuf;

/// Per-column statistics.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum ColumnSummary {
    /// Statistics over the non-missing values of a numeric column.
    Numeric {
        /// Column name
        name: String,
        /// Number of present values
        count: usize,
        /// Number of missing values
        missing: usize,
        /// Arithmetic mean (NaN if `count == 0`)
        mean: f64,
        /// Sample standard deviation (0 if `count < 2`)
        std: f64,
        /// Minimum value
        min: f64,
        /// Maximum value
        max: f64,
    },
    /// Value counts of a categorical column.
    Categorical {
        /// Column name
        name: String,
        /// Number of missing values
        missing: usize,
        /// Occurrences of each distinct value
        counts: BTreeMap<String, usize>,
    },
}

/// Summary of a dataset, produced for visualisation front-ends.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct DatasetSummary {
    /// Source file
    pub path: PathBuf,
    /// Number of records
    pub n_rows: usize,
    /// One entry per column, in file order
    pub columns: Vec<ColumnSummary>,
}

impl DatasetSummary {
    /// Computes the summary of `dataset`.
    #[must_use]
    pub fn from_dataset(path: impl Into<PathBuf>, dataset: &Dataset) -> Self {
        let columns = dataset
            .columns()
            .iter()
            .map(|col| match col.data() {
                ColumnData::Numeric(values) => numeric_summary(col.name(), values),
                ColumnData::Categorical(values) => {
                    let mut counts = BTreeMap::new();
                    for v in values.iter().flatten() {
                        *counts.entry(v.clone()).or_insert(0) += 1;
                    }
                    ColumnSummary::Categorical {
                        name: col.name().to_string(),
                        missing: col.missing_count(),
                        counts,
                    }
                }
            })
            .collect();

        Self {
            path: path.into(),
            n_rows: dataset.n_rows(),
            columns,
        }
    }

    /// Looks up a column summary by name.
    #[must_use]
    pub fn column(&self, name: &str) -> Option<&ColumnSummary> {
        self.columns.iter().find(|c| match c {
            ColumnSummary::Numeric { name: n, .. } | ColumnSummary::Categorical { name: n, .. } => {
                n == name
            }
        })
    }
}

fn numeric_summary(name: &str, values: &[Option<f64>]) -> ColumnSummary {
    let present: Vec<f64> = values.iter().flatten().copied().collect();
    let count = present.len();
    let n = count as f64;
    let mean = present.iter().sum::<f64>() / n;
    let std = if count > 1 {
        (present.iter().map(|v| (v - mean).powi(2)).sum::<f64>() / (n - 1.0)).sqrt()
    } else {
        0.0
    };

    ColumnSummary::Numeric {
        name: name.to_string(),
        count,
        missing: values.len() - count,
        mean,
        std,
        min: present.iter().copied().fold(f64::INFINITY, f64::min),
        max: present.iter().copied().fold(f64::NEG_INFINITY, f64::max),
    }
}

impl fmt::Display for DatasetSummary {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "Dataset: {}", self.path.display())?;
        writeln!(f, "  Rows: {}", self.n_rows)?;
        for col in &self.columns {
            match col {
                ColumnSummary::Numeric {
                    name,
                    count,
                    missing,
                    mean,
                    std,
                    min,
                    max,
                } => writeln!(
                    f,
                    "  {name}: n={count} missing={missing} mean={mean:.4} std={std:.4} min={min:.4} max={max:.4}"
                )?,
                ColumnSummary::Categorical {
                    name,
                    missing,
                    counts,
                } => {
                    let parts: Vec<String> =
                        counts.iter().map(|(k, v)| format!("{k}={v}")).collect();
                    writeln!(f, "  {name}: {} missing={missing}", parts.join(" "))?;
                }
            }
        }
        Ok(())
    }
}
