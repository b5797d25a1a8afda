//! In-memory tabular datasets with named columns.
//!
//! A [`Dataset`] is created once by the [`DatasetLoader`] and never mutated
//! afterwards: preprocessing steps such as
//! [`fill_missing`](crate::preprocessing::fill_missing) return a new dataset.
//!
//! # Examples
//!
//! ```
//! use vitalis::data::{Column, Dataset};
//!
//! let ds = Dataset::new(vec![
//!     Column::numeric("heart_rate", vec![Some(72.0), None, Some(110.0)]),
//!     Column::categorical("risk_level", vec![Some("LOW".into()), Some("LOW".into()), Some("HIGH".into())]),
//! ])
//! .expect("columns have equal length");
//! assert_eq!(ds.shape(), (3, 2));
//! assert_eq!(ds.numeric("heart_rate").expect("numeric column")[1], None);
//! ```

mod loader;
mod summary;

pub use loader::DatasetLoader;
pub use summary::{ColumnSummary, DatasetSummary};

use crate::error::{Result, VitalisError};
use crate::primitives::Matrix;
use std::collections::BTreeMap;

/// Values stored in a column. Missing cells are `None`.
#[derive(Debug, Clone, PartialEq)]
pub enum ColumnData {
    /// Every present cell parsed as a number.
    Numeric(Vec<Option<f64>>),
    /// Free-form text cells, used for categorical targets.
    Categorical(Vec<Option<String>>),
}

impl ColumnData {
    fn len(&self) -> usize {
        match self {
            ColumnData::Numeric(v) => v.len(),
            ColumnData::Categorical(v) => v.len(),
        }
    }

    fn gather(&self, indices: &[usize]) -> Self {
        match self {
            ColumnData::Numeric(v) => ColumnData::Numeric(indices.iter().map(|&i| v[i]).collect()),
            ColumnData::Categorical(v) => {
                ColumnData::Categorical(indices.iter().map(|&i| v[i].clone()).collect())
            }
        }
    }
}

/// A named column.
#[derive(Debug, Clone, PartialEq)]
pub struct Column {
    name: String,
    data: ColumnData,
}

impl Column {
    /// Creates a numeric column.
    pub fn numeric(name: impl Into<String>, values: Vec<Option<f64>>) -> Self {
        Self {
            name: name.into(),
            data: ColumnData::Numeric(values),
        }
    }

    /// Creates a categorical column.
    pub fn categorical(name: impl Into<String>, values: Vec<Option<String>>) -> Self {
        Self {
            name: name.into(),
            data: ColumnData::Categorical(values),
        }
    }

    /// Column name.
    #[must_use]
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Column values.
    #[must_use]
    pub fn data(&self) -> &ColumnData {
        &self.data
    }

    /// True if the column holds numbers.
    #[must_use]
    pub fn is_numeric(&self) -> bool {
        matches!(self.data, ColumnData::Numeric(_))
    }

    /// Number of missing cells.
    #[must_use]
    pub fn missing_count(&self) -> usize {
        match &self.data {
            ColumnData::Numeric(v) => v.iter().filter(|x| x.is_none()).count(),
            ColumnData::Categorical(v) => v.iter().filter(|x| x.is_none()).count(),
        }
    }
}

/// One cell of a record.
#[derive(Debug, Clone, PartialEq)]
pub enum Value<'a> {
    /// Numeric cell
    Number(f64),
    /// Categorical cell
    Text(&'a str),
    /// Empty cell
    Missing,
}

/// An ordered sequence of records sharing one column set, stored by column.
#[derive(Debug, Clone, PartialEq)]
pub struct Dataset {
    columns: Vec<Column>,
    n_rows: usize,
}

impl Dataset {
    /// Creates a dataset from named columns.
    ///
    /// # Errors
    ///
    /// Returns [`VitalisError::SchemaError`] if there are no columns, the
    /// columns have different lengths, or a name is empty or duplicated.
    pub fn new(columns: Vec<Column>) -> Result<Self> {
        let Some(first) = columns.first() else {
            return Err(VitalisError::schema("dataset must have at least one column"));
        };
        let n_rows = first.data.len();

        for col in &columns {
            if col.name.is_empty() {
                return Err(VitalisError::schema("column names cannot be empty"));
            }
            if col.data.len() != n_rows {
                return Err(VitalisError::schema(format!(
                    "column '{}' has {} rows, expected {n_rows}",
                    col.name,
                    col.data.len()
                )));
            }
        }

        let mut names: Vec<&str> = columns.iter().map(|c| c.name.as_str()).collect();
        names.sort_unstable();
        if let Some(pair) = names.windows(2).find(|w| w[0] == w[1]) {
            return Err(VitalisError::schema(format!(
                "duplicate column name '{}'",
                pair[0]
            )));
        }

        Ok(Self { columns, n_rows })
    }

    /// Returns the shape as (`n_rows`, `n_cols`).
    #[must_use]
    pub fn shape(&self) -> (usize, usize) {
        (self.n_rows, self.columns.len())
    }

    /// Returns the number of records.
    #[must_use]
    pub fn n_rows(&self) -> usize {
        self.n_rows
    }

    /// True if the dataset has no records.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.n_rows == 0
    }

    /// Column names in file order.
    #[must_use]
    pub fn column_names(&self) -> Vec<&str> {
        self.columns.iter().map(|c| c.name.as_str()).collect()
    }

    /// All columns in file order.
    #[must_use]
    pub fn columns(&self) -> &[Column] {
        &self.columns
    }

    /// Looks up a column by name.
    ///
    /// # Errors
    ///
    /// Returns [`VitalisError::SchemaError`] if the column doesn't exist.
    pub fn column(&self, name: &str) -> Result<&Column> {
        self.columns
            .iter()
            .find(|c| c.name == name)
            .ok_or_else(|| VitalisError::schema(format!("missing required column '{name}'")))
    }

    /// Checks that every name in `required` is present.
    ///
    /// # Errors
    ///
    /// Returns [`VitalisError::SchemaError`] listing every absent column.
    pub fn require_columns(&self, required: &[&str]) -> Result<()> {
        let missing: Vec<&str> = required
            .iter()
            .copied()
            .filter(|name| !self.columns.iter().any(|c| c.name == *name))
            .collect();
        if missing.is_empty() {
            Ok(())
        } else {
            Err(VitalisError::schema(format!(
                "missing required column(s): {}",
                missing.join(", ")
            )))
        }
    }

    /// Returns a numeric column's values.
    ///
    /// # Errors
    ///
    /// Returns [`VitalisError::SchemaError`] if the column is absent or not numeric.
    pub fn numeric(&self, name: &str) -> Result<&[Option<f64>]> {
        match &self.column(name)?.data {
            ColumnData::Numeric(v) => Ok(v),
            ColumnData::Categorical(_) => Err(VitalisError::schema(format!(
                "column '{name}' is not numeric"
            ))),
        }
    }

    /// Returns a column's values as label strings.
    ///
    /// Numeric columns are rendered so that integral values have no
    /// fractional part (`1.0` becomes `"1"`), letting integer-coded targets
    /// act as labels.
    ///
    /// # Errors
    ///
    /// Returns [`VitalisError::SchemaError`] if the column is absent.
    pub fn labels(&self, name: &str) -> Result<Vec<Option<String>>> {
        Ok(match &self.column(name)?.data {
            ColumnData::Categorical(v) => v.clone(),
            ColumnData::Numeric(v) => v.iter().map(|x| x.map(format_number_label)).collect(),
        })
    }

    /// Returns a copy with the named numeric column replaced.
    ///
    /// # Errors
    ///
    /// Returns [`VitalisError::SchemaError`] if the column is absent, or
    /// [`VitalisError::DimensionMismatch`] if `values` has the wrong length.
    pub fn with_numeric(&self, name: &str, values: Vec<Option<f64>>) -> Result<Self> {
        if values.len() != self.n_rows {
            return Err(VitalisError::DimensionMismatch {
                expected: format!("{} rows", self.n_rows),
                actual: format!("{} rows", values.len()),
            });
        }
        let idx = self
            .columns
            .iter()
            .position(|c| c.name == name)
            .ok_or_else(|| VitalisError::schema(format!("missing required column '{name}'")))?;

        let mut columns = self.columns.clone();
        columns[idx].data = ColumnData::Numeric(values);
        Ok(Self {
            columns,
            n_rows: self.n_rows,
        })
    }

    /// Returns a copy holding only the given rows, in the given order.
    ///
    /// # Errors
    ///
    /// Returns [`VitalisError::DimensionMismatch`] if an index is out of range.
    pub fn select_rows(&self, indices: &[usize]) -> Result<Self> {
        if let Some(&idx) = indices.iter().find(|&&i| i >= self.n_rows) {
            return Err(VitalisError::DimensionMismatch {
                expected: format!("row index < {}", self.n_rows),
                actual: idx.to_string(),
            });
        }
        let columns = self
            .columns
            .iter()
            .map(|c| Column {
                name: c.name.clone(),
                data: c.data.gather(indices),
            })
            .collect();
        Ok(Self {
            columns,
            n_rows: indices.len(),
        })
    }

    /// Returns record `idx` as a column-name to value mapping.
    ///
    /// # Errors
    ///
    /// Returns [`VitalisError::DimensionMismatch`] if `idx` is out of bounds.
    pub fn record(&self, idx: usize) -> Result<BTreeMap<&str, Value<'_>>> {
        if idx >= self.n_rows {
            return Err(VitalisError::DimensionMismatch {
                expected: format!("row index < {}", self.n_rows),
                actual: idx.to_string(),
            });
        }
        Ok(self
            .columns
            .iter()
            .map(|c| {
                let value = match &c.data {
                    ColumnData::Numeric(v) => v[idx].map_or(Value::Missing, Value::Number),
                    ColumnData::Categorical(v) => {
                        v[idx].as_deref().map_or(Value::Missing, Value::Text)
                    }
                };
                (c.name.as_str(), value)
            })
            .collect())
    }

    /// Builds a feature table from numeric columns, in the given order.
    ///
    /// # Errors
    ///
    /// Returns [`VitalisError::SchemaError`] if a column is absent, not
    /// numeric, or still contains missing values.
    pub fn to_matrix(&self, features: &[&str]) -> Result<Matrix<f64>> {
        let cols: Vec<&[Option<f64>]> = features
            .iter()
            .map(|name| self.numeric(name))
            .collect::<Result<_>>()?;

        let mut data = Vec::with_capacity(self.n_rows * features.len());
        for row in 0..self.n_rows {
            for (name, col) in features.iter().zip(&cols) {
                let value = col[row].ok_or_else(|| {
                    VitalisError::schema(format!(
                        "column '{name}' has a missing value at row {row}"
                    ))
                })?;
                data.push(value);
            }
        }
        Matrix::from_vec(self.n_rows, features.len(), data)
    }
}

/// Renders a numeric target value as a label.
pub(crate) fn format_number_label(value: f64) -> String {
    if value.fract() == 0.0 && value.abs() < 1e15 {
        format!("{}", value as i64)
    } else {
        value.to_string()
    }
}
