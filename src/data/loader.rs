//! CSV dataset loading.

use super::{Column, Dataset};
use crate::error::{Result, VitalisError};
use std::path::Path;
use tracing::{debug, info};

/// Cell contents treated as missing, matching common spreadsheet exports.
const MISSING_MARKERS: &[&str] = &["", "NA", "N/A", "NaN", "nan", "null", "NULL", "None"];

/// Reads a delimited text file with a header row into a [`Dataset`].
///
/// Column types are inferred: a column whose every present cell parses as a
/// number is numeric, anything else is categorical.
///
/// # Examples
///
/// ```no_run
/// use vitalis::data::DatasetLoader;
///
/// let ds = DatasetLoader::new()
///     .with_required(&["heart_rate", "activity_level", "risk_level"])
///     .load("health_data.csv")?;
/// # Ok::<(), vitalis::error::VitalisError>(())
/// ```
#[derive(Debug, Clone)]
pub struct DatasetLoader {
    required: Vec<String>,
    delimiter: u8,
}

impl Default for DatasetLoader {
    fn default() -> Self {
        Self::new()
    }
}

impl DatasetLoader {
    /// Creates a comma-delimited loader with no required columns.
    #[must_use]
    pub fn new() -> Self {
        Self {
            required: Vec::new(),
            delimiter: b',',
        }
    }

    /// Sets the columns that must be present.
    #[must_use]
    pub fn with_required(mut self, columns: &[&str]) -> Self {
        self.required = columns.iter().map(|c| (*c).to_string()).collect();
        self
    }

    /// Sets the field delimiter.
    #[must_use]
    pub fn with_delimiter(mut self, delimiter: u8) -> Self {
        self.delimiter = delimiter;
        self
    }

    /// Loads the dataset at `path`.
    ///
    /// # Errors
    ///
    /// - [`VitalisError::NotFound`] if the file does not exist
    /// - [`VitalisError::SchemaError`] if the header is malformed, a record
    ///   has the wrong number of fields, or a required column is absent
    /// - [`VitalisError::Io`] for other read failures
    pub fn load<P: AsRef<Path>>(&self, path: P) -> Result<Dataset> {
        let path = path.as_ref();
        if !path.is_file() {
            return Err(VitalisError::NotFound {
                what: "dataset",
                path: path.to_path_buf(),
            });
        }

        let mut reader = csv::ReaderBuilder::new()
            .delimiter(self.delimiter)
            .trim(csv::Trim::All)
            .from_path(path)
            .map_err(|e| csv_error(e, path))?;

        let headers: Vec<String> = reader
            .headers()
            .map_err(|e| csv_error(e, path))?
            .iter()
            .map(str::to_string)
            .collect();
        if headers.is_empty() || headers.iter().all(String::is_empty) {
            return Err(VitalisError::schema(format!(
                "{} has no header row",
                path.display()
            )));
        }

        let mut cells: Vec<Vec<Option<String>>> = vec![Vec::new(); headers.len()];
        for record in reader.records() {
            let record = record.map_err(|e| csv_error(e, path))?;
            for (col, field) in cells.iter_mut().zip(record.iter()) {
                col.push(if MISSING_MARKERS.contains(&field) {
                    None
                } else {
                    Some(field.to_string())
                });
            }
        }

        let columns = headers
            .into_iter()
            .zip(cells)
            .map(|(name, values)| infer_column(name, values))
            .collect();
        let dataset = Dataset::new(columns)?;

        let required: Vec<&str> = self.required.iter().map(String::as_str).collect();
        dataset.require_columns(&required)?;

        info!(
            path = %path.display(),
            rows = dataset.n_rows(),
            columns = dataset.shape().1,
            "dataset loaded"
        );
        Ok(dataset)
    }
}

fn infer_column(name: String, values: Vec<Option<String>>) -> Column {
    let parsed: Option<Vec<Option<f64>>> = values
        .iter()
        .map(|cell| match cell {
            None => Some(None),
            Some(text) => text.parse::<f64>().ok().filter(|v| v.is_finite()).map(Some),
        })
        .collect();

    match parsed {
        Some(numbers) => {
            debug!(column = %name, "inferred numeric column");
            Column::numeric(name, numbers)
        }
        None => {
            debug!(column = %name, "inferred categorical column");
            Column::categorical(name, values)
        }
    }
}

fn csv_error(err: csv::Error, path: &Path) -> VitalisError {
    let line = err.position().map(csv::Position::line);
    match err.into_kind() {
        csv::ErrorKind::Io(io) => VitalisError::Io(io),
        csv::ErrorKind::UnequalLengths {
            expected_len, len, ..
        } => VitalisError::schema(format!(
            "{}: record at line {} has {len} fields, expected {expected_len}",
            path.display(),
            line.unwrap_or(0)
        )),
        csv::ErrorKind::Utf8 { err, .. } => VitalisError::schema(format!(
            "{}: invalid UTF-8 at line {}: {err}",
            path.display(),
            line.unwrap_or(0)
        )),
        other => VitalisError::schema(format!("{}: {other:?}", path.display())),
    }
}
