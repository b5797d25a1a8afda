//! Error types for Vitalis operations.
//!
//! Every fallible operation in the crate returns [`Result`]. The variants map
//! one-to-one onto the failure classes a caller has to tell apart: a missing
//! file, a malformed dataset, degenerate statistics, out-of-domain user input
//! and a damaged model artifact.

use std::path::PathBuf;
use thiserror::Error;

/// Main error type for Vitalis operations.
///
/// # Examples
///
/// ```
/// use vitalis::error::VitalisError;
///
/// let err = VitalisError::EmptyColumn {
///     column: "heart_rate".to_string(),
/// };
/// assert!(err.to_string().contains("heart_rate"));
/// ```
#[derive(Debug, Error)]
pub enum VitalisError {
    /// A dataset or model file does not exist.
    #[error("{what} not found: {}", path.display())]
    NotFound {
        /// What was being looked up ("dataset", "model")
        what: &'static str,
        /// Location that was probed
        path: PathBuf,
    },

    /// The dataset does not have the shape the pipeline expects.
    #[error("schema error: {message}")]
    SchemaError {
        /// Description of the mismatch
        message: String,
    },

    /// A numeric column has no non-missing entries, so its mean is undefined.
    #[error("column '{column}' has no non-missing values")]
    EmptyColumn {
        /// Column name
        column: String,
    },

    /// Too few records or too few distinct labels to train an ensemble.
    #[error("insufficient data: {message}")]
    InsufficientData {
        /// Description of what is missing
        message: String,
    },

    /// A caller-supplied value is outside its declared domain.
    #[error("invalid value for '{field}': {message}")]
    ValidationError {
        /// Offending field name
        field: String,
        /// Constraint that was violated
        message: String,
    },

    /// A stored model exists but cannot be decoded.
    #[error("model '{key}' is corrupt: {message}")]
    CorruptModel {
        /// Storage key of the model
        key: String,
        /// Decoder failure
        message: String,
    },

    /// Invalid hyperparameter value provided.
    #[error("invalid hyperparameter: {param} = {value}, expected {constraint}")]
    InvalidHyperparameter {
        /// Parameter name
        param: String,
        /// Provided value
        value: String,
        /// Constraint description
        constraint: String,
    },

    /// Feature table dimensions don't match for the operation.
    #[error("dimension mismatch: expected {expected}, got {actual}")]
    DimensionMismatch {
        /// Expected dimensions description
        expected: String,
        /// Actual dimensions found
        actual: String,
    },

    /// Configuration file could not be read or parsed.
    #[error("configuration error: {0}")]
    Config(String),

    /// I/O error other than a missing file.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

impl VitalisError {
    /// Builds a [`VitalisError::ValidationError`].
    pub fn validation(field: impl Into<String>, message: impl Into<String>) -> Self {
        Self::ValidationError {
            field: field.into(),
            message: message.into(),
        }
    }

    /// Builds a [`VitalisError::SchemaError`].
    pub fn schema(message: impl Into<String>) -> Self {
        Self::SchemaError {
            message: message.into(),
        }
    }

    /// Builds a [`VitalisError::InsufficientData`].
    pub fn insufficient(message: impl Into<String>) -> Self {
        Self::InsufficientData {
            message: message.into(),
        }
    }

    /// True when the error means "the file was never there".
    #[must_use]
    pub fn is_not_found(&self) -> bool {
        matches!(self, Self::NotFound { .. })
    }

    /// True when a stored model exists but has to be retrained.
    #[must_use]
    pub fn is_corrupt(&self) -> bool {
        matches!(self, Self::CorruptModel { .. })
    }
}

/// Convenience type alias for Results with [`VitalisError`].
pub type Result<T> = std::result::Result<T, VitalisError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_not_found_display_includes_path() {
        let err = VitalisError::NotFound {
            what: "dataset",
            path: PathBuf::from("data/health_data.csv"),
        };
        let msg = err.to_string();
        assert!(msg.contains("dataset not found"));
        assert!(msg.contains("health_data.csv"));
        assert!(err.is_not_found());
        assert!(!err.is_corrupt());
    }

    #[test]
    fn test_validation_names_field() {
        let err = VitalisError::validation("heart_rate", "must be within [60, 160], got 59");
        assert_eq!(
            err.to_string(),
            "invalid value for 'heart_rate': must be within [60, 160], got 59"
        );
    }

    #[test]
    fn test_corrupt_is_distinct_from_not_found() {
        let err = VitalisError::CorruptModel {
            key: "bmi_model".to_string(),
            message: "checksum mismatch".to_string(),
        };
        assert!(err.is_corrupt());
        assert!(!err.is_not_found());
    }

    #[test]
    fn test_io_conversion() {
        let io = std::io::Error::new(std::io::ErrorKind::PermissionDenied, "denied");
        let err: VitalisError = io.into();
        assert!(matches!(err, VitalisError::Io(_)));
        assert!(err.to_string().starts_with("I/O error"));
    }
}
