//! Closed label sets for classification targets.

use crate::error::{Result, VitalisError};
use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;
use std::fmt;

/// A categorical outcome drawn from a model's [`LabelSet`].
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Label(String);

impl Label {
    /// Wraps a label string.
    pub fn new(label: impl Into<String>) -> Self {
        Self(label.into())
    }

    /// The label text as found in the dataset.
    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for Label {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl AsRef<str> for Label {
    fn as_ref(&self) -> &str {
        &self.0
    }
}

/// The distinct labels of a target column, sorted, each mapped to a class
/// index equal to its position.
///
/// The set is defined by the dataset, never hardcoded: a risk dataset may use
/// `HIGH`/`MEDIUM`/`LOW` or `HIGH`/`NORMAL`/`LOW` and both work unchanged.
///
/// # Examples
///
/// ```
/// use vitalis::preprocessing::LabelSet;
///
/// let labels = LabelSet::fit(["LOW", "HIGH", "LOW", "MEDIUM"]).expect("non-empty");
/// assert_eq!(labels.len(), 3);
/// assert_eq!(labels.encode("LOW").expect("known label"), 1);
/// assert_eq!(labels.decode(0).expect("valid index").as_str(), "HIGH");
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LabelSet {
    labels: Vec<Label>,
}

impl LabelSet {
    /// Collects the distinct labels of `values`.
    ///
    /// # Errors
    ///
    /// Returns [`VitalisError::InsufficientData`] if `values` is empty.
    pub fn fit<I, S>(values: I) -> Result<Self>
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        let distinct: BTreeSet<String> = values
            .into_iter()
            .map(|s| s.as_ref().to_string())
            .collect();
        if distinct.is_empty() {
            return Err(VitalisError::insufficient("no labels to fit"));
        }
        Ok(Self {
            labels: distinct.into_iter().map(Label::new).collect(),
        })
    }

    /// Number of distinct labels.
    #[must_use]
    pub fn len(&self) -> usize {
        self.labels.len()
    }

    /// True if the set is empty (never the case for a fitted set).
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.labels.is_empty()
    }

    /// Labels in class-index order.
    #[must_use]
    pub fn labels(&self) -> &[Label] {
        &self.labels
    }

    /// Class index of `label`.
    ///
    /// # Errors
    ///
    /// Returns [`VitalisError::ValidationError`] for a label outside the set.
    pub fn encode(&self, label: &str) -> Result<usize> {
        self.labels
            .binary_search_by(|l| l.as_str().cmp(label))
            .map_err(|_| VitalisError::validation("label", format!("unknown label '{label}'")))
    }

    /// Encodes every label of `values`.
    ///
    /// # Errors
    ///
    /// Returns [`VitalisError::ValidationError`] on the first unknown label.
    pub fn encode_all<S: AsRef<str>>(&self, values: &[S]) -> Result<Vec<usize>> {
        values.iter().map(|v| self.encode(v.as_ref())).collect()
    }

    /// Label for class index `idx`.
    ///
    /// # Errors
    ///
    /// Returns [`VitalisError::DimensionMismatch`] if `idx` is out of range.
    pub fn decode(&self, idx: usize) -> Result<&Label> {
        self.labels
            .get(idx)
            .ok_or_else(|| VitalisError::DimensionMismatch {
                expected: format!("class index < {}", self.labels.len()),
                actual: idx.to_string(),
            })
    }

    /// True if `label` belongs to the set.
    #[must_use]
    pub fn contains(&self, label: &str) -> bool {
        self.encode(label).is_ok()
    }
}
