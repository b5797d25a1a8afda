//! Evaluation metrics for trained models.
//!
//! [`classification`] holds the raw scoring functions; [`Metrics`] bundles
//! what one training run reports.

pub mod classification;

use crate::primitives::Matrix;
use serde::{Deserialize, Serialize};
use std::fmt;

/// Accuracy figures of one training run.
///
/// Computed once per run for logging and reporting; never persisted with
/// the model.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Metrics {
    /// Accuracy on the training subset, in [0, 1]
    pub train_accuracy: f64,
    /// Accuracy on the held-out subset, in [0, 1]
    pub test_accuracy: f64,
    /// Records in the training subset
    pub n_train: usize,
    /// Records in the held-out subset
    pub n_test: usize,
    /// Held-out confusion matrix (rows: true label, columns: predicted label,
    /// both in label-set order)
    pub confusion: Matrix<usize>,
}

impl fmt::Display for Metrics {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "train accuracy {:.4} (n={}), test accuracy {:.4} (n={})",
            self.train_accuracy, self.n_train, self.test_accuracy, self.n_test
        )
    }
}
