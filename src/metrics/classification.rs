//! Classification metrics over class indices.

use crate::error::{Result, VitalisError};
use crate::primitives::Matrix;

/// Compute classification accuracy.
///
/// accuracy = `correct_predictions` / `total_predictions`
///
/// # Errors
///
/// - [`VitalisError::DimensionMismatch`] if the slices differ in length
/// - [`VitalisError::InsufficientData`] if they are empty
///
/// # Examples
///
/// ```
/// use vitalis::metrics::classification::accuracy;
///
/// let y_true = vec![0, 1, 2, 0, 1, 2];
/// let y_pred = vec![0, 2, 1, 0, 0, 1];
/// let acc = accuracy(&y_pred, &y_true).expect("same non-zero length");
/// assert!((acc - 1.0 / 3.0).abs() < 1e-12);
/// ```
pub fn accuracy(y_pred: &[usize], y_true: &[usize]) -> Result<f64> {
    check_lengths(y_pred, y_true)?;
    let correct = y_pred
        .iter()
        .zip(y_true.iter())
        .filter(|(p, t)| p == t)
        .count();
    Ok(correct as f64 / y_true.len() as f64)
}

/// Confusion matrix with rows indexed by true class and columns by
/// predicted class.
///
/// Classes at or above `n_classes` widen the matrix so no record is lost.
///
/// # Errors
///
/// Same as [`accuracy`].
pub fn confusion_matrix(y_pred: &[usize], y_true: &[usize], n_classes: usize) -> Result<Matrix<usize>> {
    check_lengths(y_pred, y_true)?;
    let observed = y_pred
        .iter()
        .chain(y_true.iter())
        .max()
        .map_or(0, |m| m + 1);
    let n = n_classes.max(observed);

    let mut data = vec![0usize; n * n];
    for (&p, &t) in y_pred.iter().zip(y_true.iter()) {
        data[t * n + p] += 1;
    }
    Matrix::from_vec(n, n, data)
}

/// Recall of each class: diagonal over row total. Classes with no true
/// records get 0.
#[must_use]
pub fn per_class_recall(confusion: &Matrix<usize>) -> Vec<f64> {
    confusion
        .rows()
        .enumerate()
        .map(|(class, row)| {
            let total: usize = row.iter().sum();
            if total == 0 {
                0.0
            } else {
                row[class] as f64 / total as f64
            }
        })
        .collect()
}

fn check_lengths(y_pred: &[usize], y_true: &[usize]) -> Result<()> {
    if y_pred.len() != y_true.len() {
        return Err(VitalisError::DimensionMismatch {
            expected: format!("{} predictions", y_true.len()),
            actual: format!("{} predictions", y_pred.len()),
        });
    }
    if y_true.is_empty() {
        return Err(VitalisError::insufficient("no records to evaluate"));
    }
    Ok(())
}
