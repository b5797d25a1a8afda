//! Train/test splitting.
//!
//! Partitions are driven by a seeded [`StdRng`](rand::rngs::StdRng), so the
//! same seed and the same number of records always yield the same split.

use crate::error::{Result, VitalisError};
use crate::primitives::Matrix;
use rand::seq::SliceRandom;
use rand::SeedableRng;

/// Features and class indices partitioned into train and test subsets.
#[derive(Debug, Clone, PartialEq)]
pub struct TrainTestSplit {
    /// Training features
    pub x_train: Matrix<f64>,
    /// Held-out features
    pub x_test: Matrix<f64>,
    /// Training labels
    pub y_train: Vec<usize>,
    /// Held-out labels
    pub y_test: Vec<usize>,
    /// Original row indices of the training subset
    pub train_indices: Vec<usize>,
    /// Original row indices of the test subset
    pub test_indices: Vec<usize>,
}

/// Shuffles `0..n_samples` with the given seed and cuts it into train and
/// test index lists.
///
/// The test subset receives `ceil(n_samples * test_size)` records, so any
/// dataset with at least two records yields two non-empty subsets.
///
/// # Errors
///
/// - [`VitalisError::InvalidHyperparameter`] if `test_size` is not in (0, 1)
/// - [`VitalisError::InsufficientData`] if fewer than 2 samples are given
///
/// # Example
///
/// ```
/// use vitalis::model_selection::split_indices;
///
/// let (train, test) = split_indices(10, 0.2, 42).expect("valid split");
/// assert_eq!((train.len(), test.len()), (8, 2));
/// assert_eq!(split_indices(10, 0.2, 42).expect("valid split"), (train, test));
/// ```
pub fn split_indices(n_samples: usize, test_size: f64, seed: u64) -> Result<(Vec<usize>, Vec<usize>)> {
    validate_test_size(test_size)?;
    if n_samples < 2 {
        return Err(VitalisError::insufficient(format!(
            "need at least 2 records to split, got {n_samples}"
        )));
    }

    let n_test = ((n_samples as f64 * test_size).ceil() as usize).clamp(1, n_samples - 1);
    let n_train = n_samples - n_test;

    let mut indices: Vec<usize> = (0..n_samples).collect();
    let mut rng = rand::rngs::StdRng::seed_from_u64(seed);
    indices.shuffle(&mut rng);

    let test = indices.split_off(n_train);
    Ok((indices, test))
}

/// Splits a feature table and its labels into random train and test subsets.
///
/// # Arguments
///
/// * `x` - Feature table (n_samples × n_features)
/// * `y` - Class index of each row
/// * `test_size` - Proportion of records held out, in (0, 1)
/// * `seed` - Seed of the shuffle
///
/// # Errors
///
/// Returns [`VitalisError::DimensionMismatch`] if `x` and `y` disagree on the
/// number of records, plus the errors of [`split_indices`].
pub fn train_test_split(
    x: &Matrix<f64>,
    y: &[usize],
    test_size: f64,
    seed: u64,
) -> Result<TrainTestSplit> {
    if x.n_rows() != y.len() {
        return Err(VitalisError::DimensionMismatch {
            expected: format!("{} labels", x.n_rows()),
            actual: format!("{} labels", y.len()),
        });
    }

    let (train_indices, test_indices) = split_indices(x.n_rows(), test_size, seed)?;
    Ok(TrainTestSplit {
        x_train: x.select_rows(&train_indices),
        x_test: x.select_rows(&test_indices),
        y_train: train_indices.iter().map(|&i| y[i]).collect(),
        y_test: test_indices.iter().map(|&i| y[i]).collect(),
        train_indices,
        test_indices,
    })
}

fn validate_test_size(test_size: f64) -> Result<()> {
    if test_size > 0.0 && test_size < 1.0 {
        Ok(())
    } else {
        Err(VitalisError::InvalidHyperparameter {
            param: "test_size".to_string(),
            value: test_size.to_string(),
            constraint: "0 < test_size < 1".to_string(),
        })
    }
}
