//! Matrix type for 2D numeric data.

use crate::error::{Result, VitalisError};
use serde::{Deserialize, Serialize};

/// A 2D matrix stored row-major.
///
/// # Examples
///
/// ```
/// use vitalis::primitives::Matrix;
///
/// let m = Matrix::from_vec(2, 3, vec![1.0, 2.0, 3.0, 4.0, 5.0, 6.0])
///     .expect("data length matches rows * cols");
/// assert_eq!(m.shape(), (2, 3));
/// assert_eq!(m.row(1), &[4.0, 5.0, 6.0]);
/// ```
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Matrix<T> {
    data: Vec<T>,
    rows: usize,
    cols: usize,
}

impl<T: Copy> Matrix<T> {
    /// Creates a new matrix from row-major data.
    ///
    /// # Errors
    ///
    /// Returns [`VitalisError::DimensionMismatch`] if `data.len() != rows * cols`.
    pub fn from_vec(rows: usize, cols: usize, data: Vec<T>) -> Result<Self> {
        if data.len() != rows * cols {
            return Err(VitalisError::DimensionMismatch {
                expected: format!("{} values ({rows}x{cols})", rows * cols),
                actual: format!("{} values", data.len()),
            });
        }
        Ok(Self { data, rows, cols })
    }

    /// Creates a matrix from equally sized rows.
    ///
    /// # Errors
    ///
    /// Returns [`VitalisError::DimensionMismatch`] if the rows are ragged.
    pub fn from_rows<R: AsRef<[T]>>(rows: &[R]) -> Result<Self> {
        let cols = rows.first().map_or(0, |r| r.as_ref().len());
        let mut data = Vec::with_capacity(rows.len() * cols);
        for (i, row) in rows.iter().enumerate() {
            let row = row.as_ref();
            if row.len() != cols {
                return Err(VitalisError::DimensionMismatch {
                    expected: format!("{cols} columns"),
                    actual: format!("{} columns in row {i}", row.len()),
                });
            }
            data.extend_from_slice(row);
        }
        Ok(Self {
            data,
            rows: rows.len(),
            cols,
        })
    }

    /// Returns the shape as (rows, cols).
    #[must_use]
    pub fn shape(&self) -> (usize, usize) {
        (self.rows, self.cols)
    }

    /// Returns the number of rows.
    #[must_use]
    pub fn n_rows(&self) -> usize {
        self.rows
    }

    /// Returns the number of columns.
    #[must_use]
    pub fn n_cols(&self) -> usize {
        self.cols
    }

    /// Gets element at (row, col).
    ///
    /// # Panics
    ///
    /// Panics if indices are out of bounds.
    #[must_use]
    pub fn get(&self, row: usize, col: usize) -> T {
        self.data[row * self.cols + col]
    }

    /// Returns a row as a slice.
    ///
    /// # Panics
    ///
    /// Panics if `row_idx` is out of bounds.
    #[must_use]
    pub fn row(&self, row_idx: usize) -> &[T] {
        let start = row_idx * self.cols;
        &self.data[start..start + self.cols]
    }

    /// Iterates over rows.
    pub fn rows(&self) -> impl Iterator<Item = &[T]> {
        // chunks_exact(0) panics; a zero-width table has no row content
        let width = self.cols.max(1);
        self.data
            .chunks_exact(width)
            .take(if self.cols == 0 { 0 } else { self.rows })
    }

    /// Returns a column as an owned vector.
    #[must_use]
    pub fn column(&self, col_idx: usize) -> Vec<T> {
        (0..self.rows).map(|row| self.get(row, col_idx)).collect()
    }

    /// Gathers the given rows (in the given order, duplicates allowed).
    ///
    /// # Panics
    ///
    /// Panics if any index is out of bounds.
    #[must_use]
    pub fn select_rows(&self, indices: &[usize]) -> Self {
        let mut data = Vec::with_capacity(indices.len() * self.cols);
        for &idx in indices {
            data.extend_from_slice(self.row(idx));
        }
        Self {
            data,
            rows: indices.len(),
            cols: self.cols,
        }
    }

    /// Returns the underlying data as a slice.
    #[must_use]
    pub fn as_slice(&self) -> &[T] {
        &self.data
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_from_vec_rejects_wrong_length() {
        let err = Matrix::from_vec(2, 2, vec![1.0, 2.0, 3.0]).unwrap_err();
        assert!(matches!(err, VitalisError::DimensionMismatch { .. }));
    }

    #[test]
    fn test_from_rows() {
        let m = Matrix::from_rows(&[[0.2, 0.3], [0.6, 0.5], [0.9, 0.8]])
            .expect("rows have equal width");
        assert_eq!(m.shape(), (3, 2));
        assert_eq!(m.get(2, 1), 0.8);
        assert_eq!(m.column(0), vec![0.2, 0.6, 0.9]);
    }

    #[test]
    fn test_from_rows_ragged() {
        let rows: Vec<Vec<f64>> = vec![vec![1.0, 2.0], vec![3.0]];
        assert!(Matrix::from_rows(&rows).is_err());
    }

    #[test]
    fn test_select_rows_allows_duplicates() {
        let m = Matrix::from_vec(3, 1, vec![10.0, 20.0, 30.0]).expect("valid");
        let picked = m.select_rows(&[2, 2, 0]);
        assert_eq!(picked.as_slice(), &[30.0, 30.0, 10.0]);
    }

    #[test]
    fn test_rows_iterator() {
        let m = Matrix::from_vec(2, 2, vec![1, 2, 3, 4]).expect("valid");
        let rows: Vec<&[i32]> = m.rows().collect();
        assert_eq!(rows, vec![&[1, 2][..], &[3, 4][..]]);

        let empty: Matrix<f64> = Matrix::from_vec(3, 0, vec![]).expect("valid");
        assert_eq!(empty.rows().count(), 0);
    }
}
