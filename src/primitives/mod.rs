//! Core numeric primitives.
//!
//! Feature tables handed to the classifiers are dense, row-major
//! [`Matrix<f64>`] values, one row per record and one column per feature in
//! model order.

mod matrix;

pub use matrix::Matrix;
