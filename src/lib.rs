//! Vitalis: health-metric classifiers in pure Rust.
//!
//! Three independent prediction domains share one pipeline:
//!
//! | domain        | features                          | target       |
//! |---------------|-----------------------------------|--------------|
//! | `heart_rate`  | heart rate (bpm), activity level  | `risk_level` |
//! | `bmi`         | height (m), weight (kg)           | `Category`   |
//! | `blood_sugar` | fasting blood sugar (mg/dL)       | `Category`   |
//!
//! Each domain loads a CSV table, fills missing values, min-max normalizes
//! its scaled columns, trains a seeded random forest, reports accuracy on a
//! held-out split and stores the model together with the normalization
//! bounds. Inference validates a raw record, rescales it with the stored
//! bounds and returns the majority vote.
//!
//! # Quick Start
//!
//! ```
//! use vitalis::prelude::*;
//!
//! let x = Matrix::from_vec(8, 1, vec![70.0, 75.0, 80.0, 85.0, 120.0, 125.0, 130.0, 135.0])
//!     .expect("valid shape");
//! let y = ["LOW", "LOW", "LOW", "LOW", "HIGH", "HIGH", "HIGH", "HIGH"];
//!
//! let trainer = ModelTrainer::new(TrainConfig::default().with_n_estimators(10));
//! let (model, metrics) = trainer.train(&x, &y, &["heart_rate"]).expect("trainable");
//! assert!(metrics.train_accuracy > 0.9);
//! assert_eq!(model.predict(&[132.0]).expect("valid width").as_str(), "HIGH");
//! ```
//!
//! # Modules
//!
//! - [`primitives`]: Dense row-major matrix
//! - [`data`]: CSV loading into typed columns, dataset summaries
//! - [`preprocessing`]: Min-max normalization, mean imputation, label encoding
//! - [`model_selection`]: Seeded train/test split
//! - [`tree`]: Decision trees and the random forest classifier
//! - [`metrics`]: Accuracy and confusion matrices
//! - [`trainer`]: Training entry point and the trained model
//! - [`store`]: Checksummed on-disk model artifacts
//! - [`predict`]: Validation and inference on raw records
//! - [`pipeline`]: Per-domain pipelines and [`HealthMonitor`]
//! - [`config`]: TOML configuration

pub mod config;
pub mod data;
pub mod error;
pub mod metrics;
pub mod model_selection;
pub mod pipeline;
pub mod predict;
pub mod prelude;
pub mod preprocessing;
pub mod primitives;
pub mod store;
pub mod trainer;
pub mod tree;

pub use config::PipelineConfig;
pub use error::{Result, VitalisError};
pub use pipeline::{Domain, HealthMonitor};
pub use primitives::Matrix;
