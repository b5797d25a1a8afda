//! Convenience re-exports for common usage.
//!
//! # Usage
//!
//! ```
//! use vitalis::prelude::*;
//! ```

pub use crate::config::PipelineConfig;
pub use crate::data::{Dataset, DatasetLoader, DatasetSummary};
pub use crate::error::VitalisError;
pub use crate::metrics::Metrics;
pub use crate::pipeline::{Domain, DomainPipeline, HealthMonitor, TrainingReport};
pub use crate::predict::{Bounds, FieldSpec, Prediction, PredictionService};
pub use crate::preprocessing::{FeatureNormalizer, FeatureScaling, Label, LabelSet};
pub use crate::primitives::Matrix;
pub use crate::store::ModelStore;
pub use crate::trainer::{ModelTrainer, TrainConfig, TrainedModel};
pub use crate::tree::{MaxFeatures, RandomForestClassifier};
