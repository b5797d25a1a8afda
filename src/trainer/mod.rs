//! Model training: split, fit, evaluate.
//!
//! [`ModelTrainer::train`] takes an already preprocessed feature table and
//! its target labels, holds out a seeded test subset, fits a
//! [`RandomForestClassifier`] on the rest and reports accuracy on both
//! subsets. Persisting the result is the caller's job (see
//! [`crate::store::ModelStore`]).

use crate::error::{Result, VitalisError};
use crate::metrics::classification::{accuracy, confusion_matrix};
use crate::metrics::Metrics;
use crate::model_selection::train_test_split;
use crate::preprocessing::{FeatureScaling, Label, LabelSet};
use crate::primitives::Matrix;
use crate::tree::{MaxFeatures, RandomForestClassifier};
use serde::{Deserialize, Serialize};
use tracing::{debug, info};

/// Hyperparameters of one training run.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct TrainConfig {
    /// Proportion of records held out for evaluation, in (0, 1)
    pub test_size: f64,
    /// Seed of the split and of every tree
    pub seed: u64,
    /// Number of trees
    pub n_estimators: usize,
    /// Maximum tree depth (`None` = grow until pure)
    #[serde(skip_serializing_if = "Option::is_none")]
    pub max_depth: Option<usize>,
    /// Features available to each tree
    pub max_features: MaxFeatures,
}

impl Default for TrainConfig {
    fn default() -> Self {
        Self {
            test_size: 0.2,
            seed: 42,
            n_estimators: 50,
            max_depth: None,
            max_features: MaxFeatures::default(),
        }
    }
}

impl TrainConfig {
    /// Sets the maximum tree depth.
    #[must_use]
    pub fn with_max_depth(mut self, max_depth: usize) -> Self {
        self.max_depth = Some(max_depth);
        self
    }

    /// Sets the seed.
    #[must_use]
    pub fn with_seed(mut self, seed: u64) -> Self {
        self.seed = seed;
        self
    }

    /// Sets the number of trees.
    #[must_use]
    pub fn with_n_estimators(mut self, n_estimators: usize) -> Self {
        self.n_estimators = n_estimators;
        self
    }

    /// Checks every hyperparameter.
    ///
    /// # Errors
    ///
    /// Returns [`VitalisError::InvalidHyperparameter`] for a test size outside
    /// (0, 1), zero trees, a zero depth or a zero feature count.
    pub fn validate(&self) -> Result<()> {
        let invalid = |param: &str, value: String, constraint: &str| {
            Err(VitalisError::InvalidHyperparameter {
                param: param.to_string(),
                value,
                constraint: constraint.to_string(),
            })
        };

        if !(self.test_size > 0.0 && self.test_size < 1.0) {
            return invalid("test_size", self.test_size.to_string(), "0 < test_size < 1");
        }
        if self.n_estimators == 0 {
            return invalid("n_estimators", "0".to_string(), ">= 1");
        }
        if self.max_depth == Some(0) {
            return invalid("max_depth", "0".to_string(), ">= 1");
        }
        if self.max_features == MaxFeatures::Count(0) {
            return invalid("max_features", "0".to_string(), ">= 1");
        }
        Ok(())
    }
}

/// A fitted classifier together with everything inference needs: feature
/// order, label set and the normalization bounds observed during training.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TrainedModel {
    forest: RandomForestClassifier,
    feature_names: Vec<String>,
    labels: LabelSet,
    scaling: FeatureScaling,
}

impl TrainedModel {
    /// Attaches the normalization bounds used to preprocess the training
    /// table.
    #[must_use]
    pub fn with_scaling(mut self, scaling: FeatureScaling) -> Self {
        self.scaling = scaling;
        self
    }

    /// Feature names in the order the model expects them.
    #[must_use]
    pub fn feature_names(&self) -> &[String] {
        &self.feature_names
    }

    /// The closed set of labels the model can emit.
    #[must_use]
    pub fn labels(&self) -> &LabelSet {
        &self.labels
    }

    /// Training-time normalization bounds.
    #[must_use]
    pub fn scaling(&self) -> &FeatureScaling {
        &self.scaling
    }

    /// The underlying forest.
    #[must_use]
    pub fn forest(&self) -> &RandomForestClassifier {
        &self.forest
    }

    /// Label for one feature vector, given in [`feature_names`](Self::feature_names)
    /// order and already preprocessed.
    ///
    /// # Errors
    ///
    /// Returns [`VitalisError::DimensionMismatch`] if the vector has the wrong
    /// length.
    pub fn predict(&self, features: &[f64]) -> Result<Label> {
        let class = self.forest.predict_row(features)?;
        self.labels.decode(class).cloned()
    }

    /// Labels for every row of `features`.
    ///
    /// # Errors
    ///
    /// Same as [`predict`](Self::predict).
    pub fn predict_batch(&self, features: &Matrix<f64>) -> Result<Vec<Label>> {
        features.rows().map(|row| self.predict(row)).collect()
    }

    /// Share of trees voting for each label, in label-set order.
    ///
    /// # Errors
    ///
    /// Same as [`predict`](Self::predict).
    pub fn predict_proba(&self, features: &[f64]) -> Result<Vec<(Label, f64)>> {
        let proba = self.forest.predict_proba_row(features)?;
        Ok(self
            .labels
            .labels()
            .iter()
            .cloned()
            .zip(proba.into_iter().chain(std::iter::repeat(0.0)))
            .collect())
    }

    /// Impurity-decrease importance of each feature, normalized to sum to 1.
    #[must_use]
    pub fn feature_importances(&self) -> Vec<(String, f64)> {
        let importances = self
            .forest
            .feature_importances()
            .unwrap_or_else(|| vec![0.0; self.feature_names.len()]);
        self.feature_names
            .iter()
            .cloned()
            .zip(importances)
            .collect()
    }
}

/// Fits and evaluates a [`TrainedModel`].
#[derive(Debug, Clone, Default)]
pub struct ModelTrainer {
    config: TrainConfig,
}

impl ModelTrainer {
    /// Creates a trainer with the given hyperparameters.
    #[must_use]
    pub fn new(config: TrainConfig) -> Self {
        Self { config }
    }

    /// Hyperparameters in use.
    #[must_use]
    pub fn config(&self) -> &TrainConfig {
        &self.config
    }

    /// Splits `features`/`targets`, fits a forest on the training subset and
    /// scores it on both subsets.
    ///
    /// # Arguments
    ///
    /// * `features` - Preprocessed feature table, one row per record
    /// * `targets` - Label of each record
    /// * `feature_names` - Column name of each feature, in table order
    ///
    /// # Errors
    ///
    /// - [`VitalisError::InvalidHyperparameter`] from [`TrainConfig::validate`]
    /// - [`VitalisError::DimensionMismatch`] if the inputs disagree in length
    /// - [`VitalisError::InsufficientData`] for fewer than 2 records or a
    ///   single distinct label
    pub fn train<S: AsRef<str>>(
        &self,
        features: &Matrix<f64>,
        targets: &[S],
        feature_names: &[&str],
    ) -> Result<(TrainedModel, Metrics)> {
        self.config.validate()?;

        if features.n_rows() != targets.len() {
            return Err(VitalisError::DimensionMismatch {
                expected: format!("{} targets", features.n_rows()),
                actual: format!("{} targets", targets.len()),
            });
        }
        if features.n_cols() != feature_names.len() {
            return Err(VitalisError::DimensionMismatch {
                expected: format!("{} feature names", features.n_cols()),
                actual: format!("{} feature names", feature_names.len()),
            });
        }
        if targets.len() < 2 {
            return Err(VitalisError::insufficient(format!(
                "need at least 2 records, got {}",
                targets.len()
            )));
        }

        let labels = LabelSet::fit(targets.iter().map(|t| t.as_ref()))?;
        if labels.len() < 2 {
            return Err(VitalisError::insufficient(format!(
                "need at least 2 distinct labels, got only '{}'",
                labels.labels()[0]
            )));
        }
        let y = labels.encode_all(targets)?;

        let cfg = &self.config;
        let split = train_test_split(features, &y, cfg.test_size, cfg.seed)?;
        debug!(
            n_train = split.y_train.len(),
            n_test = split.y_test.len(),
            seed = cfg.seed,
            "partitioned records"
        );

        let mut forest = RandomForestClassifier::new(cfg.n_estimators)
            .with_seed(cfg.seed)
            .with_max_features(cfg.max_features)
            .with_n_classes(labels.len());
        if let Some(depth) = cfg.max_depth {
            forest = forest.with_max_depth(depth);
        }
        forest.fit(&split.x_train, &split.y_train)?;

        let train_pred = forest.predict(&split.x_train)?;
        let test_pred = forest.predict(&split.x_test)?;
        let metrics = Metrics {
            train_accuracy: accuracy(&train_pred, &split.y_train)?,
            test_accuracy: accuracy(&test_pred, &split.y_test)?,
            n_train: split.y_train.len(),
            n_test: split.y_test.len(),
            confusion: confusion_matrix(&test_pred, &split.y_test, labels.len())?,
        };
        info!(
            train_accuracy = metrics.train_accuracy,
            test_accuracy = metrics.test_accuracy,
            n_estimators = cfg.n_estimators,
            n_labels = labels.len(),
            "model trained"
        );

        let model = TrainedModel {
            forest,
            feature_names: feature_names.iter().map(|s| (*s).to_string()).collect(),
            labels,
            scaling: FeatureScaling::new(),
        };
        Ok((model, metrics))
    }
}

#[cfg(test)]
mod tests;
