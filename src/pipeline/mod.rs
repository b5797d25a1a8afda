//! Per-domain pipelines and the caller-facing API.
//!
//! A [`DomainPipeline`] is the explicit context of one domain: where its
//! dataset lives, how it is preprocessed, which hyperparameters train it and
//! under which key its model is stored. [`HealthMonitor`] owns one per
//! domain and exposes `train_all`, `predict` and `load_dataset`.
//!
//! Training path: load → fit normalization → fill missing → normalize →
//! drop unlabeled rows → train → attach normalization → save.
//! Inference path: load model → validate and normalize the raw record with
//! the retained bounds → vote.

mod domain;

pub use domain::Domain;

use crate::config::{DomainSettings, PipelineConfig};
use crate::data::{Dataset, DatasetLoader, DatasetSummary};
use crate::error::Result;
use crate::metrics::Metrics;
use crate::predict::{Prediction, PredictionService};
use crate::preprocessing::{fill_missing, FeatureNormalizer, FeatureScaling, Label};
use crate::primitives::Matrix;
use crate::store::ModelStore;
use crate::trainer::{ModelTrainer, TrainedModel};
use serde::Serialize;
use std::collections::BTreeMap;
use std::fmt;
use std::path::PathBuf;
use tracing::{debug, info, warn};

/// Training table of a domain after preprocessing.
#[derive(Debug, Clone, PartialEq)]
pub struct PreparedData {
    /// Feature table in model order
    pub features: Matrix<f64>,
    /// Target label of each row
    pub targets: Vec<String>,
    /// Bounds fitted on the normalized columns
    pub scaling: FeatureScaling,
    /// Rows dropped because their target was missing
    pub n_dropped: usize,
}

/// Outcome of training one domain.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct TrainingReport {
    /// Domain that was trained
    pub domain: Domain,
    /// Accuracy figures
    pub metrics: Metrics,
    /// Where the model was saved
    pub model_path: PathBuf,
    /// Rows dropped because their target was missing
    pub n_dropped: usize,
    /// Importance of each feature
    pub feature_importances: Vec<(String, f64)>,
    /// Predictions for the domain's fixed sample inputs
    pub sample_predictions: Vec<(Vec<f64>, Label)>,
}

impl fmt::Display for TrainingReport {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "[{}] {}", self.domain, self.metrics)?;
        if self.n_dropped > 0 {
            writeln!(f, "  dropped {} rows without a target", self.n_dropped)?;
        }
        for (name, importance) in &self.feature_importances {
            writeln!(f, "  importance {name}: {importance:.4}")?;
        }
        if !self.sample_predictions.is_empty() {
            let labels: Vec<String> = self
                .sample_predictions
                .iter()
                .map(|(_, l)| l.to_string())
                .collect();
            writeln!(f, "  sample predictions: [{}]", labels.join(", "))?;
        }
        write!(f, "  model saved to {}", self.model_path.display())
    }
}

/// Context of one prediction domain.
#[derive(Debug, Clone)]
pub struct DomainPipeline {
    domain: Domain,
    settings: DomainSettings,
    dataset_path: PathBuf,
    store: ModelStore,
    service: PredictionService,
}

impl DomainPipeline {
    /// Builds the pipeline of `domain` from `config`.
    #[must_use]
    pub fn new(domain: Domain, config: &PipelineConfig) -> Self {
        Self {
            domain,
            settings: config.settings(domain).clone(),
            dataset_path: config.dataset_path(domain),
            store: ModelStore::new(config.model_dir.clone()),
            service: PredictionService::new(domain.field_specs()),
        }
    }

    /// The domain served.
    #[must_use]
    pub fn domain(&self) -> Domain {
        self.domain
    }

    /// Settings in use.
    #[must_use]
    pub fn settings(&self) -> &DomainSettings {
        &self.settings
    }

    /// Model store in use.
    #[must_use]
    pub fn store(&self) -> &ModelStore {
        &self.store
    }

    /// Loads the domain dataset, requiring its feature and target columns.
    ///
    /// # Errors
    ///
    /// Returns [`crate::VitalisError::NotFound`] for a missing file and
    /// [`crate::VitalisError::SchemaError`] for missing columns.
    pub fn load_dataset(&self) -> Result<Dataset> {
        DatasetLoader::new()
            .with_required(&self.domain.required_columns())
            .load(&self.dataset_path)
    }

    /// Summary statistics of the domain dataset.
    ///
    /// # Errors
    ///
    /// Same as [`load_dataset`](Self::load_dataset).
    pub fn summary(&self) -> Result<DatasetSummary> {
        let dataset = self.load_dataset()?;
        Ok(DatasetSummary::from_dataset(&self.dataset_path, &dataset))
    }

    /// Turns a raw dataset into a training table.
    ///
    /// Normalization bounds are fitted before missing values are filled, so
    /// imputed means never widen the range.
    ///
    /// # Errors
    ///
    /// - [`crate::VitalisError::SchemaError`] for a missing or non-numeric feature column
    /// - [`crate::VitalisError::EmptyColumn`] for a feature column without values
    pub fn preprocess(&self, dataset: &Dataset) -> Result<PreparedData> {
        let features = self.domain.features();
        dataset.require_columns(&self.domain.required_columns())?;

        let mut scaling = FeatureScaling::new();
        for &column in self.domain.normalized() {
            scaling.insert(column, FeatureNormalizer::fit(dataset, column)?);
        }

        let mut data = fill_missing(dataset, features)?;
        for (column, params) in scaling.iter() {
            data = FeatureNormalizer::transform_column(&data, column, params)?;
        }

        let labels = data.labels(self.domain.target())?;
        let keep: Vec<usize> = labels
            .iter()
            .enumerate()
            .filter_map(|(i, l)| l.as_ref().map(|_| i))
            .collect();
        let n_dropped = labels.len() - keep.len();
        if n_dropped > 0 {
            warn!(
                domain = %self.domain,
                n_dropped,
                target = self.domain.target(),
                "dropping rows with a missing target"
            );
            data = data.select_rows(&keep)?;
        }

        let targets = labels.into_iter().flatten().collect();
        let features = data.to_matrix(features)?;
        debug!(domain = %self.domain, rows = features.n_rows(), "preprocessed dataset");
        Ok(PreparedData {
            features,
            targets,
            scaling,
            n_dropped,
        })
    }

    /// Preprocesses `dataset` and fits a model on it, without saving.
    ///
    /// # Errors
    ///
    /// Propagates preprocessing and training errors.
    pub fn fit(&self, dataset: &Dataset) -> Result<(TrainedModel, Metrics, usize)> {
        let prepared = self.preprocess(dataset)?;
        let trainer = ModelTrainer::new(self.settings.training.clone());
        let (model, metrics) =
            trainer.train(&prepared.features, &prepared.targets, self.domain.features())?;
        Ok((model.with_scaling(prepared.scaling), metrics, prepared.n_dropped))
    }

    /// Loads the dataset, trains, saves the model and reports.
    ///
    /// # Errors
    ///
    /// Propagates loading, preprocessing, training and storage errors.
    pub fn train(&self) -> Result<TrainingReport> {
        let dataset = self.load_dataset()?;
        let (model, metrics, n_dropped) = self.fit(&dataset)?;
        let model_path = self.store.save(&model, &self.settings.model_key)?;

        let sample_predictions = self
            .domain
            .sample_inputs()
            .into_iter()
            .map(|input| {
                let label = model.predict(&input)?;
                Ok((input, label))
            })
            .collect::<Result<Vec<_>>>()?;
        for (input, label) in &sample_predictions {
            debug!(domain = %self.domain, ?input, label = %label, "sample prediction");
        }

        info!(
            domain = %self.domain,
            train_accuracy = metrics.train_accuracy,
            test_accuracy = metrics.test_accuracy,
            "domain trained"
        );
        Ok(TrainingReport {
            domain: self.domain,
            feature_importances: model.feature_importances(),
            metrics,
            model_path,
            n_dropped,
            sample_predictions,
        })
    }

    /// Loads the stored model of this domain.
    ///
    /// # Errors
    ///
    /// [`crate::VitalisError::NotFound`] if the domain was never trained,
    /// [`crate::VitalisError::CorruptModel`] if the artifact is damaged.
    pub fn load_model(&self) -> Result<TrainedModel> {
        self.store.load(&self.settings.model_key)
    }

    /// Classifies a raw record with an already loaded model.
    ///
    /// # Errors
    ///
    /// Returns [`crate::VitalisError::ValidationError`] naming the offending field.
    pub fn predict_with(
        &self,
        model: &TrainedModel,
        raw: &BTreeMap<String, f64>,
    ) -> Result<Prediction> {
        self.service
            .predict_with_confidence(model, raw, model.scaling())
    }

    /// Loads the stored model and classifies a raw record.
    ///
    /// # Errors
    ///
    /// Errors of [`load_model`](Self::load_model) and
    /// [`predict_with`](Self::predict_with).
    pub fn predict(&self, raw: &BTreeMap<String, f64>) -> Result<Prediction> {
        let model = self.load_model()?;
        self.predict_with(&model, raw)
    }
}

/// Caller-facing entry point over all three domains.
///
/// # Example
///
/// ```no_run
/// use std::collections::BTreeMap;
/// use vitalis::config::PipelineConfig;
/// use vitalis::pipeline::{Domain, HealthMonitor};
///
/// let monitor = HealthMonitor::new(PipelineConfig::default());
/// for report in monitor.train_all().expect("datasets present") {
///     println!("{report}");
/// }
///
/// let raw = BTreeMap::from([
///     ("heart_rate".to_string(), 95.0),
///     ("activity_level".to_string(), 0.4),
/// ]);
/// let label = monitor.predict(Domain::HeartRate, &raw).expect("valid input");
/// println!("risk: {label}");
/// ```
#[derive(Debug, Clone)]
pub struct HealthMonitor {
    pipelines: BTreeMap<Domain, DomainPipeline>,
}

impl HealthMonitor {
    /// Builds one pipeline per domain.
    #[must_use]
    pub fn new(config: PipelineConfig) -> Self {
        let pipelines = Domain::ALL
            .into_iter()
            .map(|d| (d, DomainPipeline::new(d, &config)))
            .collect();
        Self { pipelines }
    }

    /// Pipeline of `domain`.
    #[must_use]
    pub fn pipeline(&self, domain: Domain) -> &DomainPipeline {
        // Every domain is inserted by `new`.
        &self.pipelines[&domain]
    }

    /// Trains every domain in turn, stopping at the first failure.
    ///
    /// # Errors
    ///
    /// The first error of [`DomainPipeline::train`].
    pub fn train_all(&self) -> Result<Vec<TrainingReport>> {
        self.pipelines.values().map(DomainPipeline::train).collect()
    }

    /// Label for a raw record of `domain`, using its stored model.
    ///
    /// # Errors
    ///
    /// See [`DomainPipeline::predict`].
    pub fn predict(&self, domain: Domain, raw: &BTreeMap<String, f64>) -> Result<Label> {
        Ok(self.pipeline(domain).predict(raw)?.label)
    }

    /// Label and vote share for a raw record of `domain`.
    ///
    /// # Errors
    ///
    /// See [`DomainPipeline::predict`].
    pub fn predict_with_confidence(
        &self,
        domain: Domain,
        raw: &BTreeMap<String, f64>,
    ) -> Result<Prediction> {
        self.pipeline(domain).predict(raw)
    }

    /// Summary statistics of the dataset of `domain`.
    ///
    /// # Errors
    ///
    /// See [`DomainPipeline::load_dataset`].
    pub fn load_dataset(&self, domain: Domain) -> Result<DatasetSummary> {
        self.pipeline(domain).summary()
    }
}

#[cfg(test)]
mod tests;
