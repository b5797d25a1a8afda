//! Inference on raw, caller-supplied records.
//!
//! [`PredictionService`] turns a map of raw field values (application units,
//! e.g. heart rate in bpm) into a label:
//!
//! 1. every field is checked against its declared [`Bounds`]
//! 2. normalized fields are checked against the training range and rescaled
//!    with the bounds retained from training
//! 3. values are assembled in the model's feature order
//! 4. the model votes
//!
//! The service never refits normalization on the incoming record.

use crate::error::{Result, VitalisError};
use crate::preprocessing::{FeatureNormalizer, FeatureScaling, Label};
use crate::trainer::TrainedModel;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fmt;
use tracing::debug;

/// Declared domain of a raw input field.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Bounds {
    /// `min <= value <= max`
    Inclusive {
        /// Lower bound
        min: f64,
        /// Upper bound
        max: f64,
    },
    /// `value > 0`
    Positive,
    /// Any finite value
    Any,
}

impl Bounds {
    /// Checks a raw value.
    ///
    /// # Errors
    ///
    /// Returns [`VitalisError::ValidationError`] naming `field` if `value`
    /// is not finite or lies outside the bounds.
    pub fn check(&self, field: &str, value: f64) -> Result<()> {
        if !value.is_finite() {
            return Err(VitalisError::validation(field, format!("{value} is not a finite number")));
        }
        let ok = match *self {
            Bounds::Inclusive { min, max } => (min..=max).contains(&value),
            Bounds::Positive => value > 0.0,
            Bounds::Any => true,
        };
        if ok {
            Ok(())
        } else {
            Err(VitalisError::validation(field, format!("{value} is outside {self}")))
        }
    }
}

impl fmt::Display for Bounds {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Bounds::Inclusive { min, max } => write!(f, "[{min}, {max}]"),
            Bounds::Positive => f.write_str("(0, +inf)"),
            Bounds::Any => f.write_str("(-inf, +inf)"),
        }
    }
}

/// A raw input field and its declared bounds.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FieldSpec {
    /// Column name, identical to the model feature name
    pub name: String,
    /// Accepted raw values
    pub bounds: Bounds,
}

impl FieldSpec {
    /// Creates a field spec.
    pub fn new(name: impl Into<String>, bounds: Bounds) -> Self {
        Self {
            name: name.into(),
            bounds,
        }
    }
}

/// A label together with the share of trees that voted for it.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Prediction {
    /// Winning label
    pub label: Label,
    /// Vote share of the winning label, in (0, 1]
    pub confidence: f64,
}

impl fmt::Display for Prediction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} (confidence {:.2})", self.label, self.confidence)
    }
}

/// Validates, normalizes and classifies raw records.
///
/// # Example
///
/// ```
/// use std::collections::BTreeMap;
/// use vitalis::predict::{Bounds, FieldSpec, PredictionService};
/// use vitalis::primitives::Matrix;
/// use vitalis::trainer::ModelTrainer;
///
/// let x = Matrix::from_vec(6, 1, vec![1.5, 1.6, 1.7, 1.8, 1.9, 2.0]).expect("valid");
/// let y = ["Short", "Short", "Short", "Tall", "Tall", "Tall"];
/// let (model, _) = ModelTrainer::default()
///     .train(&x, &y, &["Height (m)"])
///     .expect("trainable");
///
/// let service = PredictionService::new(vec![FieldSpec::new("Height (m)", Bounds::Positive)]);
/// let raw = BTreeMap::from([("Height (m)".to_string(), -1.0)]);
/// assert!(service.predict(&model, &raw, model.scaling()).is_err());
/// ```
#[derive(Debug, Clone, Default)]
pub struct PredictionService {
    fields: Vec<FieldSpec>,
}

impl PredictionService {
    /// Creates a service enforcing the given field bounds. Model features
    /// without a spec only need to be finite.
    #[must_use]
    pub fn new(fields: Vec<FieldSpec>) -> Self {
        Self { fields }
    }

    /// Declared fields.
    #[must_use]
    pub fn fields(&self) -> &[FieldSpec] {
        &self.fields
    }

    fn bounds_of(&self, name: &str) -> Bounds {
        self.fields
            .iter()
            .find(|f| f.name == name)
            .map_or(Bounds::Any, |f| f.bounds)
    }

    /// Builds the model input vector from a raw record.
    ///
    /// # Errors
    ///
    /// Returns [`VitalisError::ValidationError`] naming the offending field
    /// for an unknown or missing field, a value outside its declared bounds,
    /// or a normalized value outside the training range.
    pub fn feature_vector(
        &self,
        model: &TrainedModel,
        raw: &BTreeMap<String, f64>,
        scaling: &FeatureScaling,
    ) -> Result<Vec<f64>> {
        let names = model.feature_names();
        if let Some(unknown) = raw.keys().find(|k| !names.contains(*k)) {
            return Err(VitalisError::validation(
                unknown.as_str(),
                format!("not a model feature (expected {})", names.join(", ")),
            ));
        }

        let mut features = Vec::with_capacity(names.len());
        for name in names {
            let value = *raw
                .get(name)
                .ok_or_else(|| VitalisError::validation(name.as_str(), "missing value"))?;
            self.bounds_of(name).check(name, value)?;

            let value = match scaling.get(name) {
                Some(params) if !params.contains(value) => {
                    return Err(VitalisError::validation(
                        name.as_str(),
                        format!(
                            "{value} is outside the training range [{}, {}]",
                            params.min, params.max
                        ),
                    ));
                }
                Some(params) => FeatureNormalizer::transform(value, params),
                None => value,
            };
            features.push(value);
        }
        Ok(features)
    }

    /// Label for a raw record.
    ///
    /// `scaling` must be the bounds retained from training, normally
    /// [`TrainedModel::scaling`].
    ///
    /// # Errors
    ///
    /// See [`feature_vector`](Self::feature_vector).
    pub fn predict(
        &self,
        model: &TrainedModel,
        raw: &BTreeMap<String, f64>,
        scaling: &FeatureScaling,
    ) -> Result<Label> {
        let features = self.feature_vector(model, raw, scaling)?;
        let label = model.predict(&features)?;
        debug!(label = %label, ?features, "predicted");
        Ok(label)
    }

    /// Label for a raw record plus the vote share behind it.
    ///
    /// # Errors
    ///
    /// See [`feature_vector`](Self::feature_vector).
    pub fn predict_with_confidence(
        &self,
        model: &TrainedModel,
        raw: &BTreeMap<String, f64>,
        scaling: &FeatureScaling,
    ) -> Result<Prediction> {
        let features = self.feature_vector(model, raw, scaling)?;
        let label = model.predict(&features)?;
        let confidence = model
            .predict_proba(&features)?
            .into_iter()
            .find(|(l, _)| *l == label)
            .map_or(0.0, |(_, p)| p);
        debug!(label = %label, confidence, "predicted with confidence");
        Ok(Prediction { label, confidence })
    }
}
