//! Pipeline configuration.
//!
//! Read from a TOML file. Every key is optional: a missing key keeps the
//! built-in default for its domain, so an empty file reproduces the stock
//! setup (`health_data.csv`, `bmi_data_200.csv`, `blood_sugar_data.csv`,
//! seed 42, 50 trees, depth 5 for the heart-rate model).
//!
//! ```toml
//! data_dir = "data"
//! model_dir = "models"
//!
//! [heart_rate.training]
//! n_estimators = 100
//!
//! [bmi]
//! dataset = "bmi_data_500.csv"
//! ```

use crate::error::{Result, VitalisError};
use crate::pipeline::Domain;
use crate::trainer::TrainConfig;
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};
use tracing::debug;

/// Dataset, model key and hyperparameters of one domain.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct DomainSettings {
    /// Dataset file name, relative to `data_dir`
    pub dataset: String,
    /// Storage key of the trained model
    pub model_key: String,
    /// Training hyperparameters
    pub training: TrainConfig,
}

impl DomainSettings {
    /// Built-in settings of `domain`.
    #[must_use]
    pub fn defaults_for(domain: Domain) -> Self {
        match domain {
            Domain::HeartRate => Self {
                dataset: "health_data.csv".to_string(),
                model_key: "health_model".to_string(),
                training: TrainConfig::default().with_max_depth(5),
            },
            Domain::Bmi => Self {
                dataset: "bmi_data_200.csv".to_string(),
                model_key: "bmi_model".to_string(),
                training: TrainConfig::default(),
            },
            Domain::BloodSugar => Self {
                dataset: "blood_sugar_data.csv".to_string(),
                model_key: "blood_sugar_model".to_string(),
                training: TrainConfig::default(),
            },
        }
    }
}

/// Top-level configuration.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct PipelineConfig {
    /// Directory holding the datasets
    pub data_dir: PathBuf,
    /// Directory holding the model artifacts
    pub model_dir: PathBuf,
    /// Heart-rate risk domain
    pub heart_rate: DomainSettings,
    /// BMI domain
    pub bmi: DomainSettings,
    /// Blood-sugar domain
    pub blood_sugar: DomainSettings,
}

impl Default for PipelineConfig {
    fn default() -> Self {
        Self {
            data_dir: PathBuf::from("."),
            model_dir: PathBuf::from("."),
            heart_rate: DomainSettings::defaults_for(Domain::HeartRate),
            bmi: DomainSettings::defaults_for(Domain::Bmi),
            blood_sugar: DomainSettings::defaults_for(Domain::BloodSugar),
        }
    }
}

impl PipelineConfig {
    /// Reads a TOML configuration file.
    ///
    /// # Errors
    ///
    /// - [`VitalisError::NotFound`] if the file does not exist
    /// - [`VitalisError::Config`] if it is not valid TOML, has unknown keys,
    ///   or holds invalid hyperparameters
    pub fn load(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        if !path.is_file() {
            return Err(VitalisError::NotFound {
                what: "config file",
                path: path.to_path_buf(),
            });
        }
        let text = fs::read_to_string(path)?;
        let config = Self::from_toml(&text)?;
        debug!(path = %path.display(), "configuration loaded");
        Ok(config)
    }

    /// Parses configuration text, filling absent keys from the defaults.
    ///
    /// # Errors
    ///
    /// Returns [`VitalisError::Config`] on a parse error, an unknown key or
    /// an invalid hyperparameter.
    pub fn from_toml(text: &str) -> Result<Self> {
        let overlay: toml::Value = toml::from_str(text).map_err(config_error)?;
        let mut merged = toml::Value::try_from(Self::default()).map_err(config_error)?;
        merge(&mut merged, overlay);

        let config: Self = merged.try_into().map_err(config_error)?;
        config.validate()?;
        Ok(config)
    }

    /// Checks the hyperparameters of every domain.
    ///
    /// # Errors
    ///
    /// Returns [`VitalisError::Config`] naming the offending domain.
    pub fn validate(&self) -> Result<()> {
        for domain in Domain::ALL {
            self.settings(domain)
                .training
                .validate()
                .map_err(|e| VitalisError::Config(format!("[{domain}.training] {e}")))?;
        }
        Ok(())
    }

    /// Settings of `domain`.
    #[must_use]
    pub fn settings(&self, domain: Domain) -> &DomainSettings {
        match domain {
            Domain::HeartRate => &self.heart_rate,
            Domain::Bmi => &self.bmi,
            Domain::BloodSugar => &self.blood_sugar,
        }
    }

    /// Full path of the dataset of `domain`.
    #[must_use]
    pub fn dataset_path(&self, domain: Domain) -> PathBuf {
        self.data_dir.join(&self.settings(domain).dataset)
    }
}

fn config_error(e: impl std::fmt::Display) -> VitalisError {
    VitalisError::Config(e.to_string())
}

/// Recursively overlays `overlay` onto `base`: tables merge key by key,
/// anything else replaces.
fn merge(base: &mut toml::Value, overlay: toml::Value) {
    match (base, overlay) {
        (toml::Value::Table(base), toml::Value::Table(overlay)) => {
            for (key, value) in overlay {
                match base.get_mut(&key) {
                    Some(existing) => merge(existing, value),
                    None => {
                        base.insert(key, value);
                    }
                }
            }
        }
        (base, overlay) => *base = overlay,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::tree::MaxFeatures;
    use std::io::Write;
    use tempfile::NamedTempFile;

    #[test]
    fn test_empty_file_gives_defaults() {
        let config = PipelineConfig::from_toml("").expect("empty config is valid");
        assert_eq!(config, PipelineConfig::default());
        assert_eq!(config.heart_rate.training.max_depth, Some(5));
        assert_eq!(config.bmi.training.max_depth, None);
        assert_eq!(config.blood_sugar.model_key, "blood_sugar_model");
        assert_eq!(config.heart_rate.training.seed, 42);
        assert_eq!(config.bmi.training.n_estimators, 50);
    }

    #[test]
    fn test_partial_table_keeps_domain_defaults() {
        let config = PipelineConfig::from_toml(
            r#"
            data_dir = "data"

            [heart_rate.training]
            n_estimators = 100
            max_features = "all"

            [bmi]
            dataset = "bmi_data_500.csv"
            "#,
        )
        .expect("valid config");

        assert_eq!(config.data_dir, PathBuf::from("data"));
        assert_eq!(config.heart_rate.training.n_estimators, 100);
        assert_eq!(config.heart_rate.training.max_features, MaxFeatures::All);
        assert_eq!(config.heart_rate.training.max_depth, Some(5));
        assert_eq!(config.heart_rate.model_key, "health_model");
        assert_eq!(config.bmi.dataset, "bmi_data_500.csv");
        assert_eq!(config.bmi.model_key, "bmi_model");
        assert_eq!(
            config.dataset_path(Domain::Bmi),
            PathBuf::from("data").join("bmi_data_500.csv")
        );
    }

    #[test]
    fn test_invalid_hyperparameter_is_config_error() {
        let err = PipelineConfig::from_toml("[bmi.training]\ntest_size = 1.5\n").unwrap_err();
        assert!(matches!(err, VitalisError::Config(ref m) if m.contains("bmi")));
    }

    #[test]
    fn test_unknown_key_is_config_error() {
        let err = PipelineConfig::from_toml("[heart_rate]\nlearning_rate = 0.1\n").unwrap_err();
        assert!(matches!(err, VitalisError::Config(_)));
    }

    #[test]
    fn test_syntax_error_is_config_error() {
        let err = PipelineConfig::from_toml("data_dir = ").unwrap_err();
        assert!(matches!(err, VitalisError::Config(_)));
    }

    #[test]
    fn test_load_from_file() {
        let mut file = NamedTempFile::new().expect("temp file");
        writeln!(file, "model_dir = \"trained\"").expect("write");
        let config = PipelineConfig::load(file.path()).expect("valid config");
        assert_eq!(config.model_dir, PathBuf::from("trained"));
    }

    #[test]
    fn test_load_missing_file() {
        let err = PipelineConfig::load("/nonexistent/vitalis.toml").unwrap_err();
        assert!(err.is_not_found());
    }
}
