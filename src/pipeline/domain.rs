//! The three prediction domains and their fixed schemas.

use crate::error::VitalisError;
use crate::predict::{Bounds, FieldSpec};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// A prediction domain. Each has its own dataset, model and model key;
/// domains share no state.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Domain {
    /// Risk level from heart rate and activity level
    HeartRate,
    /// BMI category from height and weight
    Bmi,
    /// Category from fasting blood sugar
    BloodSugar,
}

/// Already-normalized feature vectors the heart-rate model is probed with
/// after training.
const HEART_RATE_SAMPLES: [[f64; 2]; 3] = [[0.2, 0.3], [0.6, 0.5], [0.9, 0.8]];

impl Domain {
    /// Every domain, in training order.
    pub const ALL: [Domain; 3] = [Domain::HeartRate, Domain::Bmi, Domain::BloodSugar];

    /// Identifier used in configuration files and on the command line.
    #[must_use]
    pub fn name(self) -> &'static str {
        match self {
            Domain::HeartRate => "heart_rate",
            Domain::Bmi => "bmi",
            Domain::BloodSugar => "blood_sugar",
        }
    }

    /// Feature columns in model order.
    #[must_use]
    pub fn features(self) -> &'static [&'static str] {
        match self {
            Domain::HeartRate => &["heart_rate", "activity_level"],
            Domain::Bmi => &["Height (m)", "Weight (kg)"],
            Domain::BloodSugar => &["Fasting Blood Sugar (mg/dL)"],
        }
    }

    /// Target column.
    #[must_use]
    pub fn target(self) -> &'static str {
        match self {
            Domain::HeartRate => "risk_level",
            Domain::Bmi | Domain::BloodSugar => "Category",
        }
    }

    /// Feature columns min-max normalized before training.
    #[must_use]
    pub fn normalized(self) -> &'static [&'static str] {
        match self {
            Domain::HeartRate => &["heart_rate"],
            Domain::Bmi | Domain::BloodSugar => &[],
        }
    }

    /// Accepted raw values of each feature.
    #[must_use]
    pub fn field_specs(self) -> Vec<FieldSpec> {
        match self {
            Domain::HeartRate => vec![
                FieldSpec::new("heart_rate", Bounds::Inclusive { min: 60.0, max: 160.0 }),
                FieldSpec::new("activity_level", Bounds::Inclusive { min: 0.0, max: 1.0 }),
            ],
            Domain::Bmi => vec![
                FieldSpec::new("Height (m)", Bounds::Positive),
                FieldSpec::new("Weight (kg)", Bounds::Positive),
            ],
            Domain::BloodSugar => vec![FieldSpec::new("Fasting Blood Sugar (mg/dL)", Bounds::Positive)],
        }
    }

    /// Model-space feature vectors reported after training.
    #[must_use]
    pub fn sample_inputs(self) -> Vec<Vec<f64>> {
        match self {
            Domain::HeartRate => HEART_RATE_SAMPLES.iter().map(|r| r.to_vec()).collect(),
            Domain::Bmi | Domain::BloodSugar => Vec::new(),
        }
    }

    /// Every column a dataset of this domain must provide.
    #[must_use]
    pub fn required_columns(self) -> Vec<&'static str> {
        let mut cols = self.features().to_vec();
        cols.push(self.target());
        cols
    }
}

impl fmt::Display for Domain {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

impl FromStr for Domain {
    type Err = VitalisError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().replace('-', "_").as_str() {
            "heart_rate" | "heart" => Ok(Domain::HeartRate),
            "bmi" => Ok(Domain::Bmi),
            "blood_sugar" | "sugar" => Ok(Domain::BloodSugar),
            _ => Err(VitalisError::validation(
                "domain",
                format!("unknown domain '{s}' (expected heart_rate, bmi or blood_sugar)"),
            )),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_domain() {
        assert_eq!("heart_rate".parse::<Domain>().expect("valid"), Domain::HeartRate);
        assert_eq!("Blood-Sugar".parse::<Domain>().expect("valid"), Domain::BloodSugar);
        assert_eq!("bmi".parse::<Domain>().expect("valid"), Domain::Bmi);
        assert!("glucose".parse::<Domain>().is_err());
    }

    #[test]
    fn test_name_roundtrip() {
        for domain in Domain::ALL {
            assert_eq!(domain.name().parse::<Domain>().expect("valid"), domain);
        }
    }

    #[test]
    fn test_normalized_columns_are_features() {
        for domain in Domain::ALL {
            for col in domain.normalized() {
                assert!(domain.features().contains(col));
            }
            assert_eq!(domain.field_specs().len(), domain.features().len());
        }
    }

    #[test]
    fn test_heart_rate_samples() {
        let samples = Domain::HeartRate.sample_inputs();
        assert_eq!(samples, vec![vec![0.2, 0.3], vec![0.6, 0.5], vec![0.9, 0.8]]);
        assert!(Domain::Bmi.sample_inputs().is_empty());
    }
}
