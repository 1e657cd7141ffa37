use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use std::{fmt, sync::Arc};

use crate::{error::ServiceError, model::Classifier};

/// Classifier verdict for one feature vector.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Prediction {
    Rainfall,
    #[serde(rename = "No Rainfall")]
    NoRainfall,
}

impl Prediction {
    pub fn from_class(class: f64) -> Self {
        if class == 1.0 { Self::Rainfall } else { Self::NoRainfall }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Rainfall => "Rainfall",
            Self::NoRainfall => "No Rainfall",
        }
    }
}

impl fmt::Display for Prediction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Validates feature vectors against the model's required features and runs
/// the classifier. Read-only once constructed.
#[derive(Debug, Clone)]
pub struct PredictionService {
    features: Vec<String>,
    classifier: Arc<dyn Classifier>,
}

impl PredictionService {
    pub fn new(features: Vec<String>, classifier: Arc<dyn Classifier>) -> Self {
        Self { features, classifier }
    }

    pub fn required_features(&self) -> &[String] {
        &self.features
    }

    pub fn predict(&self, input: &Map<String, Value>) -> Result<Prediction, ServiceError> {
        let missing: Vec<&str> = self
            .features
            .iter()
            .filter(|name| input.get(name.as_str()).is_none_or(Value::is_null))
            .map(String::as_str)
            .collect();

        if !missing.is_empty() {
            return Err(ServiceError::validation(format!(
                "Missing input values for: {}",
                missing.join(", ")
            )));
        }

        let row = self
            .features
            .iter()
            .map(|name| {
                input.get(name.as_str()).and_then(Value::as_f64).ok_or_else(|| {
                    ServiceError::internal(format!(
                        "Invalid value for feature '{name}': expected a number"
                    ))
                })
            })
            .collect::<Result<Vec<f64>, _>>()?;

        let output = self
            .classifier
            .predict(&[row])
            .map_err(|e| ServiceError::internal(e.to_string()))?;

        let class = output
            .first()
            .copied()
            .ok_or_else(|| ServiceError::internal("Classifier returned no prediction"))?;

        let prediction = Prediction::from_class(class);
        tracing::debug!(class, %prediction, "classified feature vector");

        Ok(prediction)
    }
}
