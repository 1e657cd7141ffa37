//! Classifier capability and the model artifact it is loaded from.

use anyhow::{Context, Result, anyhow, bail};
use serde::{Deserialize, Serialize};
use std::{collections::HashSet, fmt::Debug, fs, path::Path, sync::Arc};

/// A binary classifier that labels each row with `1.0` (rain) or `0.0`.
pub trait Classifier: Send + Sync + Debug {
    fn predict(&self, rows: &[Vec<f64>]) -> Result<Vec<f64>>;
}

/// On-disk model: the ordered feature names plus the fitted parameters.
///
/// Example JSON:
/// {"features": ["pressure", "dewpoint"],
///  "model": {"type": "logistic_regression", "coefficients": [0.1, 0.2], "intercept": -1.0}}
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ModelArtifact {
    pub features: Vec<String>,
    pub model: ModelSpec,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum ModelSpec {
    LogisticRegression(LogisticRegression),
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LogisticRegression {
    pub coefficients: Vec<f64>,
    pub intercept: f64,
    #[serde(default = "default_threshold")]
    pub threshold: f64,
}

fn default_threshold() -> f64 {
    0.5
}

impl LogisticRegression {
    /// Probability of the positive class for one row.
    pub fn probability(&self, row: &[f64]) -> Result<f64> {
        if row.len() != self.coefficients.len() {
            bail!(
                "Expected {} feature values, got {}",
                self.coefficients.len(),
                row.len()
            );
        }

        let z = self.intercept
            + self
                .coefficients
                .iter()
                .zip(row)
                .map(|(w, x)| w * x)
                .sum::<f64>();

        Ok(1.0 / (1.0 + (-z).exp()))
    }
}

impl Classifier for LogisticRegression {
    fn predict(&self, rows: &[Vec<f64>]) -> Result<Vec<f64>> {
        rows.iter()
            .map(|row| {
                let p = self.probability(row)?;
                Ok(if p >= self.threshold { 1.0 } else { 0.0 })
            })
            .collect()
    }
}

impl ModelArtifact {
    /// Read and validate a model artifact from a JSON file.
    pub fn load(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();

        let contents = fs::read_to_string(path)
            .with_context(|| format!("Failed to read model file: {}", path.display()))?;

        Self::from_json(&contents)
            .with_context(|| format!("Failed to load model file: {}", path.display()))
    }

    pub fn from_json(contents: &str) -> Result<Self> {
        let artifact: ModelArtifact =
            serde_json::from_str(contents).context("Failed to parse model JSON")?;
        artifact.validate()?;
        Ok(artifact)
    }

    fn validate(&self) -> Result<()> {
        if self.features.is_empty() {
            bail!("Model declares no features");
        }

        let mut seen = HashSet::new();
        for name in &self.features {
            if !seen.insert(name.as_str()) {
                bail!("Duplicate feature name '{name}' in model");
            }
        }

        match &self.model {
            ModelSpec::LogisticRegression(lr) => {
                if lr.coefficients.len() != self.features.len() {
                    return Err(anyhow!(
                        "Model has {} coefficients but {} features",
                        lr.coefficients.len(),
                        self.features.len()
                    ));
                }
            }
        }

        Ok(())
    }

    /// Split into the required-feature list and a shareable classifier.
    pub fn into_parts(self) -> (Vec<String>, Arc<dyn Classifier>) {
        let classifier: Arc<dyn Classifier> = match self.model {
            ModelSpec::LogisticRegression(lr) => Arc::new(lr),
        };
        (self.features, classifier)
    }
}
