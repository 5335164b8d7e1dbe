//! Pre-trained per-league outcome classifiers.
//!
//! The engine only sees the [`Classifier`] capability: ordered feature
//! columns, ordered class labels, class probabilities for one feature row and
//! the model's held-out test accuracy. [`ModelArtifact`] is the on-disk JSON
//! form produced by the training pipeline.

pub mod forest;
pub mod logistic;

use serde::{Deserialize, Serialize};
use std::path::Path;

use crate::error::{PredictError, PredictResult};

pub use forest::RandomForest;
pub use logistic::LogisticModel;

/// Class labels every artifact must expose, from the home team's perspective.
pub const WIN: &str = "win";
pub const DRAW: &str = "draw";
pub const LOSS: &str = "loss";

/// Minimal capability an outcome model must provide.
pub trait Classifier: Send + Sync {
    /// Feature names in the order `predict_proba` expects them.
    fn feature_columns(&self) -> &[String];

    /// Class labels in the order of `predict_proba` output.
    fn class_labels(&self) -> &[String];

    /// One probability per class for a single feature row.
    fn predict_proba(&self, features: &[f64]) -> PredictResult<Vec<f64>>;

    /// Held-out accuracy, used as the ensemble weight.
    fn test_accuracy(&self) -> f64;
}

/// Probability of `label` in `proba`, looked up through the model's own class order.
pub fn class_probability(
    model: &dyn Classifier,
    proba: &[f64],
    label: &str,
) -> PredictResult<f64> {
    let idx = model
        .class_labels()
        .iter()
        .position(|c| c == label)
        .ok_or_else(|| PredictError::Model(format!("model has no '{label}' class")))?;
    proba
        .get(idx)
        .copied()
        .ok_or_else(|| PredictError::Model(format!("no probability for class '{label}'")))
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum Estimator {
    Logistic(LogisticModel),
    RandomForest(RandomForest),
}

/// Serialized model plus the metadata the training run recorded.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ModelArtifact {
    pub feature_cols: Vec<String>,
    pub classes: Vec<String>,
    pub test_accuracy: f64,
    #[serde(default)]
    pub train_accuracy: Option<f64>,
    #[serde(default)]
    pub n_samples: Option<u64>,
    #[serde(default)]
    pub train_report: Option<serde_json::Value>,
    #[serde(default)]
    pub test_report: Option<serde_json::Value>,
    pub estimator: Estimator,
}

impl ModelArtifact {
    /// Read and validate an artifact file. A missing file is `NotFound`.
    pub fn load(path: &Path, league: &str) -> PredictResult<Self> {
        let raw = match std::fs::read_to_string(path) {
            Ok(raw) => raw,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
                return Err(PredictError::NotFound(format!(
                    "Model for '{league}' not found"
                )))
            }
            Err(e) => {
                return Err(anyhow::Error::new(e)
                    .context(format!("read model {}", path.display()))
                    .into())
            }
        };
        Self::from_json(&raw)
    }

    pub fn from_json(raw: &str) -> PredictResult<Self> {
        let artifact: ModelArtifact = serde_json::from_str(raw)
            .map_err(|e| PredictError::Model(format!("invalid model artifact: {e}")))?;
        artifact.validate()?;
        Ok(artifact)
    }

    pub fn validate(&self) -> PredictResult<()> {
        for label in [WIN, DRAW, LOSS] {
            if !self.classes.iter().any(|c| c == label) {
                return Err(PredictError::Model(format!(
                    "artifact classes {:?} lack '{label}'",
                    self.classes
                )));
            }
        }
        let n_features = self.feature_cols.len();
        let n_classes = self.classes.len();
        match &self.estimator {
            Estimator::Logistic(m) => m.validate(n_features, n_classes),
            Estimator::RandomForest(f) => f.validate(n_features, n_classes),
        }
    }
}

impl Classifier for ModelArtifact {
    fn feature_columns(&self) -> &[String] {
        &self.feature_cols
    }

    fn class_labels(&self) -> &[String] {
        &self.classes
    }

    fn predict_proba(&self, features: &[f64]) -> PredictResult<Vec<f64>> {
        if features.len() != self.feature_cols.len() {
            return Err(PredictError::Model(format!(
                "expected {} features, got {}",
                self.feature_cols.len(),
                features.len()
            )));
        }
        let proba = match &self.estimator {
            Estimator::Logistic(m) => m.predict_proba(features),
            Estimator::RandomForest(f) => f.predict_proba(features, self.classes.len()),
        };
        if proba.iter().any(|p| !p.is_finite() || *p < 0.0) {
            return Err(PredictError::Model(format!(
                "non-finite or negative probabilities {proba:?}"
            )));
        }
        Ok(proba)
    }

    fn test_accuracy(&self) -> f64 {
        self.test_accuracy
    }
}
