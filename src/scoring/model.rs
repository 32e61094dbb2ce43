//! Classifier artifacts
//!
//! The service only needs `predict_proba` for the positive class, so any
//! classifier is a [`FraudModel`]. The shipped artifact is a logistic
//! regression exported to JSON.

use std::path::Path;

use ndarray::{Array1, ArrayView1};
use serde::{Deserialize, Serialize};

use super::features::{FeatureVector, FEATURES, FEATURE_COUNT};
use super::ModelError;

/// Probability-estimating classifier
pub trait FraudModel: Send + Sync {
    /// Probability that the row belongs to the fraud class, in [0, 1]
    fn predict_proba(&self, features: &FeatureVector) -> f64;

    /// Short description for health/status output
    fn describe(&self) -> String;
}

/// Logistic regression export
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LogisticArtifact {
    pub features: Vec<String>,
    pub coefficients: Vec<f64>,
    pub intercept: f64,
}

/// Linear model with a sigmoid link
#[derive(Debug, Clone)]
pub struct LogisticModel {
    coefficients: Array1<f64>,
    intercept: f64,
}

impl LogisticModel {
    pub fn from_artifact(artifact: LogisticArtifact) -> Result<Self, ModelError> {
        if artifact.features.len() != FEATURE_COUNT || artifact.coefficients.len() != FEATURE_COUNT {
            return Err(ModelError::Invalid(format!(
                "expected {} features and coefficients, got {} and {}",
                FEATURE_COUNT,
                artifact.features.len(),
                artifact.coefficients.len()
            )));
        }

        if let Some((got, want)) = artifact
            .features
            .iter()
            .zip(FEATURES)
            .find(|(got, want)| got.as_str() != *want)
        {
            return Err(ModelError::Invalid(format!(
                "feature order mismatch: artifact has '{got}' where '{want}' is expected"
            )));
        }

        if !artifact.intercept.is_finite() || artifact.coefficients.iter().any(|c| !c.is_finite()) {
            return Err(ModelError::Invalid("non-finite model weights".to_string()));
        }

        Ok(Self {
            coefficients: Array1::from(artifact.coefficients),
            intercept: artifact.intercept,
        })
    }

    pub fn load(path: impl AsRef<Path>) -> Result<Self, ModelError> {
        let path = path.as_ref();
        let raw = std::fs::read_to_string(path)
            .map_err(|e| ModelError::Io(path.display().to_string(), e))?;
        let artifact: LogisticArtifact = serde_json::from_str(&raw)
            .map_err(|e| ModelError::Parse(path.display().to_string(), e))?;
        Self::from_artifact(artifact)
    }
}

impl FraudModel for LogisticModel {
    fn predict_proba(&self, features: &FeatureVector) -> f64 {
        let row = ArrayView1::from(features.as_array().as_slice());
        let logit = self.coefficients.dot(&row) + self.intercept;
        sigmoid(logit)
    }

    fn describe(&self) -> String {
        format!("logistic_regression({} features)", self.coefficients.len())
    }
}

fn sigmoid(x: f64) -> f64 {
    if x >= 0.0 {
        1.0 / (1.0 + (-x).exp())
    } else {
        let e = x.exp();
        e / (1.0 + e)
    }
}
