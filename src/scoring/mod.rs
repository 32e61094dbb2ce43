//! Fraud scoring
//!
//! A [`Scorer`] is loaded once at startup and shared read-only by every
//! request. Scoring a transaction extracts the fixed feature row, scales
//! `Time` and `Amount`, and asks the classifier for the fraud probability.

pub mod features;
pub mod model;
pub mod risk;
pub mod scaler;

use std::path::Path;
use std::sync::Arc;

use serde_json::{Map, Value};

pub use features::{FeatureError, FeatureVector, FEATURES, FEATURE_COUNT};
pub use model::{FraudModel, LogisticModel};
pub use risk::RiskTier;
pub use scaler::StandardScaler;

use features::{AMOUNT_INDEX, TIME_INDEX};

#[derive(Debug, thiserror::Error)]
pub enum ModelError {
    #[error("failed to read artifact {0}: {1}")]
    Io(String, #[source] std::io::Error),

    #[error("failed to parse artifact {0}: {1}")]
    Parse(String, #[source] serde_json::Error),

    #[error("invalid artifact: {0}")]
    Invalid(String),
}

/// Outcome of scoring one transaction
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Assessment {
    pub fraud_probability: f64,
    pub risk: RiskTier,
}

/// Classifier plus the scaler it was trained with
#[derive(Clone)]
pub struct Scorer {
    model: Arc<dyn FraudModel>,
    scaler: StandardScaler,
}

impl Scorer {
    pub fn new(model: Arc<dyn FraudModel>, scaler: StandardScaler) -> Self {
        Self { model, scaler }
    }

    /// Load both artifacts from disk
    pub fn load(model_path: impl AsRef<Path>, scaler_path: impl AsRef<Path>) -> Result<Self, ModelError> {
        let model = LogisticModel::load(model_path)?;
        let scaler = StandardScaler::load(scaler_path)?;
        Ok(Self::new(Arc::new(model), scaler))
    }

    /// Fraud probability for a raw transaction mapping
    pub fn score(&self, transaction: &Map<String, Value>) -> Result<f64, FeatureError> {
        let mut row = FeatureVector::from_transaction(transaction)?;

        // Time and Amount share the scaler fitted offline
        row.set(AMOUNT_INDEX, self.scaler.transform(row.get(AMOUNT_INDEX)));
        row.set(TIME_INDEX, self.scaler.transform(row.get(TIME_INDEX)));

        // NaN slips through clamp and would classify as LOW
        let p = self.model.predict_proba(&row);
        if !p.is_finite() {
            return Err(FeatureError::NonFiniteScore);
        }
        Ok(p.clamp(0.0, 1.0))
    }

    /// Score and bucket into a risk tier
    pub fn assess(&self, transaction: &Map<String, Value>) -> Result<Assessment, FeatureError> {
        let fraud_probability = self.score(transaction)?;
        Ok(Assessment {
            fraud_probability,
            risk: RiskTier::classify(fraud_probability),
        })
    }

    pub fn describe(&self) -> String {
        self.model.describe()
    }
}

/// Test doubles shared by handler and engine tests
#[cfg(test)]
pub(crate) mod testing {
    use super::*;
    use serde_json::json;

    /// Always answers with the same probability
    pub struct FixedModel(pub f64);

    impl FraudModel for FixedModel {
        fn predict_proba(&self, _features: &FeatureVector) -> f64 {
            self.0
        }

        fn describe(&self) -> String {
            format!("fixed({})", self.0)
        }
    }

    /// Answers with the unscaled `V1` feature, so tests pick the probability per request
    pub struct EchoV1Model;

    impl FraudModel for EchoV1Model {
        fn predict_proba(&self, features: &FeatureVector) -> f64 {
            features.get(1)
        }

        fn describe(&self) -> String {
            "echo(V1)".to_string()
        }
    }

    pub fn echo_scorer() -> Scorer {
        Scorer::new(Arc::new(EchoV1Model), StandardScaler::identity())
    }

    /// Complete transaction whose `V1` carries the wanted probability
    pub fn transaction_with_probability(p: f64) -> Map<String, Value> {
        let mut map = Map::new();
        for name in FEATURES {
            map.insert(name.to_string(), json!(0.0));
        }
        map.insert("V1".to_string(), json!(p));
        map.insert("Amount".to_string(), json!(149.62));
        map
    }
}
