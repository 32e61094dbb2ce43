//! Feature schema and extraction
//!
//! Transactions arrive as a loose JSON mapping. The classifier expects a
//! dense row in a fixed column order, with `Time` first and `Amount` last.

use serde_json::{Map, Value};

/// Number of model inputs
pub const FEATURE_COUNT: usize = 30;

/// Column order the classifier was trained on
pub const FEATURES: [&str; FEATURE_COUNT] = [
    "Time", "V1", "V2", "V3", "V4", "V5", "V6", "V7", "V8", "V9", "V10",
    "V11", "V12", "V13", "V14", "V15", "V16", "V17", "V18", "V19",
    "V20", "V21", "V22", "V23", "V24", "V25", "V26", "V27", "V28", "Amount",
];

pub const TIME_INDEX: usize = 0;
pub const AMOUNT_INDEX: usize = FEATURE_COUNT - 1;

#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum FeatureError {
    #[error("missing feature '{0}'")]
    Missing(String),

    #[error("feature '{0}' is not numeric")]
    NotNumeric(String),

    /// Feature values overflowed the classifier
    #[error("transaction features produced a non-finite fraud probability")]
    NonFiniteScore,
}

/// One transaction as a dense, ordered feature row
#[derive(Debug, Clone, PartialEq)]
pub struct FeatureVector([f64; FEATURE_COUNT]);

impl FeatureVector {
    /// Build a row from a raw transaction mapping.
    ///
    /// Numbers are taken as-is, numeric strings are coerced and booleans
    /// count as 1.0 / 0.0. Keys outside the schema are ignored.
    pub fn from_transaction(transaction: &Map<String, Value>) -> Result<Self, FeatureError> {
        let mut values = [0.0; FEATURE_COUNT];

        for (slot, name) in values.iter_mut().zip(FEATURES) {
            *slot = match transaction.get(name) {
                None | Some(Value::Null) => return Err(FeatureError::Missing(name.to_string())),
                Some(value) => numeric(value)
                    .ok_or_else(|| FeatureError::NotNumeric(name.to_string()))?,
            };
        }

        Ok(Self(values))
    }

    #[cfg(test)]
    pub fn from_array(values: [f64; FEATURE_COUNT]) -> Self {
        Self(values)
    }

    pub fn as_array(&self) -> &[f64; FEATURE_COUNT] {
        &self.0
    }

    pub fn get(&self, index: usize) -> f64 {
        self.0[index]
    }

    pub fn set(&mut self, index: usize, value: f64) {
        self.0[index] = value;
    }
}

fn numeric(value: &Value) -> Option<f64> {
    match value {
        Value::Number(n) => n.as_f64(),
        Value::Bool(b) => Some(if *b { 1.0 } else { 0.0 }),
        Value::String(s) => s.trim().parse::<f64>().ok().filter(|v| v.is_finite()),
        _ => None,
    }
}
