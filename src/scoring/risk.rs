//! Risk tiers

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

/// Probability above which a transaction is HIGH risk
pub const HIGH_THRESHOLD: f64 = 0.8;

/// Probability above which a transaction is at least MEDIUM risk
pub const MEDIUM_THRESHOLD: f64 = 0.5;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum RiskTier {
    Low,
    Medium,
    High,
}

impl RiskTier {
    /// Bucket a fraud probability. Both thresholds are exclusive.
    pub fn classify(probability: f64) -> Self {
        if probability > HIGH_THRESHOLD {
            RiskTier::High
        } else if probability > MEDIUM_THRESHOLD {
            RiskTier::Medium
        } else {
            RiskTier::Low
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            RiskTier::Low => "LOW",
            RiskTier::Medium => "MEDIUM",
            RiskTier::High => "HIGH",
        }
    }
}

impl fmt::Display for RiskTier {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for RiskTier {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "LOW" => Ok(RiskTier::Low),
            "MEDIUM" => Ok(RiskTier::Medium),
            "HIGH" => Ok(RiskTier::High),
            other => Err(format!("unknown risk tier '{other}'")),
        }
    }
}
