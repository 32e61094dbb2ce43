//! Transaction record model

use std::fmt;
use std::str::FromStr;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use uuid::Uuid;

use crate::scoring::RiskTier;

/// Stored lifecycle state of a transaction
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum TransactionStatus {
    Approved,
    Open,
    Cleared,
    OtpPending,
    Blocked,
}

impl TransactionStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            TransactionStatus::Approved => "APPROVED",
            TransactionStatus::Open => "OPEN",
            TransactionStatus::Cleared => "CLEARED",
            TransactionStatus::OtpPending => "OTP_PENDING",
            TransactionStatus::Blocked => "BLOCKED",
        }
    }

    /// Status written by the direct-check flow
    pub fn for_direct_check(risk: RiskTier) -> Self {
        if risk == RiskTier::High {
            TransactionStatus::Open
        } else {
            TransactionStatus::Cleared
        }
    }
}

impl fmt::Display for TransactionStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for TransactionStatus {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "APPROVED" => Ok(TransactionStatus::Approved),
            "OPEN" => Ok(TransactionStatus::Open),
            "CLEARED" => Ok(TransactionStatus::Cleared),
            "OTP_PENDING" => Ok(TransactionStatus::OtpPending),
            "BLOCKED" => Ok(TransactionStatus::Blocked),
            other => Err(format!("unknown transaction status '{other}'")),
        }
    }
}

/// One scored transaction as persisted
#[derive(Debug, Clone, PartialEq)]
pub struct TransactionRecord {
    pub id: Uuid,
    pub transaction: Map<String, Value>,
    pub fraud_probability: f64,
    pub risk: RiskTier,
    pub status: TransactionStatus,
    pub otp: Option<u32>,
    pub attempts: i32,
    pub timestamp: DateTime<Utc>,
}

/// Fields supplied when inserting a record; the store assigns `id`
#[derive(Debug, Clone)]
pub struct NewTransaction {
    pub transaction: Map<String, Value>,
    pub fraud_probability: f64,
    pub risk: RiskTier,
    pub status: TransactionStatus,
    pub otp: Option<u32>,
    pub timestamp: DateTime<Utc>,
}

impl NewTransaction {
    pub fn new(
        transaction: Map<String, Value>,
        fraud_probability: f64,
        risk: RiskTier,
        status: TransactionStatus,
    ) -> Self {
        Self {
            transaction,
            fraud_probability,
            risk,
            status,
            otp: None,
            timestamp: Utc::now(),
        }
    }

    pub fn with_otp(mut self, otp: u32) -> Self {
        self.otp = Some(otp);
        self
    }

    pub fn into_record(self, id: Uuid) -> TransactionRecord {
        TransactionRecord {
            id,
            transaction: self.transaction,
            fraud_probability: self.fraud_probability,
            risk: self.risk,
            status: self.status,
            otp: self.otp,
            attempts: 0,
            timestamp: self.timestamp,
        }
    }
}

/// Record as returned by the read endpoints (identifier omitted)
#[derive(Debug, Clone, Serialize)]
pub struct TransactionView {
    pub transaction: Map<String, Value>,
    pub fraud_probability: f64,
    pub risk: RiskTier,
    pub status: TransactionStatus,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub otp: Option<u32>,
    /// Only challenged records carry an attempt counter
    #[serde(skip_serializing_if = "Option::is_none")]
    pub attempts: Option<i32>,
    pub timestamp: DateTime<Utc>,
}

impl TransactionRecord {
    pub fn to_view(&self, expose_otp: bool) -> TransactionView {
        TransactionView {
            transaction: self.transaction.clone(),
            fraud_probability: self.fraud_probability,
            risk: self.risk,
            status: self.status,
            otp: if expose_otp { self.otp } else { None },
            attempts: self.otp.map(|_| self.attempts),
            timestamp: self.timestamp,
        }
    }
}

/// `POST /check-transaction` body; failures are reported inline
#[derive(Debug, Serialize)]
#[serde(untagged)]
pub enum CheckTransactionResponse {
    Scored {
        fraud_probability: f64,
        risk: RiskTier,
    },
    Failed {
        error: String,
    },
}

/// `POST /initiate-transaction` body
#[derive(Debug, Serialize)]
#[serde(tag = "status", rename_all = "SCREAMING_SNAKE_CASE")]
pub enum InitiateTransactionResponse {
    Approved {
        risk: RiskTier,
    },
    OtpRequired {
        risk: RiskTier,
        transaction_id: Uuid,
        #[serde(skip_serializing_if = "Option::is_none")]
        otp: Option<u32>,
    },
}
