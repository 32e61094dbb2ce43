//! OTP verification request/response models

use serde::{Deserialize, Serialize};
use serde_json::Value;

use super::TransactionStatus;

/// `POST /verify-otp` body as received; validated in the handler
#[derive(Debug, Deserialize)]
pub struct VerifyOtpRequest {
    #[serde(default)]
    pub transaction_id: Option<String>,
    #[serde(default)]
    pub otp: Option<Value>,
}

/// Result of one verification attempt
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum VerifyOutcome {
    NotFound,
    /// Record was not awaiting an OTP; its stored status is reported as-is
    Unchanged(TransactionStatus),
    Blocked,
    WrongOtp { attempts_left: i32 },
    Approved,
}

#[derive(Debug, Serialize)]
pub struct VerifyOtpResponse {
    pub status: &'static str,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub attempts_left: Option<i32>,
}

impl From<VerifyOutcome> for VerifyOtpResponse {
    fn from(outcome: VerifyOutcome) -> Self {
        let (status, attempts_left) = match outcome {
            VerifyOutcome::NotFound => ("NOT_FOUND", None),
            VerifyOutcome::Unchanged(status) => (status.as_str(), None),
            VerifyOutcome::Blocked => ("BLOCKED", None),
            VerifyOutcome::WrongOtp { attempts_left } => ("WRONG_OTP", Some(attempts_left)),
            VerifyOutcome::Approved => ("APPROVED", None),
        };
        Self { status, attempts_left }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_attempts_left_only_on_wrong_otp() {
        let wrong = serde_json::to_value(VerifyOtpResponse::from(VerifyOutcome::WrongOtp { attempts_left: 1 })).unwrap();
        assert_eq!(wrong, json!({"status": "WRONG_OTP", "attempts_left": 1}));

        let blocked = serde_json::to_value(VerifyOtpResponse::from(VerifyOutcome::Blocked)).unwrap();
        assert_eq!(blocked, json!({"status": "BLOCKED"}));

        let cleared = serde_json::to_value(VerifyOtpResponse::from(VerifyOutcome::Unchanged(TransactionStatus::Cleared))).unwrap();
        assert_eq!(cleared, json!({"status": "CLEARED"}));
    }
}
