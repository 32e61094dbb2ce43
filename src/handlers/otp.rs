//! OTP verification handler

use axum::{extract::State, Json};
use serde_json::Value;
use uuid::Uuid;

use crate::{AppState, AppError, AppResult};
use crate::models::{VerifyOtpRequest, VerifyOtpResponse};

/// Verify the OTP for a pending transaction
pub async fn verify(
    State(state): State<AppState>,
    Json(req): Json<VerifyOtpRequest>,
) -> AppResult<Json<VerifyOtpResponse>> {
    let id = parse_transaction_id(req.transaction_id.as_deref())?;
    let otp = parse_otp(req.otp.as_ref())?;

    let outcome = state.otp.verify(id, otp).await?;
    tracing::debug!("OTP verification for {}: {:?}", id, outcome);

    Ok(Json(outcome.into()))
}

fn parse_transaction_id(raw: Option<&str>) -> AppResult<Uuid> {
    let raw = raw.ok_or_else(|| AppError::ValidationError("transaction_id is required".to_string()))?;
    Uuid::parse_str(raw.trim())
        .map_err(|_| AppError::ValidationError(format!("invalid transaction_id '{}'", raw)))
}

/// Accepts an integer or a numeric string
fn parse_otp(raw: Option<&Value>) -> AppResult<i64> {
    let invalid = || AppError::ValidationError("otp must be an integer".to_string());

    match raw.ok_or_else(|| AppError::ValidationError("otp is required".to_string()))? {
        Value::Number(n) => n
            .as_i64()
            .or_else(|| n.as_f64().filter(|f| f.fract() == 0.0 && f.abs() < 1e15).map(|f| f as i64))
            .ok_or_else(invalid),
        Value::String(s) => s.trim().parse::<i64>().map_err(|_| invalid()),
        _ => Err(invalid()),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_parse_otp_forms() {
        assert_eq!(parse_otp(Some(&json!(123456))).unwrap(), 123456);
        assert_eq!(parse_otp(Some(&json!("654321"))).unwrap(), 654321);
        assert_eq!(parse_otp(Some(&json!(" 42 "))).unwrap(), 42);
        assert_eq!(parse_otp(Some(&json!(100000.0))).unwrap(), 100000);
    }

    #[test]
    fn test_parse_otp_rejects_garbage() {
        assert!(matches!(parse_otp(Some(&json!("12a"))), Err(AppError::ValidationError(_))));
        assert!(matches!(parse_otp(Some(&json!(1.5))), Err(AppError::ValidationError(_))));
        assert!(matches!(parse_otp(Some(&json!(null))), Err(AppError::ValidationError(_))));
        assert!(matches!(parse_otp(None), Err(AppError::ValidationError(_))));
    }

    #[test]
    fn test_parse_transaction_id() {
        let id = Uuid::new_v4();
        assert_eq!(parse_transaction_id(Some(id.to_string().as_str())).unwrap(), id);
        assert!(parse_transaction_id(Some("64f1c0ffee")).is_err());
        assert!(parse_transaction_id(None).is_err());
    }
}
