//! Transaction scoring handlers

use axum::{extract::State, Json};
use serde_json::{Map, Value};

use crate::{AppState, AppResult};
use crate::models::{
    CheckTransactionResponse, InitiateTransactionResponse, NewTransaction,
    TransactionStatus, TransactionView,
};
use crate::otp::Initiation;
use crate::scoring::{Assessment, RiskTier};

/// Score a transaction and store it without any challenge.
///
/// Failures come back inline as `{"error": ..}` and nothing is stored.
pub async fn check(
    State(state): State<AppState>,
    Json(transaction): Json<Map<String, Value>>,
) -> Json<CheckTransactionResponse> {
    match score_and_store(&state, transaction).await {
        Ok(Assessment { fraud_probability, risk }) => {
            Json(CheckTransactionResponse::Scored { fraud_probability, risk })
        }
        Err(e) => {
            tracing::warn!("Transaction check failed: {}", e);
            Json(CheckTransactionResponse::Failed { error: e.to_string() })
        }
    }
}

async fn score_and_store(state: &AppState, transaction: Map<String, Value>) -> AppResult<Assessment> {
    let assessment = state.scorer.assess(&transaction)?;

    let record = state
        .store
        .insert(NewTransaction::new(
            transaction,
            assessment.fraud_probability,
            assessment.risk,
            TransactionStatus::for_direct_check(assessment.risk),
        ))
        .await?;

    tracing::info!(
        "Transaction {} scored {:.4} ({}) -> {}",
        record.id, assessment.fraud_probability, assessment.risk, record.status
    );

    Ok(assessment)
}

/// List every stored transaction
pub async fn list(State(state): State<AppState>) -> AppResult<Json<Vec<TransactionView>>> {
    let records = state.store.list(None).await?;
    Ok(Json(records.iter().map(|r| r.to_view(state.config.echo_otp)).collect()))
}

/// List HIGH risk transactions
pub async fn fraud_cases(State(state): State<AppState>) -> AppResult<Json<Vec<TransactionView>>> {
    let records = state.store.list(Some(RiskTier::High)).await?;
    Ok(Json(records.iter().map(|r| r.to_view(state.config.echo_otp)).collect()))
}

/// Score a transaction and either approve it or open an OTP challenge.
///
/// Unlike `check`, feature errors are not caught here and surface as an
/// error response.
pub async fn initiate(
    State(state): State<AppState>,
    Json(transaction): Json<Map<String, Value>>,
) -> AppResult<Json<InitiateTransactionResponse>> {
    let assessment = state.scorer.assess(&transaction)?;
    tracing::debug!("Initiated transaction scored {:.4} ({})", assessment.fraud_probability, assessment.risk);

    let response = match state.otp.initiate(transaction, assessment).await? {
        Initiation::Approved(record) => InitiateTransactionResponse::Approved { risk: record.risk },
        Initiation::Challenged { record, otp } => InitiateTransactionResponse::OtpRequired {
            risk: record.risk,
            transaction_id: record.id,
            otp: state.config.echo_otp.then_some(otp),
        },
    };

    Ok(Json(response))
}
