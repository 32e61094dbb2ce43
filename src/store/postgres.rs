//! PostgreSQL-backed store

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use serde_json::{Map, Value};
use sqlx::types::Json;
use sqlx::{FromRow, PgPool};
use uuid::Uuid;

use super::{StoreError, TransactionStore};
use crate::models::{NewTransaction, TransactionRecord, TransactionStatus};
use crate::scoring::RiskTier;

#[derive(Debug, FromRow)]
struct TransactionRow {
    id: Uuid,
    transaction: Json<Map<String, Value>>,
    fraud_probability: f64,
    risk: String,
    status: String,
    otp: Option<i32>,
    attempts: i32,
    created_at: DateTime<Utc>,
}

impl TryFrom<TransactionRow> for TransactionRecord {
    type Error = StoreError;

    fn try_from(row: TransactionRow) -> Result<Self, Self::Error> {
        let otp = row
            .otp
            .map(|code| u32::try_from(code).map_err(|_| StoreError::Corrupt(format!("negative otp on {}", row.id))))
            .transpose()?;

        Ok(TransactionRecord {
            id: row.id,
            transaction: row.transaction.0,
            fraud_probability: row.fraud_probability,
            risk: row.risk.parse::<RiskTier>().map_err(StoreError::Corrupt)?,
            status: row.status.parse::<TransactionStatus>().map_err(StoreError::Corrupt)?,
            otp,
            attempts: row.attempts,
            timestamp: row.created_at,
        })
    }
}

pub struct PgStore {
    pool: PgPool,
}

impl PgStore {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl TransactionStore for PgStore {
    async fn insert(&self, new: NewTransaction) -> Result<TransactionRecord, StoreError> {
        let row = sqlx::query_as::<_, TransactionRow>(
            r#"
            INSERT INTO transactions (id, transaction, fraud_probability, risk, status, otp, attempts, created_at)
            VALUES ($1, $2, $3, $4, $5, $6, 0, $7)
            RETURNING *
            "#
        )
        .bind(Uuid::new_v4())
        .bind(Json(&new.transaction))
        .bind(new.fraud_probability)
        .bind(new.risk.as_str())
        .bind(new.status.as_str())
        .bind(new.otp.map(|code| code as i32))
        .bind(new.timestamp)
        .fetch_one(&self.pool)
        .await?;

        row.try_into()
    }

    async fn find(&self, id: Uuid) -> Result<Option<TransactionRecord>, StoreError> {
        sqlx::query_as::<_, TransactionRow>("SELECT * FROM transactions WHERE id = $1")
            .bind(id)
            .fetch_optional(&self.pool)
            .await?
            .map(TryInto::try_into)
            .transpose()
    }

    async fn list(&self, risk: Option<RiskTier>) -> Result<Vec<TransactionRecord>, StoreError> {
        let rows = sqlx::query_as::<_, TransactionRow>(
            "SELECT * FROM transactions WHERE $1::VARCHAR IS NULL OR risk = $1"
        )
        .bind(risk.map(|tier| tier.as_str()))
        .fetch_all(&self.pool)
        .await?;

        rows.into_iter().map(TryInto::try_into).collect()
    }

    async fn record_failed_attempt(&self, id: Uuid, max_attempts: i32) -> Result<Option<i32>, StoreError> {
        let attempts = sqlx::query_scalar::<_, i32>(
            r#"
            UPDATE transactions
            SET attempts = attempts + 1
            WHERE id = $1
              AND status = 'OTP_PENDING'
              AND attempts < $2
            RETURNING attempts
            "#
        )
        .bind(id)
        .bind(max_attempts)
        .fetch_optional(&self.pool)
        .await?;

        Ok(attempts)
    }

    async fn transition(
        &self,
        id: Uuid,
        from: TransactionStatus,
        to: TransactionStatus,
    ) -> Result<bool, StoreError> {
        let result = sqlx::query(
            "UPDATE transactions SET status = $3 WHERE id = $1 AND status = $2"
        )
        .bind(id)
        .bind(from.as_str())
        .bind(to.as_str())
        .execute(&self.pool)
        .await?;

        Ok(result.rows_affected() > 0)
    }

    fn backend(&self) -> &'static str {
        "postgres"
    }
}
