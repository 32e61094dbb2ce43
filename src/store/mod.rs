//! Transaction store
//!
//! Records are written once by the scoring flows and afterwards only touched
//! by OTP verification. Mutations are conditional so that concurrent
//! verifications against the same record cannot overshoot the attempt limit
//! or move a record out of a terminal state.

pub mod memory;
pub mod postgres;

use async_trait::async_trait;
use uuid::Uuid;

use crate::models::{NewTransaction, TransactionRecord, TransactionStatus};
use crate::scoring::RiskTier;

pub use memory::MemoryStore;
pub use postgres::PgStore;

#[derive(Debug, thiserror::Error)]
pub enum StoreError {
    #[error(transparent)]
    Database(#[from] sqlx::Error),

    #[error("corrupt record: {0}")]
    Corrupt(String),
}

#[async_trait]
pub trait TransactionStore: Send + Sync {
    /// Persist a new record and return it with its assigned id
    async fn insert(&self, new: NewTransaction) -> Result<TransactionRecord, StoreError>;

    async fn find(&self, id: Uuid) -> Result<Option<TransactionRecord>, StoreError>;

    /// All records, or only those with the given risk tier
    async fn list(&self, risk: Option<RiskTier>) -> Result<Vec<TransactionRecord>, StoreError>;

    /// Increment `attempts` if the record is still `OTP_PENDING` and below
    /// `max_attempts`. Returns the new count, or `None` if nothing changed.
    async fn record_failed_attempt(&self, id: Uuid, max_attempts: i32) -> Result<Option<i32>, StoreError>;

    /// Set `status` to `to` only if it is currently `from`
    async fn transition(
        &self,
        id: Uuid,
        from: TransactionStatus,
        to: TransactionStatus,
    ) -> Result<bool, StoreError>;

    fn backend(&self) -> &'static str;
}
