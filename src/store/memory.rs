//! In-process store, used by tests and `STORE_BACKEND=memory`

use std::collections::HashMap;

use async_trait::async_trait;
use parking_lot::RwLock;
use uuid::Uuid;

use super::{StoreError, TransactionStore};
use crate::models::{NewTransaction, TransactionRecord, TransactionStatus};
use crate::scoring::RiskTier;

#[derive(Default)]
pub struct MemoryStore {
    records: RwLock<HashMap<Uuid, TransactionRecord>>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    #[cfg(test)]
    pub fn len(&self) -> usize {
        self.records.read().len()
    }
}

#[async_trait]
impl TransactionStore for MemoryStore {
    async fn insert(&self, new: NewTransaction) -> Result<TransactionRecord, StoreError> {
        let record = new.into_record(Uuid::new_v4());
        self.records.write().insert(record.id, record.clone());
        Ok(record)
    }

    async fn find(&self, id: Uuid) -> Result<Option<TransactionRecord>, StoreError> {
        Ok(self.records.read().get(&id).cloned())
    }

    async fn list(&self, risk: Option<RiskTier>) -> Result<Vec<TransactionRecord>, StoreError> {
        Ok(self
            .records
            .read()
            .values()
            .filter(|r| risk.map_or(true, |tier| r.risk == tier))
            .cloned()
            .collect())
    }

    async fn record_failed_attempt(&self, id: Uuid, max_attempts: i32) -> Result<Option<i32>, StoreError> {
        let mut records = self.records.write();
        Ok(records.get_mut(&id).and_then(|r| {
            if r.status == TransactionStatus::OtpPending && r.attempts < max_attempts {
                r.attempts += 1;
                Some(r.attempts)
            } else {
                None
            }
        }))
    }

    async fn transition(
        &self,
        id: Uuid,
        from: TransactionStatus,
        to: TransactionStatus,
    ) -> Result<bool, StoreError> {
        let mut records = self.records.write();
        match records.get_mut(&id) {
            Some(r) if r.status == from => {
                r.status = to;
                Ok(true)
            }
            _ => Ok(false),
        }
    }

    fn backend(&self) -> &'static str {
        "memory"
    }
}
