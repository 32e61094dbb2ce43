//! OTP step-up challenge
//!
//! Risky transactions from the initiate flow are parked in `OTP_PENDING`
//! with a six-digit code. Verification allows three wrong guesses; the call
//! after the third wrong guess blocks the transaction whatever code it carries.
//!
//! ```text
//!   LOW ──────────────────────────────► APPROVED
//!   MEDIUM/HIGH ──► OTP_PENDING ──ok──► APPROVED
//!                       │ wrong (attempts += 1, up to 3)
//!                       └─ attempts >= 3 ──► BLOCKED
//! ```

use std::sync::Arc;

use rand::Rng;
use serde_json::{Map, Value};
use uuid::Uuid;

use crate::models::{NewTransaction, TransactionRecord, TransactionStatus, VerifyOutcome};
use crate::scoring::{Assessment, RiskTier};
use crate::store::{StoreError, TransactionStore};

pub const OTP_MIN: u32 = 100_000;
pub const OTP_MAX: u32 = 999_999;

/// Wrong guesses tolerated before the next verification blocks
pub const MAX_ATTEMPTS: i32 = 3;

/// Uniform six-digit code
pub fn generate_code<R: Rng + ?Sized>(rng: &mut R) -> u32 {
    rng.gen_range(OTP_MIN..=OTP_MAX)
}

/// What the initiate flow decided for a transaction
#[derive(Debug, Clone)]
pub enum Initiation {
    Approved(TransactionRecord),
    Challenged { record: TransactionRecord, otp: u32 },
}

#[derive(Clone)]
pub struct OtpEngine {
    store: Arc<dyn TransactionStore>,
}

impl OtpEngine {
    pub fn new(store: Arc<dyn TransactionStore>) -> Self {
        Self { store }
    }

    /// Store a scored transaction, approving LOW risk outright and issuing a
    /// challenge for everything else.
    pub async fn initiate(
        &self,
        transaction: Map<String, Value>,
        assessment: Assessment,
    ) -> Result<Initiation, StoreError> {
        let Assessment { fraud_probability, risk } = assessment;

        if risk == RiskTier::Low {
            let record = self
                .store
                .insert(NewTransaction::new(transaction, fraud_probability, risk, TransactionStatus::Approved))
                .await?;
            return Ok(Initiation::Approved(record));
        }

        let otp = generate_code(&mut rand::thread_rng());
        let record = self
            .store
            .insert(
                NewTransaction::new(transaction, fraud_probability, risk, TransactionStatus::OtpPending)
                    .with_otp(otp),
            )
            .await?;

        tracing::info!("OTP challenge issued for transaction {} (risk {})", record.id, risk);
        Ok(Initiation::Challenged { record, otp })
    }

    /// Check a submitted code against a pending transaction
    pub async fn verify(&self, id: Uuid, submitted: i64) -> Result<VerifyOutcome, StoreError> {
        // Conditional updates that lose a race re-read the record; every retry
        // follows a status change or the attempt counter reaching its limit.
        loop {
            let Some(record) = self.store.find(id).await? else {
                return Ok(VerifyOutcome::NotFound);
            };

            if record.status != TransactionStatus::OtpPending {
                return Ok(VerifyOutcome::Unchanged(record.status));
            }

            if record.attempts >= MAX_ATTEMPTS {
                if self
                    .store
                    .transition(id, TransactionStatus::OtpPending, TransactionStatus::Blocked)
                    .await?
                {
                    tracing::warn!("Transaction {} blocked after {} failed OTP attempts", id, record.attempts);
                    return Ok(VerifyOutcome::Blocked);
                }
                continue;
            }

            if record.otp.map(i64::from) != Some(submitted) {
                match self.store.record_failed_attempt(id, MAX_ATTEMPTS).await? {
                    Some(attempts) => {
                        tracing::info!("Wrong OTP for transaction {} (attempt {})", id, attempts);
                        return Ok(VerifyOutcome::WrongOtp {
                            attempts_left: MAX_ATTEMPTS - attempts,
                        });
                    }
                    None => continue,
                }
            }

            if self
                .store
                .transition(id, TransactionStatus::OtpPending, TransactionStatus::Approved)
                .await?
            {
                tracing::info!("Transaction {} approved by OTP", id);
                return Ok(VerifyOutcome::Approved);
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::store::MemoryStore;
    use rand::SeedableRng;

    fn assessment(p: f64) -> Assessment {
        Assessment { fraud_probability: p, risk: RiskTier::classify(p) }
    }

    async fn challenged(engine: &OtpEngine, p: f64) -> (Uuid, u32) {
        match engine.initiate(Map::new(), assessment(p)).await.unwrap() {
            Initiation::Challenged { record, otp } => (record.id, otp),
            other => panic!("expected challenge, got {other:?}"),
        }
    }

    fn wrong(otp: u32) -> i64 {
        if otp == OTP_MAX { OTP_MIN as i64 } else { otp as i64 + 1 }
    }

    fn setup() -> (Arc<MemoryStore>, OtpEngine) {
        let store = Arc::new(MemoryStore::new());
        (store.clone(), OtpEngine::new(store))
    }

    #[test]
    fn test_codes_are_six_digits() {
        let mut rng = rand::rngs::StdRng::seed_from_u64(7);
        for _ in 0..10_000 {
            let code = generate_code(&mut rng);
            assert!((OTP_MIN..=OTP_MAX).contains(&code));
        }
    }

    #[tokio::test]
    async fn test_low_risk_is_approved_without_otp() {
        let (store, engine) = setup();
        let Initiation::Approved(record) = engine.initiate(Map::new(), assessment(0.2)).await.unwrap() else {
            panic!("LOW risk must not be challenged");
        };
        assert_eq!(record.status, TransactionStatus::Approved);
        assert_eq!(record.otp, None);
        assert_eq!(store.find(record.id).await.unwrap().unwrap().status, TransactionStatus::Approved);
    }

    #[tokio::test]
    async fn test_medium_and_high_are_challenged() {
        let (store, engine) = setup();
        for p in [0.6, 0.95] {
            let (id, otp) = challenged(&engine, p).await;
            let record = store.find(id).await.unwrap().unwrap();
            assert_eq!(record.status, TransactionStatus::OtpPending);
            assert_eq!(record.attempts, 0);
            assert_eq!(record.otp, Some(otp));
            assert!((OTP_MIN..=OTP_MAX).contains(&otp));
        }
    }

    #[tokio::test]
    async fn test_correct_code_approves() {
        let (store, engine) = setup();
        let (id, otp) = challenged(&engine, 0.7).await;

        assert_eq!(engine.verify(id, otp as i64).await.unwrap(), VerifyOutcome::Approved);
        assert_eq!(store.find(id).await.unwrap().unwrap().status, TransactionStatus::Approved);
    }

    #[tokio::test]
    async fn test_three_wrong_then_blocked() {
        let (store, engine) = setup();
        let (id, otp) = challenged(&engine, 0.95).await;

        for left in [2, 1, 0] {
            assert_eq!(
                engine.verify(id, wrong(otp)).await.unwrap(),
                VerifyOutcome::WrongOtp { attempts_left: left }
            );
            assert_eq!(store.find(id).await.unwrap().unwrap().status, TransactionStatus::OtpPending);
        }

        // the fourth call blocks even with the right code
        assert_eq!(engine.verify(id, otp as i64).await.unwrap(), VerifyOutcome::Blocked);
        let record = store.find(id).await.unwrap().unwrap();
        assert_eq!(record.status, TransactionStatus::Blocked);
        assert_eq!(record.attempts, 3);
    }

    #[tokio::test]
    async fn test_terminal_records_are_reported_unchanged() {
        let (store, engine) = setup();
        let (approved, otp) = challenged(&engine, 0.7).await;
        engine.verify(approved, otp as i64).await.unwrap();

        assert_eq!(
            engine.verify(approved, wrong(otp)).await.unwrap(),
            VerifyOutcome::Unchanged(TransactionStatus::Approved)
        );
        assert_eq!(store.find(approved).await.unwrap().unwrap().attempts, 0);

        let (blocked, otp) = challenged(&engine, 0.9).await;
        for _ in 0..4 {
            engine.verify(blocked, wrong(otp)).await.unwrap();
        }
        assert_eq!(
            engine.verify(blocked, otp as i64).await.unwrap(),
            VerifyOutcome::Unchanged(TransactionStatus::Blocked)
        );
        assert_eq!(store.find(blocked).await.unwrap().unwrap().attempts, 3);
    }

    #[tokio::test]
    async fn test_unknown_id_is_not_found() {
        let (store, engine) = setup();
        assert_eq!(engine.verify(Uuid::new_v4(), 123456).await.unwrap(), VerifyOutcome::NotFound);
        assert_eq!(store.len(), 0);
    }

    #[tokio::test]
    async fn test_concurrent_wrong_guesses_never_overshoot() {
        let (store, engine) = setup();
        let (id, otp) = challenged(&engine, 0.9).await;

        let handles: Vec<_> = (0..8)
            .map(|_| {
                let engine = engine.clone();
                tokio::spawn(async move { engine.verify(id, wrong(otp)).await.unwrap() })
            })
            .collect();

        let mut wrong_reports = Vec::new();
        for handle in handles {
            if let VerifyOutcome::WrongOtp { attempts_left } = handle.await.unwrap() {
                wrong_reports.push(attempts_left);
            }
        }
        wrong_reports.sort();

        assert_eq!(wrong_reports, vec![0, 1, 2]);
        assert_eq!(store.find(id).await.unwrap().unwrap().attempts, 3);
    }
}
