use std::sync::Arc;

use crate::error::AppResult;
use domain::credits::{CreditAccount, CreditTransaction, TransactionReason};
use domain::user::UserId;

/// Result of an atomic conditional spend. `Insufficient` carries the
/// balance observed at mutation time, not at check time.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SpendOutcome {
    Spent(CreditAccount),
    Insufficient { balance: i64 },
}

/// Durable credit counters. The check-and-decrement in `try_spend`
/// must be a single atomic operation per user; callers rely on two
/// concurrent spends of the last credit resolving to exactly one
/// `Spent`.
#[async_trait::async_trait]
pub trait CreditStorePort: Send + Sync {
    async fn fetch_account(&self, user_id: &UserId) -> AppResult<Option<CreditAccount>>;

    /// Creates the account with its initial grant if absent; returns
    /// the existing account otherwise.
    async fn create_account(
        &self,
        user_id: &UserId,
        initial_grant: i64,
    ) -> AppResult<CreditAccount>;

    async fn try_spend(
        &self,
        user_id: &UserId,
        amount: i64,
        reason: TransactionReason,
    ) -> AppResult<SpendOutcome>;

    /// Pairs an `AdminGrant` earn with a spend of the same amount in
    /// one atomic step, so admin consumption is audited without a
    /// balance requirement.
    async fn grant_and_spend(&self, user_id: &UserId, amount: i64) -> AppResult<CreditAccount>;

    async fn earn(
        &self,
        user_id: &UserId,
        amount: i64,
        reason: TransactionReason,
    ) -> AppResult<CreditAccount>;

    async fn transactions(
        &self,
        user_id: &UserId,
        limit: i64,
    ) -> AppResult<Vec<CreditTransaction>>;
}

pub type DynCreditStorePort = Arc<dyn CreditStorePort>;
