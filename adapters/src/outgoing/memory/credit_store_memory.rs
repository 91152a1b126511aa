use std::collections::HashMap;
use time::OffsetDateTime;
use tokio::sync::Mutex;
use tracing::debug;

use domain::credits::{CreditAccount, CreditTransaction, TransactionReason};
use domain::user::UserId;
use recipegen_application::{
    error::{AppError, AppResult},
    ports::outgoing::credit_store::{CreditStorePort, SpendOutcome},
};

#[derive(Default)]
struct LedgerState {
    accounts: HashMap<UserId, CreditAccount>,
    journal: HashMap<UserId, Vec<CreditTransaction>>,
}

/// Non-durable credit store for local development. One async mutex
/// serializes all mutations, which satisfies the port's atomicity
/// requirement for `try_spend`.
#[derive(Default)]
pub struct MemoryCreditStoreAdapter {
    state: Mutex<LedgerState>,
}

impl MemoryCreditStoreAdapter {
    pub fn new() -> Self {
        Self::default()
    }
}

fn missing_account(user_id: &UserId) -> AppError {
    AppError::NotFound {
        message: format!("No credit account for user {}", user_id),
    }
}

#[async_trait::async_trait]
impl CreditStorePort for MemoryCreditStoreAdapter {
    async fn fetch_account(&self, user_id: &UserId) -> AppResult<Option<CreditAccount>> {
        let state = self.state.lock().await;
        Ok(state.accounts.get(user_id).cloned())
    }

    async fn create_account(
        &self,
        user_id: &UserId,
        initial_grant: i64,
    ) -> AppResult<CreditAccount> {
        let now = OffsetDateTime::now_utc();
        let mut state = self.state.lock().await;

        if let Some(existing) = state.accounts.get(user_id) {
            return Ok(existing.clone());
        }

        let account = CreditAccount::new(user_id.clone(), initial_grant, now);
        state.accounts.insert(user_id.clone(), account.clone());
        state.journal.entry(user_id.clone()).or_default().push(
            CreditTransaction::earn(user_id.clone(), initial_grant, TransactionReason::Initial, now),
        );

        debug!("Created in-memory credit account for user {}", user_id);
        Ok(account)
    }

    async fn try_spend(
        &self,
        user_id: &UserId,
        amount: i64,
        reason: TransactionReason,
    ) -> AppResult<SpendOutcome> {
        let now = OffsetDateTime::now_utc();
        let mut state = self.state.lock().await;

        let account = state
            .accounts
            .get_mut(user_id)
            .ok_or_else(|| missing_account(user_id))?;

        match account.debit(amount, now) {
            Ok(()) => {
                let snapshot = account.clone();
                state
                    .journal
                    .entry(user_id.clone())
                    .or_default()
                    .push(CreditTransaction::spend(user_id.clone(), amount, reason, now));
                Ok(SpendOutcome::Spent(snapshot))
            }
            Err(err) => Ok(SpendOutcome::Insufficient {
                balance: err.available,
            }),
        }
    }

    async fn grant_and_spend(&self, user_id: &UserId, amount: i64) -> AppResult<CreditAccount> {
        let now = OffsetDateTime::now_utc();
        let mut state = self.state.lock().await;

        let account = state
            .accounts
            .get_mut(user_id)
            .ok_or_else(|| missing_account(user_id))?;

        account.credit(amount, now);
        account
            .debit(amount, now)
            .map_err(|_| AppError::InternalServerError)?;
        let snapshot = account.clone();

        let journal = state.journal.entry(user_id.clone()).or_default();
        journal.push(CreditTransaction::earn(
            user_id.clone(),
            amount,
            TransactionReason::AdminGrant,
            now,
        ));
        journal.push(CreditTransaction::spend(
            user_id.clone(),
            amount,
            TransactionReason::Generation,
            now,
        ));

        Ok(snapshot)
    }

    async fn earn(
        &self,
        user_id: &UserId,
        amount: i64,
        reason: TransactionReason,
    ) -> AppResult<CreditAccount> {
        let now = OffsetDateTime::now_utc();
        let mut state = self.state.lock().await;

        let account = state
            .accounts
            .get_mut(user_id)
            .ok_or_else(|| missing_account(user_id))?;

        account.credit(amount, now);
        let snapshot = account.clone();
        state
            .journal
            .entry(user_id.clone())
            .or_default()
            .push(CreditTransaction::earn(user_id.clone(), amount, reason, now));

        Ok(snapshot)
    }

    async fn transactions(
        &self,
        user_id: &UserId,
        limit: i64,
    ) -> AppResult<Vec<CreditTransaction>> {
        let state = self.state.lock().await;
        Ok(state
            .journal
            .get(user_id)
            .map(|journal| {
                journal
                    .iter()
                    .rev()
                    .take(usize::try_from(limit).unwrap_or(usize::MAX))
                    .cloned()
                    .collect()
            })
            .unwrap_or_default())
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used, clippy::panic)]
mod tests {
    use super::*;
    use std::sync::Arc;

    #[tokio::test]
    async fn create_is_idempotent() {
        let store = MemoryCreditStoreAdapter::new();
        let user = UserId::new();

        let first = store.create_account(&user, 3).await.unwrap();
        let second = store.create_account(&user, 3).await.unwrap();

        assert_eq!(first.balance, 3);
        assert_eq!(second.total_earned, 3);

        let journal = store.transactions(&user, 10).await.unwrap();
        assert_eq!(journal.len(), 1);
    }

    #[tokio::test]
    async fn concurrent_spends_of_last_credit_admit_one() {
        let store = Arc::new(MemoryCreditStoreAdapter::new());
        let user = UserId::new();
        store.create_account(&user, 1).await.unwrap();

        let (a, b) = tokio::join!(
            store.try_spend(&user, 1, TransactionReason::Generation),
            store.try_spend(&user, 1, TransactionReason::Generation)
        );

        let outcomes = [a.unwrap(), b.unwrap()];
        let spent = outcomes
            .iter()
            .filter(|outcome| matches!(outcome, SpendOutcome::Spent(_)))
            .count();
        assert_eq!(spent, 1);

        let account = store.fetch_account(&user).await.unwrap().unwrap();
        assert_eq!(account.balance, 0);
    }

    #[tokio::test]
    async fn grant_and_spend_leaves_balance_unchanged() {
        let store = MemoryCreditStoreAdapter::new();
        let user = UserId::new();
        store.create_account(&user, 0).await.unwrap();

        let account = store.grant_and_spend(&user, 2).await.unwrap();

        assert_eq!(account.balance, 0);
        assert_eq!(account.total_earned, 2);
        assert_eq!(account.total_spent, 2);
        assert_eq!(store.transactions(&user, 10).await.unwrap().len(), 3);
    }
}
