#![allow(clippy::unwrap_used, clippy::expect_used, clippy::panic)]

use std::collections::HashMap;
use time::OffsetDateTime;
use tokio::sync::Mutex;

use crate::error::{AppError, AppResult};
use crate::ports::outgoing::credit_store::{CreditStorePort, SpendOutcome};
use domain::credits::{CreditAccount, CreditTransaction, TransactionReason};
use domain::user::UserId;

/// Test double for the credit store: a single async mutex serializes
/// every mutation, which is exactly the linearizability the port
/// demands.
#[derive(Default)]
pub(crate) struct InProcessStore {
    state: Mutex<HashMap<UserId, (CreditAccount, Vec<CreditTransaction>)>>,
}

#[async_trait::async_trait]
impl CreditStorePort for InProcessStore {
    async fn fetch_account(&self, user_id: &UserId) -> AppResult<Option<CreditAccount>> {
        let state = self.state.lock().await;
        Ok(state.get(user_id).map(|(account, _)| account.clone()))
    }

    async fn create_account(
        &self,
        user_id: &UserId,
        initial_grant: i64,
    ) -> AppResult<CreditAccount> {
        let now = OffsetDateTime::now_utc();
        let mut state = self.state.lock().await;
        let (account, _) = state.entry(user_id.clone()).or_insert_with(|| {
            let account = CreditAccount::new(user_id.clone(), initial_grant, now);
            let journal = vec![CreditTransaction::earn(
                user_id.clone(),
                initial_grant,
                TransactionReason::Initial,
                now,
            )];
            (account, journal)
        });
        Ok(account.clone())
    }

    async fn try_spend(
        &self,
        user_id: &UserId,
        amount: i64,
        reason: TransactionReason,
    ) -> AppResult<SpendOutcome> {
        let now = OffsetDateTime::now_utc();
        let mut state = self.state.lock().await;
        let (account, journal) = state.get_mut(user_id).ok_or_else(|| AppError::NotFound {
            message: "account missing".to_string(),
        })?;

        match account.debit(amount, now) {
            Ok(()) => {
                journal.push(CreditTransaction::spend(user_id.clone(), amount, reason, now));
                Ok(SpendOutcome::Spent(account.clone()))
            }
            Err(err) => Ok(SpendOutcome::Insufficient {
                balance: err.available,
            }),
        }
    }

    async fn grant_and_spend(&self, user_id: &UserId, amount: i64) -> AppResult<CreditAccount> {
        let now = OffsetDateTime::now_utc();
        let mut state = self.state.lock().await;
        let (account, journal) = state.get_mut(user_id).ok_or_else(|| AppError::NotFound {
            message: "account missing".to_string(),
        })?;

        account.credit(amount, now);
        account
            .debit(amount, now)
            .map_err(|_| AppError::InternalServerError)?;
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
        Ok(account.clone())
    }

    async fn earn(
        &self,
        user_id: &UserId,
        amount: i64,
        reason: TransactionReason,
    ) -> AppResult<CreditAccount> {
        let now = OffsetDateTime::now_utc();
        let mut state = self.state.lock().await;
        let (account, journal) = state.get_mut(user_id).ok_or_else(|| AppError::NotFound {
            message: "account missing".to_string(),
        })?;

        account.credit(amount, now);
        journal.push(CreditTransaction::earn(user_id.clone(), amount, reason, now));
        Ok(account.clone())
    }

    async fn transactions(
        &self,
        user_id: &UserId,
        limit: i64,
    ) -> AppResult<Vec<CreditTransaction>> {
        let state = self.state.lock().await;
        Ok(state
            .get(user_id)
            .map(|(_, journal)| {
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
