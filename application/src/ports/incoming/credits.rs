use std::sync::Arc;

use crate::error::AppResult;
use domain::credits::{ClientCreditSnapshot, CreditAccount, CreditTransaction, TransactionReason};
use domain::user::UserId;

#[async_trait::async_trait]
pub trait CreditsQueryUseCase: Send + Sync {
    /// Authoritative balance read; lazily initializes the account and
    /// reconciles the session projection.
    async fn get_snapshot(
        &self,
        user_id: &UserId,
        is_admin: bool,
    ) -> AppResult<ClientCreditSnapshot>;

    async fn get_transactions(&self, user_id: &UserId) -> AppResult<Vec<CreditTransaction>>;
}

#[async_trait::async_trait]
pub trait CreditsMutationUseCase: Send + Sync {
    async fn spend(
        &self,
        user_id: &UserId,
        amount: i64,
        is_admin: bool,
    ) -> AppResult<CreditAccount>;

    async fn earn(
        &self,
        user_id: &UserId,
        amount: i64,
        reason: TransactionReason,
    ) -> AppResult<CreditAccount>;
}

pub type DynCreditsQueryUseCase = Arc<dyn CreditsQueryUseCase>;
pub type DynCreditsMutationUseCase = Arc<dyn CreditsMutationUseCase>;
