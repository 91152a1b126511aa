use std::sync::Arc;
use tracing::{debug, instrument};

use domain::credits::{ClientCreditSnapshot, CreditAccount, CreditTransaction, TransactionReason};
use domain::error::DomainError;
use domain::user::UserId;

use crate::{
    config::CreditSettings,
    error::{AppError, AppResult},
    ports::{
        incoming::credits::{CreditsMutationUseCase, CreditsQueryUseCase},
        outgoing::credit_store::{DynCreditStorePort, SpendOutcome},
    },
};

use super::projection::ProjectionRegistry;

/// Business rules over the credit store: lazy account creation with
/// the configured grant, the non-negative balance guarantee, admin
/// bypass, and projection reconciliation on every authoritative read.
pub struct CreditLedgerService {
    store: DynCreditStorePort,
    projections: Arc<ProjectionRegistry>,
    settings: CreditSettings,
}

impl CreditLedgerService {
    pub fn new(
        store: DynCreditStorePort,
        projections: Arc<ProjectionRegistry>,
        settings: CreditSettings,
    ) -> Arc<Self> {
        Arc::new(Self {
            store,
            projections,
            settings,
        })
    }

    #[must_use]
    pub fn settings(&self) -> &CreditSettings {
        &self.settings
    }

    #[must_use]
    pub fn projections(&self) -> &Arc<ProjectionRegistry> {
        &self.projections
    }

    async fn get_or_create_account(&self, user_id: &UserId) -> AppResult<CreditAccount> {
        if let Some(account) = self.store.fetch_account(user_id).await? {
            return Ok(account);
        }

        debug!("Creating credit account for user {}", user_id);
        self.store
            .create_account(user_id, self.settings.initial_grant)
            .await
    }

    fn can_generate(&self, account: &CreditAccount, is_admin: bool) -> bool {
        is_admin || account.can_consume(self.settings.generation_cost)
    }

    #[instrument(skip(self))]
    pub async fn can_consume(
        &self,
        user_id: &UserId,
        amount: i64,
        is_admin: bool,
    ) -> AppResult<bool> {
        if is_admin {
            return Ok(true);
        }

        let account = self.get_or_create_account(user_id).await?;
        Ok(account.can_consume(amount))
    }

    #[instrument(skip(self))]
    pub async fn get_snapshot(
        &self,
        user_id: &UserId,
        is_admin: bool,
    ) -> AppResult<ClientCreditSnapshot> {
        let account = self.get_or_create_account(user_id).await?;
        let can_generate = self.can_generate(&account, is_admin);
        Ok(self.projections.reconcile(&account, can_generate))
    }

    #[instrument(skip(self))]
    pub async fn spend(
        &self,
        user_id: &UserId,
        amount: i64,
        is_admin: bool,
    ) -> AppResult<CreditAccount> {
        if amount <= 0 {
            return Err(DomainError::InvalidAmount(amount).into());
        }

        self.get_or_create_account(user_id).await?;

        let account = if is_admin {
            self.store.grant_and_spend(user_id, amount).await?
        } else {
            match self
                .store
                .try_spend(user_id, amount, TransactionReason::Generation)
                .await?
            {
                SpendOutcome::Spent(account) => account,
                SpendOutcome::Insufficient { balance } => {
                    return Err(AppError::InsufficientCredits {
                        message: format!("Required {} credits, but only {} available", amount, balance),
                    });
                }
            }
        };

        debug!(
            "Spent {} credits for user {}, {} remaining",
            amount, user_id, account.balance
        );

        let can_generate = self.can_generate(&account, is_admin);
        self.projections.reconcile(&account, can_generate);
        Ok(account)
    }

    #[instrument(skip(self))]
    pub async fn earn(
        &self,
        user_id: &UserId,
        amount: i64,
        reason: TransactionReason,
    ) -> AppResult<CreditAccount> {
        if amount <= 0 {
            return Err(DomainError::InvalidAmount(amount).into());
        }

        self.get_or_create_account(user_id).await?;
        let account = self.store.earn(user_id, amount, reason).await?;

        debug!(
            "Earned {} credits ({}) for user {}, balance {}",
            amount,
            reason.as_str(),
            user_id,
            account.balance
        );

        let can_generate = self.can_generate(&account, false);
        self.projections.reconcile(&account, can_generate);
        Ok(account)
    }

    pub async fn get_transactions(&self, user_id: &UserId) -> AppResult<Vec<CreditTransaction>> {
        self.store
            .transactions(user_id, self.settings.transaction_page_size)
            .await
    }
}

#[async_trait::async_trait]
impl CreditsQueryUseCase for CreditLedgerService {
    async fn get_snapshot(
        &self,
        user_id: &UserId,
        is_admin: bool,
    ) -> AppResult<ClientCreditSnapshot> {
        self.get_snapshot(user_id, is_admin).await
    }

    async fn get_transactions(&self, user_id: &UserId) -> AppResult<Vec<CreditTransaction>> {
        self.get_transactions(user_id).await
    }
}

#[async_trait::async_trait]
impl CreditsMutationUseCase for CreditLedgerService {
    async fn spend(
        &self,
        user_id: &UserId,
        amount: i64,
        is_admin: bool,
    ) -> AppResult<CreditAccount> {
        self.spend(user_id, amount, is_admin).await
    }

    async fn earn(
        &self,
        user_id: &UserId,
        amount: i64,
        reason: TransactionReason,
    ) -> AppResult<CreditAccount> {
        self.earn(user_id, amount, reason).await
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used, clippy::expect_used, clippy::panic)]
mod tests {
    use super::*;

    use crate::test_support::InProcessStore;
    use domain::credits::TransactionKind;

    fn service(initial_grant: i64) -> Arc<CreditLedgerService> {
        CreditLedgerService::new(
            Arc::new(InProcessStore::default()),
            Arc::new(ProjectionRegistry::new(1)),
            CreditSettings {
                initial_grant,
                generation_cost: 1,
                transaction_page_size: 50,
            },
        )
    }

    #[tokio::test]
    async fn first_read_lazily_creates_account_with_grant() {
        let service = service(3);
        let user = UserId::new();

        let snapshot = service.get_snapshot(&user, false).await.unwrap();

        assert_eq!(snapshot.balance, 3);
        assert_eq!(snapshot.total_earned, 3);
        assert!(snapshot.can_generate);
    }

    #[tokio::test]
    async fn concurrent_spends_of_last_credit_resolve_to_one_winner() {
        let service = service(1);
        let user = UserId::new();
        service.get_snapshot(&user, false).await.unwrap();

        let (first, second) =
            tokio::join!(service.spend(&user, 1, false), service.spend(&user, 1, false));

        let outcomes = [first, second];
        let successes = outcomes.iter().filter(|outcome| outcome.is_ok()).count();
        let insufficient = outcomes
            .iter()
            .filter(|outcome| {
                matches!(outcome, Err(AppError::InsufficientCredits { .. }))
            })
            .count();

        assert_eq!(successes, 1);
        assert_eq!(insufficient, 1);

        let snapshot = service.get_snapshot(&user, false).await.unwrap();
        assert_eq!(snapshot.balance, 0);
    }

    #[tokio::test]
    async fn admin_can_consume_at_zero_balance() {
        let service = service(0);
        let user = UserId::new();

        assert!(service.can_consume(&user, 1, true).await.unwrap());
        assert!(!service.can_consume(&user, 1, false).await.unwrap());
    }

    #[tokio::test]
    async fn admin_spend_is_audited_and_keeps_identity() {
        let service = service(0);
        let user = UserId::new();

        let account = service.spend(&user, 1, true).await.unwrap();

        assert_eq!(account.balance, 0);
        assert_eq!(account.total_earned, 1);
        assert_eq!(account.total_spent, 1);

        let transactions = service.get_transactions(&user).await.unwrap();
        assert!(transactions
            .iter()
            .any(|tx| tx.reason == TransactionReason::AdminGrant));
        assert!(transactions
            .iter()
            .any(|tx| tx.kind == TransactionKind::Spend));
    }

    #[tokio::test]
    async fn spend_then_refund_restores_balance_with_audit_trail() {
        let service = service(1);
        let user = UserId::new();
        service.get_snapshot(&user, false).await.unwrap();

        let spent = service.spend(&user, 1, false).await.unwrap();
        assert_eq!(spent.balance, 0);

        let refunded = service
            .earn(&user, 1, TransactionReason::Refund)
            .await
            .unwrap();

        assert_eq!(refunded.balance, 1);
        assert_eq!(refunded.total_spent, 1);
        assert_eq!(refunded.total_earned, 2);

        let transactions = service.get_transactions(&user).await.unwrap();
        assert!(transactions
            .iter()
            .any(|tx| tx.reason == TransactionReason::Refund));
        assert!(transactions
            .iter()
            .any(|tx| tx.kind == TransactionKind::Spend
                && tx.reason == TransactionReason::Generation));
    }

    #[tokio::test]
    async fn spend_rejects_non_positive_amounts() {
        let service = service(5);
        let user = UserId::new();

        assert!(matches!(
            service.spend(&user, 0, false).await,
            Err(AppError::Domain(DomainError::InvalidAmount(0)))
        ));
    }
}
