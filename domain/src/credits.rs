use std::error::Error;
use std::fmt::{Display, Formatter, Result as FmtResult};
use time::OffsetDateTime;
use uuid::Uuid;

use crate::user::UserId;

/// Authoritative per-user credit counters. `balance` is always
/// `total_earned - total_spent` and never negative.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CreditAccount {
    pub user_id: UserId,
    pub balance: i64,
    pub total_earned: i64,
    pub total_spent: i64,
    pub updated_at: OffsetDateTime,
}

impl CreditAccount {
    pub fn new(user_id: UserId, initial_grant: i64, now: OffsetDateTime) -> Self {
        Self {
            user_id,
            balance: initial_grant,
            total_earned: initial_grant,
            total_spent: 0,
            updated_at: now,
        }
    }

    #[must_use]
    pub fn can_consume(&self, amount: i64) -> bool {
        self.balance >= amount
    }

    pub fn debit(
        &mut self,
        amount: i64,
        now: OffsetDateTime,
    ) -> Result<(), InsufficientCreditsError> {
        if self.balance < amount {
            return Err(InsufficientCreditsError {
                required: amount,
                available: self.balance,
            });
        }

        self.balance -= amount;
        self.total_spent += amount;
        self.updated_at = now;
        Ok(())
    }

    pub fn credit(&mut self, amount: i64, now: OffsetDateTime) {
        self.balance += amount;
        self.total_earned += amount;
        self.updated_at = now;
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct InsufficientCreditsError {
    pub required: i64,
    pub available: i64,
}

impl Display for InsufficientCreditsError {
    fn fmt(&self, f: &mut Formatter<'_>) -> FmtResult {
        write!(
            f,
            "Insufficient credits: required {}, available {}",
            self.required, self.available
        )
    }
}

impl Error for InsufficientCreditsError {}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TransactionKind {
    Earn,
    Spend,
}

impl TransactionKind {
    #[must_use]
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Earn => "earn",
            Self::Spend => "spend",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TransactionReason {
    Initial,
    AdminGrant,
    Generation,
    Refund,
}

impl TransactionReason {
    #[must_use]
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Initial => "initial",
            Self::AdminGrant => "admin_grant",
            Self::Generation => "generation",
            Self::Refund => "refund",
        }
    }
}

/// Append-only audit record, one per ledger mutation.
#[derive(Debug, Clone)]
pub struct CreditTransaction {
    pub id: Uuid,
    pub user_id: UserId,
    pub kind: TransactionKind,
    pub amount: i64,
    pub reason: TransactionReason,
    pub created_at: OffsetDateTime,
}

impl CreditTransaction {
    pub fn earn(
        user_id: UserId,
        amount: i64,
        reason: TransactionReason,
        now: OffsetDateTime,
    ) -> Self {
        Self {
            id: Uuid::new_v4(),
            user_id,
            kind: TransactionKind::Earn,
            amount,
            reason,
            created_at: now,
        }
    }

    pub fn spend(
        user_id: UserId,
        amount: i64,
        reason: TransactionReason,
        now: OffsetDateTime,
    ) -> Self {
        Self {
            id: Uuid::new_v4(),
            user_id,
            kind: TransactionKind::Spend,
            amount,
            reason,
            created_at: now,
        }
    }
}

/// Last known account state on the client side of the API, with the
/// derived go/no-go bit for the generate button. Advisory only; the
/// next authoritative read overwrites it.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ClientCreditSnapshot {
    pub balance: i64,
    pub total_earned: i64,
    pub total_spent: i64,
    pub can_generate: bool,
}

impl ClientCreditSnapshot {
    pub fn from_account(account: &CreditAccount, can_generate: bool) -> Self {
        Self {
            balance: account.balance,
            total_earned: account.total_earned,
            total_spent: account.total_spent,
            can_generate,
        }
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used, clippy::panic)]
mod tests {
    use super::*;

    fn account(balance: i64) -> CreditAccount {
        CreditAccount::new(UserId::new(), balance, OffsetDateTime::now_utc())
    }

    fn identity_holds(account: &CreditAccount) -> bool {
        account.balance == account.total_earned - account.total_spent && account.balance >= 0
    }

    #[test]
    fn debit_decrements_and_tracks_spent() {
        let mut account = account(3);
        let now = OffsetDateTime::now_utc();

        account.debit(2, now).unwrap();

        assert_eq!(account.balance, 1);
        assert_eq!(account.total_spent, 2);
        assert!(identity_holds(&account));
    }

    #[test]
    fn debit_rejects_overdraft_without_mutation() {
        let mut account = account(1);
        let now = OffsetDateTime::now_utc();

        let err = account.debit(2, now).unwrap_err();

        assert_eq!(err.required, 2);
        assert_eq!(err.available, 1);
        assert_eq!(account.balance, 1);
        assert_eq!(account.total_spent, 0);
    }

    #[test]
    fn identity_holds_across_operation_sequences() {
        let mut account = account(5);
        let now = OffsetDateTime::now_utc();

        account.debit(3, now).unwrap();
        account.credit(4, now);
        account.debit(6, now).unwrap();
        account.credit(1, now);

        assert_eq!(account.balance, 1);
        assert_eq!(account.total_earned, 10);
        assert_eq!(account.total_spent, 9);
        assert!(identity_holds(&account));
    }

    #[test]
    fn snapshot_copies_counters() {
        let account = account(2);
        let snapshot = ClientCreditSnapshot::from_account(&account, true);

        assert_eq!(snapshot.balance, 2);
        assert_eq!(snapshot.total_earned, 2);
        assert_eq!(snapshot.total_spent, 0);
        assert!(snapshot.can_generate);
    }
}
