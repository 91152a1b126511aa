use dashmap::DashMap;

use domain::credits::{ClientCreditSnapshot, CreditAccount};
use domain::user::UserId;

/// Session-local view of one user's credits. Optimistic decrements
/// keep a UI responsive between request and confirmation; they are
/// advisory and live only until the next authoritative read.
#[derive(Debug, Clone)]
pub struct CreditProjection {
    snapshot: ClientCreditSnapshot,
    generation_cost: i64,
}

impl CreditProjection {
    pub fn new(snapshot: ClientCreditSnapshot, generation_cost: i64) -> Self {
        Self {
            snapshot,
            generation_cost,
        }
    }

    #[must_use]
    pub fn snapshot(&self) -> &ClientCreditSnapshot {
        &self.snapshot
    }

    pub fn apply_optimistic_spend(&mut self, amount: i64) {
        self.snapshot.balance = self.snapshot.balance.saturating_sub(amount).max(0);
        self.snapshot.can_generate = self.snapshot.balance >= self.generation_cost;
    }

    /// Last authoritative write wins: the server response replaces the
    /// projection wholesale, so optimistic deltas never compound.
    pub fn reconcile(&mut self, snapshot: ClientCreditSnapshot) {
        self.snapshot = snapshot;
    }
}

/// Per-user projection sessions. Each entry is private to one user;
/// nothing here is authoritative.
pub struct ProjectionRegistry {
    sessions: DashMap<UserId, CreditProjection>,
    generation_cost: i64,
}

impl ProjectionRegistry {
    pub fn new(generation_cost: i64) -> Self {
        Self {
            sessions: DashMap::new(),
            generation_cost,
        }
    }

    pub fn reconcile(&self, account: &CreditAccount, can_generate: bool) -> ClientCreditSnapshot {
        let snapshot = ClientCreditSnapshot::from_account(account, can_generate);
        self.sessions
            .entry(account.user_id.clone())
            .and_modify(|projection| projection.reconcile(snapshot.clone()))
            .or_insert_with(|| CreditProjection::new(snapshot.clone(), self.generation_cost));
        snapshot
    }

    pub fn apply_optimistic_spend(&self, user_id: &UserId, amount: i64) {
        if let Some(mut projection) = self.sessions.get_mut(user_id) {
            projection.apply_optimistic_spend(amount);
        }
    }

    #[must_use]
    pub fn peek(&self, user_id: &UserId) -> Option<ClientCreditSnapshot> {
        self.sessions
            .get(user_id)
            .map(|projection| projection.snapshot().clone())
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used, clippy::panic)]
mod tests {
    use super::*;
    use time::OffsetDateTime;

    fn account(user_id: &UserId, balance: i64) -> CreditAccount {
        CreditAccount::new(user_id.clone(), balance, OffsetDateTime::now_utc())
    }

    #[test]
    fn optimistic_spend_decrements_locally() {
        let registry = ProjectionRegistry::new(1);
        let user = UserId::new();

        registry.reconcile(&account(&user, 2), true);
        registry.apply_optimistic_spend(&user, 1);

        let snapshot = registry.peek(&user).unwrap();
        assert_eq!(snapshot.balance, 1);
        assert!(snapshot.can_generate);

        registry.apply_optimistic_spend(&user, 1);
        let snapshot = registry.peek(&user).unwrap();
        assert_eq!(snapshot.balance, 0);
        assert!(!snapshot.can_generate);
    }

    #[test]
    fn authoritative_read_overwrites_optimistic_deltas() {
        let registry = ProjectionRegistry::new(1);
        let user = UserId::new();

        registry.reconcile(&account(&user, 5), true);
        registry.apply_optimistic_spend(&user, 1);
        registry.apply_optimistic_spend(&user, 1);

        // Server truth says 4, not the locally projected 3.
        let snapshot = registry.reconcile(&account(&user, 4), true);

        assert_eq!(snapshot.balance, 4);
        assert_eq!(registry.peek(&user).unwrap().balance, 4);
    }

    #[test]
    fn optimistic_spend_never_goes_negative() {
        let registry = ProjectionRegistry::new(1);
        let user = UserId::new();

        registry.reconcile(&account(&user, 0), false);
        registry.apply_optimistic_spend(&user, 3);

        assert_eq!(registry.peek(&user).unwrap().balance, 0);
    }

    #[test]
    fn unknown_session_is_ignored_by_optimistic_spend() {
        let registry = ProjectionRegistry::new(1);
        let user = UserId::new();

        registry.apply_optimistic_spend(&user, 1);

        assert!(registry.peek(&user).is_none());
    }
}
