use std::future::Future;
use std::time::Duration;

use sqlx::{PgPool, Postgres, Row, Transaction, postgres::PgRow};
use time::OffsetDateTime;
use tokio::time::timeout;
use tracing::{debug, instrument};
use uuid::Uuid;

use domain::credits::{
    CreditAccount, CreditTransaction, TransactionKind, TransactionReason,
};
use domain::user::UserId;
use recipegen_application::{
    error::{AppError, AppResult},
    ports::outgoing::credit_store::{CreditStorePort, SpendOutcome},
};

pub struct PostgresCreditStoreAdapter {
    pool: PgPool,
    query_timeout: Duration,
}

impl PostgresCreditStoreAdapter {
    pub fn new(pool: PgPool, query_timeout_secs: u64) -> Self {
        Self {
            pool,
            query_timeout: Duration::from_secs(query_timeout_secs),
        }
    }

    // Read paths run outside a transaction but still under the
    // configured deadline so a stalled pool cannot hang a request.
    async fn read<T, Fut>(&self, query: Fut, context: &str) -> AppResult<T>
    where
        Fut: Future<Output = Result<T, sqlx::Error>> + Send,
    {
        timeout(self.query_timeout, query)
            .await
            .map_err(|_| AppError::DatabaseError {
                message: format!("{context}: query deadline exceeded"),
            })?
            .map_err(|e| db_err(context, e))
    }

    async fn begin(&self) -> AppResult<Transaction<'_, Postgres>> {
        self.pool
            .begin()
            .await
            .map_err(|e| db_err("Failed to open transaction", e))
    }
}

async fn commit(tx: Transaction<'_, Postgres>) -> AppResult<()> {
    tx.commit()
        .await
        .map_err(|e| db_err("Failed to commit transaction", e))
}

fn db_err(context: &str, e: sqlx::Error) -> AppError {
    AppError::DatabaseError {
        message: format!("{}: {}", context, e),
    }
}

fn account_from_row(row: &PgRow, user_id: &UserId) -> AppResult<CreditAccount> {
    let balance: i64 = row.try_get("balance").map_err(|e| db_err("balance", e))?;
    let total_earned: i64 = row
        .try_get("total_earned")
        .map_err(|e| db_err("total_earned", e))?;
    let total_spent: i64 = row
        .try_get("total_spent")
        .map_err(|e| db_err("total_spent", e))?;
    let updated_at: OffsetDateTime = row
        .try_get("updated_at")
        .map_err(|e| db_err("updated_at", e))?;

    Ok(CreditAccount {
        user_id: user_id.clone(),
        balance,
        total_earned,
        total_spent,
        updated_at,
    })
}

fn parse_kind(raw: &str) -> AppResult<TransactionKind> {
    match raw {
        "earn" => Ok(TransactionKind::Earn),
        "spend" => Ok(TransactionKind::Spend),
        other => Err(AppError::DatabaseError {
            message: format!("Unknown transaction kind: {}", other),
        }),
    }
}

fn parse_reason(raw: &str) -> AppResult<TransactionReason> {
    match raw {
        "initial" => Ok(TransactionReason::Initial),
        "admin_grant" => Ok(TransactionReason::AdminGrant),
        "generation" => Ok(TransactionReason::Generation),
        "refund" => Ok(TransactionReason::Refund),
        other => Err(AppError::DatabaseError {
            message: format!("Unknown transaction reason: {}", other),
        }),
    }
}

async fn insert_transaction<'e, E>(
    executor: E,
    tx: &CreditTransaction,
) -> Result<(), sqlx::Error>
where
    E: sqlx::PgExecutor<'e>,
{
    sqlx::query(
        r"
        INSERT INTO credit_transactions (id, user_id, kind, amount, reason, created_at)
        VALUES ($1, $2, $3, $4, $5, $6)
        ",
    )
    .bind(tx.id)
    .bind(tx.user_id.as_uuid())
    .bind(tx.kind.as_str())
    .bind(tx.amount)
    .bind(tx.reason.as_str())
    .bind(tx.created_at)
    .execute(executor)
    .await?;

    Ok(())
}

#[async_trait::async_trait]
impl CreditStorePort for PostgresCreditStoreAdapter {
    #[instrument(skip(self))]
    async fn fetch_account(&self, user_id: &UserId) -> AppResult<Option<CreditAccount>> {
        let row = self
            .read(
                sqlx::query(
                    r"
                    SELECT balance, total_earned, total_spent, updated_at
                    FROM credit_accounts
                    WHERE user_id = $1
                    ",
                )
                .bind(user_id.as_uuid())
                .fetch_optional(&self.pool),
                &format!("Failed to fetch account for user {}", user_id),
            )
            .await?;

        row.map(|record| account_from_row(&record, user_id)).transpose()
    }

    #[instrument(skip(self))]
    async fn create_account(
        &self,
        user_id: &UserId,
        initial_grant: i64,
    ) -> AppResult<CreditAccount> {
        let now = OffsetDateTime::now_utc();
        let mut tx = self.begin().await?;

        // ON CONFLICT DO NOTHING keeps concurrent first contacts from
        // double-granting; the loser reads the winner's row.
        let inserted = sqlx::query(
            r"
            INSERT INTO credit_accounts (user_id, balance, total_earned, total_spent, updated_at)
            VALUES ($1, $2, $2, 0, $3)
            ON CONFLICT (user_id) DO NOTHING
            RETURNING balance, total_earned, total_spent, updated_at
            ",
        )
        .bind(user_id.as_uuid())
        .bind(initial_grant)
        .bind(now)
        .fetch_optional(&mut *tx)
        .await
        .map_err(|e| db_err("Failed to create account", e))?;

        if let Some(row) = inserted {
            let account = account_from_row(&row, user_id)?;
            let grant =
                CreditTransaction::earn(user_id.clone(), initial_grant, TransactionReason::Initial, now);
            insert_transaction(&mut *tx, &grant)
                .await
                .map_err(|e| db_err("Failed to record initial grant", e))?;
            commit(tx).await?;

            debug!("Created credit account for user {} with grant {}", user_id, initial_grant);
            return Ok(account);
        }

        drop(tx);
        self.fetch_account(user_id)
            .await?
            .ok_or_else(|| AppError::DatabaseError {
                message: format!("Account for user {} vanished during creation", user_id),
            })
    }

    #[instrument(skip(self))]
    async fn try_spend(
        &self,
        user_id: &UserId,
        amount: i64,
        reason: TransactionReason,
    ) -> AppResult<SpendOutcome> {
        let now = OffsetDateTime::now_utc();
        let mut tx = self.begin().await?;

        // The balance guard and the decrement are one statement, so two
        // racing spends of the last credit serialize in the database.
        let updated = sqlx::query(
            r"
            UPDATE credit_accounts
            SET balance = balance - $2, total_spent = total_spent + $2, updated_at = $3
            WHERE user_id = $1 AND balance >= $2
            RETURNING balance, total_earned, total_spent, updated_at
            ",
        )
        .bind(user_id.as_uuid())
        .bind(amount)
        .bind(now)
        .fetch_optional(&mut *tx)
        .await
        .map_err(|e| db_err("Failed to spend credits", e))?;

        let Some(row) = updated else {
            drop(tx);
            let balance = self
                .fetch_account(user_id)
                .await?
                .map(|account| account.balance)
                .ok_or_else(|| AppError::NotFound {
                    message: format!("No credit account for user {}", user_id),
                })?;
            return Ok(SpendOutcome::Insufficient { balance });
        };

        let account = account_from_row(&row, user_id)?;
        let record = CreditTransaction::spend(user_id.clone(), amount, reason, now);
        insert_transaction(&mut *tx, &record)
            .await
            .map_err(|e| db_err("Failed to record spend", e))?;
        commit(tx).await?;

        debug!(
            "Spent {} credits for user {}, {} remaining",
            amount, user_id, account.balance
        );

        Ok(SpendOutcome::Spent(account))
    }

    #[instrument(skip(self))]
    async fn grant_and_spend(&self, user_id: &UserId, amount: i64) -> AppResult<CreditAccount> {
        let now = OffsetDateTime::now_utc();
        let mut tx = self.begin().await?;

        // Net-zero on balance; both counters advance so the identity
        // balance = total_earned - total_spent keeps holding.
        let row = sqlx::query(
            r"
            UPDATE credit_accounts
            SET total_earned = total_earned + $2, total_spent = total_spent + $2, updated_at = $3
            WHERE user_id = $1
            RETURNING balance, total_earned, total_spent, updated_at
            ",
        )
        .bind(user_id.as_uuid())
        .bind(amount)
        .bind(now)
        .fetch_optional(&mut *tx)
        .await
        .map_err(|e| db_err("Failed to grant-and-spend credits", e))?
        .ok_or_else(|| AppError::NotFound {
            message: format!("No credit account for user {}", user_id),
        })?;

        let account = account_from_row(&row, user_id)?;
        let grant =
            CreditTransaction::earn(user_id.clone(), amount, TransactionReason::AdminGrant, now);
        let spend =
            CreditTransaction::spend(user_id.clone(), amount, TransactionReason::Generation, now);
        insert_transaction(&mut *tx, &grant)
            .await
            .map_err(|e| db_err("Failed to record admin grant", e))?;
        insert_transaction(&mut *tx, &spend)
            .await
            .map_err(|e| db_err("Failed to record admin spend", e))?;
        commit(tx).await?;

        Ok(account)
    }

    #[instrument(skip(self))]
    async fn earn(
        &self,
        user_id: &UserId,
        amount: i64,
        reason: TransactionReason,
    ) -> AppResult<CreditAccount> {
        let now = OffsetDateTime::now_utc();
        let mut tx = self.begin().await?;

        let row = sqlx::query(
            r"
            UPDATE credit_accounts
            SET balance = balance + $2, total_earned = total_earned + $2, updated_at = $3
            WHERE user_id = $1
            RETURNING balance, total_earned, total_spent, updated_at
            ",
        )
        .bind(user_id.as_uuid())
        .bind(amount)
        .bind(now)
        .fetch_optional(&mut *tx)
        .await
        .map_err(|e| db_err("Failed to earn credits", e))?
        .ok_or_else(|| AppError::NotFound {
            message: format!("No credit account for user {}", user_id),
        })?;

        let account = account_from_row(&row, user_id)?;
        let record = CreditTransaction::earn(user_id.clone(), amount, reason, now);
        insert_transaction(&mut *tx, &record)
            .await
            .map_err(|e| db_err("Failed to record earn", e))?;
        commit(tx).await?;

        debug!(
            "Earned {} credits ({}) for user {}, balance {}",
            amount,
            reason.as_str(),
            user_id,
            account.balance
        );

        Ok(account)
    }

    #[instrument(skip(self))]
    async fn transactions(
        &self,
        user_id: &UserId,
        limit: i64,
    ) -> AppResult<Vec<CreditTransaction>> {
        let rows = self
            .read(
                sqlx::query(
                    r"
                    SELECT id, kind, amount, reason, created_at
                    FROM credit_transactions
                    WHERE user_id = $1
                    ORDER BY created_at DESC, id DESC
                    LIMIT $2
                    ",
                )
                .bind(user_id.as_uuid())
                .bind(limit)
                .fetch_all(&self.pool),
                &format!("Failed to list transactions for user {}", user_id),
            )
            .await?;

        rows.iter()
            .map(|row| {
                let id: Uuid = row.try_get("id").map_err(|e| db_err("id", e))?;
                let kind: String = row.try_get("kind").map_err(|e| db_err("kind", e))?;
                let amount: i64 = row.try_get("amount").map_err(|e| db_err("amount", e))?;
                let reason: String = row.try_get("reason").map_err(|e| db_err("reason", e))?;
                let created_at: OffsetDateTime = row
                    .try_get("created_at")
                    .map_err(|e| db_err("created_at", e))?;

                Ok(CreditTransaction {
                    id,
                    user_id: user_id.clone(),
                    kind: parse_kind(&kind)?,
                    amount,
                    reason: parse_reason(&reason)?,
                    created_at,
                })
            })
            .collect()
    }
}
