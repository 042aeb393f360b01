//! Credit ledger over `users.credits` and the append-only `transactions` table.
//!
//! Every balance change and its ledger row are written in the same database
//! transaction, so `SUM(transactions.amount)` per user always equals
//! `users.credits`. Debits use a conditional `UPDATE ... WHERE credits >= $n`
//! and therefore never drive a balance negative, even under concurrent
//! requests.

use lasy_core::types::DbId;
use sqlx::{PgConnection, PgPool};

use crate::models::status::TransactionKind;
use crate::models::transaction::CreditTransaction;

/// Column list shared across queries to avoid repetition.
const COLUMNS: &str =
    "id, user_id, amount, kind_id, description, external_ref, balance_after, created_at";

#[derive(Debug, thiserror::Error)]
pub enum LedgerError {
    #[error("insufficient credits: {required} required, {available} available")]
    InsufficientCredits { required: i32, available: i32 },

    #[error("user {0} not found")]
    UserNotFound(DbId),

    #[error("credit amount must be positive, got {0}")]
    InvalidAmount(i32),

    #[error(transparent)]
    Database(#[from] sqlx::Error),
}

/// Atomic debit/credit operations and ledger queries.
pub struct LedgerRepo;

impl LedgerRepo {
    // -----------------------------------------------------------------------
    // Writes
    // -----------------------------------------------------------------------

    /// Debit `amount` credits from a user as a `usage` entry.
    pub async fn debit(
        pool: &PgPool,
        user_id: DbId,
        amount: i32,
        description: &str,
    ) -> Result<CreditTransaction, LedgerError> {
        let mut tx = pool.begin().await?;
        let entry = Self::debit_in(&mut tx, user_id, amount, description).await?;
        tx.commit().await?;
        Ok(entry)
    }

    /// [`debit`](Self::debit) inside a caller-owned transaction.
    ///
    /// On error nothing has been written; the caller should drop its
    /// transaction.
    pub async fn debit_in(
        conn: &mut PgConnection,
        user_id: DbId,
        amount: i32,
        description: &str,
    ) -> Result<CreditTransaction, LedgerError> {
        ensure_positive(amount)?;

        let balance_after: Option<i32> = sqlx::query_scalar(
            "UPDATE users SET credits = credits - $2 \
             WHERE id = $1 AND credits >= $2 \
             RETURNING credits",
        )
        .bind(user_id)
        .bind(amount)
        .fetch_optional(&mut *conn)
        .await?;

        let Some(balance_after) = balance_after else {
            let available: Option<i32> =
                sqlx::query_scalar("SELECT credits FROM users WHERE id = $1")
                    .bind(user_id)
                    .fetch_optional(&mut *conn)
                    .await?;
            return Err(match available {
                Some(available) => LedgerError::InsufficientCredits {
                    required: amount,
                    available,
                },
                None => LedgerError::UserNotFound(user_id),
            });
        };

        let entry = insert_entry(
            conn,
            user_id,
            -amount,
            TransactionKind::Usage,
            description,
            None,
            balance_after,
        )
        .await?;

        tracing::debug!(user_id, amount, balance_after, "Credits debited");
        Ok(entry)
    }

    /// Credit `amount` credits to a user.
    ///
    /// When `external_ref` is given and already recorded the call is a no-op
    /// returning `Ok(None)`, which makes replayed payment events harmless.
    pub async fn credit(
        pool: &PgPool,
        user_id: DbId,
        amount: i32,
        kind: TransactionKind,
        description: &str,
        external_ref: Option<&str>,
    ) -> Result<Option<CreditTransaction>, LedgerError> {
        let mut tx = pool.begin().await?;
        let entry =
            Self::credit_in(&mut tx, user_id, amount, kind, description, external_ref).await?;
        tx.commit().await?;
        Ok(entry)
    }

    /// [`credit`](Self::credit) inside a caller-owned transaction.
    pub async fn credit_in(
        conn: &mut PgConnection,
        user_id: DbId,
        amount: i32,
        kind: TransactionKind,
        description: &str,
        external_ref: Option<&str>,
    ) -> Result<Option<CreditTransaction>, LedgerError> {
        ensure_positive(amount)?;

        // Row lock serialises concurrent credits for the same user, which
        // keeps the external_ref check below race-free.
        let locked: Option<i32> =
            sqlx::query_scalar("SELECT credits FROM users WHERE id = $1 FOR UPDATE")
                .bind(user_id)
                .fetch_optional(&mut *conn)
                .await?;
        if locked.is_none() {
            return Err(LedgerError::UserNotFound(user_id));
        }

        if let Some(reference) = external_ref {
            let seen: bool = sqlx::query_scalar(
                "SELECT EXISTS (SELECT 1 FROM transactions WHERE external_ref = $1)",
            )
            .bind(reference)
            .fetch_one(&mut *conn)
            .await?;
            if seen {
                tracing::info!(user_id, external_ref = reference, "Duplicate credit ignored");
                return Ok(None);
            }
        }

        let balance_after: i32 = sqlx::query_scalar(
            "UPDATE users SET credits = credits + $2 WHERE id = $1 RETURNING credits",
        )
        .bind(user_id)
        .bind(amount)
        .fetch_one(&mut *conn)
        .await?;

        let entry = insert_entry(
            conn,
            user_id,
            amount,
            kind,
            description,
            external_ref,
            balance_after,
        )
        .await?;

        tracing::debug!(user_id, amount, balance_after, kind = kind.name(), "Credits added");
        Ok(Some(entry))
    }

    // -----------------------------------------------------------------------
    // Reads
    // -----------------------------------------------------------------------

    /// Current balance of a user.
    pub async fn balance(pool: &PgPool, user_id: DbId) -> Result<i32, LedgerError> {
        sqlx::query_scalar("SELECT credits FROM users WHERE id = $1")
            .bind(user_id)
            .fetch_optional(pool)
            .await?
            .ok_or(LedgerError::UserNotFound(user_id))
    }

    /// Latest ledger entries for a user, newest first, optionally filtered by kind.
    pub async fn list_for_user(
        pool: &PgPool,
        user_id: DbId,
        kind: Option<TransactionKind>,
        limit: i64,
    ) -> Result<Vec<CreditTransaction>, sqlx::Error> {
        let query = format!(
            "SELECT {COLUMNS} FROM transactions \
             WHERE user_id = $1 AND ($2::SMALLINT IS NULL OR kind_id = $2) \
             ORDER BY created_at DESC, id DESC \
             LIMIT $3"
        );
        sqlx::query_as::<_, CreditTransaction>(&query)
            .bind(user_id)
            .bind(kind.map(TransactionKind::id))
            .bind(limit)
            .fetch_all(pool)
            .await
    }

    /// Signed sum of a user's ledger amounts, optionally filtered by kind.
    pub async fn sum_for_user(
        pool: &PgPool,
        user_id: DbId,
        kind: Option<TransactionKind>,
    ) -> Result<i64, sqlx::Error> {
        sqlx::query_scalar(
            "SELECT COALESCE(SUM(amount), 0)::BIGINT FROM transactions \
             WHERE user_id = $1 AND ($2::SMALLINT IS NULL OR kind_id = $2)",
        )
        .bind(user_id)
        .bind(kind.map(TransactionKind::id))
        .fetch_one(pool)
        .await
    }
}

fn ensure_positive(amount: i32) -> Result<(), LedgerError> {
    if amount <= 0 {
        return Err(LedgerError::InvalidAmount(amount));
    }
    Ok(())
}

async fn insert_entry(
    conn: &mut PgConnection,
    user_id: DbId,
    amount: i32,
    kind: TransactionKind,
    description: &str,
    external_ref: Option<&str>,
    balance_after: i32,
) -> Result<CreditTransaction, sqlx::Error> {
    let query = format!(
        "INSERT INTO transactions \
             (user_id, amount, kind_id, description, external_ref, balance_after) \
         VALUES ($1, $2, $3, $4, $5, $6) \
         RETURNING {COLUMNS}"
    );
    sqlx::query_as::<_, CreditTransaction>(&query)
        .bind(user_id)
        .bind(amount)
        .bind(kind.id())
        .bind(description)
        .bind(external_ref)
        .bind(balance_after)
        .fetch_one(&mut *conn)
        .await
}
