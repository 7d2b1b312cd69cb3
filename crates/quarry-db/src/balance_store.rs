//! The durable balance store backing the money ledger.
//!
//! `balances` is the one authoritative table in the schema: unlike rank
//! and stats rows it is never shadowed by a cache, because the debit must
//! be atomic. The withdraw is a single conditional UPDATE (`WHERE balance
//! >= amount`), so two concurrent debits can never both pass the balance
//! check. Every movement also appends a `balance_audit` row carrying the
//! caller's reason.

use futures::future::BoxFuture;
use rust_decimal::Decimal;
use sqlx::PgPool;
use uuid::Uuid;

use quarry_economy::{BalanceStore, LedgerError};
use quarry_types::PlayerId;

use crate::postgres::PostgresPool;

/// [`BalanceStore`] implementation over the `balances` table.
#[derive(Clone)]
pub struct PgBalanceStore {
    pool: PgPool,
}

impl PgBalanceStore {
    /// Create a store sharing the given pool.
    pub fn new(pool: &PostgresPool) -> Self {
        Self {
            pool: pool.pool().clone(),
        }
    }

    async fn append_audit(
        tx: &mut sqlx::PgConnection,
        player: PlayerId,
        amount: Decimal,
        reason: &str,
    ) -> Result<(), sqlx::Error> {
        sqlx::query(
            r"INSERT INTO balance_audit (id, player_id, amount, reason) VALUES ($1, $2, $3, $4)",
        )
        .bind(Uuid::now_v7())
        .bind(player.into_inner())
        .bind(amount)
        .bind(reason)
        .execute(tx)
        .await?;
        Ok(())
    }
}

/// Map a driver failure onto the ledger's unavailability variant.
fn unavailable(error: sqlx::Error) -> LedgerError {
    LedgerError::Unavailable(error.to_string())
}

impl BalanceStore for PgBalanceStore {
    fn balance(&self, player: PlayerId) -> BoxFuture<'_, Result<Decimal, LedgerError>> {
        Box::pin(async move {
            let row: Option<(Decimal,)> =
                sqlx::query_as(r"SELECT balance FROM balances WHERE player_id = $1")
                    .bind(player.into_inner())
                    .fetch_optional(&self.pool)
                    .await
                    .map_err(unavailable)?;
            Ok(row.map_or(Decimal::ZERO, |(balance,)| balance))
        })
    }

    fn deposit<'a>(
        &'a self,
        player: PlayerId,
        amount: Decimal,
        reason: &'a str,
    ) -> BoxFuture<'a, Result<(), LedgerError>> {
        Box::pin(async move {
            let mut tx = self.pool.begin().await.map_err(unavailable)?;
            sqlx::query(
                r"INSERT INTO balances (player_id, balance, updated_at)
                  VALUES ($1, $2, now())
                  ON CONFLICT (player_id) DO UPDATE
                  SET balance = balances.balance + EXCLUDED.balance, updated_at = now()",
            )
            .bind(player.into_inner())
            .bind(amount)
            .execute(&mut *tx)
            .await
            .map_err(unavailable)?;
            Self::append_audit(&mut tx, player, amount, reason)
                .await
                .map_err(unavailable)?;
            tx.commit().await.map_err(unavailable)?;
            Ok(())
        })
    }

    fn withdraw<'a>(
        &'a self,
        player: PlayerId,
        amount: Decimal,
        reason: &'a str,
    ) -> BoxFuture<'a, Result<(), LedgerError>> {
        Box::pin(async move {
            let mut tx = self.pool.begin().await.map_err(unavailable)?;
            let updated = sqlx::query(
                r"UPDATE balances
                  SET balance = balance - $2, updated_at = now()
                  WHERE player_id = $1 AND balance >= $2",
            )
            .bind(player.into_inner())
            .bind(amount)
            .execute(&mut *tx)
            .await
            .map_err(unavailable)?;
            if updated.rows_affected() == 0 {
                // Dropping the transaction rolls it back.
                return Err(LedgerError::InsufficientFunds { required: amount });
            }
            let debited = Decimal::ZERO.saturating_sub(amount);
            Self::append_audit(&mut tx, player, debited, reason)
                .await
                .map_err(unavailable)?;
            tx.commit().await.map_err(unavailable)?;
            Ok(())
        })
    }

    fn set_balance(
        &self,
        player: PlayerId,
        amount: Decimal,
    ) -> BoxFuture<'_, Result<(), LedgerError>> {
        Box::pin(async move {
            let mut tx = self.pool.begin().await.map_err(unavailable)?;
            sqlx::query(
                r"INSERT INTO balances (player_id, balance, updated_at)
                  VALUES ($1, $2, now())
                  ON CONFLICT (player_id) DO UPDATE
                  SET balance = EXCLUDED.balance, updated_at = now()",
            )
            .bind(player.into_inner())
            .bind(amount)
            .execute(&mut *tx)
            .await
            .map_err(unavailable)?;
            Self::append_audit(&mut tx, player, amount, "balance reset")
                .await
                .map_err(unavailable)?;
            tx.commit().await.map_err(unavailable)?;
            Ok(())
        })
    }
}
