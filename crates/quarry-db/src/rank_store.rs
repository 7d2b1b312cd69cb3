//! Persistence for the `player_ranks` table.
//!
//! One row per player, upsert on save. The bulk load recovers from
//! unreadable rows by regenerating the default rank state and immediately
//! re-persisting it; a corrupt row is never a fatal startup error.

use sqlx::PgPool;
use uuid::Uuid;

use quarry_types::{PlayerId, PlayerRankState, RankId};

use crate::error::DbError;

/// Rows per UNNEST batch.
const DEFAULT_BATCH_SIZE: usize = 500;

/// Operations on the `player_ranks` table.
pub struct RankStore<'a> {
    pool: &'a PgPool,
    batch_size: usize,
}

impl<'a> RankStore<'a> {
    /// Create a store bound to a connection pool.
    pub const fn new(pool: &'a PgPool) -> Self {
        Self {
            pool,
            batch_size: DEFAULT_BATCH_SIZE,
        }
    }

    /// Set the batch size for bulk upserts.
    #[must_use]
    pub const fn with_batch_size(mut self, size: usize) -> Self {
        self.batch_size = size;
        self
    }

    /// Load every persisted rank state (startup).
    ///
    /// Rows whose rank identifier no longer parses are reset to the
    /// default state, logged, and re-persisted in place.
    ///
    /// # Errors
    ///
    /// Returns [`DbError::Postgres`] if the query fails.
    pub async fn load_all(&self) -> Result<Vec<(PlayerId, PlayerRankState)>, DbError> {
        let rows = sqlx::query_as::<_, RankRow>(
            r"SELECT player_id, rank, prestige FROM player_ranks",
        )
        .fetch_all(self.pool)
        .await?;

        let mut loaded = Vec::with_capacity(rows.len());
        let mut regenerated = Vec::new();
        for row in rows {
            let player = PlayerId::from(row.player_id);
            match row.decode() {
                Some(state) => loaded.push((player, state)),
                None => {
                    tracing::warn!(player = %player, rank = %row.rank, "unreadable rank row; regenerating defaults");
                    let state = PlayerRankState::default();
                    regenerated.push((player, state));
                    loaded.push((player, state));
                }
            }
        }
        if !regenerated.is_empty() {
            self.upsert_many(&regenerated).await?;
        }

        tracing::info!(count = loaded.len(), "loaded player rank states");
        Ok(loaded)
    }

    /// Upsert a single player's rank state (write-behind path).
    ///
    /// # Errors
    ///
    /// Returns [`DbError::Postgres`] if the upsert fails.
    pub async fn upsert_one(&self, player: PlayerId, state: PlayerRankState) -> Result<(), DbError> {
        sqlx::query(
            r"INSERT INTO player_ranks (player_id, rank, prestige, updated_at)
              VALUES ($1, $2, $3, now())
              ON CONFLICT (player_id) DO UPDATE
              SET rank = EXCLUDED.rank, prestige = EXCLUDED.prestige, updated_at = now()",
        )
        .bind(player.into_inner())
        .bind(state.rank.as_str())
        .bind(i64::from(state.prestige))
        .execute(self.pool)
        .await?;
        Ok(())
    }

    /// Batch-upsert rank states with multi-row UNNEST (shutdown save).
    ///
    /// Each chunk runs in its own transaction.
    ///
    /// # Errors
    ///
    /// Returns [`DbError::Postgres`] if any chunk fails.
    pub async fn upsert_many(&self, entries: &[(PlayerId, PlayerRankState)]) -> Result<(), DbError> {
        if entries.is_empty() {
            return Ok(());
        }

        for chunk in entries.chunks(self.batch_size) {
            let mut tx = self.pool.begin().await?;

            let len = chunk.len();
            let mut ids = Vec::with_capacity(len);
            let mut ranks = Vec::with_capacity(len);
            let mut prestiges = Vec::with_capacity(len);
            for (player, state) in chunk {
                ids.push(player.into_inner());
                ranks.push(state.rank.as_str().to_owned());
                prestiges.push(i64::from(state.prestige));
            }

            sqlx::query(
                r"INSERT INTO player_ranks (player_id, rank, prestige, updated_at)
                  SELECT id, rank, prestige, now()
                  FROM UNNEST($1::UUID[], $2::TEXT[], $3::BIGINT[]) AS t(id, rank, prestige)
                  ON CONFLICT (player_id) DO UPDATE
                  SET rank = EXCLUDED.rank, prestige = EXCLUDED.prestige, updated_at = now()",
            )
            .bind(&ids)
            .bind(&ranks)
            .bind(&prestiges)
            .execute(&mut *tx)
            .await?;

            tx.commit().await?;
        }

        tracing::debug!(count = entries.len(), "upserted rank states (batch UNNEST)");
        Ok(())
    }
}

/// A row from the `player_ranks` table.
#[derive(Debug, Clone, sqlx::FromRow)]
struct RankRow {
    player_id: Uuid,
    rank: String,
    prestige: i64,
}

impl RankRow {
    /// Decode into the in-memory state, `None` when the row is unreadable.
    fn decode(&self) -> Option<PlayerRankState> {
        let rank = RankId::parse(&self.rank)?;
        let prestige = u32::try_from(self.prestige).ok()?;
        Some(PlayerRankState { rank, prestige })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn well_formed_rows_decode() {
        let row = RankRow {
            player_id: Uuid::nil(),
            rank: "K".to_owned(),
            prestige: 3,
        };
        let state = row.decode();
        assert_eq!(
            state.map(|s| (s.rank.as_str(), s.prestige)),
            Some(("K", 3)),
        );
    }

    #[test]
    fn corrupt_rows_fail_decoding() {
        let bad_rank = RankRow {
            player_id: Uuid::nil(),
            rank: "??".to_owned(),
            prestige: 0,
        };
        assert!(bad_rank.decode().is_none());

        let bad_prestige = RankRow {
            player_id: Uuid::nil(),
            rank: "A".to_owned(),
            prestige: -1,
        };
        assert!(bad_prestige.decode().is_none());
    }
}
