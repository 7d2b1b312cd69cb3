//! Persistence for the `player_stats` table.
//!
//! The session stamp (`session_started_ms`) is deliberately not a column:
//! it is only meaningful while the player is online, and every load
//! happens after a restart when nobody is. Rows with out-of-range
//! counters are reset to defaults and re-persisted, like the rank store.

use rust_decimal::Decimal;
use sqlx::PgPool;
use uuid::Uuid;

use quarry_types::{PlayerId, PlayerStatsState};

use crate::error::DbError;

/// Rows per UNNEST batch.
const DEFAULT_BATCH_SIZE: usize = 500;

/// Operations on the `player_stats` table.
pub struct StatsStore<'a> {
    pool: &'a PgPool,
    batch_size: usize,
}

impl<'a> StatsStore<'a> {
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

    /// Load every persisted stats record (startup).
    ///
    /// # Errors
    ///
    /// Returns [`DbError::Postgres`] if the query fails.
    pub async fn load_all(&self) -> Result<Vec<(PlayerId, PlayerStatsState)>, DbError> {
        let rows = sqlx::query_as::<_, StatsRow>(
            r"SELECT player_id, blocks_mined, money_earned, time_played_ms,
                     fortune_level, efficiency_level, autosell_level, autosell_enabled
              FROM player_stats",
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
                    tracing::warn!(player = %player, "unreadable stats row; regenerating defaults");
                    let state = PlayerStatsState::default();
                    regenerated.push((player, state.clone()));
                    loaded.push((player, state));
                }
            }
        }
        if !regenerated.is_empty() {
            self.upsert_many(&regenerated).await?;
        }

        tracing::info!(count = loaded.len(), "loaded player stats");
        Ok(loaded)
    }

    /// Upsert a single player's stats (write-behind path).
    ///
    /// # Errors
    ///
    /// Returns [`DbError::Postgres`] if the upsert fails.
    pub async fn upsert_one(
        &self,
        player: PlayerId,
        state: PlayerStatsState,
    ) -> Result<(), DbError> {
        sqlx::query(
            r"INSERT INTO player_stats
                  (player_id, blocks_mined, money_earned, time_played_ms,
                   fortune_level, efficiency_level, autosell_level, autosell_enabled, updated_at)
              VALUES ($1, $2, $3, $4, $5, $6, $7, $8, now())
              ON CONFLICT (player_id) DO UPDATE
              SET blocks_mined = EXCLUDED.blocks_mined,
                  money_earned = EXCLUDED.money_earned,
                  time_played_ms = EXCLUDED.time_played_ms,
                  fortune_level = EXCLUDED.fortune_level,
                  efficiency_level = EXCLUDED.efficiency_level,
                  autosell_level = EXCLUDED.autosell_level,
                  autosell_enabled = EXCLUDED.autosell_enabled,
                  updated_at = now()",
        )
        .bind(player.into_inner())
        .bind(i64::try_from(state.blocks_mined).unwrap_or(i64::MAX))
        .bind(state.money_earned)
        .bind(i64::try_from(state.time_played_ms).unwrap_or(i64::MAX))
        .bind(i16::from(state.fortune_level))
        .bind(i16::from(state.efficiency_level))
        .bind(i16::from(state.autosell_level))
        .bind(state.autosell_enabled)
        .execute(self.pool)
        .await?;
        Ok(())
    }

    /// Batch-upsert stats with multi-row UNNEST (shutdown save).
    ///
    /// # Errors
    ///
    /// Returns [`DbError::Postgres`] if any chunk fails.
    pub async fn upsert_many(
        &self,
        entries: &[(PlayerId, PlayerStatsState)],
    ) -> Result<(), DbError> {
        if entries.is_empty() {
            return Ok(());
        }

        for chunk in entries.chunks(self.batch_size) {
            let mut tx = self.pool.begin().await?;

            let len = chunk.len();
            let mut ids = Vec::with_capacity(len);
            let mut blocks = Vec::with_capacity(len);
            let mut earned = Vec::with_capacity(len);
            let mut played = Vec::with_capacity(len);
            let mut fortunes = Vec::with_capacity(len);
            let mut efficiencies = Vec::with_capacity(len);
            let mut autosells = Vec::with_capacity(len);
            let mut enableds = Vec::with_capacity(len);
            for (player, state) in chunk {
                ids.push(player.into_inner());
                blocks.push(i64::try_from(state.blocks_mined).unwrap_or(i64::MAX));
                earned.push(state.money_earned);
                played.push(i64::try_from(state.time_played_ms).unwrap_or(i64::MAX));
                fortunes.push(i16::from(state.fortune_level));
                efficiencies.push(i16::from(state.efficiency_level));
                autosells.push(i16::from(state.autosell_level));
                enableds.push(state.autosell_enabled);
            }

            sqlx::query(
                r"INSERT INTO player_stats
                      (player_id, blocks_mined, money_earned, time_played_ms,
                       fortune_level, efficiency_level, autosell_level, autosell_enabled, updated_at)
                  SELECT id, blocks, earned, played, fortune, efficiency, autosell, enabled, now()
                  FROM UNNEST($1::UUID[], $2::BIGINT[], $3::NUMERIC[], $4::BIGINT[],
                              $5::SMALLINT[], $6::SMALLINT[], $7::SMALLINT[], $8::BOOLEAN[])
                       AS t(id, blocks, earned, played, fortune, efficiency, autosell, enabled)
                  ON CONFLICT (player_id) DO UPDATE
                  SET blocks_mined = EXCLUDED.blocks_mined,
                      money_earned = EXCLUDED.money_earned,
                      time_played_ms = EXCLUDED.time_played_ms,
                      fortune_level = EXCLUDED.fortune_level,
                      efficiency_level = EXCLUDED.efficiency_level,
                      autosell_level = EXCLUDED.autosell_level,
                      autosell_enabled = EXCLUDED.autosell_enabled,
                      updated_at = now()",
            )
            .bind(&ids)
            .bind(&blocks)
            .bind(&earned)
            .bind(&played)
            .bind(&fortunes)
            .bind(&efficiencies)
            .bind(&autosells)
            .bind(&enableds)
            .execute(&mut *tx)
            .await?;

            tx.commit().await?;
        }

        tracing::debug!(count = entries.len(), "upserted player stats (batch UNNEST)");
        Ok(())
    }
}

/// A row from the `player_stats` table.
#[derive(Debug, Clone, sqlx::FromRow)]
struct StatsRow {
    player_id: Uuid,
    blocks_mined: i64,
    money_earned: Decimal,
    time_played_ms: i64,
    fortune_level: i16,
    efficiency_level: i16,
    autosell_level: i16,
    autosell_enabled: bool,
}

impl StatsRow {
    /// Decode into the in-memory state, `None` when the row is unreadable.
    fn decode(&self) -> Option<PlayerStatsState> {
        Some(PlayerStatsState {
            blocks_mined: u64::try_from(self.blocks_mined).ok()?,
            money_earned: self.money_earned,
            time_played_ms: u64::try_from(self.time_played_ms).ok()?,
            session_started_ms: 0,
            fortune_level: u8::try_from(self.fortune_level).ok()?,
            efficiency_level: u8::try_from(self.efficiency_level).ok()?,
            autosell_level: u8::try_from(self.autosell_level).ok()?,
            autosell_enabled: self.autosell_enabled,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn decoded_rows_start_with_no_session() {
        let row = StatsRow {
            player_id: Uuid::nil(),
            blocks_mined: 42,
            money_earned: Decimal::new(1234, 2),
            time_played_ms: 90_000,
            fortune_level: 2,
            efficiency_level: 1,
            autosell_level: 1,
            autosell_enabled: true,
        };
        let state = row.decode();
        assert_eq!(state.as_ref().map(|s| s.blocks_mined), Some(42));
        assert_eq!(state.as_ref().map(|s| s.session_started_ms), Some(0));
        assert_eq!(state.as_ref().map(|s| s.autosell_enabled), Some(true));
    }

    #[test]
    fn negative_counters_fail_decoding() {
        let row = StatsRow {
            player_id: Uuid::nil(),
            blocks_mined: -5,
            money_earned: Decimal::ZERO,
            time_played_ms: 0,
            fortune_level: 0,
            efficiency_level: 0,
            autosell_level: 0,
            autosell_enabled: false,
        };
        assert!(row.decode().is_none());
    }
}
