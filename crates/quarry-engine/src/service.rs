//! Service wiring: the explicitly constructed object that owns every
//! engine.
//!
//! There is no global accessor anywhere in the workspace; the host builds
//! one [`QuarryService`] at startup, passes its collaborators in, and
//! hands out references to the engines. Both caches are fully populated
//! before `start` returns, so no pipeline event ever observes a
//! half-loaded table.

use std::sync::Arc;
use std::time::Duration;

use tokio::task::JoinHandle;
use tracing_subscriber::EnvFilter;

use quarry_core::config::LoggingConfig;
use quarry_core::{BlockValueTable, QuarryConfig, RankLadder};
use quarry_db::{PgBalanceStore, PostgresConfig, PostgresPool, RankStore, StatsStore};
use quarry_economy::{MoneyLedger, SellEngine, StatsService, UpgradeEngine};
use quarry_progression::{ChallengeTracker, RankProgressionEngine};
use quarry_state::{PlayerLocks, PlayerStateCache, spawn_write_behind};
use quarry_types::{PlayerRankState, PlayerStatsState};

use crate::error::EngineError;
use crate::notify::Notifier;
use crate::pipeline::BlockBreakPipeline;
use crate::zone::ZoneProvider;

/// Install the global tracing subscriber.
///
/// `RUST_LOG` wins over the configured level. Safe to call more than
/// once; later calls are ignored.
pub fn init_telemetry(config: &LoggingConfig) {
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(config.level.clone()));
    drop(
        tracing_subscriber::fmt()
            .with_env_filter(filter)
            .with_target(true)
            .try_init(),
    );
}

/// The assembled engine stack and its background writers.
pub struct QuarryService {
    pool: PostgresPool,
    ranks: Arc<PlayerStateCache<PlayerRankState>>,
    stats_cache: Arc<PlayerStateCache<PlayerStatsState>>,
    stats: StatsService,
    ledger: MoneyLedger,
    progression: Arc<RankProgressionEngine>,
    sell: SellEngine,
    upgrades: UpgradeEngine,
    pipeline: BlockBreakPipeline,
    writers: Vec<JoinHandle<()>>,
}

impl QuarryService {
    /// Connect, migrate, bulk-load both caches, spawn the write-behind
    /// writers, and wire every engine.
    ///
    /// # Errors
    ///
    /// Returns [`EngineError::Db`] if the database cannot be reached,
    /// migrated, or loaded from.
    pub async fn start(
        config: &QuarryConfig,
        zones: Arc<dyn ZoneProvider>,
        challenges: Arc<dyn ChallengeTracker>,
        notifier: Arc<dyn Notifier>,
    ) -> Result<Self, EngineError> {
        let db_config = PostgresConfig::new(&config.infrastructure.postgres_url)
            .with_max_connections(config.infrastructure.postgres_max_connections)
            .with_connect_timeout(Duration::from_secs(
                config.infrastructure.postgres_connect_timeout_secs,
            ));
        let pool = PostgresPool::connect(&db_config).await?;
        pool.run_migrations().await?;

        // Both caches are fully loaded before any engine exists.
        let (ranks, rank_queue) = PlayerStateCache::new();
        let ranks = Arc::new(ranks);
        ranks.replace_all(RankStore::new(pool.pool()).load_all().await?);

        let (stats_cache, stats_queue) = PlayerStateCache::new();
        let stats_cache = Arc::new(stats_cache);
        stats_cache.replace_all(StatsStore::new(pool.pool()).load_all().await?);

        let rank_pool = pool.clone();
        let rank_writer = spawn_write_behind(rank_queue, "player_ranks", move |player, record| {
            let pool = rank_pool.clone();
            async move { RankStore::new(pool.pool()).upsert_one(player, record).await }
        });
        let stats_pool = pool.clone();
        let stats_writer =
            spawn_write_behind(stats_queue, "player_stats", move |player, record| {
                let pool = stats_pool.clone();
                async move { StatsStore::new(pool.pool()).upsert_one(player, record).await }
            });

        let ledger = MoneyLedger::new(Arc::new(PgBalanceStore::new(&pool)));
        let ladder = Arc::new(RankLadder::from_config(&config.ranks));
        let locks = Arc::new(PlayerLocks::new());
        let stats = StatsService::new(Arc::clone(&stats_cache));

        let progression = Arc::new(RankProgressionEngine::new(
            Arc::clone(&ranks),
            Arc::clone(&ladder),
            ledger.clone(),
            Arc::clone(&challenges),
            Arc::clone(&locks),
            config.economy.starting_balance,
        ));
        let sell = SellEngine::new(
            BlockValueTable::new(config.economy.block_values.clone()),
            ledger.clone(),
            Arc::clone(&ranks),
            stats.clone(),
            Arc::clone(&ladder),
            config.economy.global_sell_multiplier,
        );
        let upgrades = UpgradeEngine::new(
            ledger.clone(),
            Arc::clone(&stats_cache),
            Arc::clone(&locks),
            config.upgrades.clone(),
        );
        let pipeline = BlockBreakPipeline::new(
            zones,
            Arc::clone(&progression),
            stats.clone(),
            sell.clone(),
            challenges,
            notifier,
        );

        tracing::info!(
            players_loaded = ranks.len(),
            stats_loaded = stats_cache.len(),
            "quarry service started"
        );
        Ok(Self {
            pool,
            ranks,
            stats_cache,
            stats,
            ledger,
            progression,
            sell,
            upgrades,
            pipeline,
            writers: vec![rank_writer, stats_writer],
        })
    }

    /// The block-break pipeline.
    pub const fn pipeline(&self) -> &BlockBreakPipeline {
        &self.pipeline
    }

    /// The rank progression engine.
    pub const fn progression(&self) -> &Arc<RankProgressionEngine> {
        &self.progression
    }

    /// The sell engine.
    pub const fn sell(&self) -> &SellEngine {
        &self.sell
    }

    /// The upgrade engine.
    pub const fn upgrades(&self) -> &UpgradeEngine {
        &self.upgrades
    }

    /// The stats service (session join/quit, counters).
    pub const fn stats(&self) -> &StatsService {
        &self.stats
    }

    /// The money ledger (balance previews for the command layer).
    pub const fn ledger(&self) -> &MoneyLedger {
        &self.ledger
    }

    /// Flush every cached record and stop the background writers.
    ///
    /// The batch upserts cover anything still sitting in the write-behind
    /// queues, so the writers are simply aborted afterwards.
    ///
    /// # Errors
    ///
    /// Returns [`EngineError::Db`] if a batch save fails; in-memory state
    /// is gone after this call either way.
    pub async fn shutdown(self) -> Result<(), EngineError> {
        let rank_snapshot = self.ranks.snapshot();
        let stats_snapshot = self.stats_cache.snapshot();
        RankStore::new(self.pool.pool())
            .upsert_many(&rank_snapshot)
            .await?;
        StatsStore::new(self.pool.pool())
            .upsert_many(&stats_snapshot)
            .await?;

        for writer in self.writers {
            writer.abort();
        }
        self.pool.close().await;
        tracing::info!(
            players_saved = rank_snapshot.len(),
            stats_saved = stats_snapshot.len(),
            "quarry service stopped"
        );
        Ok(())
    }
}
