//! PostgreSQL data layer for Quarry.
//!
//! The database mirrors the in-memory caches, never the other way around:
//! rank and stats rows are bulk-loaded once at startup, trickle back
//! through the write-behind queues while the server runs, and are
//! batch-upserted at shutdown. Only the balance table is authoritative,
//! because debits must be atomic.
//!
//! ```text
//! startup            running                    shutdown
//!    |                  |                          |
//!    +-- load_all ----> caches --- persist_one --> +-- upsert_many
//!                          |
//!                          +-- MoneyLedger ------> balances (+ audit)
//! ```
//!
//! # Modules
//!
//! - [`postgres`] -- Connection pool, configuration, migrations
//! - [`rank_store`] -- `player_ranks` load and upsert
//! - [`stats_store`] -- `player_stats` load and upsert
//! - [`balance_store`] -- [`PgBalanceStore`], the durable `BalanceStore`
//! - [`error`] -- Shared error type

pub mod balance_store;
pub mod error;
pub mod postgres;
pub mod rank_store;
pub mod stats_store;

pub use balance_store::PgBalanceStore;
pub use error::DbError;
pub use postgres::{PostgresConfig, PostgresPool};
pub use rank_store::RankStore;
pub use stats_store::StatsStore;
