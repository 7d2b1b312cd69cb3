//! Shared type definitions for the Quarry progression-and-economy engine.
//!
//! This crate holds the data model used by every other Quarry crate: player
//! identity, rank identifiers, mutable player records, outcome tags, and the
//! money formatting rules. It deliberately contains no I/O and no engine
//! logic -- the logic crates (`quarry-economy`, `quarry-progression`,
//! `quarry-engine`) operate on these types, and `quarry-db` persists them.
//!
//! # Modules
//!
//! - [`ids`] -- Type-safe player identity ([`PlayerId`])
//! - [`rank`] -- The rank ladder identifier type ([`RankId`])
//! - [`state`] -- Mutable per-player records ([`PlayerRankState`], [`PlayerStatsState`])
//! - [`results`] -- Outcome tags and value objects ([`RankupResult`], [`UpgradeResult`], [`SellResult`])
//! - [`money`] -- Rounding and display formatting for currency amounts
//! - [`pos`] -- World coordinates ([`BlockPos`])

pub mod ids;
pub mod money;
pub mod pos;
pub mod rank;
pub mod results;
pub mod state;

// Re-export primary types at crate root for convenience.
pub use ids::PlayerId;
pub use money::{format_money, round_money};
pub use pos::BlockPos;
pub use rank::RankId;
pub use results::{RankupResult, SellResult, UpgradeResult};
pub use state::{PlayerRankState, PlayerStatsState};
