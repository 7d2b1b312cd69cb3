//! Mutable per-player records.
//!
//! Both records are created lazily on first access with [`Default`] values
//! and live in exactly one cache each (`quarry-state`). Every other
//! component reads and mutates them through that owning cache -- no second
//! writable copy exists anywhere.

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use crate::rank::RankId;

/// Progression state for one player: ladder position plus prestige count.
///
/// Owned exclusively by the rank cache and mutated only by the rank
/// progression engine. Persisted as a single upserted row per player.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct PlayerRankState {
    /// Current ladder position. New players start at "A".
    pub rank: RankId,
    /// Number of completed prestige cycles.
    pub prestige: u32,
}

/// Gameplay statistics and pickaxe upgrade levels for one player.
///
/// Mutated from many independent event handlers (block breaks, sells,
/// purchases, session join/quit), so all access goes through the owning
/// cache's per-record lock.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct PlayerStatsState {
    /// Cumulative blocks mined. Monotonic.
    pub blocks_mined: u64,
    /// Cumulative money earned from selling. Monotonic outside data
    /// correction.
    pub money_earned: Decimal,
    /// Total accumulated play time in milliseconds.
    pub time_played_ms: u64,
    /// Wall-clock milliseconds of the current session start, 0 when the
    /// player is offline.
    pub session_started_ms: i64,
    /// Fortune upgrade level (0-5).
    pub fortune_level: u8,
    /// Efficiency upgrade level (0-5).
    pub efficiency_level: u8,
    /// Auto-sell unlock level (0 = locked, 1 = owned).
    pub autosell_level: u8,
    /// Whether auto-sell is currently switched on.
    pub autosell_enabled: bool,
}

impl PlayerStatsState {
    /// Whether the auto-sell upgrade has been purchased.
    pub const fn autosell_owned(&self) -> bool {
        self.autosell_level > 0
    }
}
