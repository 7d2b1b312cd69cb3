//! Gameplay statistics: mined-block counters, cumulative earnings, and
//! session play-time tracking.
//!
//! High-frequency counters (blocks, earnings) mutate memory only and reach
//! the database through the shutdown batch save; level changes and session
//! boundaries are durable and queue a write-behind upsert immediately.

use std::sync::Arc;

use chrono::Utc;
use rust_decimal::Decimal;

use quarry_state::PlayerStateCache;
use quarry_types::{PlayerId, PlayerStatsState};

/// Accessor service over the stats cache.
///
/// The cache itself is owned here; every other component that needs a
/// stats field reads through this service (or the same shared cache
/// handle), never through a second copy.
#[derive(Clone)]
pub struct StatsService {
    stats: Arc<PlayerStateCache<PlayerStatsState>>,
}

impl StatsService {
    /// Wrap the owning stats cache.
    pub const fn new(stats: Arc<PlayerStateCache<PlayerStatsState>>) -> Self {
        Self { stats }
    }

    /// The shared cache handle (for the service wiring's load/save).
    pub const fn cache(&self) -> &Arc<PlayerStateCache<PlayerStatsState>> {
        &self.stats
    }

    /// Count one mined block. Memory only -- this runs on every break.
    pub fn record_block_mined(&self, player: PlayerId) {
        self.stats.mutate(player, |s| {
            s.blocks_mined = s.blocks_mined.saturating_add(1);
        });
    }

    /// Add to cumulative earnings. Memory only, like the block counter.
    pub fn record_earnings(&self, player: PlayerId, amount: Decimal) {
        if amount <= Decimal::ZERO {
            return;
        }
        self.stats.mutate(player, |s| {
            s.money_earned = s.money_earned.saturating_add(amount);
        });
    }

    /// Stamp the session start on join.
    pub fn on_join(&self, player: PlayerId) {
        self.on_join_at(player, Utc::now().timestamp_millis());
    }

    /// Stamp the session start with an explicit clock (testable core).
    pub fn on_join_at(&self, player: PlayerId, now_ms: i64) {
        self.stats.mutate_and_persist(player, |s| {
            s.session_started_ms = now_ms;
        });
    }

    /// Fold the finished session into total play time on quit.
    pub fn on_quit(&self, player: PlayerId) {
        self.on_quit_at(player, Utc::now().timestamp_millis());
    }

    /// Fold the session with an explicit clock (testable core).
    ///
    /// A zero session stamp (never joined, or a double quit) adds nothing.
    pub fn on_quit_at(&self, player: PlayerId, now_ms: i64) {
        self.stats.mutate_and_persist(player, |s| {
            if s.session_started_ms > 0 {
                let elapsed = now_ms.saturating_sub(s.session_started_ms).max(0);
                let elapsed_ms = u64::try_from(elapsed).unwrap_or(0);
                s.time_played_ms = s.time_played_ms.saturating_add(elapsed_ms);
            }
            s.session_started_ms = 0;
        });
    }

    /// Current fortune level.
    pub fn fortune_level(&self, player: PlayerId) -> u8 {
        self.stats.with(player, |s| s.fortune_level)
    }

    /// Current efficiency level.
    pub fn efficiency_level(&self, player: PlayerId) -> u8 {
        self.stats.with(player, |s| s.efficiency_level)
    }

    /// Whether auto-sell is owned *and* switched on.
    pub fn autosell_active(&self, player: PlayerId) -> bool {
        self.stats
            .with(player, |s| s.autosell_owned() && s.autosell_enabled)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn service() -> StatsService {
        let (cache, _rx) = PlayerStateCache::new();
        StatsService::new(Arc::new(cache))
    }

    #[test]
    fn block_counter_is_monotonic() {
        let stats = service();
        let player = PlayerId::new();
        for _ in 0..3 {
            stats.record_block_mined(player);
        }
        assert_eq!(stats.cache().with(player, |s| s.blocks_mined), 3);
    }

    #[test]
    fn earnings_ignore_non_positive_amounts() {
        let stats = service();
        let player = PlayerId::new();
        stats.record_earnings(player, Decimal::new(1250, 2));
        stats.record_earnings(player, Decimal::ZERO);
        stats.record_earnings(player, Decimal::new(-5, 0));
        assert_eq!(
            stats.cache().with(player, |s| s.money_earned),
            Decimal::new(1250, 2),
        );
    }

    #[test]
    fn session_time_accumulates_across_sessions() {
        let stats = service();
        let player = PlayerId::new();

        stats.on_join_at(player, 1_000);
        stats.on_quit_at(player, 4_500);
        stats.on_join_at(player, 10_000);
        stats.on_quit_at(player, 10_500);

        let state = stats.cache().with(player, PlayerStatsState::clone);
        assert_eq!(state.time_played_ms, 4_000);
        assert_eq!(state.session_started_ms, 0);
    }

    #[test]
    fn double_quit_adds_nothing() {
        let stats = service();
        let player = PlayerId::new();
        stats.on_join_at(player, 1_000);
        stats.on_quit_at(player, 2_000);
        stats.on_quit_at(player, 9_000);
        assert_eq!(stats.cache().with(player, |s| s.time_played_ms), 1_000);
    }

    #[test]
    fn autosell_requires_ownership_and_toggle() {
        let stats = service();
        let player = PlayerId::new();
        assert!(!stats.autosell_active(player));
        stats.cache().mutate(player, |s| {
            s.autosell_level = 1;
        });
        assert!(!stats.autosell_active(player));
        stats.cache().mutate(player, |s| {
            s.autosell_enabled = true;
        });
        assert!(stats.autosell_active(player));
    }
}
