//! Pickaxe upgrade purchases: fortune, efficiency, and the auto-sell
//! unlock.
//!
//! Every purchase runs under the player's mutation lock: preconditions
//! (max level, already owned) are checked first without touching the
//! ledger, then the price is debited atomically, and only a confirmed
//! debit advances the in-memory level. A failed debit leaves the player
//! exactly as they were.

use std::sync::Arc;

use rust_decimal::Decimal;

use quarry_core::config::UpgradesConfig;
use quarry_state::{PlayerLocks, PlayerStateCache};
use quarry_types::{PlayerId, PlayerStatsState, UpgradeResult};

use crate::error::LedgerError;
use crate::ledger::MoneyLedger;

/// The two leveled upgrade tracks.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Track {
    Fortune,
    Efficiency,
}

impl Track {
    const fn name(self) -> &'static str {
        match self {
            Self::Fortune => "fortune upgrade",
            Self::Efficiency => "efficiency upgrade",
        }
    }

    const fn level(self, stats: &PlayerStatsState) -> u8 {
        match self {
            Self::Fortune => stats.fortune_level,
            Self::Efficiency => stats.efficiency_level,
        }
    }

    fn set_level(self, stats: &mut PlayerStatsState, level: u8) {
        match self {
            Self::Fortune => stats.fortune_level = level,
            Self::Efficiency => stats.efficiency_level = level,
        }
    }
}

/// Sells pickaxe upgrades against the money ledger.
#[derive(Clone)]
pub struct UpgradeEngine {
    ledger: MoneyLedger,
    stats: Arc<PlayerStateCache<PlayerStatsState>>,
    locks: Arc<PlayerLocks>,
    prices: UpgradesConfig,
}

impl UpgradeEngine {
    /// Assemble the engine from its shared collaborators.
    pub const fn new(
        ledger: MoneyLedger,
        stats: Arc<PlayerStateCache<PlayerStatsState>>,
        locks: Arc<PlayerLocks>,
        prices: UpgradesConfig,
    ) -> Self {
        Self {
            ledger,
            stats,
            locks,
            prices,
        }
    }

    /// Buy the next fortune tier.
    pub async fn purchase_fortune(&self, player: PlayerId) -> UpgradeResult {
        self.purchase_track(player, Track::Fortune).await
    }

    /// Buy the next efficiency tier.
    pub async fn purchase_efficiency(&self, player: PlayerId) -> UpgradeResult {
        self.purchase_track(player, Track::Efficiency).await
    }

    /// Buy the one-time auto-sell unlock. Buying it also switches it on.
    pub async fn purchase_autosell(&self, player: PlayerId) -> UpgradeResult {
        let _guard = self.locks.acquire(player).await;

        if self.stats.with(player, PlayerStatsState::autosell_owned) {
            return UpgradeResult::AlreadyOwned;
        }
        match self
            .ledger
            .debit(player, self.prices.autosell_price, "auto-sell unlock")
            .await
        {
            Ok(()) => {
                self.stats.mutate_and_persist(player, |s| {
                    s.autosell_level = 1;
                    s.autosell_enabled = true;
                });
                UpgradeResult::Success
            }
            Err(error) => debit_failure(player, "auto-sell unlock", &error),
        }
    }

    /// Flip the auto-sell switch.
    ///
    /// Returns the new state, or `false` without any change when the
    /// unlock was never bought.
    pub async fn toggle_auto_sell(&self, player: PlayerId) -> bool {
        let _guard = self.locks.acquire(player).await;

        if !self.stats.with(player, PlayerStatsState::autosell_owned) {
            return false;
        }
        let mut enabled = false;
        self.stats.mutate_and_persist(player, |s| {
            s.autosell_enabled = !s.autosell_enabled;
            enabled = s.autosell_enabled;
        });
        enabled
    }

    /// The price of the next tier on a track, `None` at max level.
    fn next_price(&self, track: Track, level: u8) -> Option<Decimal> {
        let table = match track {
            Track::Fortune => &self.prices.fortune_prices,
            Track::Efficiency => &self.prices.efficiency_prices,
        };
        table.get(usize::from(level)).copied()
    }

    async fn purchase_track(&self, player: PlayerId, track: Track) -> UpgradeResult {
        let _guard = self.locks.acquire(player).await;

        let level = self.stats.with(player, |s| track.level(s));
        let Some(price) = self.next_price(track, level) else {
            return UpgradeResult::MaxLevel;
        };
        match self.ledger.debit(player, price, track.name()).await {
            Ok(()) => {
                self.stats.mutate_and_persist(player, |s| {
                    track.set_level(s, level.saturating_add(1));
                });
                tracing::info!(
                    player = %player,
                    upgrade = track.name(),
                    level = level.saturating_add(1),
                    %price,
                    "upgrade purchased"
                );
                UpgradeResult::Success
            }
            Err(error) => debit_failure(player, track.name(), &error),
        }
    }
}

/// Map a failed debit onto the purchase result.
///
/// A store outage is conservatively reported as not-enough-money so the
/// caller never grants anything unpaid; the outage itself is logged at
/// error severity.
fn debit_failure(player: PlayerId, what: &str, error: &LedgerError) -> UpgradeResult {
    match error {
        LedgerError::InsufficientFunds { .. } | LedgerError::NonPositiveAmount(_) => {
            UpgradeResult::NotEnoughMoney
        }
        LedgerError::Unavailable(_) => {
            tracing::error!(player = %player, what, %error, "ledger unavailable during purchase");
            UpgradeResult::NotEnoughMoney
        }
    }
}
