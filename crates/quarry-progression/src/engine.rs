//! The rank progression state machine.
//!
//! Rank state moves only through this engine: rank-up purchases, the
//! batch max-rank-up, and prestige cycles. Every mutation runs under the
//! player's lock and waits for its ledger movement to commit before
//! touching the cache, so a failed debit never grants an advance and two
//! concurrent attempts can never double-spend.

use std::sync::Arc;

use rust_decimal::Decimal;

use quarry_core::{RankLadder, multiplier};
use quarry_economy::{LedgerError, MoneyLedger};
use quarry_state::{PlayerLocks, PlayerStateCache};
use quarry_types::{PlayerId, PlayerRankState, RankId, RankupResult};

use crate::challenges::ChallengeTracker;

/// Drives rank-ups and prestige cycles against the ledger and the
/// challenge module.
#[derive(Clone)]
pub struct RankProgressionEngine {
    ranks: Arc<PlayerStateCache<PlayerRankState>>,
    ladder: Arc<RankLadder>,
    ledger: MoneyLedger,
    challenges: Arc<dyn ChallengeTracker>,
    locks: Arc<PlayerLocks>,
    starting_balance: Decimal,
}

impl RankProgressionEngine {
    /// Assemble the engine from its shared collaborators.
    pub const fn new(
        ranks: Arc<PlayerStateCache<PlayerRankState>>,
        ladder: Arc<RankLadder>,
        ledger: MoneyLedger,
        challenges: Arc<dyn ChallengeTracker>,
        locks: Arc<PlayerLocks>,
        starting_balance: Decimal,
    ) -> Self {
        Self {
            ranks,
            ladder,
            ledger,
            challenges,
            locks,
            starting_balance,
        }
    }

    /// The player's current rank state.
    pub fn rank_state(&self, player: PlayerId) -> PlayerRankState {
        self.ranks.with(player, |s| *s)
    }

    /// The price of the player's next rank-up, `None` at "FREE".
    ///
    /// Next rank's base price scaled by `1 + prestige * 0.5`; every
    /// prestige cycle makes the whole ladder permanently costlier.
    pub fn rankup_price(&self, player: PlayerId) -> Option<Decimal> {
        let state = self.rank_state(player);
        self.ladder
            .next_definition(state.rank)
            .map(|next| multiplier::rankup_price(next.price, state.prestige))
    }

    /// Preview a rank-up without holding the player's lock.
    ///
    /// The answer can go stale immediately; [`Self::rank_up`] re-validates
    /// everything at commit time.
    pub async fn can_rank_up(&self, player: PlayerId) -> RankupResult {
        let state = self.rank_state(player);
        let Some(next) = self.ladder.next_definition(state.rank) else {
            return RankupResult::MaxRank;
        };
        if !self.challenges_complete(player, state.rank) {
            return RankupResult::ChallengesIncomplete;
        }
        let price = multiplier::rankup_price(next.price, state.prestige);
        match self.ledger.balance(player).await {
            Ok(balance) if balance >= price => RankupResult::Success,
            Ok(_) => RankupResult::NotEnoughMoney,
            Err(error) => {
                tracing::error!(player = %player, %error, "ledger unavailable during rank-up preview");
                RankupResult::NotEnoughMoney
            }
        }
    }

    /// Buy the next rank.
    ///
    /// Re-validates under the player's lock, and the balance check is the
    /// atomic debit itself: the returned tag reflects commit time, not
    /// check time.
    pub async fn rank_up(&self, player: PlayerId) -> RankupResult {
        let _guard = self.locks.acquire(player).await;

        let state = self.rank_state(player);
        let Some(next) = self.ladder.next_definition(state.rank) else {
            return RankupResult::MaxRank;
        };
        if !self.challenges_complete(player, state.rank) {
            return RankupResult::ChallengesIncomplete;
        }
        let price = multiplier::rankup_price(next.price, state.prestige);
        match self.ledger.debit(player, price, "rank-up").await {
            Ok(()) => {}
            Err(LedgerError::InsufficientFunds { .. } | LedgerError::NonPositiveAmount(_)) => {
                return RankupResult::NotEnoughMoney;
            }
            Err(error) => {
                tracing::error!(player = %player, %error, "ledger unavailable during rank-up");
                return RankupResult::NotEnoughMoney;
            }
        }

        let target = next.rank;
        if let Err(error) = self.challenges.on_money_spent(player, price) {
            tracing::warn!(player = %player, %error, "challenge tracker missed a money-spent event");
        }
        self.ranks.mutate_and_persist(player, |s| s.rank = target);
        if let Err(error) = self.challenges.invalidate_rank_cache(player) {
            tracing::warn!(player = %player, %error, "challenge rank-cache invalidation failed");
        }
        tracing::info!(player = %player, rank = %target, %price, "rank purchased");
        RankupResult::Success
    }

    /// Rank up as far as the balance and challenges allow.
    ///
    /// Returns the number of successful advances.
    pub async fn max_rank_up(&self, player: PlayerId) -> u32 {
        let mut advances: u32 = 0;
        while self.rank_up(player).await == RankupResult::Success {
            advances = advances.saturating_add(1);
        }
        advances
    }

    /// Whether the player can prestige right now (rank is "FREE").
    pub fn can_prestige(&self, player: PlayerId) -> bool {
        self.rank_state(player).rank.is_free()
    }

    /// Cycle the player back to "A" with one more prestige level.
    ///
    /// The balance reset is an intentional full reset, not a refund, and
    /// is awaited first: if the ledger cannot commit it, nothing else is
    /// applied and this returns `false`. Challenge progress is wiped and
    /// rank caches invalidated after the state change.
    pub async fn prestige(&self, player: PlayerId) -> bool {
        let _guard = self.locks.acquire(player).await;

        if !self.rank_state(player).rank.is_free() {
            return false;
        }
        if let Err(error) = self.ledger.reset(player, self.starting_balance).await {
            tracing::error!(player = %player, %error, "ledger unavailable during prestige");
            return false;
        }

        let prestige = self.ranks.mutate_and_persist(player, |s| {
            s.prestige = s.prestige.saturating_add(1);
            s.rank = RankId::FIRST;
            s.prestige
        });
        if let Err(error) = self.challenges.reset_all(player) {
            tracing::warn!(player = %player, %error, "challenge reset failed after prestige");
        }
        if let Err(error) = self.challenges.invalidate_rank_cache(player) {
            tracing::warn!(player = %player, %error, "challenge rank-cache invalidation failed");
        }
        tracing::info!(player = %player, prestige, "prestige cycle completed");
        true
    }

    /// The player's personal multiplier: rank multiplier + prestige *
    /// 0.25, recomputed on every read.
    pub fn player_multiplier(&self, player: PlayerId) -> Decimal {
        let state = self.rank_state(player);
        multiplier::player_multiplier(self.ladder.multiplier(state.rank), state.prestige)
    }

    /// Ask the challenge module whether the rank's set is complete.
    ///
    /// A tracker failure is conservatively read as incomplete so a broken
    /// module can never hand out free ranks.
    fn challenges_complete(&self, player: PlayerId, rank: RankId) -> bool {
        match self.challenges.all_complete(player, rank) {
            Ok(complete) => complete,
            Err(error) => {
                tracing::error!(player = %player, rank = %rank, %error, "challenge tracker failed; denying rank-up");
                false
            }
        }
    }
}
