//! The per-event block-break pipeline.
//!
//! Runs synchronously on the context that raised the break event; the
//! only asynchronous work it ever causes is the detached auto-sell credit
//! inside the sell engine. Collaborator failures are logged at the
//! smallest possible scope and never abort the remaining steps.
//!
//! ```text
//! break event
//!   1. resolve zone          -> OutsideMine
//!   2. composition whitelist -> Vetoed
//!   3. decrement remaining
//!   4. resolve player        -> Unattributed
//!   5. rank gate             -> RankTooLow
//!   6. count + challenges
//!   7. fortune roll
//!   8. auto-sell             -> Rewarded
//! ```

use std::sync::Arc;

use rand::Rng;
use rust_decimal::Decimal;

use quarry_core::is_rank_higher_or_equal;
use quarry_economy::{SellEngine, StatsService};
use quarry_progression::{ChallengeTracker, RankProgressionEngine};
use quarry_types::{BlockPos, PlayerId};

use crate::notify::Notifier;
use crate::zone::ZoneProvider;

/// One block-break event as reported by the host.
#[derive(Debug, Clone)]
pub struct BlockBreakEvent {
    /// The breaking player, when the host could attribute the break.
    pub player: Option<PlayerId>,
    /// World coordinate of the broken block.
    pub position: BlockPos,
    /// Block-type identifier of the broken block.
    pub block_type: String,
}

/// What the pipeline decided for one break event.
///
/// Only [`BreakOutcome::Vetoed`] asks the host to cancel the break at the
/// world level; every other non-rewarded outcome just means no rewards.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum BreakOutcome {
    /// The coordinate is outside every mine; the event is ignored.
    OutsideMine,
    /// The zone's composition whitelist excludes this block type; the
    /// host must cancel the break.
    Vetoed,
    /// No player could be resolved; nothing to attribute.
    Unattributed,
    /// The player's rank does not open this zone; no rewards.
    RankTooLow,
    /// The break counted and rewards were applied.
    Rewarded {
        /// Drop count after the fortune roll (1 or 2).
        drops: u64,
        /// Amount auto-sold, zero when auto-sell is off or unowned.
        auto_sold: Decimal,
    },
}

/// Executes the eight break-handling steps against the engines.
#[derive(Clone)]
pub struct BlockBreakPipeline {
    zones: Arc<dyn ZoneProvider>,
    progression: Arc<RankProgressionEngine>,
    stats: StatsService,
    sell: SellEngine,
    challenges: Arc<dyn ChallengeTracker>,
    notifier: Arc<dyn Notifier>,
}

impl BlockBreakPipeline {
    /// Assemble the pipeline from its shared collaborators.
    pub const fn new(
        zones: Arc<dyn ZoneProvider>,
        progression: Arc<RankProgressionEngine>,
        stats: StatsService,
        sell: SellEngine,
        challenges: Arc<dyn ChallengeTracker>,
        notifier: Arc<dyn Notifier>,
    ) -> Self {
        Self {
            zones,
            progression,
            stats,
            sell,
            challenges,
            notifier,
        }
    }

    /// Handle one break event.
    pub fn handle_block_break(&self, event: &BlockBreakEvent) -> BreakOutcome {
        // 1. Outside every mine: not our event.
        let Some(zone) = self.zones.find_zone(event.position) else {
            return BreakOutcome::OutsideMine;
        };

        // 2. Natural-mode composition whitelist.
        if zone.is_configured()
            && zone.natural_mode()
            && !zone.block_in_composition(&event.block_type)
        {
            tracing::debug!(
                zone = zone.display_name(),
                block = event.block_type,
                "break vetoed: block outside zone composition"
            );
            return BreakOutcome::Vetoed;
        }

        // 3. The reset scheduler watches this counter.
        zone.decrement_remaining();

        // 4. No player, no attribution.
        let Some(player) = event.player else {
            return BreakOutcome::Unattributed;
        };

        // 5. Rank gate. The break already happened at the world level;
        // from here on the pipeline only controls rewards and stats.
        let rank = self.progression.rank_state(player).rank;
        if !is_rank_higher_or_equal(rank.as_str(), zone.required_rank()) {
            return BreakOutcome::RankTooLow;
        }

        // 6. Count the block and tell the challenge module.
        self.stats.record_block_mined(player);
        if let Err(error) = self.challenges.on_block_mined(player, &event.block_type) {
            tracing::warn!(player = %player, %error, "challenge tracker missed a mined block");
        }

        // 7. Fortune roll.
        let fortune = self.stats.fortune_level(player);
        let drops = bonus_drops(fortune, &mut rand::rng());

        // 8. Auto-sell.
        let mut auto_sold = Decimal::ZERO;
        if self.stats.autosell_active(player) {
            auto_sold = self.sell.auto_sell(player, &event.block_type, drops);
            if auto_sold > Decimal::ZERO {
                self.notifier.auto_sell_receipt(player, auto_sold);
            }
        }

        BreakOutcome::Rewarded { drops, auto_sold }
    }
}

/// The fortune drop-count roll.
///
/// Level 0 is deterministic. Level L doubles the drop with probability
/// `L * 0.10` (clamped to 1), one independent draw per break; the count
/// never exceeds 2 regardless of level.
pub fn bonus_drops<R: Rng + ?Sized>(fortune_level: u8, rng: &mut R) -> u64 {
    if fortune_level == 0 {
        return 1;
    }
    #[allow(clippy::arithmetic_side_effects)]
    let chance = (f64::from(fortune_level) * 0.10).min(1.0);
    if rng.random_bool(chance) { 2 } else { 1 }
}

#[cfg(test)]
mod tests {
    #![allow(clippy::cast_precision_loss, clippy::arithmetic_side_effects)]

    use super::*;

    use std::sync::atomic::{AtomicU64, Ordering};

    use rand::SeedableRng;
    use rand::rngs::StdRng;

    use parking_lot::Mutex;

    use quarry_core::config::EconomyConfig;
    use quarry_core::{BlockValueTable, RankLadder};
    use quarry_economy::{MemoryBalanceStore, MoneyLedger};
    use quarry_progression::{ChallengeError, NoChallenges};
    use quarry_state::{PlayerLocks, PlayerStateCache};
    use quarry_types::{PlayerRankState, PlayerStatsState, RankId};

    use crate::zone::MineZone;

    struct FakeZone {
        configured: bool,
        natural: bool,
        composition: Vec<String>,
        required: String,
        remaining: AtomicU64,
    }

    impl FakeZone {
        fn open() -> Self {
            Self {
                configured: true,
                natural: false,
                composition: Vec::new(),
                required: "A".to_owned(),
                remaining: AtomicU64::new(1000),
            }
        }
    }

    impl MineZone for FakeZone {
        fn display_name(&self) -> &str {
            "test mine"
        }

        fn is_configured(&self) -> bool {
            self.configured
        }

        fn natural_mode(&self) -> bool {
            self.natural
        }

        fn block_in_composition(&self, block_type: &str) -> bool {
            self.composition.iter().any(|b| b == block_type)
        }

        fn decrement_remaining(&self) {
            self.remaining.fetch_sub(1, Ordering::Relaxed);
        }

        fn required_rank(&self) -> &str {
            &self.required
        }
    }

    /// Provider with one zone covering everything, or nothing at all.
    struct SingleZone(Option<Arc<FakeZone>>);

    impl ZoneProvider for SingleZone {
        fn find_zone(&self, _position: BlockPos) -> Option<Arc<dyn MineZone>> {
            self.0
                .as_ref()
                .map(|zone| Arc::clone(zone) as Arc<dyn MineZone>)
        }
    }

    #[derive(Default)]
    struct CountingNotifier {
        receipts: Mutex<Vec<Decimal>>,
    }

    impl Notifier for CountingNotifier {
        fn auto_sell_receipt(&self, _player: PlayerId, amount: Decimal) {
            self.receipts.lock().push(amount);
        }
    }

    struct Fixture {
        pipeline: BlockBreakPipeline,
        stats: Arc<PlayerStateCache<PlayerStatsState>>,
        ranks: Arc<PlayerStateCache<PlayerRankState>>,
        zone: Option<Arc<FakeZone>>,
        notifier: Arc<CountingNotifier>,
    }

    fn fixture(zone: Option<FakeZone>) -> Fixture {
        let zone = zone.map(Arc::new);
        let (ranks, _rank_rx) = PlayerStateCache::new();
        let ranks = Arc::new(ranks);
        let (stats_cache, _stats_rx) = PlayerStateCache::new();
        let stats_cache = Arc::new(stats_cache);
        let stats = StatsService::new(Arc::clone(&stats_cache));
        let ledger = MoneyLedger::new(Arc::new(MemoryBalanceStore::new()));
        let ladder = Arc::new(RankLadder::default());
        let challenges = Arc::new(NoChallenges);
        let notifier = Arc::new(CountingNotifier::default());

        let sell = SellEngine::new(
            BlockValueTable::new(EconomyConfig::default().block_values),
            ledger.clone(),
            Arc::clone(&ranks),
            stats.clone(),
            Arc::clone(&ladder),
            Decimal::ONE,
        );
        let progression = Arc::new(RankProgressionEngine::new(
            Arc::clone(&ranks),
            ladder,
            ledger,
            Arc::clone(&challenges) as Arc<dyn quarry_progression::ChallengeTracker>,
            Arc::new(PlayerLocks::new()),
            Decimal::ZERO,
        ));
        let pipeline = BlockBreakPipeline::new(
            Arc::new(SingleZone(zone.clone())),
            progression,
            stats.clone(),
            sell,
            challenges,
            Arc::clone(&notifier) as Arc<dyn Notifier>,
        );
        Fixture {
            pipeline,
            stats: stats_cache,
            ranks,
            zone,
            notifier,
        }
    }

    fn break_event(player: Option<PlayerId>, block: &str) -> BlockBreakEvent {
        BlockBreakEvent {
            player,
            position: BlockPos { x: 0, y: 64, z: 0 },
            block_type: block.to_owned(),
        }
    }

    #[test]
    fn outside_any_mine_is_ignored() {
        let fixture = fixture(None);
        let player = PlayerId::new();

        let outcome = fixture
            .pipeline
            .handle_block_break(&break_event(Some(player), "cobblestone"));

        assert_eq!(outcome, BreakOutcome::OutsideMine);
        assert_eq!(fixture.stats.with(player, |s| s.blocks_mined), 0);
    }

    #[test]
    fn natural_mode_vetoes_foreign_blocks_without_decrementing() {
        let zone = FakeZone {
            natural: true,
            composition: vec!["stone".to_owned()],
            ..FakeZone::open()
        };
        let fixture = fixture(Some(zone));
        let player = PlayerId::new();

        let outcome = fixture
            .pipeline
            .handle_block_break(&break_event(Some(player), "diamond_ore"));

        assert_eq!(outcome, BreakOutcome::Vetoed);
        let remaining = fixture
            .zone
            .as_ref()
            .map(|z| z.remaining.load(Ordering::Relaxed));
        assert_eq!(remaining, Some(1000));
        assert_eq!(fixture.stats.with(player, |s| s.blocks_mined), 0);
    }

    #[test]
    fn natural_mode_allows_composition_blocks() {
        let zone = FakeZone {
            natural: true,
            composition: vec!["stone".to_owned()],
            ..FakeZone::open()
        };
        let fixture = fixture(Some(zone));
        let player = PlayerId::new();

        let outcome = fixture
            .pipeline
            .handle_block_break(&break_event(Some(player), "stone"));

        assert!(matches!(outcome, BreakOutcome::Rewarded { .. }));
        let remaining = fixture
            .zone
            .as_ref()
            .map(|z| z.remaining.load(Ordering::Relaxed));
        assert_eq!(remaining, Some(999));
    }

    #[test]
    fn unattributed_breaks_still_count_against_the_zone() {
        let fixture = fixture(Some(FakeZone::open()));

        let outcome = fixture
            .pipeline
            .handle_block_break(&break_event(None, "cobblestone"));

        assert_eq!(outcome, BreakOutcome::Unattributed);
        let remaining = fixture
            .zone
            .as_ref()
            .map(|z| z.remaining.load(Ordering::Relaxed));
        assert_eq!(remaining, Some(999));
    }

    #[test]
    fn low_rank_earns_nothing() {
        let zone = FakeZone {
            required: "C".to_owned(),
            ..FakeZone::open()
        };
        let fixture = fixture(Some(zone));
        let player = PlayerId::new(); // defaults to rank A

        let outcome = fixture
            .pipeline
            .handle_block_break(&break_event(Some(player), "cobblestone"));

        assert_eq!(outcome, BreakOutcome::RankTooLow);
        assert_eq!(fixture.stats.with(player, |s| s.blocks_mined), 0);
    }

    #[test]
    fn matching_rank_opens_the_gate() {
        let zone = FakeZone {
            required: "C".to_owned(),
            ..FakeZone::open()
        };
        let fixture = fixture(Some(zone));
        let player = PlayerId::new();
        fixture.ranks.mutate(player, |s| {
            s.rank = RankId::parse("C").unwrap_or_default();
        });

        let outcome = fixture
            .pipeline
            .handle_block_break(&break_event(Some(player), "cobblestone"));

        assert!(matches!(outcome, BreakOutcome::Rewarded { .. }));
        assert_eq!(fixture.stats.with(player, |s| s.blocks_mined), 1);
    }

    #[test]
    fn fortune_zero_always_drops_one() {
        let fixture = fixture(Some(FakeZone::open()));
        let player = PlayerId::new();

        for _ in 0..50 {
            let outcome = fixture
                .pipeline
                .handle_block_break(&break_event(Some(player), "cobblestone"));
            assert_eq!(
                outcome,
                BreakOutcome::Rewarded {
                    drops: 1,
                    auto_sold: Decimal::ZERO,
                },
            );
        }
        assert_eq!(fixture.stats.with(player, |s| s.blocks_mined), 50);
    }

    #[tokio::test]
    async fn auto_sell_rewards_and_notifies() {
        let fixture = fixture(Some(FakeZone::open()));
        let player = PlayerId::new();
        fixture.stats.mutate(player, |s| {
            s.autosell_level = 1;
            s.autosell_enabled = true;
        });

        let outcome = fixture
            .pipeline
            .handle_block_break(&break_event(Some(player), "diamond_ore"));
        tokio::task::yield_now().await;

        // One diamond at base 200, rank A multiplier 1.
        assert_eq!(
            outcome,
            BreakOutcome::Rewarded {
                drops: 1,
                auto_sold: Decimal::new(200_00, 2),
            },
        );
        assert_eq!(
            fixture.notifier.receipts.lock().as_slice(),
            &[Decimal::new(200_00, 2)],
        );
        assert_eq!(
            fixture.stats.with(player, |s| s.money_earned),
            Decimal::new(200_00, 2),
        );
    }

    #[test]
    fn priced_auto_sell_on_a_plain_thread_still_rewards() {
        // The host's event thread is not a runtime worker; the detached
        // credit must not abort the break handling.
        let fixture = fixture(Some(FakeZone::open()));
        let player = PlayerId::new();
        fixture.stats.mutate(player, |s| {
            s.autosell_level = 1;
            s.autosell_enabled = true;
        });

        let outcome = fixture
            .pipeline
            .handle_block_break(&break_event(Some(player), "diamond_ore"));

        assert_eq!(
            outcome,
            BreakOutcome::Rewarded {
                drops: 1,
                auto_sold: Decimal::new(200_00, 2),
            },
        );
        assert_eq!(
            fixture.stats.with(player, |s| s.money_earned),
            Decimal::new(200_00, 2),
        );
        assert_eq!(
            fixture.notifier.receipts.lock().as_slice(),
            &[Decimal::new(200_00, 2)],
        );
    }

    #[test]
    fn unpriced_auto_sell_stays_silent() {
        let fixture = fixture(Some(FakeZone::open()));
        let player = PlayerId::new();
        fixture.stats.mutate(player, |s| {
            s.autosell_level = 1;
            s.autosell_enabled = true;
        });

        let outcome = fixture
            .pipeline
            .handle_block_break(&break_event(Some(player), "bedrock"));

        assert_eq!(
            outcome,
            BreakOutcome::Rewarded {
                drops: 1,
                auto_sold: Decimal::ZERO,
            },
        );
        assert!(fixture.notifier.receipts.lock().is_empty());
    }

    /// A tracker that always fails; rewards must not care.
    struct BrokenTracker;

    impl quarry_progression::ChallengeTracker for BrokenTracker {
        fn on_block_mined(
            &self,
            _player: PlayerId,
            _block_type: &str,
        ) -> Result<(), ChallengeError> {
            Err(ChallengeError("offline".to_owned()))
        }

        fn on_money_spent(&self, _player: PlayerId, _amount: Decimal) -> Result<(), ChallengeError> {
            Err(ChallengeError("offline".to_owned()))
        }

        fn all_complete(&self, _player: PlayerId, _rank: RankId) -> Result<bool, ChallengeError> {
            Err(ChallengeError("offline".to_owned()))
        }

        fn reset_all(&self, _player: PlayerId) -> Result<(), ChallengeError> {
            Err(ChallengeError("offline".to_owned()))
        }

        fn invalidate_rank_cache(&self, _player: PlayerId) -> Result<(), ChallengeError> {
            Err(ChallengeError("offline".to_owned()))
        }
    }

    #[test]
    fn broken_challenge_tracker_never_blocks_rewards() {
        let mut fixture = fixture(Some(FakeZone::open()));
        fixture.pipeline.challenges = Arc::new(BrokenTracker);
        let player = PlayerId::new();

        let outcome = fixture
            .pipeline
            .handle_block_break(&break_event(Some(player), "cobblestone"));

        assert!(matches!(outcome, BreakOutcome::Rewarded { .. }));
        assert_eq!(fixture.stats.with(player, |s| s.blocks_mined), 1);
    }

    #[test]
    fn fortune_roll_level_zero_is_deterministic() {
        let mut rng = StdRng::seed_from_u64(7);
        for _ in 0..100 {
            assert_eq!(bonus_drops(0, &mut rng), 1);
        }
    }

    #[test]
    fn fortune_roll_level_five_doubles_about_half_the_time() {
        let mut rng = StdRng::seed_from_u64(42);
        let trials = 10_000_u32;
        let mut doubles = 0_u32;
        for _ in 0..trials {
            if bonus_drops(5, &mut rng) == 2 {
                doubles = doubles.saturating_add(1);
            }
        }
        let ratio = f64::from(doubles) / f64::from(trials);
        assert!((0.45..=0.55).contains(&ratio), "ratio was {ratio}");
    }
}
