//! The sell engine: inventory sweeps, auto-sell, and the shared pricing
//! kernel.
//!
//! Both sale paths price through the same multiplier stack (rank
//! multiplier + prestige bonus, times the global sell multiplier) and
//! round half-up to 2 fraction digits exactly once, so an auto-sold block
//! and the same block swept from an inventory earn the same cent.

use std::sync::Arc;

use rust_decimal::Decimal;

use quarry_core::{BlockValueTable, RankLadder, multiplier};
use quarry_state::PlayerStateCache;
use quarry_types::{PlayerId, PlayerRankState, SellResult, round_money};

use crate::error::SlotError;
use crate::ledger::MoneyLedger;
use crate::stats::StatsService;

/// A stack of identical blocks occupying one inventory slot.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ItemStack {
    /// Block-type identifier, matching the value table's keys.
    pub block_type: String,
    /// Number of blocks in the stack.
    pub count: u64,
}

impl ItemStack {
    /// Convenience constructor.
    pub fn new(block_type: impl Into<String>, count: u64) -> Self {
        Self {
            block_type: block_type.into(),
            count,
        }
    }
}

/// Abstract view of a sellable container.
///
/// The engine never learns how the host represents inventories; it only
/// peeks slots and takes the ones it sells. `take` removes the whole
/// stack from the slot and is allowed to fail per slot (a stale view, a
/// locked slot) without aborting the sweep.
pub trait InventorySource {
    /// Number of slots, occupied or not.
    fn slot_count(&self) -> usize;

    /// The stack in a slot, `None` when the slot is empty.
    fn peek(&self, slot: usize) -> Option<&ItemStack>;

    /// Remove and return the stack in a slot.
    fn take(&mut self, slot: usize) -> Result<ItemStack, SlotError>;
}

/// Prices block sales and moves the proceeds through the ledger.
#[derive(Clone)]
pub struct SellEngine {
    values: BlockValueTable,
    ledger: MoneyLedger,
    ranks: Arc<PlayerStateCache<PlayerRankState>>,
    stats: StatsService,
    ladder: Arc<RankLadder>,
    global_multiplier: Decimal,
}

impl SellEngine {
    /// Assemble the engine from its shared collaborators.
    pub const fn new(
        values: BlockValueTable,
        ledger: MoneyLedger,
        ranks: Arc<PlayerStateCache<PlayerRankState>>,
        stats: StatsService,
        ladder: Arc<RankLadder>,
        global_multiplier: Decimal,
    ) -> Self {
        Self {
            values,
            ledger,
            ranks,
            stats,
            ladder,
            global_multiplier,
        }
    }

    /// Whether a block type earns anything at all.
    pub fn is_sellable(&self, block_type: &str) -> bool {
        self.values.is_sellable(block_type)
    }

    /// The combined sell rate for a player right now.
    ///
    /// Recomputed on every read from the rank cache, never cached here.
    fn sell_rate(&self, player: PlayerId) -> Decimal {
        let state = self.ranks.with(player, |r| *r);
        let personal = multiplier::player_multiplier(self.ladder.multiplier(state.rank), state.prestige);
        multiplier::sell_multiplier(personal, self.global_multiplier)
    }

    /// The pure pricing kernel: what `count` blocks of `block_type` earn
    /// `player` right now, fully multiplied and rounded.
    ///
    /// Zero for unpriced block types or a zero count. No side effects.
    pub fn block_value(&self, player: PlayerId, block_type: &str, count: u64) -> Decimal {
        if count == 0 {
            return Decimal::ZERO;
        }
        let Some(base) = self.values.value_of(block_type) else {
            return Decimal::ZERO;
        };
        let base_total = base.saturating_mul(Decimal::from(count));
        round_money(base_total.saturating_mul(self.sell_rate(player)))
    }

    /// Sweep an inventory and sell every priced stack the filter accepts.
    ///
    /// Slots the filter rejects, empty slots, and unpriced stacks stay in
    /// place. A slot whose removal fails is logged and skipped; everything
    /// already taken is still sold. The multiplier is applied once to the
    /// accumulated base total and the result rounded half-up to 2dp, then
    /// credited through the ledger and recorded as earnings.
    pub async fn sell_inventory<F>(
        &self,
        player: PlayerId,
        inventory: &mut dyn InventorySource,
        filter: F,
    ) -> SellResult
    where
        F: Fn(&ItemStack) -> bool,
    {
        let mut result = SellResult::empty();
        let mut base_total = Decimal::ZERO;

        for slot in 0..inventory.slot_count() {
            let Some(stack) = inventory.peek(slot) else {
                continue;
            };
            if stack.count == 0 || !filter(stack) {
                continue;
            }
            let Some(base) = self.values.value_of(&stack.block_type) else {
                continue;
            };
            match inventory.take(slot) {
                Ok(taken) => {
                    base_total = base_total
                        .saturating_add(base.saturating_mul(Decimal::from(taken.count)));
                    result.add_sold(&taken.block_type, taken.count);
                }
                Err(error) => {
                    tracing::warn!(player = %player, slot, %error, "skipping unsellable slot");
                }
            }
        }

        if result.is_empty() {
            return result;
        }

        result.total_earned = round_money(base_total.saturating_mul(self.sell_rate(player)));
        self.stats.record_earnings(player, result.total_earned);
        if let Err(error) = self
            .ledger
            .credit(player, result.total_earned, "inventory sale")
            .await
        {
            tracing::error!(player = %player, amount = %result.total_earned, %error, "sale credit failed");
        }
        result
    }

    /// Sweep an inventory with no filter: everything priced gets sold.
    pub async fn sell_all(
        &self,
        player: PlayerId,
        inventory: &mut dyn InventorySource,
    ) -> SellResult {
        self.sell_inventory(player, inventory, |_| true).await
    }

    /// Sell blocks straight off the break path.
    ///
    /// Prices through [`Self::block_value`], records the earnings, and
    /// dispatches the ledger credit without waiting for the store. Returns
    /// the amount earned (zero for unpriced blocks).
    pub fn auto_sell(&self, player: PlayerId, block_type: &str, count: u64) -> Decimal {
        let earned = self.block_value(player, block_type, count);
        if earned <= Decimal::ZERO {
            return Decimal::ZERO;
        }
        self.stats.record_earnings(player, earned);
        self.ledger.credit_detached(player, earned, "auto-sell");
        earned
    }
}
