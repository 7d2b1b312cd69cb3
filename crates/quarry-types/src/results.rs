//! Outcome tags and value objects returned by the economy engines.
//!
//! Precondition failures (not enough money, max level, incomplete
//! challenges) are ordinary enum variants here, never errors: by the time a
//! caller sees `Success`, every side effect has already been applied, so
//! there is nothing to retry.

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

/// Outcome of a rank-up attempt (or a `can_rank_up` precheck).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum RankupResult {
    /// The rank advanced (or, from a precheck, would advance).
    Success,
    /// Ledger balance is below the rank-up price.
    NotEnoughMoney,
    /// Not every challenge for the current rank is complete.
    ChallengesIncomplete,
    /// Already at the terminal "FREE" rank.
    MaxRank,
}

/// Outcome of an upgrade purchase attempt.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum UpgradeResult {
    /// The level advanced and the price was debited.
    Success,
    /// Ledger balance is below the tier price.
    NotEnoughMoney,
    /// The upgrade is already at its maximum level.
    MaxLevel,
    /// The one-shot upgrade (auto-sell) was already purchased.
    AlreadyOwned,
}

/// Result of one sell operation (inventory sweep or auto-sell).
///
/// A zero-item result is a valid, non-error outcome. The per-type quantity
/// list preserves insertion order for deterministic reporting.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct SellResult {
    /// Total currency credited, already rounded to 2 fraction digits
    /// (half-up) with all multipliers applied.
    pub total_earned: Decimal,
    /// Total number of items sold.
    pub total_blocks: u64,
    /// Block type to quantity sold, in the order the types were first seen.
    pub sold: Vec<(String, u64)>,
}

impl SellResult {
    /// An empty result: nothing sold, nothing earned.
    pub const fn empty() -> Self {
        Self {
            total_earned: Decimal::ZERO,
            total_blocks: 0,
            sold: Vec::new(),
        }
    }

    /// Whether nothing was sold.
    pub const fn is_empty(&self) -> bool {
        self.total_blocks == 0
    }

    /// Quantity sold of one block type, 0 if absent.
    pub fn quantity_of(&self, block_type: &str) -> u64 {
        self.sold
            .iter()
            .find(|(name, _)| name == block_type)
            .map_or(0, |(_, qty)| *qty)
    }

    /// Add a quantity to a block type's tally, preserving first-seen order.
    pub fn add_sold(&mut self, block_type: &str, quantity: u64) {
        self.total_blocks = self.total_blocks.saturating_add(quantity);
        if let Some(entry) = self.sold.iter_mut().find(|(name, _)| name == block_type) {
            entry.1 = entry.1.saturating_add(quantity);
        } else {
            self.sold.push((block_type.to_owned(), quantity));
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn empty_result_is_empty() {
        let result = SellResult::empty();
        assert!(result.is_empty());
        assert_eq!(result.total_earned, Decimal::ZERO);
        assert_eq!(result.quantity_of("stone"), 0);
    }

    #[test]
    fn add_sold_preserves_insertion_order() {
        let mut result = SellResult::empty();
        result.add_sold("stone", 3);
        result.add_sold("coal_ore", 2);
        result.add_sold("stone", 1);

        assert_eq!(result.total_blocks, 6);
        assert_eq!(result.quantity_of("stone"), 4);
        let order: Vec<&str> = result.sold.iter().map(|(n, _)| n.as_str()).collect();
        assert_eq!(order, vec!["stone", "coal_ore"]);
    }
}
