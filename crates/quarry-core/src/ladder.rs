//! The ordered rank ladder and index-based rank comparison.
//!
//! The ladder is generated once at startup from [`RanksConfig`] and is
//! immutable afterwards: 26 letter ranks whose prices grow geometrically
//! (each step rounded to 2 fraction digits before the next multiplication,
//! so the table is an exact decimal contract), followed by the terminal
//! "FREE" rank at its fixed price.

use rust_decimal::Decimal;

use quarry_types::{RankId, round_money};

use crate::config::RanksConfig;

/// One rank on the ladder, fully resolved from configuration.
#[derive(Debug, Clone, PartialEq)]
pub struct RankDefinition {
    /// Ladder position.
    pub rank: RankId,
    /// Human-readable name shown in messages ("A" .. "Z", "FREE").
    pub display_name: String,
    /// Base price of this rank. A rank-up to this rank costs this price
    /// scaled by the buyer's prestige.
    pub price: Decimal,
    /// Name of the mine zone associated with this rank.
    pub zone: String,
    /// Sell multiplier granted at this rank (>= 1).
    pub multiplier: Decimal,
}

/// The full ordered ladder, indexed by [`RankId::index`].
#[derive(Debug, Clone)]
pub struct RankLadder {
    definitions: Vec<RankDefinition>,
}

impl RankLadder {
    /// Build the ladder from configuration.
    ///
    /// Letter prices: `A = base_price`, then `price(n+1) =
    /// round_2dp(price(n) * growth)`. Multipliers: `1 + index * step`.
    /// Zone names come from the explicit override map when present,
    /// otherwise `"<prefix><lowercase id>"`.
    pub fn from_config(config: &RanksConfig) -> Self {
        let mut definitions = Vec::with_capacity(RankId::LADDER_LEN);
        let mut price = config.base_price;

        for index in 0..RankId::LADDER_LEN {
            let Some(rank) = RankId::from_index(index) else {
                break;
            };
            let rank_price = if rank.is_free() {
                config.free_rank_price
            } else {
                price
            };
            let step_total = config
                .multiplier_step
                .saturating_mul(Decimal::from(index));
            let multiplier = Decimal::ONE.saturating_add(step_total);
            let zone = config.zones.get(rank.as_str()).cloned().unwrap_or_else(|| {
                format!("{}{}", config.zone_prefix, rank.as_str().to_ascii_lowercase())
            });

            definitions.push(RankDefinition {
                rank,
                display_name: rank.as_str().to_owned(),
                price: rank_price,
                zone,
                multiplier,
            });

            price = round_money(price.saturating_mul(config.price_growth));
        }

        Self { definitions }
    }

    /// Look up the definition for a rank.
    pub fn definition(&self, rank: RankId) -> Option<&RankDefinition> {
        self.definitions.get(rank.index())
    }

    /// The definition of the rank *after* `rank`, or `None` at "FREE".
    ///
    /// This is the rank a rank-up from `rank` purchases.
    pub fn next_definition(&self, rank: RankId) -> Option<&RankDefinition> {
        rank.next().and_then(|next| self.definition(next))
    }

    /// The sell multiplier for a rank. Falls back to 1 for a rank the
    /// ladder somehow does not carry.
    pub fn multiplier(&self, rank: RankId) -> Decimal {
        self.definition(rank).map_or(Decimal::ONE, |d| d.multiplier)
    }

    /// All definitions in ladder order.
    pub fn definitions(&self) -> &[RankDefinition] {
        &self.definitions
    }
}

impl Default for RankLadder {
    fn default() -> Self {
        Self::from_config(&RanksConfig::default())
    }
}

/// The ladder index of an identifier string, or -1 for anything that is
/// not a ladder rank.
pub fn rank_index(identifier: &str) -> i64 {
    RankId::parse(identifier).map_or(-1, |rank| i64::try_from(rank.index()).unwrap_or(-1))
}

/// Whether rank `lhs` grants at least the access of rank `rhs`.
///
/// Both sides go through [`rank_index`], so a non-ladder identifier (index
/// -1) is never higher-or-equal to any valid rank. This is the pure
/// access-gating predicate zones use; it has no permission-system
/// dependency.
pub fn is_rank_higher_or_equal(lhs: &str, rhs: &str) -> bool {
    rank_index(lhs) >= rank_index(rhs)
}
