//! Multiplier stacking and price formulas.
//!
//! Pure [`Decimal`] functions shared by every reward and pricing path.
//! Nothing here is cached: multipliers are recomputed on every read since
//! rank and prestige change rarely relative to how often they are read.

use rust_decimal::Decimal;

/// Prestige bonus added to the rank multiplier per prestige level (0.25).
const PRESTIGE_MULTIPLIER_BONUS: Decimal = Decimal::from_parts(25, 0, 0, false, 2);

/// Prestige surcharge applied to rank-up prices per prestige level (0.5).
const PRESTIGE_PRICE_SURCHARGE: Decimal = Decimal::from_parts(5, 0, 0, false, 1);

/// A player's personal multiplier: rank multiplier + prestige * 0.25.
pub fn player_multiplier(rank_multiplier: Decimal, prestige: u32) -> Decimal {
    let bonus = PRESTIGE_MULTIPLIER_BONUS.saturating_mul(Decimal::from(prestige));
    rank_multiplier.saturating_add(bonus)
}

/// The combined multiplier applied to a sale: personal * global.
pub fn sell_multiplier(player_multiplier: Decimal, global_multiplier: Decimal) -> Decimal {
    player_multiplier.saturating_mul(global_multiplier)
}

/// Rank-up price: next rank's base price * (1 + prestige * 0.5).
///
/// Every prestige cycle makes the whole ladder permanently costlier. The
/// formula is part of the operator contract and is applied exactly as
/// written even though prestige also resets the balance.
pub fn rankup_price(next_rank_base_price: Decimal, prestige: u32) -> Decimal {
    let surcharge = PRESTIGE_PRICE_SURCHARGE.saturating_mul(Decimal::from(prestige));
    next_rank_base_price.saturating_mul(Decimal::ONE.saturating_add(surcharge))
}
