//! Currency rounding and display formatting.
//!
//! Stored amounts are always exact [`Decimal`] values rounded to 2 fraction
//! digits, half-up. The abbreviated `K$`/`M$`/`B$` forms are a display
//! contract only and never flow back into arithmetic.

use rust_decimal::{Decimal, RoundingStrategy};

/// One thousand, as a [`Decimal`].
const THOUSAND: Decimal = Decimal::from_parts(1_000, 0, 0, false, 0);

/// One million, as a [`Decimal`].
const MILLION: Decimal = Decimal::from_parts(1_000_000, 0, 0, false, 0);

/// One billion, as a [`Decimal`].
const BILLION: Decimal = Decimal::from_parts(1_000_000_000, 0, 0, false, 0);

/// Round a currency amount to 2 fraction digits, half-up.
///
/// This is the single rounding rule for every reward path; all engines
/// round through here so auto-sell and inventory sells agree to the cent.
pub fn round_money(amount: Decimal) -> Decimal {
    amount.round_dp_with_strategy(2, RoundingStrategy::MidpointAwayFromZero)
}

/// Format an amount for display with magnitude suffixes.
///
/// Amounts at or above 1e9 render as `#.##B$`, above 1e6 as `#.##M$`,
/// above 1e3 as `#.##K$`, everything else as a plain 2-decimal value with
/// the currency suffix.
pub fn format_money(amount: Decimal) -> String {
    let magnitude = amount.abs();
    if magnitude >= BILLION {
        let scaled = round_money(amount.checked_div(BILLION).unwrap_or(Decimal::ZERO));
        format!("{scaled:.2}B$")
    } else if magnitude >= MILLION {
        let scaled = round_money(amount.checked_div(MILLION).unwrap_or(Decimal::ZERO));
        format!("{scaled:.2}M$")
    } else if magnitude >= THOUSAND {
        let scaled = round_money(amount.checked_div(THOUSAND).unwrap_or(Decimal::ZERO));
        format!("{scaled:.2}K$")
    } else {
        let rounded = round_money(amount);
        format!("{rounded:.2}$")
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn dec(value: i64) -> Decimal {
        Decimal::from(value)
    }

    #[test]
    fn round_money_is_half_up() {
        assert_eq!(round_money(Decimal::new(12_345, 3)).to_string(), "12.35");
        assert_eq!(round_money(Decimal::new(12_344, 3)).to_string(), "12.34");
        // Exact midpoint rounds away from zero.
        assert_eq!(round_money(Decimal::new(125, 3)).to_string(), "0.13");
    }

    #[test]
    fn plain_amounts_keep_two_decimals() {
        assert_eq!(format_money(dec(999)), "999.00$");
        assert_eq!(format_money(Decimal::new(1250, 2)), "12.50$");
    }

    #[test]
    fn thousands_use_k_suffix() {
        assert_eq!(format_money(dec(1_000)), "1.00K$");
        assert_eq!(format_money(dec(1_500)), "1.50K$");
        assert_eq!(format_money(dec(999_999)), "1000.00K$");
    }

    #[test]
    fn millions_and_billions() {
        assert_eq!(format_money(dec(2_500_000)), "2.50M$");
        assert_eq!(format_money(dec(1_000_000_000)), "1.00B$");
        assert_eq!(format_money(dec(1_750_000_000)), "1.75B$");
    }
}
