//! User-facing strings for every result tag.
//!
//! Pure functions with no I/O; the host's command layer picks the string
//! and delivers it. Every failure tag has a specific message so no
//! operation ever silently no-ops.

use rust_decimal::Decimal;

use quarry_types::{RankId, RankupResult, SellResult, UpgradeResult, format_money};

/// Message for a rank-up attempt.
///
/// `price` is the rank-up price at the player's prestige, when one
/// exists; insufficient-funds messages always name it.
pub fn rankup_message(result: RankupResult, current_rank: RankId, price: Option<Decimal>) -> String {
    match result {
        RankupResult::Success => current_rank.next().map_or_else(
            || "You reached the top of the ladder!".to_owned(),
            |next| format!("Rank up! Welcome to rank {next}."),
        ),
        RankupResult::NotEnoughMoney => price.map_or_else(
            || "You cannot afford the next rank.".to_owned(),
            |price| format!("You need {} for the next rank.", format_money(price)),
        ),
        RankupResult::ChallengesIncomplete => {
            format!("Complete all rank {current_rank} challenges first.")
        }
        RankupResult::MaxRank => "You are already at the FREE rank.".to_owned(),
    }
}

/// Message for the batch rank-up command.
pub fn max_rankup_message(advances: u32, final_rank: RankId) -> String {
    match advances {
        0 => "No rank-ups were affordable.".to_owned(),
        1 => format!("Ranked up once. You are now rank {final_rank}."),
        n => format!("Ranked up {n} times. You are now rank {final_rank}."),
    }
}

/// Message for a prestige attempt.
pub fn prestige_message(success: bool, prestige: u32) -> String {
    if success {
        format!("Prestige {prestige}! Back to rank A with a permanent bonus.")
    } else {
        "You must reach the FREE rank before you can prestige.".to_owned()
    }
}

/// Message for an upgrade purchase.
pub fn upgrade_message(result: UpgradeResult, name: &str, price: Option<Decimal>) -> String {
    match result {
        UpgradeResult::Success => format!("{name} upgraded!"),
        UpgradeResult::NotEnoughMoney => price.map_or_else(
            || format!("You cannot afford the {name} upgrade."),
            |price| format!("You need {} for the {name} upgrade.", format_money(price)),
        ),
        UpgradeResult::MaxLevel => format!("Your {name} is fully upgraded."),
        UpgradeResult::AlreadyOwned => format!("You already own {name}."),
    }
}

/// Message for the auto-sell toggle.
pub fn toggle_autosell_message(owned: bool, enabled: bool) -> String {
    if !owned {
        return "Buy the auto-sell unlock first.".to_owned();
    }
    if enabled {
        "Auto-sell is now ON.".to_owned()
    } else {
        "Auto-sell is now OFF.".to_owned()
    }
}

/// Message for an inventory sell sweep.
pub fn sell_message(result: &SellResult) -> String {
    if result.is_empty() {
        return "Nothing sellable in your inventory.".to_owned();
    }
    format!(
        "Sold {} blocks for {}.",
        result.total_blocks,
        format_money(result.total_earned),
    )
}

/// Short auto-sell receipt line.
pub fn auto_sell_receipt(amount: Decimal) -> String {
    format!("+{}", format_money(amount))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn insufficient_funds_names_the_price() {
        let message = rankup_message(
            RankupResult::NotEnoughMoney,
            RankId::FIRST,
            Some(Decimal::new(1_500_000, 0)),
        );
        assert_eq!(message, "You need 1.50M$ for the next rank.");
    }

    #[test]
    fn incomplete_challenges_name_the_rank() {
        let message = rankup_message(RankupResult::ChallengesIncomplete, RankId::FIRST, None);
        assert!(message.contains("rank A"));
    }

    #[test]
    fn max_level_reads_as_fully_upgraded() {
        let message = upgrade_message(UpgradeResult::MaxLevel, "fortune", None);
        assert_eq!(message, "Your fortune is fully upgraded.");
    }

    #[test]
    fn sell_message_totals_and_formats() {
        let mut result = SellResult::empty();
        result.add_sold("cobblestone", 10);
        result.total_earned = Decimal::new(1200, 2);
        assert_eq!(sell_message(&result), "Sold 10 blocks for 12.00$.");
        assert_eq!(sell_message(&SellResult::empty()), "Nothing sellable in your inventory.");
    }

    #[test]
    fn toggle_requires_ownership() {
        assert_eq!(
            toggle_autosell_message(false, false),
            "Buy the auto-sell unlock first.",
        );
        assert_eq!(toggle_autosell_message(true, true), "Auto-sell is now ON.");
    }

    #[test]
    fn receipts_use_compact_money() {
        assert_eq!(auto_sell_receipt(Decimal::new(2_500, 0)), "+2.50K$");
    }
}
