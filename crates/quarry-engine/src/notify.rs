//! Player notification contract.

use rust_decimal::Decimal;

use quarry_types::{PlayerId, format_money};

/// Sends short transient messages to players. The host wires in its chat
/// or action-bar implementation.
pub trait Notifier: Send + Sync {
    /// Tell the player what auto-sell just earned them.
    fn auto_sell_receipt(&self, player: PlayerId, amount: Decimal);
}

/// Fallback notifier that only logs, for headless runs and tests.
#[derive(Debug, Clone, Copy, Default)]
pub struct LogNotifier;

impl Notifier for LogNotifier {
    fn auto_sell_receipt(&self, player: PlayerId, amount: Decimal) {
        tracing::info!(player = %player, amount = %format_money(amount), "auto-sell receipt");
    }
}
