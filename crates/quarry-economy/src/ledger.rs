//! The money ledger bridge.
//!
//! [`MoneyLedger`] wraps an abstract [`BalanceStore`] and is the only way
//! the engines move currency. Every movement carries a human-readable
//! reason string for audit, and every amount is validated positive before
//! it reaches the store.
//!
//! The trait is object-safe (methods return [`BoxFuture`]) so the ledger
//! can hold `Arc<dyn BalanceStore>`: production wires in the Postgres
//! store from `quarry-db`, tests and ephemeral servers use
//! [`MemoryBalanceStore`].

use std::collections::HashMap;
use std::sync::Arc;

use futures::future::BoxFuture;
use parking_lot::Mutex;
use rust_decimal::Decimal;

use quarry_types::PlayerId;

use crate::error::LedgerError;

/// Abstract balance store consumed by [`MoneyLedger`].
///
/// `withdraw` must be atomic: it fails with
/// [`LedgerError::InsufficientFunds`] when the balance is below the amount
/// *at commit time*, never debiting partially.
pub trait BalanceStore: Send + Sync {
    /// Current balance, zero for unknown players.
    fn balance(&self, player: PlayerId) -> BoxFuture<'_, Result<Decimal, LedgerError>>;

    /// Add to a player's balance.
    fn deposit<'a>(
        &'a self,
        player: PlayerId,
        amount: Decimal,
        reason: &'a str,
    ) -> BoxFuture<'a, Result<(), LedgerError>>;

    /// Atomically subtract from a player's balance.
    fn withdraw<'a>(
        &'a self,
        player: PlayerId,
        amount: Decimal,
        reason: &'a str,
    ) -> BoxFuture<'a, Result<(), LedgerError>>;

    /// Overwrite a player's balance (prestige reset).
    fn set_balance(
        &self,
        player: PlayerId,
        amount: Decimal,
    ) -> BoxFuture<'_, Result<(), LedgerError>>;
}

/// The bridge every engine moves money through.
#[derive(Clone)]
pub struct MoneyLedger {
    store: Arc<dyn BalanceStore>,
    /// Runtime captured at construction, so detached credits issued from
    /// a non-runtime thread (the host's event thread) still land.
    runtime: Option<tokio::runtime::Handle>,
}

impl MoneyLedger {
    /// Wrap a balance store.
    ///
    /// When constructed inside a tokio runtime the handle is captured and
    /// [`credit_detached`](Self::credit_detached) spawns onto it, whatever
    /// thread the call later comes from.
    pub fn new(store: Arc<dyn BalanceStore>) -> Self {
        Self {
            store,
            runtime: tokio::runtime::Handle::try_current().ok(),
        }
    }

    /// Current balance for a player.
    pub async fn balance(&self, player: PlayerId) -> Result<Decimal, LedgerError> {
        self.store.balance(player).await
    }

    /// Credit a player, waiting for the store to confirm.
    pub async fn credit(
        &self,
        player: PlayerId,
        amount: Decimal,
        reason: &str,
    ) -> Result<(), LedgerError> {
        validate_positive(amount)?;
        self.store.deposit(player, amount, reason).await?;
        tracing::debug!(player = %player, %amount, reason, "ledger credit");
        Ok(())
    }

    /// Debit a player, waiting for the store to confirm.
    ///
    /// This is the one blocking-wait money operation; rank-ups and
    /// purchases call it *before* mutating any in-memory state so a failed
    /// debit can never leave a rank or level granted unpaid.
    pub async fn debit(
        &self,
        player: PlayerId,
        amount: Decimal,
        reason: &str,
    ) -> Result<(), LedgerError> {
        validate_positive(amount)?;
        self.store.withdraw(player, amount, reason).await?;
        tracing::debug!(player = %player, %amount, reason, "ledger debit");
        Ok(())
    }

    /// Overwrite a player's balance (prestige reset), waiting for the
    /// store to confirm.
    pub async fn reset(&self, player: PlayerId, amount: Decimal) -> Result<(), LedgerError> {
        self.store.set_balance(player, amount).await?;
        tracing::debug!(player = %player, %amount, "ledger balance reset");
        Ok(())
    }

    /// Credit a player without waiting for the store.
    ///
    /// Used on the hot block-break path (auto-sell), where the pipeline
    /// must never wait on the database. The write is spawned onto the
    /// runtime captured at construction, so calling from a plain host
    /// thread is safe. A failed credit is logged; the earned amount was
    /// already recorded in the player's stats, which remain the in-memory
    /// truth.
    pub fn credit_detached(&self, player: PlayerId, amount: Decimal, reason: &str) {
        if let Err(error) = validate_positive(amount) {
            tracing::warn!(player = %player, %error, "dropping detached credit");
            return;
        }
        let Some(runtime) = self
            .runtime
            .clone()
            .or_else(|| tokio::runtime::Handle::try_current().ok())
        else {
            tracing::warn!(player = %player, %amount, reason, "dropping detached credit, no async runtime");
            return;
        };
        let store = Arc::clone(&self.store);
        let reason = reason.to_owned();
        runtime.spawn(async move {
            if let Err(error) = store.deposit(player, amount, &reason).await {
                tracing::warn!(player = %player, %amount, reason, %error, "detached ledger credit failed");
            }
        });
    }
}

fn validate_positive(amount: Decimal) -> Result<(), LedgerError> {
    if amount <= Decimal::ZERO {
        return Err(LedgerError::NonPositiveAmount(amount));
    }
    Ok(())
}

// ---------------------------------------------------------------------------
// In-memory store
// ---------------------------------------------------------------------------

/// In-memory [`BalanceStore`] for tests and ephemeral servers.
#[derive(Debug, Default)]
pub struct MemoryBalanceStore {
    balances: Mutex<HashMap<PlayerId, Decimal>>,
}

impl MemoryBalanceStore {
    /// Create an empty store.
    pub fn new() -> Self {
        Self::default()
    }

    /// Create a store pre-seeded with balances (test convenience).
    pub fn seeded(entries: impl IntoIterator<Item = (PlayerId, Decimal)>) -> Self {
        Self {
            balances: Mutex::new(entries.into_iter().collect()),
        }
    }
}

impl BalanceStore for MemoryBalanceStore {
    fn balance(&self, player: PlayerId) -> BoxFuture<'_, Result<Decimal, LedgerError>> {
        Box::pin(async move {
            Ok(self
                .balances
                .lock()
                .get(&player)
                .copied()
                .unwrap_or(Decimal::ZERO))
        })
    }

    fn deposit<'a>(
        &'a self,
        player: PlayerId,
        amount: Decimal,
        _reason: &'a str,
    ) -> BoxFuture<'a, Result<(), LedgerError>> {
        Box::pin(async move {
            let mut balances = self.balances.lock();
            let entry = balances.entry(player).or_insert(Decimal::ZERO);
            *entry = entry.saturating_add(amount);
            Ok(())
        })
    }

    fn withdraw<'a>(
        &'a self,
        player: PlayerId,
        amount: Decimal,
        _reason: &'a str,
    ) -> BoxFuture<'a, Result<(), LedgerError>> {
        Box::pin(async move {
            let mut balances = self.balances.lock();
            let entry = balances.entry(player).or_insert(Decimal::ZERO);
            if *entry < amount {
                return Err(LedgerError::InsufficientFunds { required: amount });
            }
            *entry = entry.saturating_sub(amount);
            Ok(())
        })
    }

    fn set_balance(
        &self,
        player: PlayerId,
        amount: Decimal,
    ) -> BoxFuture<'_, Result<(), LedgerError>> {
        Box::pin(async move {
            self.balances.lock().insert(player, amount);
            Ok(())
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn ledger_with(player: PlayerId, balance: Decimal) -> MoneyLedger {
        MoneyLedger::new(Arc::new(MemoryBalanceStore::seeded([(player, balance)])))
    }

    #[tokio::test]
    async fn unknown_player_has_zero_balance() {
        let ledger = MoneyLedger::new(Arc::new(MemoryBalanceStore::new()));
        let balance = ledger.balance(PlayerId::new()).await;
        assert_eq!(balance.ok(), Some(Decimal::ZERO));
    }

    #[tokio::test]
    async fn credit_then_debit_roundtrip() {
        let player = PlayerId::new();
        let ledger = ledger_with(player, Decimal::ZERO);

        let credited = ledger.credit(player, Decimal::new(100, 0), "sale").await;
        assert!(credited.is_ok());
        let debited = ledger.debit(player, Decimal::new(40, 0), "upgrade").await;
        assert!(debited.is_ok());
        assert_eq!(
            ledger.balance(player).await.ok(),
            Some(Decimal::new(60, 0)),
        );
    }

    #[tokio::test]
    async fn debit_fails_atomically_when_short() {
        let player = PlayerId::new();
        let ledger = ledger_with(player, Decimal::new(30, 0));

        let result = ledger.debit(player, Decimal::new(40, 0), "upgrade").await;
        assert!(matches!(
            result,
            Err(LedgerError::InsufficientFunds { .. }),
        ));
        // Nothing was debited.
        assert_eq!(
            ledger.balance(player).await.ok(),
            Some(Decimal::new(30, 0)),
        );
    }

    #[tokio::test]
    async fn non_positive_amounts_are_rejected() {
        let player = PlayerId::new();
        let ledger = ledger_with(player, Decimal::new(10, 0));
        let credit = ledger.credit(player, Decimal::ZERO, "nothing").await;
        assert!(matches!(credit, Err(LedgerError::NonPositiveAmount(_))));
        let debit = ledger.debit(player, Decimal::new(-5, 0), "nothing").await;
        assert!(matches!(debit, Err(LedgerError::NonPositiveAmount(_))));
    }

    #[tokio::test]
    async fn reset_overwrites_balance() {
        let player = PlayerId::new();
        let ledger = ledger_with(player, Decimal::new(12_345, 0));
        let reset = ledger.reset(player, Decimal::new(500, 0)).await;
        assert!(reset.is_ok());
        assert_eq!(
            ledger.balance(player).await.ok(),
            Some(Decimal::new(500, 0)),
        );
    }

    #[tokio::test]
    async fn detached_credit_lands_eventually() {
        let player = PlayerId::new();
        let store = Arc::new(MemoryBalanceStore::new());
        let ledger = MoneyLedger::new(Arc::clone(&store) as Arc<dyn BalanceStore>);

        ledger.credit_detached(player, Decimal::new(25, 0), "auto-sell");
        // Let the spawned task run.
        tokio::task::yield_now().await;
        let balance = ledger.balance(player).await;
        assert_eq!(balance.ok(), Some(Decimal::new(25, 0)));
    }

    #[tokio::test]
    async fn detached_credit_from_plain_thread_uses_captured_runtime() {
        let player = PlayerId::new();
        let ledger = MoneyLedger::new(Arc::new(MemoryBalanceStore::new()));

        // The block-break path runs on the host's own thread, not a
        // runtime worker.
        let host_thread = {
            let ledger = ledger.clone();
            std::thread::spawn(move || {
                ledger.credit_detached(player, Decimal::new(10, 0), "auto-sell");
            })
        };
        assert!(host_thread.join().is_ok());

        tokio::task::yield_now().await;
        let balance = ledger.balance(player).await;
        assert_eq!(balance.ok(), Some(Decimal::new(10, 0)));
    }

    #[test]
    fn detached_credit_without_any_runtime_is_dropped() {
        let player = PlayerId::new();
        let store = Arc::new(MemoryBalanceStore::new());
        let ledger = MoneyLedger::new(Arc::clone(&store) as Arc<dyn BalanceStore>);

        // No runtime exists anywhere: the credit is logged and dropped
        // rather than aborting the caller.
        ledger.credit_detached(player, Decimal::new(10, 0), "auto-sell");

        let balance = futures::executor::block_on(store.balance(player));
        assert_eq!(balance.ok(), Some(Decimal::ZERO));
    }
}
