//! Economy engines for Quarry: the money ledger bridge, block selling,
//! pickaxe upgrades, and gameplay statistics.
//!
//! All currency amounts are [`rust_decimal::Decimal`] and every reward
//! path rounds through [`quarry_types::round_money`], so the auto-sell
//! path and the inventory sweep agree to the cent by construction.
//!
//! # Modules
//!
//! - [`error`] -- Ledger and inventory error types
//! - [`ledger`] -- [`MoneyLedger`] over an abstract [`BalanceStore`]
//! - [`sell`] -- [`SellEngine`]: inventory sweeps, auto-sell, pricing kernel
//! - [`stats`] -- [`StatsService`]: counters, earnings, session time
//! - [`upgrades`] -- [`UpgradeEngine`]: fortune, efficiency, auto-sell unlock

pub mod error;
pub mod ledger;
pub mod sell;
pub mod stats;
pub mod upgrades;

pub use error::{LedgerError, SlotError};
pub use ledger::{BalanceStore, MemoryBalanceStore, MoneyLedger};
pub use sell::{InventorySource, ItemStack, SellEngine};
pub use stats::StatsService;
pub use upgrades::UpgradeEngine;
