//! Error types for the economy layer.

use rust_decimal::Decimal;

/// Errors from balance-store operations.
///
/// Insufficient funds is an error at this level because the store's debit
/// is atomic; the engines translate it into their precondition result
/// tags before anything reaches a caller.
#[derive(Debug, thiserror::Error)]
pub enum LedgerError {
    /// The balance was below the requested debit at commit time.
    #[error("insufficient funds: required {required}")]
    InsufficientFunds {
        /// The amount the debit needed.
        required: Decimal,
    },

    /// The amount was zero or negative.
    #[error("non-positive amount: {0}")]
    NonPositiveAmount(Decimal),

    /// The backing store could not be reached or failed.
    #[error("balance store unavailable: {0}")]
    Unavailable(String),
}

/// A single inventory slot could not be removed during a sell sweep.
///
/// The sweep swallows these and skips the slot; the type exists so
/// [`crate::InventorySource`] implementations can say why.
#[derive(Debug, thiserror::Error)]
#[error("inventory slot error: {0}")]
pub struct SlotError(pub String);
