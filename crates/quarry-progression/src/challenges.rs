//! The challenge collaborator contract.
//!
//! Challenges live in an external module the engine never inspects; the
//! engine only notifies it of progress events and asks whether the current
//! rank's set is complete. Every notification is best-effort: a failing
//! tracker is logged by the caller and never blocks rewards or
//! progression.

use rust_decimal::Decimal;

use quarry_types::{PlayerId, RankId};

/// Opaque failure from the challenge module.
///
/// Callers only log it; the message is whatever the module wants to say.
#[derive(Debug, thiserror::Error)]
#[error("challenge tracker error: {0}")]
pub struct ChallengeError(pub String);

/// Progress events and completion queries the engine exchanges with the
/// challenge module.
pub trait ChallengeTracker: Send + Sync {
    /// A block of `block_type` was mined by the player.
    fn on_block_mined(&self, player: PlayerId, block_type: &str) -> Result<(), ChallengeError>;

    /// The player spent money (rank-up debits).
    fn on_money_spent(&self, player: PlayerId, amount: Decimal) -> Result<(), ChallengeError>;

    /// Whether every challenge for `rank` is complete for the player.
    fn all_complete(&self, player: PlayerId, rank: RankId) -> Result<bool, ChallengeError>;

    /// Wipe all challenge progress for the player (prestige).
    fn reset_all(&self, player: PlayerId) -> Result<(), ChallengeError>;

    /// Drop any rank-dependent cache the module keeps for the player.
    fn invalidate_rank_cache(&self, player: PlayerId) -> Result<(), ChallengeError>;
}

/// Tracker for servers running without a challenge module: every rank's
/// set is vacuously complete and events go nowhere.
#[derive(Debug, Clone, Copy, Default)]
pub struct NoChallenges;

impl ChallengeTracker for NoChallenges {
    fn on_block_mined(&self, _player: PlayerId, _block_type: &str) -> Result<(), ChallengeError> {
        Ok(())
    }

    fn on_money_spent(&self, _player: PlayerId, _amount: Decimal) -> Result<(), ChallengeError> {
        Ok(())
    }

    fn all_complete(&self, _player: PlayerId, _rank: RankId) -> Result<bool, ChallengeError> {
        Ok(true)
    }

    fn reset_all(&self, _player: PlayerId) -> Result<(), ChallengeError> {
        Ok(())
    }

    fn invalidate_rank_cache(&self, _player: PlayerId) -> Result<(), ChallengeError> {
        Ok(())
    }
}
