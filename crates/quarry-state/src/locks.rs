//! Per-player mutual exclusion for money-moving operations.
//!
//! Rank-ups, prestiges, and upgrade purchases re-validate their
//! preconditions at commit time under this lock, so two concurrent
//! attempts for the same player can never both pass the balance check and
//! double-spend. Read paths (multiplier, balance preview) never take it.

use std::collections::HashMap;
use std::sync::Arc;

use parking_lot::Mutex;
use tokio::sync::OwnedMutexGuard;

use quarry_types::PlayerId;

/// Lazily grown map of per-player async mutexes.
///
/// The outer lock is held only long enough to fetch or insert the
/// player's entry; the returned guard is the per-player lock itself and
/// may be held across awaits (the ledger debit).
#[derive(Debug, Default)]
pub struct PlayerLocks {
    table: Mutex<HashMap<PlayerId, Arc<tokio::sync::Mutex<()>>>>,
}

impl PlayerLocks {
    /// Create an empty lock table.
    pub fn new() -> Self {
        Self::default()
    }

    /// Acquire the mutation lock for one player.
    pub async fn acquire(&self, id: PlayerId) -> OwnedMutexGuard<()> {
        let lock = {
            let mut table = self.table.lock();
            Arc::clone(table.entry(id).or_default())
        };
        lock.lock_owned().await
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn same_player_is_serialized() {
        let locks = Arc::new(PlayerLocks::new());
        let id = PlayerId::new();

        let guard = locks.acquire(id).await;
        let contender = {
            let locks = Arc::clone(&locks);
            tokio::spawn(async move {
                let _guard = locks.acquire(id).await;
            })
        };
        // The contender cannot finish while the first guard is held.
        tokio::task::yield_now().await;
        assert!(!contender.is_finished());

        drop(guard);
        let joined = contender.await;
        assert!(joined.is_ok());
    }

    #[tokio::test]
    async fn different_players_do_not_contend() {
        let locks = PlayerLocks::new();
        let _a = locks.acquire(PlayerId::new()).await;
        // A second player's lock is immediately available.
        let _b = locks.acquire(PlayerId::new()).await;
    }
}
