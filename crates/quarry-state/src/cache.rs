//! Concurrent read-through cache keyed by [`PlayerId`].
//!
//! The table is a `parking_lot::RwLock<HashMap<PlayerId, Arc<Mutex<R>>>>`:
//! lookups of existing records take only the read lock, each record mutates
//! under its own mutex (block-mining counters increment at high frequency
//! from many event-handling contexts), and the write lock is held just long
//! enough to insert a default record on first miss.

use std::collections::HashMap;
use std::fmt::Display;
use std::future::Future;
use std::sync::Arc;

use parking_lot::{Mutex, RwLock};
use tokio::sync::mpsc;
use tokio::task::JoinHandle;

use quarry_types::PlayerId;

/// Receiving side of a cache's persistence channel, consumed by
/// [`spawn_write_behind`].
pub type PersistQueue<R> = mpsc::UnboundedReceiver<(PlayerId, R)>;

/// Generic in-memory player-record cache with write-behind persistence.
///
/// Instantiated twice: once for [`quarry_types::PlayerRankState`] and once
/// for [`quarry_types::PlayerStatsState`]. Each record is owned by exactly
/// one cache; every other component reads and mutates through it.
#[derive(Debug)]
pub struct PlayerStateCache<R> {
    table: RwLock<HashMap<PlayerId, Arc<Mutex<R>>>>,
    persist_tx: mpsc::UnboundedSender<(PlayerId, R)>,
}

impl<R> PlayerStateCache<R>
where
    R: Clone + Default + Send + 'static,
{
    /// Create an empty cache and the persistence queue feeding its writer.
    pub fn new() -> (Self, PersistQueue<R>) {
        let (persist_tx, persist_rx) = mpsc::unbounded_channel();
        (
            Self {
                table: RwLock::new(HashMap::new()),
                persist_tx,
            },
            persist_rx,
        )
    }

    /// Return the record handle for a player, creating a default record
    /// atomically on first miss (read-through, write-through to memory).
    pub fn entry(&self, id: PlayerId) -> Arc<Mutex<R>> {
        if let Some(record) = self.table.read().get(&id) {
            return Arc::clone(record);
        }
        // Miss: take the write lock and re-check, another context may have
        // inserted while we upgraded.
        let mut table = self.table.write();
        Arc::clone(table.entry(id).or_default())
    }

    /// Read a player's record through a closure.
    pub fn with<T>(&self, id: PlayerId, f: impl FnOnce(&R) -> T) -> T {
        let record = self.entry(id);
        let guard = record.lock();
        f(&guard)
    }

    /// Mutate a player's record under its lock. Memory only; call
    /// [`persist_one`](Self::persist_one) (or use
    /// [`mutate_and_persist`](Self::mutate_and_persist)) for durable
    /// mutations.
    pub fn mutate<T>(&self, id: PlayerId, f: impl FnOnce(&mut R) -> T) -> T {
        let record = self.entry(id);
        let mut guard = record.lock();
        f(&mut guard)
    }

    /// Queue a fire-and-forget upsert of the player's current record.
    ///
    /// Never awaited by the caller; a full or closed queue is logged and
    /// ignored because in-memory state stays authoritative either way.
    pub fn persist_one(&self, id: PlayerId) {
        let snapshot = self.with(id, R::clone);
        if self.persist_tx.send((id, snapshot)).is_err() {
            tracing::warn!(player = %id, "persistence queue closed; dropping write-behind upsert");
        }
    }

    /// Mutate under the record lock, then queue the upsert.
    pub fn mutate_and_persist<T>(&self, id: PlayerId, f: impl FnOnce(&mut R) -> T) -> T {
        let result = self.mutate(id, f);
        self.persist_one(id);
        result
    }

    /// Replace the whole table with bulk-loaded rows (startup).
    pub fn replace_all(&self, entries: impl IntoIterator<Item = (PlayerId, R)>) {
        let mut table = self.table.write();
        table.clear();
        for (id, record) in entries {
            table.insert(id, Arc::new(Mutex::new(record)));
        }
    }

    /// Clone every entry for the shutdown batch save.
    pub fn snapshot(&self) -> Vec<(PlayerId, R)> {
        self.table
            .read()
            .iter()
            .map(|(id, record)| (*id, record.lock().clone()))
            .collect()
    }

    /// Number of cached records.
    pub fn len(&self) -> usize {
        self.table.read().len()
    }

    /// Whether the cache holds no records.
    pub fn is_empty(&self) -> bool {
        self.table.read().is_empty()
    }
}

/// Spawn the write-behind task draining a cache's persistence queue.
///
/// `write` performs the single-row upsert; failures are logged at `warn`
/// and the task keeps draining -- persistence errors are never fatal and
/// never propagate to the mutation that queued them.
pub fn spawn_write_behind<R, F, Fut, E>(
    mut queue: PersistQueue<R>,
    store_name: &'static str,
    write: F,
) -> JoinHandle<()>
where
    R: Send + 'static,
    F: Fn(PlayerId, R) -> Fut + Send + 'static,
    Fut: Future<Output = Result<(), E>> + Send,
    E: Display,
{
    tokio::spawn(async move {
        while let Some((id, record)) = queue.recv().await {
            if let Err(error) = write(id, record).await {
                tracing::warn!(
                    store = store_name,
                    player = %id,
                    %error,
                    "write-behind upsert failed; in-memory state remains authoritative"
                );
            }
        }
        tracing::debug!(store = store_name, "write-behind queue drained and closed");
    })
}
