//! The generic player-state cache pattern used by the rank and stats stores.
//!
//! The in-memory table is the source of truth; the database is an
//! eventually-consistent mirror. Mutations apply to memory first and are
//! mirrored by a fire-and-forget message to an async writer task -- the
//! mutating call path never waits on the database and a failed upsert never
//! rolls anything back.
//!
//! ```text
//! event handler --(mutate_and_persist)--> PlayerStateCache
//!                                             |  clone record
//!                                             v
//!                                    mpsc (unbounded)
//!                                             |
//!                                             v
//!                                  write-behind task --> upsert row
//! ```
//!
//! Bulk load at startup ([`PlayerStateCache::replace_all`]) and batch save
//! at shutdown ([`PlayerStateCache::snapshot`]) are driven by the service
//! wiring in `quarry-engine`, which talks to the stores directly.

pub mod cache;
pub mod locks;

pub use cache::{PersistQueue, PlayerStateCache, spawn_write_behind};
pub use locks::PlayerLocks;
