//! Mine zone collaborator contracts.
//!
//! Zones (their geometry, composition whitelists, and reset scheduling)
//! live in the host; the pipeline only resolves the zone owning a
//! coordinate and asks it a few questions per break.

use std::sync::Arc;

use quarry_types::BlockPos;

/// One mine region, as seen by the break pipeline.
pub trait MineZone: Send + Sync {
    /// Name shown in messages and logs.
    fn display_name(&self) -> &str;

    /// Whether the zone has a configured block composition at all.
    fn is_configured(&self) -> bool;

    /// Whether the composition is enforced as a whitelist ("natural
    /// mode"): breaking anything outside it is vetoed.
    fn natural_mode(&self) -> bool;

    /// Whether a block type belongs to the configured composition.
    fn block_in_composition(&self, block_type: &str) -> bool;

    /// Count one broken block off the zone's remaining counter. The
    /// external reset scheduler watches this; the pipeline never resets.
    fn decrement_remaining(&self);

    /// The rank identifier required to earn rewards in this zone.
    ///
    /// An identifier outside the ladder gates nothing (its index is -1).
    fn required_rank(&self) -> &str;
}

/// Resolves the zone owning a world coordinate.
pub trait ZoneProvider: Send + Sync {
    /// The zone containing `position`, `None` outside every mine.
    fn find_zone(&self, position: BlockPos) -> Option<Arc<dyn MineZone>>;
}
