//! Block type to base sale price lookup.

use std::collections::BTreeMap;

use rust_decimal::Decimal;

/// Immutable mapping from block-type identifier to base sale price.
///
/// Built once from configuration. A zero or missing price means "not
/// sellable" and is reported as `None`, so callers never have to re-check
/// positivity.
#[derive(Debug, Clone, Default)]
pub struct BlockValueTable {
    values: BTreeMap<String, Decimal>,
}

impl BlockValueTable {
    /// Build the table from a configured price map.
    pub const fn new(values: BTreeMap<String, Decimal>) -> Self {
        Self { values }
    }

    /// The base price of a block type, if it is sellable.
    pub fn value_of(&self, block_type: &str) -> Option<Decimal> {
        self.values
            .get(block_type)
            .copied()
            .filter(|price| *price > Decimal::ZERO)
    }

    /// Whether the block type has a positive configured price.
    pub fn is_sellable(&self, block_type: &str) -> bool {
        self.value_of(block_type).is_some()
    }

    /// Number of configured entries (including unsellable zero entries).
    #[allow(clippy::missing_const_for_fn)]
    pub fn len(&self) -> usize {
        self.values.len()
    }

    /// Whether no prices are configured at all.
    #[allow(clippy::missing_const_for_fn)]
    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }
}
