//! Configuration, rank ladder, and pure pricing kernels for Quarry.
//!
//! Everything in this crate is deterministic and I/O-free except for
//! [`config`], which reads the YAML configuration file once at startup.
//! The engines in `quarry-economy` and `quarry-progression` consume these
//! types; nothing here holds mutable player state.
//!
//! # Modules
//!
//! - [`config`] -- Typed configuration structures and the YAML loader
//! - [`ladder`] -- The ordered rank ladder and index-based rank comparison
//! - [`multiplier`] -- Multiplier stacking and rank-up price formulas
//! - [`values`] -- Block type to base sale price lookup

pub mod config;
pub mod ladder;
pub mod multiplier;
pub mod values;

pub use config::{ConfigError, QuarryConfig};
pub use ladder::{RankDefinition, RankLadder, is_rank_higher_or_equal, rank_index};
pub use values::BlockValueTable;
