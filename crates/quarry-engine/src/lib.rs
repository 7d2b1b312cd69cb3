//! Event-facing engine for Quarry: the block-break pipeline, the service
//! wiring object, and the contracts the host implements.
//!
//! The host gamemode raises break events and commands; everything below
//! that line lives here or in the sibling crates:
//!
//! ```text
//! host (events, commands, chat)
//!   |            |
//!   v            v
//! BlockBreakPipeline   command layer --> messages
//!   |    \
//!   v     v
//! engines (sell, upgrades, progression, stats)
//!   |
//!   v
//! caches + ledger --> PostgreSQL
//! ```
//!
//! # Modules
//!
//! - [`zone`] -- [`ZoneProvider`] and [`MineZone`] collaborator traits
//! - [`notify`] -- [`Notifier`] trait and the logging fallback
//! - [`pipeline`] -- [`BlockBreakPipeline`] and [`BreakOutcome`]
//! - [`messages`] -- Result-tag to user-string mapping
//! - [`service`] -- [`QuarryService`] wiring and telemetry init
//! - [`error`] -- [`EngineError`]

pub mod error;
pub mod messages;
pub mod notify;
pub mod pipeline;
pub mod service;
pub mod zone;

pub use error::EngineError;
pub use notify::{LogNotifier, Notifier};
pub use pipeline::{BlockBreakEvent, BlockBreakPipeline, BreakOutcome, bonus_drops};
pub use service::{QuarryService, init_telemetry};
pub use zone::{MineZone, ZoneProvider};
