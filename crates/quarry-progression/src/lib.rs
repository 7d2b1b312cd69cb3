//! Rank progression for Quarry: the ladder state machine, prestige
//! cycles, and the challenge collaborator contract.
//!
//! # Modules
//!
//! - [`challenges`] -- [`ChallengeTracker`] trait and [`ChallengeError`]
//! - [`engine`] -- [`RankProgressionEngine`]: rank-up, max-rank-up, prestige

pub mod challenges;
pub mod engine;

pub use challenges::{ChallengeError, ChallengeTracker, NoChallenges};
pub use engine::RankProgressionEngine;
