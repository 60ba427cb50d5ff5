//! Matchmaking
//!
//! The matchmaker set, versus challenges, pair scoring and bot opponents.
//! Everything here is pure over plain data; escrow, mojo spending and
//! account mutation stay with the orchestrator so a failed precondition
//! never leaves partial state behind.

pub mod bots;
pub mod queue;
pub mod score;

pub use bots::{bot_choose_slot, BotProfile};
pub use queue::{Challenge, Matchmaker};
pub use score::{find_match, match_score, Candidate};
