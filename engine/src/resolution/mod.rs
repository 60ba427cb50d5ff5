//! Turn Resolution Pipeline
//!
//! One resolved turn runs a strictly ordered sequence of phases over the two
//! sides symmetrically: move substitution, derived stats, pre-damage
//! effects, base power, move-vs-move interaction, damage modifiers, indirect
//! damage, recovery, redirection, stamina commit, bookkeeping, termination.
//!
//! The pipeline is pure given its inputs: battle sides, counters, the move
//! pair and a seeded random stream. It operates on an owned [`context::TurnContext`]
//! passed by value through each phase — no aliased shared state.

pub mod context;
pub mod moves;
pub mod pipeline;
pub mod substitution;

pub use context::{TurnContext, TurnEvent};
pub use pipeline::{resolve_turn, TurnOutcome};
