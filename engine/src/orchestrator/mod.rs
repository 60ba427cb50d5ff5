//! The exposed call surface
//!
//! `BattleEngine` glues the pure components together: it validates each
//! incoming call, moves tokens, loads and persists records through the
//! object store, and emits events. Every operation is one synchronous,
//! all-or-nothing state transition.

pub mod engine;

pub use engine::{BattleEngine, EngineError};
