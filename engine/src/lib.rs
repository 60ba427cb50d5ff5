//! Battle Engine Core - Rust Engine
//!
//! Ledger-embedded, turn-based wrestling battle engine with deterministic
//! execution: matchmaking, per-turn move resolution, and outcome settlement
//! (bets, experience, rating).
//!
//! # Architecture
//!
//! - **core**: Ledger time, call context, tunable parameters
//! - **models**: Domain types (Wrestler, Item, Account, Battle)
//! - **matchmaking**: Queue manager, match scoring, versus challenges, bots
//! - **preparation**: Match setup (stat derivation, bet equalization)
//! - **resolution**: The per-turn resolution pipeline
//! - **settlement**: Terminal payout, ELO rating, progression
//! - **orchestrator**: The exposed call surface (`BattleEngine`)
//! - **rng**: Deterministic random number generation
//! - **external**: Narrow traits for the hosting ledger
//!
//! # Critical Invariants
//!
//! 1. All token amounts are i64 (minimal units)
//! 2. All randomness is deterministic (seeded from the transaction hash)
//! 3. Resolution never reads wall-clock time or touches floating point

// Module declarations
pub mod core;
pub mod events;
pub mod external;
pub mod matchmaking;
pub mod models;
pub mod orchestrator;
pub mod preparation;
pub mod resolution;
pub mod rng;
pub mod settlement;

// Re-exports for convenience
pub use crate::core::{clock::LedgerClock, context::CallContext, params::EngineParams};
pub use events::{EngineEvent, EventLog};
pub use external::{
    EventSink, InMemoryLedger, InMemoryStore, LedgerError, ObjectStore, RecordingSink,
    StaticWitnessSet, StoreError, TokenLedger, TrustingWitnessSet, WitnessSet,
};
pub use models::{
    account::{Account, AccountError, ModeRecord, QueueTicket, Trophies},
    battle::{
        Battle, BattleCounters, BattleError, BattleMode, BattleSide, BattleState, FighterState,
        SideIndex, Stance, StatusFlags,
    },
    item::{Item, ItemEffect, ItemFlags, ItemKind, ItemLocation},
    wrestler::{Location, TrainingBoosts, Wrestler, WrestlerError},
};
pub use orchestrator::{BattleEngine, EngineError};
pub use resolution::moves::{slot_move, MoveClass, MoveKind};
pub use rng::TurnRng;
