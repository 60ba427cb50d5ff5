//! Event logging for replay and off-chain indexing.
//!
//! Every significant state change emits one typed event. Events enable:
//! - Deterministic replay (identical call sequences yield identical logs)
//! - Auditing (verify payouts and rating changes)
//! - Off-chain indexing (the notification sink forwards them fire-and-forget)
//!
//! # Event Types
//!
//! Events are categorized by engine phase:
//! - **Queue**: join / leave / challenge lifecycle
//! - **Preparation**: match creation
//! - **Resolution**: committed moves, resolved turns
//! - **Settlement**: terminal payouts, rating and trophy changes
//!
//! # Example
//!
//! ```rust
//! use battle_engine_core_rs::EngineEvent;
//!
//! let event = EngineEvent::QueueJoined {
//!     time: 100,
//!     account: "alice".to_string(),
//!     mode: "ranked".to_string(),
//!     bet: 5_000,
//! };
//! assert_eq!(event.time(), 100);
//! ```

use serde::{Deserialize, Serialize};

use crate::models::battle::BattleState;
use crate::resolution::context::TurnEvent;

/// Engine event capturing a state change.
///
/// All events include the ledger timestamp for temporal ordering. Events are
/// logged in the order they occur within a call.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum EngineEvent {
    /// Account entered the matchmaker queue (or issued a versus challenge)
    QueueJoined {
        time: u64,
        account: String,
        mode: String,
        bet: i64,
    },

    /// Account left the queue (cancel or eviction); escrow refunded
    QueueLeft {
        time: u64,
        account: String,
        refunded: i64,
        reason: String,
    },

    /// Versus challenge recorded against a target
    ChallengeIssued {
        time: u64,
        challenger: String,
        target: String,
        bet: i64,
    },

    /// Two participants were paired and a battle record created
    MatchPrepared {
        time: u64,
        battle_id: u64,
        side_a: String,
        side_b: String,
        mode: String,
        bet: i64,
    },

    /// One side committed a move for a turn (rendezvous not yet complete)
    MoveCommitted {
        time: u64,
        battle_id: u64,
        turn: u32,
        account: String,
    },

    /// Both moves present: the turn resolved
    TurnResolved {
        time: u64,
        battle_id: u64,
        turn: u32,
        events: Vec<TurnEvent>,
    },

    /// Battle reached a terminal state
    BattleEnded {
        time: u64,
        battle_id: u64,
        state: BattleState,
    },

    /// Stakes paid out on a terminal state
    PayoutSettled {
        time: u64,
        battle_id: u64,
        winner_amount: i64,
        loser_amount: i64,
        pot_amount: i64,
    },

    /// ELO rating changed for one account
    RatingChanged {
        time: u64,
        account: String,
        old_rating: i32,
        new_rating: i32,
    },

    /// One-time trophy granted
    TrophyGranted {
        time: u64,
        account: String,
        trophy: String,
    },

    /// A stale battle was detected and force-cancelled on read
    BattleBroken {
        time: u64,
        battle_id: u64,
        idle_secs: u64,
    },
}

impl EngineEvent {
    /// Ledger timestamp the event was emitted at
    pub fn time(&self) -> u64 {
        match self {
            EngineEvent::QueueJoined { time, .. }
            | EngineEvent::QueueLeft { time, .. }
            | EngineEvent::ChallengeIssued { time, .. }
            | EngineEvent::MatchPrepared { time, .. }
            | EngineEvent::MoveCommitted { time, .. }
            | EngineEvent::TurnResolved { time, .. }
            | EngineEvent::BattleEnded { time, .. }
            | EngineEvent::PayoutSettled { time, .. }
            | EngineEvent::RatingChanged { time, .. }
            | EngineEvent::TrophyGranted { time, .. }
            | EngineEvent::BattleBroken { time, .. } => *time,
        }
    }
}

/// Append-only event log
///
/// # Example
/// ```
/// use battle_engine_core_rs::{EngineEvent, EventLog};
///
/// let mut log = EventLog::new();
/// log.push(EngineEvent::QueueJoined {
///     time: 5,
///     account: "alice".to_string(),
///     mode: "unranked".to_string(),
///     bet: 100,
/// });
/// assert_eq!(log.len(), 1);
/// ```
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct EventLog {
    events: Vec<EngineEvent>,
}

impl EventLog {
    pub fn new() -> Self {
        Self { events: Vec::new() }
    }

    pub fn push(&mut self, event: EngineEvent) {
        self.events.push(event);
    }

    pub fn len(&self) -> usize {
        self.events.len()
    }

    pub fn is_empty(&self) -> bool {
        self.events.is_empty()
    }

    pub fn events(&self) -> &[EngineEvent] {
        &self.events
    }

    /// Events at or after a given ledger time (for incremental indexing)
    pub fn since(&self, time: u64) -> impl Iterator<Item = &EngineEvent> {
        self.events.iter().filter(move |e| e.time() >= time)
    }
}
