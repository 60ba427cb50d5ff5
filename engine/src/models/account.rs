//! Account model
//!
//! Engine-side view of a player account: queue membership, battle reference,
//! rating, per-mode records, trophies. Ownership of wrestlers and tokens is
//! recorded externally; the account only holds battle-domain state.
//!
//! # Critical Invariant
//!
//! An account is never queued and in a battle at the same time:
//! `queue.is_some()` and `battle_id.is_some()` are mutually exclusive.

use bitflags::bitflags;
use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::models::battle::BattleMode;

/// Starting ELO rating
pub const DEFAULT_ELO: i32 = 1200;

/// Errors that can occur during account operations
#[derive(Debug, Error, PartialEq, Eq)]
pub enum AccountError {
    #[error("Account {0} is already queued")]
    AlreadyQueued(String),

    #[error("Account {0} is already in a battle")]
    AlreadyInBattle(String),

    #[error("Account {0} is not queued")]
    NotQueued(String),
}

bitflags! {
    /// One-time trophies
    #[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
    pub struct Trophies: u32 {
        /// Beat a max-level bot for the first time
        const BOT_LADDER_CLEAR = 1 << 0;
        /// Won a match while in Clown stance
        const CLOWN_WIN        = 1 << 1;
        /// Won on the very first resolved turn
        const ONE_HIT_KO       = 1 << 2;
    }
}

/// Win/loss/draw record for one mode
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct ModeRecord {
    pub wins: u32,
    pub losses: u32,
    pub draws: u32,
    /// Current win streak; resets on loss or draw
    pub streak: u32,
}

/// Pending matchmaking request held on the account while queued
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct QueueTicket {
    pub mode: BattleMode,
    /// Escrowed stake (equalized when the match is made)
    pub bet: i64,
    pub wrestler_ids: Vec<u64>,
    /// Ledger time the account joined the queue
    pub join_time: u64,
    /// Ledger time of the last UpdateQueue call (rate limiting)
    pub update_time: u64,
    /// Versus mode only: the challenged address
    pub versus_target: Option<String>,
}

/// A player account
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Account {
    address: String,
    pub elo: i32,
    queue: Option<QueueTicket>,
    battle_id: Option<u64>,
    pub ranked: ModeRecord,
    pub unranked: ModeRecord,
    pub versus: ModeRecord,
    pub practice: ModeRecord,
    pub trophies: Trophies,
    /// Referral linkage; never read by battle logic
    pub referrer: Option<String>,
    /// Opponent of the most recent finished match (rematch penalty)
    pub last_opponent: Option<String>,
    /// Highest bot level beaten in practice (trophy progress)
    pub bot_ladder_best: u32,
    /// Synthetic opponents are flagged so settlement can skip them
    pub is_bot: bool,
}

impl Account {
    pub fn new(address: &str) -> Self {
        Self {
            address: address.to_string(),
            elo: DEFAULT_ELO,
            queue: None,
            battle_id: None,
            ranked: ModeRecord::default(),
            unranked: ModeRecord::default(),
            versus: ModeRecord::default(),
            practice: ModeRecord::default(),
            trophies: Trophies::empty(),
            referrer: None,
            last_opponent: None,
            bot_ladder_best: 0,
            is_bot: false,
        }
    }

    pub fn new_bot(address: &str, elo: i32) -> Self {
        let mut account = Self::new(address);
        account.is_bot = true;
        account.elo = elo;
        account
    }

    pub fn address(&self) -> &str {
        &self.address
    }

    pub fn queue(&self) -> Option<&QueueTicket> {
        self.queue.as_ref()
    }

    pub fn queue_mut(&mut self) -> Option<&mut QueueTicket> {
        self.queue.as_mut()
    }

    pub fn battle_id(&self) -> Option<u64> {
        self.battle_id
    }

    /// Free to queue or be challenged: neither queued nor battling
    pub fn is_idle(&self) -> bool {
        self.queue.is_none() && self.battle_id.is_none()
    }

    /// Enter the queue; enforces the queued/battling exclusivity invariant
    pub fn enter_queue(&mut self, ticket: QueueTicket) -> Result<(), AccountError> {
        if self.queue.is_some() {
            return Err(AccountError::AlreadyQueued(self.address.clone()));
        }
        if self.battle_id.is_some() {
            return Err(AccountError::AlreadyInBattle(self.address.clone()));
        }
        self.queue = Some(ticket);
        Ok(())
    }

    /// Leave the queue, returning the ticket so escrow can be refunded
    pub fn leave_queue(&mut self) -> Result<QueueTicket, AccountError> {
        self.queue
            .take()
            .ok_or_else(|| AccountError::NotQueued(self.address.clone()))
    }

    /// Move from queued to battling (match preparation)
    pub fn enter_battle(&mut self, battle_id: u64) {
        assert!(
            self.battle_id.is_none(),
            "account {} already in battle",
            self.address
        );
        self.queue = None;
        self.battle_id = Some(battle_id);
    }

    /// Release the battle reference (settlement)
    pub fn leave_battle(&mut self) {
        self.battle_id = None;
    }

    pub fn record(&self, mode: BattleMode) -> &ModeRecord {
        match mode {
            BattleMode::Ranked => &self.ranked,
            BattleMode::Unranked => &self.unranked,
            BattleMode::Versus => &self.versus,
            BattleMode::Practice => &self.practice,
        }
    }

    pub fn record_mut(&mut self, mode: BattleMode) -> &mut ModeRecord {
        match mode {
            BattleMode::Ranked => &mut self.ranked,
            BattleMode::Unranked => &mut self.unranked,
            BattleMode::Versus => &mut self.versus,
            BattleMode::Practice => &mut self.practice,
        }
    }

    /// Grant a trophy once; returns true on first grant
    pub fn grant_trophy(&mut self, trophy: Trophies) -> bool {
        if self.trophies.contains(trophy) {
            false
        } else {
            self.trophies.insert(trophy);
            true
        }
    }
}
