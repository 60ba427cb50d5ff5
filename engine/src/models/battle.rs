//! Battle model
//!
//! A battle is two sides, a turn counter and a state machine. The two
//! participants submit moves via independent calls: the first arrival only
//! records a commitment, the second triggers resolution. That rendezvous is
//! expressed here as the `turn` field on each side — both sides equal to the
//! battle turn means "resolve now".
//!
//! # Critical Invariants
//!
//! 1. The two sides' `turn` fields differ by at most 1 while Active
//! 2. Once a move is committed for a turn it cannot be changed
//! 3. All non-Active states are terminal; Settlement is the only writer of
//!    account ratings and wrestler experience/location-release

use bitflags::bitflags;
use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::models::item::ItemEffect;
use crate::resolution::moves::MoveKind;

/// Maximum fighters per side (tag teams)
pub const MAX_TEAM_SIZE: usize = 2;

/// Errors that can occur when mutating a battle record
#[derive(Debug, Error, PartialEq, Eq)]
pub enum BattleError {
    #[error("Battle {0} is not active")]
    NotActive(u64),

    #[error("{address} is not a participant of battle {battle_id}")]
    NotParticipant { battle_id: u64, address: String },

    #[error("Wrong turn: side is at turn {expected}, submission was for {got}")]
    WrongTurn { expected: u32, got: u32 },

    #[error("Move already committed for turn {turn}")]
    MoveAlreadyCommitted { turn: u32 },

    #[error("Invalid move slot {0}")]
    InvalidSlot(u8),
}

/// Battle-scoped mode switch changing what a wrestler's move slots resolve to
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Stance {
    #[default]
    Main,
    Alternative,
    Bizarre,
    Clown,
    Zombie,
}

/// Match mode
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum BattleMode {
    /// Matchmade, fixed fee, rated, max level required
    Ranked,
    /// Matchmade, free stake, rated
    Unranked,
    /// Direct challenge against a chosen opponent
    Versus,
    /// Instant match against a synthetic bot, no bet
    Practice,
}

impl BattleMode {
    /// Modes fed by the global matchmaker set (and therefore ELO-rated)
    pub fn is_matchmade(&self) -> bool {
        matches!(self, BattleMode::Ranked | BattleMode::Unranked)
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            BattleMode::Ranked => "ranked",
            BattleMode::Unranked => "unranked",
            BattleMode::Versus => "versus",
            BattleMode::Practice => "practice",
        }
    }
}

/// Battle lifecycle; everything but `Active` is terminal
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum BattleState {
    Active,
    WinA,
    WinB,
    ForfeitA,
    ForfeitB,
    Draw,
    Cancelled,
}

impl BattleState {
    pub fn is_terminal(&self) -> bool {
        !matches!(self, BattleState::Active)
    }

    /// Winning side, if the state names one
    pub fn winner(&self) -> Option<SideIndex> {
        match self {
            BattleState::WinA | BattleState::ForfeitB => Some(SideIndex::A),
            BattleState::WinB | BattleState::ForfeitA => Some(SideIndex::B),
            _ => None,
        }
    }
}

/// One of the two sides of a battle
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum SideIndex {
    A,
    B,
}

impl SideIndex {
    pub fn opponent(&self) -> SideIndex {
        match self {
            SideIndex::A => SideIndex::B,
            SideIndex::B => SideIndex::A,
        }
    }

    pub fn as_usize(&self) -> usize {
        match self {
            SideIndex::A => 0,
            SideIndex::B => 1,
        }
    }
}

bitflags! {
    /// Status conditions on a fighter; several may be active at once
    #[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
    pub struct StatusFlags: u16 {
        /// Must attack; cannot pick guard/utility moves
        const TAUNTED  = 1 << 0;
        /// Repeating the previous move forces a Flinch
        const CURSED   = 1 << 1;
        /// Moves may swap to a random neighbor slot
        const DRUNK    = 1 << 2;
        /// Direct damage may be redirected onto the attacker
        const CONFUSED = 1 << 3;
        /// Loses a percentage of stamina per turn
        const BLEEDING = 1 << 4;
        /// Loses a percentage of stamina per turn
        const BURNING  = 1 << 5;
        /// Loses stamina per stack per turn
        const POISONED = 1 << 6;
    }
}

/// Item facts frozen into the battle at preparation
///
/// Resolution reads this snapshot, never the live item record; a consumable
/// triggering clears the snapshot for the rest of the battle.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct ItemSnapshot {
    pub item_id: u64,
    pub effect: ItemEffect,
}

/// Battle-scoped state of one wrestler
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FighterState {
    pub wrestler_id: u64,
    pub stamina: u32,
    pub max_stamina: u32,
    pub base_attack: u32,
    pub base_defense: u32,
    /// Additive percentage on base attack for the rest of the battle
    pub attack_boost_pct: u32,
    /// Additive percentage on base defense for the rest of the battle
    pub defense_boost_pct: u32,
    pub status: StatusFlags,
    pub stance: Stance,
    pub last_move: Option<MoveKind>,
    /// Move disabled by an opposing effect
    pub disabled_move: Option<MoveKind>,
    /// Move locked in by a choice item
    pub rigged_move: Option<MoveKind>,
    /// Move learned through Copycat
    pub learned_move: Option<MoveKind>,
    pub item: Option<ItemSnapshot>,
}

impl FighterState {
    pub fn is_down(&self) -> bool {
        self.stamina == 0
    }

    /// Current attack after boost
    pub fn current_attack(&self) -> u32 {
        self.base_attack * (100 + self.attack_boost_pct) / 100
    }

    /// Current defense after boost
    pub fn current_defense(&self) -> u32 {
        self.base_defense * (100 + self.defense_boost_pct) / 100
    }
}

/// One side of a battle: 1–2 fighters, a committed move, the turn cursor
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct BattleSide {
    /// Owning account address
    pub address: String,
    pub fighters: Vec<FighterState>,
    /// Index of the currently active fighter
    pub active: usize,
    /// Move committed for the current battle turn, if any
    pub move_choice: Option<MoveKind>,
    /// Number of turns this side has committed a move for
    pub turn: u32,
    /// Remaining turns are delegated to the bot heuristic
    pub auto: bool,
    /// Damage this side took in the previous resolved turn
    pub prev_damage: u32,
    /// Recovery this side received in the previous resolved turn
    pub prev_recover: u32,
}

impl BattleSide {
    pub fn active_fighter(&self) -> &FighterState {
        &self.fighters[self.active]
    }

    pub fn active_fighter_mut(&mut self) -> &mut FighterState {
        &mut self.fighters[self.active]
    }

    /// Side is defeated once every fighter is down
    pub fn is_defeated(&self) -> bool {
        self.fighters.iter().all(|f| f.is_down())
    }

    /// Bring in the next standing fighter after a knockout, if any
    pub fn rotate_active(&mut self) -> bool {
        if let Some(next) = self.fighters.iter().position(|f| !f.is_down()) {
            self.active = next;
            true
        } else {
            false
        }
    }
}

/// Per-battle counters, one named field per slot
///
/// These used to be an ad-hoc indexed array; naming each field removes the
/// magic indices and lets the type system guarantee the slot exists.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct BattleCounters {
    pub charge_a: u8,
    pub charge_b: u8,
    pub drink_a: u8,
    pub drink_b: u8,
    pub poison_stacks_a: u8,
    pub poison_stacks_b: u8,
    pub gorilla_charge_a: u8,
    pub gorilla_charge_b: u8,
}

impl BattleCounters {
    pub fn charge(&self, side: SideIndex) -> u8 {
        match side {
            SideIndex::A => self.charge_a,
            SideIndex::B => self.charge_b,
        }
    }

    pub fn charge_mut(&mut self, side: SideIndex) -> &mut u8 {
        match side {
            SideIndex::A => &mut self.charge_a,
            SideIndex::B => &mut self.charge_b,
        }
    }

    pub fn drink(&self, side: SideIndex) -> u8 {
        match side {
            SideIndex::A => self.drink_a,
            SideIndex::B => self.drink_b,
        }
    }

    pub fn drink_mut(&mut self, side: SideIndex) -> &mut u8 {
        match side {
            SideIndex::A => &mut self.drink_a,
            SideIndex::B => &mut self.drink_b,
        }
    }

    pub fn poison_stacks(&self, side: SideIndex) -> u8 {
        match side {
            SideIndex::A => self.poison_stacks_a,
            SideIndex::B => self.poison_stacks_b,
        }
    }

    pub fn poison_stacks_mut(&mut self, side: SideIndex) -> &mut u8 {
        match side {
            SideIndex::A => &mut self.poison_stacks_a,
            SideIndex::B => &mut self.poison_stacks_b,
        }
    }

    pub fn gorilla_charge(&self, side: SideIndex) -> u8 {
        match side {
            SideIndex::A => self.gorilla_charge_a,
            SideIndex::B => self.gorilla_charge_b,
        }
    }

    pub fn gorilla_charge_mut(&mut self, side: SideIndex) -> &mut u8 {
        match side {
            SideIndex::A => &mut self.gorilla_charge_a,
            SideIndex::B => &mut self.gorilla_charge_b,
        }
    }
}

/// A battle record
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Battle {
    id: u64,
    pub mode: BattleMode,
    /// Equalized match bet (per side)
    pub bet: i64,
    /// Current turn number, starting at 1
    pub turn: u32,
    pub state: BattleState,
    /// Ledger time of the last mutation
    pub time: u64,
    /// Hash of the transaction that resolved the previous turn
    pub last_turn_hash: [u8; 32],
    pub counters: BattleCounters,
    sides: [BattleSide; 2],
}

impl Battle {
    pub fn new(id: u64, mode: BattleMode, bet: i64, time: u64, sides: [BattleSide; 2]) -> Self {
        assert!(
            sides.iter().all(|s| {
                !s.fighters.is_empty() && s.fighters.len() <= MAX_TEAM_SIZE
            }),
            "each side needs 1..={} fighters",
            MAX_TEAM_SIZE
        );
        Self {
            id,
            mode,
            bet,
            turn: 1,
            state: BattleState::Active,
            time,
            last_turn_hash: [0u8; 32],
            counters: BattleCounters::default(),
            sides,
        }
    }

    pub fn id(&self) -> u64 {
        self.id
    }

    pub fn side(&self, ix: SideIndex) -> &BattleSide {
        &self.sides[ix.as_usize()]
    }

    pub fn side_mut(&mut self, ix: SideIndex) -> &mut BattleSide {
        &mut self.sides[ix.as_usize()]
    }

    /// Which side an address plays on, if any
    pub fn side_of(&self, address: &str) -> Option<SideIndex> {
        if self.sides[0].address == address {
            Some(SideIndex::A)
        } else if self.sides[1].address == address {
            Some(SideIndex::B)
        } else {
            None
        }
    }

    /// Take both sides out for the pipeline and put them back afterwards
    pub fn take_sides(&mut self) -> [BattleSide; 2] {
        let placeholder = |addr: &str| BattleSide {
            address: addr.to_string(),
            fighters: Vec::new(),
            active: 0,
            move_choice: None,
            turn: 0,
            auto: false,
            prev_damage: 0,
            prev_recover: 0,
        };
        let a = std::mem::replace(&mut self.sides[0], placeholder(""));
        let b = std::mem::replace(&mut self.sides[1], placeholder(""));
        [a, b]
    }

    pub fn put_sides(&mut self, sides: [BattleSide; 2]) {
        self.sides = sides;
    }

    /// Commit a move for one side
    ///
    /// The first arrival for a turn records a commitment; a second submission
    /// for the same turn is accepted only if it repeats the committed move.
    pub fn commit_move(
        &mut self,
        ix: SideIndex,
        turn: u32,
        mv: MoveKind,
    ) -> Result<(), BattleError> {
        if self.state.is_terminal() {
            return Err(BattleError::NotActive(self.id));
        }
        let battle_turn = self.turn;
        let side = self.side_mut(ix);
        if turn != battle_turn {
            return Err(BattleError::WrongTurn {
                expected: battle_turn,
                got: turn,
            });
        }
        match side.move_choice {
            None => {
                side.move_choice = Some(mv);
                side.turn = battle_turn;
                Ok(())
            }
            Some(existing) if existing == mv => Ok(()), // idempotent resubmission
            Some(_) => Err(BattleError::MoveAlreadyCommitted { turn }),
        }
    }

    /// Resolution fires only when both sides committed for the current turn
    pub fn both_committed(&self) -> bool {
        self.sides
            .iter()
            .all(|s| s.move_choice.is_some() && s.turn == self.turn)
    }

    /// Advance the battle to the next turn, clearing committed moves
    pub fn advance_turn(&mut self, time: u64, tx_hash: [u8; 32]) {
        debug_assert!(self.both_committed());
        for side in &mut self.sides {
            side.move_choice = None;
        }
        self.turn += 1;
        self.time = time;
        self.last_turn_hash = tx_hash;
    }

    /// Turn-sync invariant: sides' commit cursors never diverge by more
    /// than one
    pub fn check_turn_sync(&self) {
        let a = self.sides[0].turn;
        let b = self.sides[1].turn;
        assert!(a.abs_diff(b) <= 1, "side turns out of sync: {a} vs {b}");
    }
}
