//! Turn context
//!
//! All mutable state of one resolving turn, owned in a single value that the
//! pipeline phases take and return. Nothing in the pipeline aliases the
//! battle record; the orchestrator moves the sides in, runs the phases, and
//! moves the result back out.

use serde::{Deserialize, Serialize};

use crate::models::battle::{BattleCounters, BattleSide, SideIndex, Stance, StatusFlags};
use crate::resolution::moves::MoveKind;
use crate::rng::TurnRng;

/// Per-side working values for the turn being resolved
#[derive(Debug, Clone)]
pub struct SideWork {
    /// Move as committed
    pub chosen: MoveKind,
    /// Move after the substitution phase
    pub effective: MoveKind,
    /// Derived current attack (base × boost)
    pub attack: u32,
    /// Derived current defense (base × boost)
    pub defense: u32,
    /// Chance draw for this side's success checks, 0..100 plus item bonus
    pub chance: u32,
    /// Conditioned move power
    pub power: u32,
    /// Pending direct damage TO this side
    pub direct: u32,
    /// Pending indirect damage TO this side
    pub indirect: u32,
    /// Pending recovery FOR this side
    pub recover: u32,
    /// An item effect on this side activated this turn (shock-chip bait)
    pub item_activated: bool,
}

impl SideWork {
    pub fn new(chosen: MoveKind) -> Self {
        Self {
            chosen,
            effective: chosen,
            attack: 0,
            defense: 0,
            chance: 0,
            power: 0,
            direct: 0,
            indirect: 0,
            recover: 0,
            item_activated: false,
        }
    }
}

/// Everything one resolving turn owns
#[derive(Debug)]
pub struct TurnContext {
    pub battle_id: u64,
    pub turn: u32,
    pub sides: [BattleSide; 2],
    pub counters: BattleCounters,
    pub work: [SideWork; 2],
    pub rng: TurnRng,
    pub events: Vec<TurnEvent>,
}

impl TurnContext {
    /// Assemble the context; both sides must have a committed move.
    pub fn new(
        battle_id: u64,
        turn: u32,
        sides: [BattleSide; 2],
        counters: BattleCounters,
        rng: TurnRng,
    ) -> Self {
        let chosen_a = sides[0].move_choice.expect("side A move committed");
        let chosen_b = sides[1].move_choice.expect("side B move committed");
        Self {
            battle_id,
            turn,
            sides,
            counters,
            work: [SideWork::new(chosen_a), SideWork::new(chosen_b)],
            rng,
            events: Vec::new(),
        }
    }

    pub fn side(&self, ix: SideIndex) -> &BattleSide {
        &self.sides[ix.as_usize()]
    }

    pub fn side_mut(&mut self, ix: SideIndex) -> &mut BattleSide {
        &mut self.sides[ix.as_usize()]
    }

    pub fn work(&self, ix: SideIndex) -> &SideWork {
        &self.work[ix.as_usize()]
    }

    pub fn work_mut(&mut self, ix: SideIndex) -> &mut SideWork {
        &mut self.work[ix.as_usize()]
    }

    pub fn push(&mut self, event: TurnEvent) {
        self.events.push(event);
    }

    /// Drop the active fighter's item snapshot after a consumable triggered
    pub fn consume_item(&mut self, ix: SideIndex) {
        self.side_mut(ix).active_fighter_mut().item = None;
    }
}

/// Fine-grained record of what happened inside one resolved turn
///
/// Collected in order and published inside the `TurnResolved` engine event.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum TurnEvent {
    /// A status/item/stance effect replaced the chosen move
    Substituted {
        side: SideIndex,
        from: MoveKind,
        to: MoveKind,
    },

    /// An effect's own success check failed
    EffectMissed { side: SideIndex, mv: MoveKind },

    /// A stat boost took hold for the rest of the battle
    BoostApplied {
        side: SideIndex,
        attack_pct: u32,
        defense_pct: u32,
    },

    /// A status condition was inflicted on `side`
    StatusInflicted { side: SideIndex, status: StatusFlags },

    /// A status condition was cured on `side`
    StatusCured { side: SideIndex, status: StatusFlags },

    /// Direct damage dealt by `attacker`
    Hit {
        attacker: SideIndex,
        power: u32,
        damage: u32,
    },

    /// Counter flipped the attacker's power back
    Countered { side: SideIndex },

    /// Block halved the incoming damage
    Blocked { side: SideIndex },

    /// Dodge zeroed the incoming damage
    Dodged { side: SideIndex },

    /// Status tick or item side effect damage
    IndirectDamage {
        side: SideIndex,
        amount: u32,
        source: String,
    },

    /// Stamina restored
    Healed { side: SideIndex, amount: u32 },

    /// A death-prevention item left the fighter at 1 stamina
    DeathPrevented { side: SideIndex },

    /// An item effect activated
    ItemTriggered { side: SideIndex, item_id: u64 },

    /// Confusion or Voodoo moved pending damage around
    Redirected { from: SideIndex, to: SideIndex },

    /// Stance changed
    StanceChanged { side: SideIndex, stance: Stance },

    /// Active fighter went down
    Knockout { side: SideIndex, wrestler_id: u64 },

    /// A tag partner stepped in after a knockout
    FighterSwapped { side: SideIndex },

    /// Side forfeited
    Forfeited { side: SideIndex },
}
