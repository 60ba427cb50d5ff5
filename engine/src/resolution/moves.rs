//! Move registry
//!
//! Every move maps to a [`MoveSpec`] in one static table: class, base power,
//! and an optional pure conditioner function adjusting power from the
//! situational inputs (turn parity, stamina thresholds, charge counters,
//! equipped item). Each conditioner is testable in isolation; the pipeline
//! never switches on move kinds for power.
//!
//! Stances change what a wrestler's move slots resolve to; the grid lives in
//! [`slot_move`]. `Idle` and `Flinch` are not slot-reachable: the engine
//! force-submits `Idle` on timeout and substitution produces `Flinch`.

use serde::{Deserialize, Serialize};

use crate::models::battle::Stance;

/// Number of selectable move slots per stance
pub const MOVE_SLOTS: u8 = 8;

/// Closed enumeration of moves
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
#[repr(usize)]
pub enum MoveKind {
    Idle,
    Forfeit,
    Flinch,
    Strike,
    Slam,
    Grapple,
    Block,
    Dodge,
    Counter,
    AntiCounter,
    Taunt,
    Focus,
    Drink,
    Recover,
    PoisonMist,
    Bite,
    FireBreath,
    Copycat,
    GorillaPress,
    Tornado,
    ClownSlap,
    ThrillerKick,
    Voodoo,
    StanceDance,
}

/// Broad move category driving the interaction phase
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum MoveClass {
    /// Deals direct damage
    Attack,
    /// Halves incoming direct damage
    Guard,
    /// Zeroes incoming direct damage from non-piercing moves
    Evade,
    /// Reflects or negates depending on the opposing move
    CounterClass,
    /// Inflicts or cures a status, or shifts a boost
    Effect,
    /// Restores stamina
    Heal,
    /// No combat interaction (Idle, Forfeit, StanceDance)
    Utility,
}

/// Situational inputs a power conditioner may read
#[derive(Debug, Clone, Copy)]
pub struct PowerInputs {
    pub turn: u32,
    pub stamina: u32,
    pub max_stamina: u32,
    pub charge: u8,
    pub gorilla_charge: u8,
    pub drink: u8,
    pub has_item: bool,
}

/// One entry of the move table
#[derive(Debug, Clone, Copy)]
pub struct MoveSpec {
    pub kind: MoveKind,
    pub class: MoveClass,
    pub base_power: u32,
    /// Evasion does not apply to this move
    pub pierces_dodge: bool,
    /// Pure function adjusting base power from situational inputs
    pub conditioner: Option<fn(u32, &PowerInputs) -> u32>,
}

// --- conditioners -----------------------------------------------------------

/// Strike swings harder on even turns
fn strike_parity(base: u32, inputs: &PowerInputs) -> u32 {
    if inputs.turn % 2 == 0 {
        base + 10
    } else {
        base
    }
}

/// Slam doubles down when the attacker is under half stamina
fn slam_desperation(base: u32, inputs: &PowerInputs) -> u32 {
    if inputs.stamina * 2 <= inputs.max_stamina {
        base + 25
    } else {
        base
    }
}

/// GorillaPress charges on first use, unleashes on the next
fn gorilla_unleash(base: u32, inputs: &PowerInputs) -> u32 {
    if inputs.gorilla_charge > 0 {
        base
    } else {
        0
    }
}

/// Tornado spins harder with something to throw
fn tornado_item(base: u32, inputs: &PowerInputs) -> u32 {
    if inputs.has_item {
        base + 20
    } else {
        base
    }
}

/// ThrillerKick feeds on the drink counter
fn thriller_drink(base: u32, inputs: &PowerInputs) -> u32 {
    base + 5 * inputs.drink as u32
}

// --- the table --------------------------------------------------------------

macro_rules! mv {
    ($kind:ident, $class:ident, $power:expr) => {
        MoveSpec {
            kind: MoveKind::$kind,
            class: MoveClass::$class,
            base_power: $power,
            pierces_dodge: false,
            conditioner: None,
        }
    };
    ($kind:ident, $class:ident, $power:expr, pierce) => {
        MoveSpec {
            kind: MoveKind::$kind,
            class: MoveClass::$class,
            base_power: $power,
            pierces_dodge: true,
            conditioner: None,
        }
    };
    ($kind:ident, $class:ident, $power:expr, $cond:expr) => {
        MoveSpec {
            kind: MoveKind::$kind,
            class: MoveClass::$class,
            base_power: $power,
            pierces_dodge: false,
            conditioner: Some($cond),
        }
    };
    ($kind:ident, $class:ident, $power:expr, $cond:expr, pierce) => {
        MoveSpec {
            kind: MoveKind::$kind,
            class: MoveClass::$class,
            base_power: $power,
            pierces_dodge: true,
            conditioner: Some($cond),
        }
    };
}

/// Static move table, indexed by `MoveKind` discriminant
static MOVE_TABLE: &[MoveSpec] = &[
    mv!(Idle, Utility, 0),
    mv!(Forfeit, Utility, 0),
    mv!(Flinch, Utility, 0),
    mv!(Strike, Attack, 30, strike_parity),
    mv!(Slam, Attack, 40, slam_desperation),
    mv!(Grapple, Attack, 35),
    mv!(Block, Guard, 0),
    mv!(Dodge, Evade, 0),
    mv!(Counter, CounterClass, 0),
    mv!(AntiCounter, CounterClass, 25),
    mv!(Taunt, Effect, 0),
    mv!(Focus, Effect, 0),
    mv!(Drink, Effect, 0),
    mv!(Recover, Heal, 0),
    mv!(PoisonMist, Effect, 10),
    mv!(Bite, Attack, 20),
    mv!(FireBreath, Attack, 25),
    mv!(Copycat, Utility, 0),
    mv!(GorillaPress, Attack, 90, gorilla_unleash, pierce),
    mv!(Tornado, Attack, 50, tornado_item),
    mv!(ClownSlap, Attack, 25),
    mv!(ThrillerKick, Attack, 45, thriller_drink, pierce),
    mv!(Voodoo, Effect, 0),
    mv!(StanceDance, Utility, 0),
];

/// Look up the spec for a move
pub fn spec(kind: MoveKind) -> &'static MoveSpec {
    let entry = &MOVE_TABLE[kind as usize];
    debug_assert_eq!(entry.kind, kind, "move table out of order");
    entry
}

impl MoveKind {
    pub fn class(&self) -> MoveClass {
        spec(*self).class
    }

    pub fn is_attack(&self) -> bool {
        matches!(self.class(), MoveClass::Attack)
    }

    /// Moves whose effect depends on a held item
    pub fn needs_item(&self) -> bool {
        matches!(self, MoveKind::Tornado)
    }

    /// Base power after the conditioner, if any
    pub fn power(&self, inputs: &PowerInputs) -> u32 {
        let s = spec(*self);
        match s.conditioner {
            Some(f) => f(s.base_power, inputs),
            None => s.base_power,
        }
    }
}

/// Resolve a move slot under a stance
///
/// # Example
/// ```
/// use battle_engine_core_rs::{slot_move, MoveKind, Stance};
///
/// assert_eq!(slot_move(Stance::Main, 0), Some(MoveKind::Strike));
/// assert_eq!(slot_move(Stance::Zombie, 0), Some(MoveKind::Bite));
/// assert_eq!(slot_move(Stance::Main, 42), None);
/// ```
pub fn slot_move(stance: Stance, slot: u8) -> Option<MoveKind> {
    use MoveKind::*;
    const GRID: [[MoveKind; MOVE_SLOTS as usize]; 5] = [
        // Main
        [Strike, Slam, Block, Counter, Taunt, Focus, StanceDance, Forfeit],
        // Alternative
        [Strike, GorillaPress, Dodge, AntiCounter, Drink, Tornado, StanceDance, Forfeit],
        // Bizarre
        [Strike, PoisonMist, Voodoo, Copycat, Bite, FireBreath, StanceDance, Forfeit],
        // Clown
        [ClownSlap, Grapple, Dodge, Taunt, Drink, Recover, StanceDance, Forfeit],
        // Zombie
        [Bite, ThrillerKick, Block, Counter, PoisonMist, Recover, StanceDance, Forfeit],
    ];
    if slot >= MOVE_SLOTS {
        return None;
    }
    let row = match stance {
        Stance::Main => 0,
        Stance::Alternative => 1,
        Stance::Bizarre => 2,
        Stance::Clown => 3,
        Stance::Zombie => 4,
    };
    Some(GRID[row][slot as usize])
}

/// The stance StanceDance shifts into
pub fn next_stance(current: Stance) -> Stance {
    match current {
        Stance::Main => Stance::Alternative,
        Stance::Alternative => Stance::Bizarre,
        Stance::Bizarre => Stance::Main,
        // Item-forced stances return to Main
        Stance::Clown | Stance::Zombie => Stance::Main,
    }
}
