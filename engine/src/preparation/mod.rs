//! Battle preparation
//!
//! Turns two matched contenders into an Active battle record: stat
//! derivation, item snapshots, the rigged-glove cross-wiring, start-of-match
//! boosts and curses, and bet equalization. The function is pure over its
//! inputs; the orchestrator loads the records, calls in, and persists what
//! comes back.

use serde::{Deserialize, Serialize};

use crate::models::battle::{
    Battle, BattleMode, BattleSide, FighterState, ItemSnapshot, Stance, StatusFlags, MAX_TEAM_SIZE,
};
use crate::models::item::{Item, ItemEffect};
use crate::models::wrestler::{Location, Wrestler};

/// One matched participant, records already loaded
#[derive(Debug, Clone)]
pub struct Contender {
    pub address: String,
    /// Escrowed stake (pre-equalization)
    pub bet: i64,
    pub wrestlers: Vec<Wrestler>,
    /// Equipped item per wrestler, same order
    pub items: Vec<Option<Item>>,
}

/// Result of preparation: the battle plus per-side writebacks
#[derive(Debug, Clone)]
pub struct PreparedMatch {
    pub battle: Battle,
    pub sides: [PreparedSide; 2],
}

/// What must be persisted for one side after preparation
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PreparedSide {
    pub address: String,
    /// Excess stake to hand back to the over-staker
    pub refund: i64,
    /// Wrestlers with `location` moved to the new battle
    pub wrestlers: Vec<Wrestler>,
}

/// Build an Active battle from two matched contenders
///
/// The smaller stake becomes the match bet; the difference lands in the
/// over-staker's `refund`. Both sides' wrestlers come back with
/// `location = Battle(battle_id)`.
pub fn prepare_match(
    battle_id: u64,
    mode: BattleMode,
    a: Contender,
    b: Contender,
    now: u64,
) -> PreparedMatch {
    assert!(
        !a.wrestlers.is_empty() && a.wrestlers.len() <= MAX_TEAM_SIZE,
        "side A team size"
    );
    assert!(
        !b.wrestlers.is_empty() && b.wrestlers.len() <= MAX_TEAM_SIZE,
        "side B team size"
    );

    let bet = a.bet.min(b.bet);
    let refund_a = a.bet - bet;
    let refund_b = b.bet - bet;

    let mut snapshots_a = item_snapshots(&a.items);
    let mut snapshots_b = item_snapshots(&b.items);
    cross_wire(&mut snapshots_a, &mut snapshots_b);

    let mut fighters_a = build_fighters(&a.wrestlers, &snapshots_a);
    let mut fighters_b = build_fighters(&b.wrestlers, &snapshots_b);
    apply_side_boosts(&mut fighters_a);
    apply_side_boosts(&mut fighters_b);
    apply_start_curses(&mut fighters_a, &mut fighters_b);

    let side_a = BattleSide {
        address: a.address.clone(),
        fighters: fighters_a,
        active: 0,
        move_choice: None,
        turn: 1,
        auto: false,
        prev_damage: 0,
        prev_recover: 0,
    };
    let side_b = BattleSide {
        address: b.address.clone(),
        fighters: fighters_b,
        active: 0,
        move_choice: None,
        turn: 1,
        auto: false,
        prev_damage: 0,
        prev_recover: 0,
    };

    let battle = Battle::new(battle_id, mode, bet, now, [side_a, side_b]);

    let relocate = |mut wrestlers: Vec<Wrestler>| -> Vec<Wrestler> {
        for w in wrestlers.iter_mut() {
            w.set_location(Location::Battle { battle_id });
        }
        wrestlers
    };

    PreparedMatch {
        battle,
        sides: [
            PreparedSide {
                address: a.address,
                refund: refund_a,
                wrestlers: relocate(a.wrestlers),
            },
            PreparedSide {
                address: b.address,
                refund: refund_b,
                wrestlers: relocate(b.wrestlers),
            },
        ],
    }
}

/// Active effect snapshots, one slot per wrestler
fn item_snapshots(items: &[Option<Item>]) -> Vec<Option<ItemSnapshot>> {
    items
        .iter()
        .map(|slot| {
            slot.as_ref().and_then(|item| {
                item.active_effect().map(|effect| ItemSnapshot {
                    item_id: item.id(),
                    effect,
                })
            })
        })
        .collect()
}

/// RiggedGlove swaps the lead fighters' items unless the victim side holds
/// insulated boots anywhere
fn cross_wire(a: &mut [Option<ItemSnapshot>], b: &mut [Option<ItemSnapshot>]) {
    let holds = |side: &[Option<ItemSnapshot>], effect: ItemEffect| {
        side.iter()
            .any(|s| s.map(|snap| snap.effect) == Some(effect))
    };
    let a_swaps = holds(a, ItemEffect::SwapItems) && !holds(b, ItemEffect::NullifySwap);
    let b_swaps = holds(b, ItemEffect::SwapItems) && !holds(a, ItemEffect::NullifySwap);
    // Two gloves cancel out; one glove trades the lead slots
    if a_swaps != b_swaps {
        std::mem::swap(&mut a[0], &mut b[0]);
    }
}

fn build_fighters(
    wrestlers: &[Wrestler],
    snapshots: &[Option<ItemSnapshot>],
) -> Vec<FighterState> {
    wrestlers
        .iter()
        .zip(snapshots.iter())
        .map(|(w, snapshot)| {
            let stance = match snapshot.map(|s| s.effect) {
                Some(ItemEffect::ForceStance(stance)) => stance,
                _ => Stance::Main,
            };
            FighterState {
                wrestler_id: w.id(),
                stamina: w.max_stamina(),
                max_stamina: w.max_stamina(),
                base_attack: w.attack(),
                base_defense: w.defense(),
                attack_boost_pct: 0,
                defense_boost_pct: 0,
                status: StatusFlags::empty(),
                stance,
                last_move: None,
                disabled_move: None,
                rigged_move: None,
                learned_move: None,
                item: *snapshot,
            }
        })
        .collect()
}

/// Start-of-match stat boosts from instruments
///
/// A non-stacking boost applies only once per side; the Maracas/Bongos
/// stacking pair held across the side amplifies both by half again.
fn apply_side_boosts(fighters: &mut [FighterState]) {
    let effects: Vec<ItemEffect> = fighters
        .iter()
        .filter_map(|f| f.item.map(|s| s.effect))
        .collect();
    let has_stacking_pair = effects
        .iter()
        .any(|e| matches!(e, ItemEffect::AttackBoost { stacks: true, .. }))
        && effects
            .iter()
            .any(|e| matches!(e, ItemEffect::DefenseBoost { stacks: true, .. }));

    for fighter in fighters.iter_mut() {
        let Some(snapshot) = fighter.item else { continue };
        match snapshot.effect {
            ItemEffect::AttackBoost { pct, stacks } => {
                let pct = if stacks && has_stacking_pair {
                    pct * 3 / 2
                } else {
                    pct
                };
                fighter.attack_boost_pct += pct;
            }
            ItemEffect::DefenseBoost { pct, stacks } => {
                let pct = if stacks && has_stacking_pair {
                    pct * 3 / 2
                } else {
                    pct
                };
                fighter.defense_boost_pct += pct;
            }
            _ => {}
        }
    }
}

/// CursedDoll curses the opposing lead fighter before turn 1
fn apply_start_curses(a: &mut [FighterState], b: &mut [FighterState]) {
    let holds_curse = |side: &[FighterState]| {
        side.iter()
            .any(|f| f.item.map(|s| s.effect) == Some(ItemEffect::StartCurse))
    };
    if holds_curse(a) {
        b[0].status.insert(StatusFlags::CURSED);
    }
    if holds_curse(b) {
        a[0].status.insert(StatusFlags::CURSED);
    }
}
