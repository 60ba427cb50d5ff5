//! Turn resolution pipeline (steps 2–12)
//!
//! Runs once both sides have committed a move for the same turn. Each phase
//! takes the owned [`TurnContext`] and returns it; the orchestrator moves
//! the battle's sides in and out around the whole run.
//!
//! Phase order is load-bearing and mirrors the (documented) resolution
//! contract: derived stats, pre-damage effects, base power, move-vs-move
//! interaction, damage modifiers, indirect damage, recovery, redirection,
//! stamina commit, bookkeeping, termination.

use crate::models::battle::{BattleCounters, BattleSide, BattleState, SideIndex, StatusFlags};
use crate::models::item::ItemEffect;
use crate::resolution::context::{TurnContext, TurnEvent};
use crate::resolution::moves::{next_stance, spec, MoveKind, PowerInputs};
use crate::resolution::substitution::substitute;

const SIDES: [SideIndex; 2] = [SideIndex::A, SideIndex::B];

/// Success thresholds (minimum chance draw) for pre-damage effects
const TAUNT_THRESHOLD: u32 = 25;
const FOCUS_THRESHOLD: u32 = 10;
const POISON_THRESHOLD: u32 = 20;
const BITE_THRESHOLD: u32 = 40;
const BURN_THRESHOLD: u32 = 40;
const CONFUSE_THRESHOLD: u32 = 50;
const VOODOO_CURSE_THRESHOLD: u32 = 35;

/// Chance (percent) a confused fighter's damage lands on itself
const CONFUSION_SELF_PCT: u32 = 33;

/// Maximum charge / drink / poison stack counters
const CHARGE_CAP: u8 = 3;
const DRINK_CAP: u8 = 5;
const POISON_STACK_CAP: u8 = 5;

/// Result of one resolved turn
#[derive(Debug)]
pub struct TurnOutcome {
    pub sides: [BattleSide; 2],
    pub counters: BattleCounters,
    pub state: BattleState,
    pub events: Vec<TurnEvent>,
}

/// Resolve one full turn
pub fn resolve_turn(mut ctx: TurnContext) -> TurnOutcome {
    // Forfeits bypass combat entirely
    let forfeit_a = ctx.work(SideIndex::A).chosen == MoveKind::Forfeit;
    let forfeit_b = ctx.work(SideIndex::B).chosen == MoveKind::Forfeit;
    if forfeit_a || forfeit_b {
        if forfeit_a {
            ctx.push(TurnEvent::Forfeited { side: SideIndex::A });
        }
        if forfeit_b {
            ctx.push(TurnEvent::Forfeited { side: SideIndex::B });
        }
        let state = match (forfeit_a, forfeit_b) {
            (true, true) => BattleState::Draw,
            (true, false) => BattleState::ForfeitA,
            (false, true) => BattleState::ForfeitB,
            (false, false) => unreachable!(),
        };
        return TurnOutcome {
            sides: ctx.sides,
            counters: ctx.counters,
            state,
            events: ctx.events,
        };
    }

    // Step 1: move substitution, side A first (fixed order keeps the RNG
    // stream identical on every replica)
    substitute(&mut ctx, SideIndex::A);
    substitute(&mut ctx, SideIndex::B);

    let ctx = derived_stats(ctx);
    let ctx = pre_damage_effects(ctx);
    let ctx = base_power(ctx);
    let ctx = interaction(ctx);
    let ctx = damage_modifiers(ctx);
    let ctx = indirect_damage(ctx);
    let ctx = recovery(ctx);
    let ctx = redirection(ctx);
    let ctx = commit_stamina(ctx);
    let ctx = bookkeeping(ctx);

    let state = termination(&ctx);
    TurnOutcome {
        sides: ctx.sides,
        counters: ctx.counters,
        state,
        events: ctx.events,
    }
}

/// Step 2: per-side derived stats and the turn's chance draws
fn derived_stats(mut ctx: TurnContext) -> TurnContext {
    for ix in SIDES {
        let fighter = ctx.side(ix).active_fighter().clone();
        let mut attack = fighter.current_attack();
        let defense = fighter.current_defense();
        let mut chance_bonus = 0;
        if let Some(snapshot) = fighter.item {
            match snapshot.effect {
                ItemEffect::ChoiceLock { attack_pct } => {
                    attack = attack * (100 + attack_pct) / 100;
                }
                ItemEffect::Spiked { attack_pct, .. } => {
                    attack = attack * (100 + attack_pct) / 100;
                }
                ItemEffect::ChanceBonus(bonus) => chance_bonus = bonus,
                _ => {}
            }
        }
        let roll = ctx.rng.roll(100);
        let work = ctx.work_mut(ix);
        work.attack = attack;
        work.defense = defense;
        work.chance = roll + chance_bonus;
    }
    ctx
}

/// Step 3: stat buffs/debuffs, cures, status infliction
///
/// Every mutation records an event; a failed success check records a miss.
fn pre_damage_effects(mut ctx: TurnContext) -> TurnContext {
    for ix in SIDES {
        let opp = ix.opponent();
        let effective = ctx.work(ix).effective;
        let chance = ctx.work(ix).chance;
        match effective {
            MoveKind::Taunt => {
                if chance >= TAUNT_THRESHOLD {
                    inflict(&mut ctx, opp, StatusFlags::TAUNTED);
                } else {
                    ctx.push(TurnEvent::EffectMissed { side: ix, mv: effective });
                }
            }
            MoveKind::Focus => {
                if chance >= FOCUS_THRESHOLD {
                    ctx.side_mut(ix).active_fighter_mut().attack_boost_pct += 10;
                    let charge = ctx.counters.charge_mut(ix);
                    *charge = (*charge + 1).min(CHARGE_CAP);
                    ctx.push(TurnEvent::BoostApplied {
                        side: ix,
                        attack_pct: 10,
                        defense_pct: 0,
                    });
                } else {
                    ctx.push(TurnEvent::EffectMissed { side: ix, mv: effective });
                }
            }
            MoveKind::Drink => {
                let drink = ctx.counters.drink_mut(ix);
                *drink = (*drink + 1).min(DRINK_CAP);
                let drinks = *drink;
                let fighter = ctx.side_mut(ix).active_fighter_mut();
                if fighter.status.contains(StatusFlags::BURNING) {
                    fighter.status.remove(StatusFlags::BURNING);
                    ctx.push(TurnEvent::StatusCured {
                        side: ix,
                        status: StatusFlags::BURNING,
                    });
                }
                if drinks >= 2 {
                    inflict(&mut ctx, ix, StatusFlags::DRUNK);
                }
            }
            MoveKind::Recover => {
                let cured = StatusFlags::BLEEDING | StatusFlags::POISONED;
                let fighter = ctx.side_mut(ix).active_fighter_mut();
                let present = fighter.status & cured;
                if !present.is_empty() {
                    fighter.status.remove(cured);
                    *ctx.counters.poison_stacks_mut(ix) = 0;
                    ctx.push(TurnEvent::StatusCured {
                        side: ix,
                        status: present,
                    });
                }
            }
            MoveKind::PoisonMist => {
                if chance >= POISON_THRESHOLD {
                    let stacks = ctx.counters.poison_stacks_mut(opp);
                    *stacks = (*stacks + 1).min(POISON_STACK_CAP);
                    inflict(&mut ctx, opp, StatusFlags::POISONED);
                } else {
                    ctx.push(TurnEvent::EffectMissed { side: ix, mv: effective });
                }
            }
            MoveKind::Bite => {
                if chance >= BITE_THRESHOLD {
                    inflict(&mut ctx, opp, StatusFlags::BLEEDING);
                } else {
                    ctx.push(TurnEvent::EffectMissed { side: ix, mv: effective });
                }
            }
            MoveKind::FireBreath => {
                if chance >= BURN_THRESHOLD {
                    inflict(&mut ctx, opp, StatusFlags::BURNING);
                } else {
                    ctx.push(TurnEvent::EffectMissed { side: ix, mv: effective });
                }
            }
            MoveKind::ClownSlap => {
                if chance >= CONFUSE_THRESHOLD {
                    inflict(&mut ctx, opp, StatusFlags::CONFUSED);
                } else {
                    ctx.push(TurnEvent::EffectMissed { side: ix, mv: effective });
                }
            }
            MoveKind::Voodoo => {
                if chance >= VOODOO_CURSE_THRESHOLD {
                    inflict(&mut ctx, opp, StatusFlags::CURSED);
                } else {
                    ctx.push(TurnEvent::EffectMissed { side: ix, mv: effective });
                }
            }
            MoveKind::StanceDance => {
                let fighter = ctx.side_mut(ix).active_fighter_mut();
                let stance = next_stance(fighter.stance);
                fighter.stance = stance;
                ctx.push(TurnEvent::StanceChanged { side: ix, stance });
            }
            MoveKind::GorillaPress => {
                // First use charges; the unleash is handled through power
                if ctx.counters.gorilla_charge(ix) == 0 {
                    *ctx.counters.gorilla_charge_mut(ix) = 1;
                }
            }
            _ => {}
        }
    }
    ctx
}

/// Step 4: base move power through the registry conditioners
fn base_power(mut ctx: TurnContext) -> TurnContext {
    for ix in SIDES {
        let fighter = ctx.side(ix).active_fighter();
        let inputs = PowerInputs {
            turn: ctx.turn,
            stamina: fighter.stamina,
            max_stamina: fighter.max_stamina,
            charge: ctx.counters.charge(ix),
            gorilla_charge: ctx.counters.gorilla_charge(ix),
            drink: ctx.counters.drink(ix),
            has_item: fighter.item.is_some(),
        };
        let effective = ctx.work(ix).effective;
        ctx.work_mut(ix).power = effective.power(&inputs);
    }
    ctx
}

/// Step 5: move-vs-move interaction (Counter / Anti-Counter)
///
/// Counter reflects an attacker's power and zeroes it; Anti-Counter doubles
/// into a Counter. Block and Dodge apply to the computed damage in step 6.
fn interaction(mut ctx: TurnContext) -> TurnContext {
    for ix in SIDES {
        let opp = ix.opponent();
        let my_move = ctx.work(ix).effective;
        let opp_move = ctx.work(opp).effective;
        if my_move != MoveKind::Counter {
            continue;
        }
        if opp_move == MoveKind::AntiCounter {
            // The counter is read and punished
            ctx.work_mut(opp).power *= 2;
        } else if opp_move.is_attack() {
            let reflected = ctx.work(opp).power;
            ctx.work_mut(ix).power = reflected;
            ctx.work_mut(opp).power = 0;
            ctx.push(TurnEvent::Countered { side: ix });
        }
        // Counter against anything else whiffs (base power 0)
    }
    ctx
}

/// Step 6: damage computation and modifiers
///
/// Any side left with positive power deals direct damage here: charge
/// amplification, outgoing halving, guard/evade reactions, recoil.
fn damage_modifiers(mut ctx: TurnContext) -> TurnContext {
    for ix in SIDES {
        let opp = ix.opponent();
        let power = ctx.work(ix).power;
        if power == 0 {
            continue;
        }
        let attack = ctx.work(ix).attack;
        let defense = ctx.work(opp).defense;
        let mut damage = power * attack / (defense + 50);

        // Focus charges amplify, then reset
        let charge = ctx.counters.charge(ix);
        if charge > 0 {
            damage = damage * (100 + 25 * charge as u32) / 100;
            *ctx.counters.charge_mut(ix) = 0;
        }

        // Unleashed gorilla charge is spent
        if ctx.work(ix).effective == MoveKind::GorillaPress
            && ctx.counters.gorilla_charge(ix) > 0
            && power > 0
        {
            *ctx.counters.gorilla_charge_mut(ix) = 0;
        }

        let attacker_item = ctx.side(ix).active_fighter().item;
        if let Some(snapshot) = attacker_item {
            // LoserMask trades power for survivability
            if snapshot.effect
                == (ItemEffect::DeathPrevention {
                    halve_outgoing: true,
                })
            {
                damage /= 2;
            }
            if let ItemEffect::Spiked { recoil_pct, .. } = snapshot.effect {
                let recoil = damage * recoil_pct / 100;
                if recoil > 0 {
                    ctx.work_mut(ix).indirect += recoil;
                    ctx.work_mut(ix).item_activated = true;
                    ctx.push(TurnEvent::ItemTriggered {
                        side: ix,
                        item_id: snapshot.item_id,
                    });
                }
            }
        }

        // Guard and evade reactions from the defender's move
        let defender_move = ctx.work(opp).effective;
        if defender_move == MoveKind::Block && damage > 0 {
            damage /= 2;
            ctx.push(TurnEvent::Blocked { side: opp });
        }
        if defender_move == MoveKind::Dodge && !spec(ctx.work(ix).effective).pierces_dodge {
            damage = 0;
            ctx.push(TurnEvent::Dodged { side: opp });
        }

        ctx.work_mut(opp).direct += damage;
        ctx.push(TurnEvent::Hit {
            attacker: ix,
            power,
            damage,
        });
    }
    ctx
}

/// Step 7: indirect damage — status ticks and item side effects
fn indirect_damage(mut ctx: TurnContext) -> TurnContext {
    for ix in SIDES {
        let opp = ix.opponent();
        let fighter = ctx.side(ix).active_fighter().clone();
        let max = fighter.max_stamina;

        if fighter.status.contains(StatusFlags::BLEEDING) {
            tick(&mut ctx, ix, max / 25, "bleed");
        }
        if fighter.status.contains(StatusFlags::BURNING) {
            tick(&mut ctx, ix, max / 20, "burn");
        }
        if fighter.status.contains(StatusFlags::POISONED) {
            let stacks = ctx.counters.poison_stacks(ix) as u32;
            tick(&mut ctx, ix, stacks * max / 50, "poison");
        }

        if let Some(snapshot) = fighter.item {
            match snapshot.effect {
                // The bomb cooks for one turn, then goes off at the opponent
                ItemEffect::Bomb { damage } if ctx.turn == 2 => {
                    ctx.work_mut(opp).indirect += damage;
                    ctx.consume_item(ix);
                    ctx.work_mut(ix).item_activated = true;
                    ctx.push(TurnEvent::ItemTriggered {
                        side: ix,
                        item_id: snapshot.item_id,
                    });
                    ctx.push(TurnEvent::IndirectDamage {
                        side: opp,
                        amount: damage,
                        source: "bomb".to_string(),
                    });
                }
                // Thorns: hitting the holder costs the attacker
                ItemEffect::Nails { damage } if ctx.work(ix).direct > 0 => {
                    ctx.work_mut(opp).indirect += damage;
                    ctx.work_mut(ix).item_activated = true;
                    ctx.push(TurnEvent::ItemTriggered {
                        side: ix,
                        item_id: snapshot.item_id,
                    });
                    ctx.push(TurnEvent::IndirectDamage {
                        side: opp,
                        amount: damage,
                        source: "nails".to_string(),
                    });
                }
                _ => {}
            }
        }
    }
    ctx
}

fn tick(ctx: &mut TurnContext, ix: SideIndex, amount: u32, source: &str) {
    if amount == 0 {
        return;
    }
    ctx.work_mut(ix).indirect += amount;
    ctx.push(TurnEvent::IndirectDamage {
        side: ix,
        amount,
        source: source.to_string(),
    });
}

/// Step 8: recovery — move-granted and item-granted healing
fn recovery(mut ctx: TurnContext) -> TurnContext {
    for ix in SIDES {
        let fighter = ctx.side(ix).active_fighter().clone();
        let mut heal = 0;
        match ctx.work(ix).effective {
            MoveKind::Recover => heal += fighter.max_stamina / 5,
            MoveKind::Drink => heal += 15,
            _ => {}
        }
        if let Some(snapshot) = fighter.item {
            if let ItemEffect::RegenPerTurn(amount) = snapshot.effect {
                heal += amount;
            }
        }
        ctx.work_mut(ix).recover += heal;
    }
    ctx
}

/// Step 9: redirection — confusion self-damage, Voodoo swap, shock chip
fn redirection(mut ctx: TurnContext) -> TurnContext {
    // Confusion: damage a confused fighter dealt may land on itself
    for ix in SIDES {
        let opp = ix.opponent();
        let confused = ctx
            .side(ix)
            .active_fighter()
            .status
            .contains(StatusFlags::CONFUSED);
        if confused && ctx.work(opp).direct > 0 && ctx.rng.roll(100) < CONFUSION_SELF_PCT {
            let moved = ctx.work(opp).direct;
            ctx.work_mut(opp).direct = 0;
            ctx.work_mut(ix).direct += moved;
            ctx.push(TurnEvent::Redirected { from: opp, to: ix });
        }
    }

    // Voodoo swaps both sides' pending direct damage outright
    let voodoo_used = SIDES
        .iter()
        .any(|ix| ctx.work(*ix).effective == MoveKind::Voodoo);
    if voodoo_used {
        let a = ctx.work(SideIndex::A).direct;
        let b = ctx.work(SideIndex::B).direct;
        if a != b {
            ctx.work_mut(SideIndex::A).direct = b;
            ctx.work_mut(SideIndex::B).direct = a;
            ctx.push(TurnEvent::Redirected {
                from: SideIndex::A,
                to: SideIndex::B,
            });
        }
    }

    // Shock chip punishes the opponent for any item activation
    for ix in SIDES {
        let opp = ix.opponent();
        if !ctx.work(ix).item_activated {
            continue;
        }
        if let Some(snapshot) = ctx.side(opp).active_fighter().item {
            if let ItemEffect::ShockChip { damage } = snapshot.effect {
                ctx.work_mut(ix).indirect += damage;
                ctx.push(TurnEvent::ItemTriggered {
                    side: opp,
                    item_id: snapshot.item_id,
                });
                ctx.push(TurnEvent::IndirectDamage {
                    side: ix,
                    amount: damage,
                    source: "shock_chip".to_string(),
                });
            }
        }
    }
    ctx
}

/// Step 10: stamina commit
///
/// `stamina = clamp(stamina - direct - indirect + recover, 0, max)`. A
/// lethal hit cannot be out-healed in the same turn; death-prevention items
/// leave the fighter at 1 instead. Clamping retroactively trues up the
/// recorded figures so the emitted ledger matches the applied delta.
fn commit_stamina(mut ctx: TurnContext) -> TurnContext {
    for ix in SIDES {
        let (direct, indirect, recover) = {
            let w = ctx.work(ix);
            (w.direct, w.indirect, w.recover)
        };
        let fighter = ctx.side(ix).active_fighter().clone();
        let before = fighter.stamina;
        let max = fighter.max_stamina;
        let loss = direct + indirect;

        if loss >= before && loss > 0 {
            // Lethal: healing is forfeit unless an item says otherwise
            let prevention = fighter.item.and_then(|snap| match snap.effect {
                ItemEffect::DeathPrevention { .. } => Some(snap),
                _ => None,
            });
            if let Some(snap) = prevention {
                ctx.side_mut(ix).active_fighter_mut().stamina = 1;
                if snap.effect.is_consumable() {
                    ctx.consume_item(ix);
                }
                ctx.work_mut(ix).item_activated = true;
                ctx.push(TurnEvent::DeathPrevented { side: ix });
                // True up so direct + indirect == before - 1
                let w = ctx.work_mut(ix);
                w.recover = 0;
                let applied = before - 1;
                w.indirect = w.indirect.min(applied);
                w.direct = applied - w.indirect;
            } else {
                ctx.side_mut(ix).active_fighter_mut().stamina = 0;
                let w = ctx.work_mut(ix);
                w.recover = 0;
                w.indirect = w.indirect.min(before);
                w.direct = before - w.indirect;
            }
        } else {
            let after = (before - loss + recover).min(max);
            let granted = after + loss - before;
            ctx.side_mut(ix).active_fighter_mut().stamina = after;
            ctx.work_mut(ix).recover = granted;
            if granted > 0 {
                ctx.push(TurnEvent::Healed {
                    side: ix,
                    amount: granted,
                });
            }
        }

        let (direct, indirect, recover) = {
            let w = ctx.work(ix);
            (w.direct, w.indirect, w.recover)
        };
        let side = ctx.side_mut(ix);
        side.prev_damage = direct + indirect;
        side.prev_recover = recover;

        if side.active_fighter().is_down() {
            let downed = side.active_fighter().wrestler_id;
            ctx.push(TurnEvent::Knockout {
                side: ix,
                wrestler_id: downed,
            });
            if ctx.side_mut(ix).rotate_active() {
                ctx.push(TurnEvent::FighterSwapped { side: ix });
            }
        }
    }
    ctx
}

/// Step 11: post-turn bookkeeping on the fighters
///
/// Battle-level stamping (`turn`, `time`, `lastTurnHash`) belongs to the
/// orchestrator, which owns the battle record.
fn bookkeeping(mut ctx: TurnContext) -> TurnContext {
    for ix in SIDES {
        let (chosen, effective) = {
            let w = ctx.work(ix);
            (w.chosen, w.effective)
        };
        let fighter = ctx.side_mut(ix).active_fighter_mut();
        fighter.last_move = Some(effective);
        if chosen == MoveKind::Copycat && effective != MoveKind::Flinch {
            fighter.learned_move = Some(effective);
        }
        if let Some(snapshot) = fighter.item {
            if matches!(snapshot.effect, ItemEffect::ChoiceLock { .. })
                && fighter.rigged_move.is_none()
                && !matches!(effective, MoveKind::Idle | MoveKind::Flinch)
            {
                fighter.rigged_move = Some(effective);
            }
        }
    }
    ctx
}

/// Step 12: termination check
fn termination(ctx: &TurnContext) -> BattleState {
    let a_down = ctx.side(SideIndex::A).is_defeated();
    let b_down = ctx.side(SideIndex::B).is_defeated();
    match (a_down, b_down) {
        (true, true) => BattleState::Draw,
        (true, false) => BattleState::WinB,
        (false, true) => BattleState::WinA,
        (false, false) => BattleState::Active,
    }
}

fn inflict(ctx: &mut TurnContext, ix: SideIndex, status: StatusFlags) {
    ctx.side_mut(ix).active_fighter_mut().status.insert(status);
    ctx.push(TurnEvent::StatusInflicted { side: ix, status });
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::battle::{BattleCounters, BattleSide, FighterState, ItemSnapshot, Stance};
    use crate::rng::TurnRng;

    fn fighter(id: u64) -> FighterState {
        FighterState {
            wrestler_id: id,
            stamina: 300,
            max_stamina: 300,
            base_attack: 100,
            base_defense: 80,
            attack_boost_pct: 0,
            defense_boost_pct: 0,
            status: StatusFlags::empty(),
            stance: Stance::Main,
            last_move: None,
            disabled_move: None,
            rigged_move: None,
            learned_move: None,
            item: None,
        }
    }

    fn side(addr: &str, f: FighterState, mv: MoveKind) -> BattleSide {
        BattleSide {
            address: addr.to_string(),
            fighters: vec![f],
            active: 0,
            move_choice: Some(mv),
            turn: 1,
            auto: false,
            prev_damage: 0,
            prev_recover: 0,
        }
    }

    fn run(a: FighterState, b: FighterState, mv_a: MoveKind, mv_b: MoveKind) -> TurnOutcome {
        run_turn(a, b, mv_a, mv_b, 1)
    }

    fn run_turn(
        a: FighterState,
        b: FighterState,
        mv_a: MoveKind,
        mv_b: MoveKind,
        turn: u32,
    ) -> TurnOutcome {
        let ctx = TurnContext::new(
            1,
            turn,
            [side("a", a, mv_a), side("b", b, mv_b)],
            BattleCounters::default(),
            TurnRng::new(7),
        );
        resolve_turn(ctx)
    }

    #[test]
    fn test_double_forfeit_is_draw() {
        let out = run(fighter(1), fighter(2), MoveKind::Forfeit, MoveKind::Forfeit);
        assert_eq!(out.state, BattleState::Draw);
    }

    #[test]
    fn test_single_forfeit_names_the_forfeiter() {
        let out = run(fighter(1), fighter(2), MoveKind::Forfeit, MoveKind::Strike);
        assert_eq!(out.state, BattleState::ForfeitA);
        assert_eq!(out.state.winner(), Some(SideIndex::B));
    }

    #[test]
    fn test_strike_deals_damage_to_defender() {
        let out = run(fighter(1), fighter(2), MoveKind::Strike, MoveKind::Idle);
        let b = &out.sides[1].fighters[0];
        assert!(b.stamina < 300, "defender should have taken damage");
        let a = &out.sides[0].fighters[0];
        assert_eq!(a.stamina, 300, "idle attacker untouched");
    }

    #[test]
    fn test_block_halves_dodge_zeroes() {
        let blocked = run(fighter(1), fighter(2), MoveKind::Strike, MoveKind::Block);
        let open = run(fighter(1), fighter(2), MoveKind::Strike, MoveKind::Idle);
        let dmg_blocked = 300 - blocked.sides[1].fighters[0].stamina;
        let dmg_open = 300 - open.sides[1].fighters[0].stamina;
        assert_eq!(dmg_blocked, dmg_open / 2);

        let dodged = run(fighter(1), fighter(2), MoveKind::Strike, MoveKind::Dodge);
        assert_eq!(dodged.sides[1].fighters[0].stamina, 300);
        assert!(dodged
            .events
            .iter()
            .any(|e| matches!(e, TurnEvent::Dodged { side: SideIndex::B })));
    }

    #[test]
    fn test_counter_reflects_attack() {
        let out = run(fighter(1), fighter(2), MoveKind::Strike, MoveKind::Counter);
        // Attacker is hit by its own reflected power; defender untouched
        assert!(out.sides[0].fighters[0].stamina < 300);
        assert_eq!(out.sides[1].fighters[0].stamina, 300);
        assert!(out
            .events
            .iter()
            .any(|e| matches!(e, TurnEvent::Countered { side: SideIndex::B })));
    }

    #[test]
    fn test_anti_counter_doubles_into_counter() {
        let countered = run(fighter(1), fighter(2), MoveKind::AntiCounter, MoveKind::Counter);
        let plain = run(fighter(1), fighter(2), MoveKind::AntiCounter, MoveKind::Idle);
        let dmg_countered = 300 - countered.sides[1].fighters[0].stamina;
        let dmg_plain = 300 - plain.sides[1].fighters[0].stamina;
        assert_eq!(dmg_countered, dmg_plain * 2);
    }

    #[test]
    fn test_bleed_ticks_every_turn() {
        let mut b = fighter(2);
        b.status.insert(StatusFlags::BLEEDING);
        let out = run(fighter(1), b, MoveKind::Idle, MoveKind::Idle);
        // 300 / 25 = 12 bleed tick
        assert_eq!(out.sides[1].fighters[0].stamina, 288);
    }

    #[test]
    fn test_recover_cures_and_heals() {
        let mut b = fighter(2);
        b.status.insert(StatusFlags::BLEEDING);
        b.stamina = 100;
        let out = run(fighter(1), b, MoveKind::Idle, MoveKind::Recover);
        let healed = &out.sides[1].fighters[0];
        assert!(!healed.status.contains(StatusFlags::BLEEDING));
        // Cure happens before the tick phase, so no bleed this turn
        assert_eq!(healed.stamina, 160); // +max/5
    }

    #[test]
    fn test_heal_clamps_at_max() {
        let mut b = fighter(2);
        b.stamina = 295;
        let out = run(fighter(1), b, MoveKind::Idle, MoveKind::Recover);
        let healed = &out.sides[1].fighters[0];
        assert_eq!(healed.stamina, 300);
        // Recorded recover trued up to the granted 5, not the rolled 60
        assert_eq!(out.sides[1].prev_recover, 5);
    }

    #[test]
    fn test_lethal_hit_cannot_be_outhealed() {
        let mut b = fighter(2);
        b.stamina = 10;
        b.base_defense = 0;
        let out = run(fighter(1), b, MoveKind::Slam, MoveKind::Recover);
        assert_eq!(out.sides[1].fighters[0].stamina, 0);
        assert_eq!(out.state, BattleState::WinA);
        assert_eq!(out.sides[1].prev_recover, 0);
        // Trued-up damage figure equals what was actually lost
        assert_eq!(out.sides[1].prev_damage, 10);
    }

    #[test]
    fn test_death_prevention_leaves_one_stamina() {
        let mut b = fighter(2);
        b.stamina = 10;
        b.base_defense = 0;
        b.item = Some(ItemSnapshot {
            item_id: 11,
            effect: ItemEffect::DeathPrevention {
                halve_outgoing: false,
            },
        });
        let out = run(fighter(1), b, MoveKind::Slam, MoveKind::Idle);
        assert_eq!(out.sides[1].fighters[0].stamina, 1);
        assert_eq!(out.state, BattleState::Active);
        // Banana is consumed
        assert!(out.sides[1].fighters[0].item.is_none());
        assert!(out
            .events
            .iter()
            .any(|e| matches!(e, TurnEvent::DeathPrevented { side: SideIndex::B })));
    }

    #[test]
    fn test_both_down_is_draw() {
        let mut a = fighter(1);
        let mut b = fighter(2);
        a.stamina = 1;
        b.stamina = 1;
        a.base_defense = 0;
        b.base_defense = 0;
        let out = run(a, b, MoveKind::Strike, MoveKind::Strike);
        assert_eq!(out.state, BattleState::Draw);
    }

    #[test]
    fn test_tag_partner_steps_in() {
        let mut lead = fighter(1);
        lead.stamina = 1;
        lead.base_defense = 0;
        let partner = fighter(3);
        let mut side_a = side("a", lead, MoveKind::Idle);
        side_a.fighters.push(partner);
        let side_b = side("b", fighter(2), MoveKind::Strike);
        let ctx = TurnContext::new(
            1,
            1,
            [side_a, side_b],
            BattleCounters::default(),
            TurnRng::new(7),
        );
        let out = resolve_turn(ctx);
        assert_eq!(out.state, BattleState::Active);
        assert_eq!(out.sides[0].active, 1);
        assert!(out
            .events
            .iter()
            .any(|e| matches!(e, TurnEvent::FighterSwapped { side: SideIndex::A })));
    }

    #[test]
    fn test_bomb_goes_off_on_turn_two() {
        let mut a = fighter(1);
        a.item = Some(ItemSnapshot {
            item_id: 5,
            effect: ItemEffect::Bomb { damage: 25 },
        });
        let quiet = run_turn(a.clone(), fighter(2), MoveKind::Idle, MoveKind::Idle, 1);
        assert_eq!(quiet.sides[1].fighters[0].stamina, 300);

        let boom = run_turn(a, fighter(2), MoveKind::Idle, MoveKind::Idle, 2);
        assert_eq!(boom.sides[1].fighters[0].stamina, 275);
        assert!(boom.sides[0].fighters[0].item.is_none());
    }

    #[test]
    fn test_voodoo_swaps_pending_damage() {
        let mut a = fighter(1);
        a.stance = Stance::Bizarre;
        let out = run(a, fighter(2), MoveKind::Voodoo, MoveKind::Strike);
        // Strike damage intended for A lands on B instead
        assert_eq!(out.sides[0].fighters[0].stamina, 300);
        assert!(out.sides[1].fighters[0].stamina < 300);
    }

    #[test]
    fn test_determinism_identical_inputs_identical_outputs() {
        let build = || {
            let mut a = fighter(1);
            let mut b = fighter(2);
            a.status.insert(StatusFlags::DRUNK);
            b.status.insert(StatusFlags::CONFUSED);
            TurnContext::new(
                9,
                3,
                [side("a", a, MoveKind::Strike), side("b", b, MoveKind::Bite)],
                BattleCounters::default(),
                TurnRng::for_turn(&[5u8; 32], 9, 3),
            )
        };
        let out1 = resolve_turn(build());
        let out2 = resolve_turn(build());
        assert_eq!(out1.sides, out2.sides);
        assert_eq!(out1.counters, out2.counters);
        assert_eq!(out1.state, out2.state);
        assert_eq!(out1.events, out2.events);
    }

    #[test]
    fn test_stamina_always_within_bounds() {
        // A handful of random-ish move pairings; stamina must stay in range
        let pairs = [
            (MoveKind::Strike, MoveKind::Slam),
            (MoveKind::Recover, MoveKind::Recover),
            (MoveKind::Counter, MoveKind::Counter),
            (MoveKind::GorillaPress, MoveKind::Block),
            (MoveKind::Taunt, MoveKind::Focus),
        ];
        for (ma, mb) in pairs {
            let mut a = fighter(1);
            a.stance = Stance::Alternative;
            let out = run(a, fighter(2), ma, mb);
            for s in &out.sides {
                for f in &s.fighters {
                    assert!(f.stamina <= f.max_stamina);
                }
            }
        }
    }
}
