//! Move substitution (pipeline step 1)
//!
//! Status, item and stance effects may force a different effective move
//! before any stats are computed. The checks run in a fixed order; the first
//! one that fires logs a `Substituted` event, and later checks continue from
//! the substituted move.
//!
//! Order: disabled move, forced attack under Taunt, forced Flinch on repeat
//! under Curse, Copycat learned-move, choice-item lock, trap-card reaction,
//! drunk-status swap, stance gating of signature specials.

use crate::models::battle::{SideIndex, Stance, StatusFlags};
use crate::models::item::ItemEffect;
use crate::resolution::context::{TurnContext, TurnEvent};
use crate::resolution::moves::{slot_move, MoveClass, MoveKind, MOVE_SLOTS};

/// Chance (percent) a drunk fighter's move slips to a random slot
const DRUNK_SLIP_PCT: u32 = 25;

/// Compute the effective move for one side, recording substitutions
pub fn substitute(ctx: &mut TurnContext, ix: SideIndex) {
    let opp = ix.opponent();
    let chosen = ctx.work(ix).chosen;
    let mut effective = chosen;

    // Forfeit is always honored as chosen
    if effective == MoveKind::Forfeit {
        return;
    }

    let fighter = ctx.side(ix).active_fighter().clone();

    // A disabled move cannot come out
    if Some(effective) == fighter.disabled_move {
        effective = MoveKind::Flinch;
    }

    // Taunt forces an attack
    if fighter.status.contains(StatusFlags::TAUNTED) && !effective.is_attack() {
        effective = MoveKind::Strike;
    }

    // Curse punishes repetition
    if fighter.status.contains(StatusFlags::CURSED) && Some(effective) == fighter.last_move {
        effective = MoveKind::Flinch;
    }

    // Copycat resolves to the learned move, else mirrors the opponent
    if effective == MoveKind::Copycat {
        let mirrored = fighter
            .learned_move
            .or(ctx.side(opp).active_fighter().last_move);
        effective = mirrored.unwrap_or(MoveKind::Flinch);
    }

    // Choice item locks the first move picked
    if let Some(snapshot) = fighter.item {
        if matches!(snapshot.effect, ItemEffect::ChoiceLock { .. }) {
            if let Some(locked) = fighter.rigged_move {
                if effective != locked {
                    effective = locked;
                }
            }
        }
    }

    // Trap card on the opponent fires on counter-class moves
    if effective.class() == MoveClass::CounterClass {
        if let Some(snapshot) = ctx.side(opp).active_fighter().item {
            if snapshot.effect == ItemEffect::TrapCurse {
                ctx.side_mut(ix)
                    .active_fighter_mut()
                    .status
                    .insert(StatusFlags::CURSED);
                ctx.consume_item(opp);
                ctx.work_mut(opp).item_activated = true;
                ctx.push(TurnEvent::ItemTriggered {
                    side: opp,
                    item_id: snapshot.item_id,
                });
                ctx.push(TurnEvent::StatusInflicted {
                    side: ix,
                    status: StatusFlags::CURSED,
                });
            }
        }
    }

    // Drunk fighters sometimes reach for the wrong slot
    if fighter.status.contains(StatusFlags::DRUNK) && ctx.rng.roll(100) < DRUNK_SLIP_PCT {
        let slot = ctx.rng.roll(MOVE_SLOTS as u32) as u8;
        if let Some(slipped) = slot_move(fighter.stance, slot) {
            // Never slip into forfeiting the match
            if slipped != MoveKind::Forfeit {
                effective = slipped;
            }
        }
    }

    // Signature specials only work in their stance
    effective = match (effective, fighter.stance) {
        (MoveKind::Tornado, Stance::Alternative)
        | (MoveKind::ClownSlap, Stance::Clown)
        | (MoveKind::ThrillerKick, Stance::Zombie) => effective,
        (MoveKind::Tornado | MoveKind::ClownSlap | MoveKind::ThrillerKick, _) => MoveKind::Strike,
        (other, _) => other,
    };

    if effective != chosen {
        ctx.push(TurnEvent::Substituted {
            side: ix,
            from: chosen,
            to: effective,
        });
    }
    ctx.work_mut(ix).effective = effective;
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::battle::{
        BattleCounters, BattleSide, FighterState, ItemSnapshot, Stance,
    };
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

    fn ctx_with(a: FighterState, b: FighterState, mv_a: MoveKind, mv_b: MoveKind) -> TurnContext {
        let side = |addr: &str, f: FighterState, mv: MoveKind| BattleSide {
            address: addr.to_string(),
            fighters: vec![f],
            active: 0,
            move_choice: Some(mv),
            turn: 1,
            auto: false,
            prev_damage: 0,
            prev_recover: 0,
        };
        TurnContext::new(
            1,
            1,
            [side("a", a, mv_a), side("b", b, mv_b)],
            BattleCounters::default(),
            TurnRng::new(42),
        )
    }

    #[test]
    fn test_taunt_forces_attack() {
        let mut a = fighter(1);
        a.status.insert(StatusFlags::TAUNTED);
        let mut ctx = ctx_with(a, fighter(2), MoveKind::Block, MoveKind::Strike);
        substitute(&mut ctx, SideIndex::A);
        assert_eq!(ctx.work(SideIndex::A).effective, MoveKind::Strike);
    }

    #[test]
    fn test_curse_punishes_repeat() {
        let mut a = fighter(1);
        a.status.insert(StatusFlags::CURSED);
        a.last_move = Some(MoveKind::Slam);
        let mut ctx = ctx_with(a, fighter(2), MoveKind::Slam, MoveKind::Strike);
        substitute(&mut ctx, SideIndex::A);
        assert_eq!(ctx.work(SideIndex::A).effective, MoveKind::Flinch);
    }

    #[test]
    fn test_curse_allows_fresh_move() {
        let mut a = fighter(1);
        a.status.insert(StatusFlags::CURSED);
        a.last_move = Some(MoveKind::Slam);
        let mut ctx = ctx_with(a, fighter(2), MoveKind::Strike, MoveKind::Strike);
        substitute(&mut ctx, SideIndex::A);
        assert_eq!(ctx.work(SideIndex::A).effective, MoveKind::Strike);
    }

    #[test]
    fn test_copycat_mirrors_opponent_last_move() {
        let a = fighter(1);
        let mut b = fighter(2);
        b.last_move = Some(MoveKind::Slam);
        let mut ctx = ctx_with(a, b, MoveKind::Copycat, MoveKind::Strike);
        substitute(&mut ctx, SideIndex::A);
        assert_eq!(ctx.work(SideIndex::A).effective, MoveKind::Slam);
    }

    #[test]
    fn test_copycat_prefers_learned_move() {
        let mut a = fighter(1);
        a.learned_move = Some(MoveKind::Grapple);
        let mut b = fighter(2);
        b.last_move = Some(MoveKind::Slam);
        let mut ctx = ctx_with(a, b, MoveKind::Copycat, MoveKind::Strike);
        substitute(&mut ctx, SideIndex::A);
        assert_eq!(ctx.work(SideIndex::A).effective, MoveKind::Grapple);
    }

    #[test]
    fn test_copycat_with_nothing_to_mirror_flinches() {
        let mut ctx = ctx_with(fighter(1), fighter(2), MoveKind::Copycat, MoveKind::Strike);
        substitute(&mut ctx, SideIndex::A);
        assert_eq!(ctx.work(SideIndex::A).effective, MoveKind::Flinch);
    }

    #[test]
    fn test_choice_lock_overrides() {
        let mut a = fighter(1);
        a.item = Some(ItemSnapshot {
            item_id: 9,
            effect: ItemEffect::ChoiceLock { attack_pct: 25 },
        });
        a.rigged_move = Some(MoveKind::Strike);
        let mut ctx = ctx_with(a, fighter(2), MoveKind::Slam, MoveKind::Strike);
        substitute(&mut ctx, SideIndex::A);
        assert_eq!(ctx.work(SideIndex::A).effective, MoveKind::Strike);
    }

    #[test]
    fn test_trap_card_curses_counter_user() {
        let a = fighter(1);
        let mut b = fighter(2);
        b.item = Some(ItemSnapshot {
            item_id: 4,
            effect: ItemEffect::TrapCurse,
        });
        let mut ctx = ctx_with(a, b, MoveKind::Counter, MoveKind::Strike);
        substitute(&mut ctx, SideIndex::A);
        assert!(ctx
            .side(SideIndex::A)
            .active_fighter()
            .status
            .contains(StatusFlags::CURSED));
        // Card consumed
        assert!(ctx.side(SideIndex::B).active_fighter().item.is_none());
        assert!(ctx.work(SideIndex::B).item_activated);
    }

    #[test]
    fn test_stance_gating_degrades_specials() {
        let a = fighter(1); // Main stance
        let mut ctx = ctx_with(a, fighter(2), MoveKind::Tornado, MoveKind::Strike);
        substitute(&mut ctx, SideIndex::A);
        assert_eq!(ctx.work(SideIndex::A).effective, MoveKind::Strike);

        let mut alt = fighter(1);
        alt.stance = Stance::Alternative;
        let mut ctx = ctx_with(alt, fighter(2), MoveKind::Tornado, MoveKind::Strike);
        substitute(&mut ctx, SideIndex::A);
        assert_eq!(ctx.work(SideIndex::A).effective, MoveKind::Tornado);
    }
}
