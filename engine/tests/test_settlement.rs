//! Settlement: payouts, ratings, progression and trophies.

mod common;

use battle_engine_core_rs::models::battle::{BattleMode, BattleState};
use battle_engine_core_rs::settlement::{decisive_payout, draw_payout, win_delta};
use battle_engine_core_rs::{EngineParams, ItemKind, TokenLedger, Trophies};
use common::{ctx, engine, equip_item, seed_wrestler, TOKEN};
use proptest::prelude::*;

#[test]
fn test_unranked_win_settles_stakes_rating_and_progression() {
    let mut eng = engine(&[("alice", 1_000), ("bob", 1_000)]);
    let wa = seed_wrestler(&mut eng, 1, 3); // 400 experience
    let wb = seed_wrestler(&mut eng, 2, 3);

    eng.join_queue(&ctx("alice", 0, 1), &[wa], 100, BattleMode::Unranked, None)
        .unwrap();
    let battle_id = eng
        .join_queue(&ctx("bob", 1, 2), &[wb], 100, BattleMode::Unranked, None)
        .unwrap()
        .expect("equal candidates pair immediately");

    eng.play_turn(&ctx("alice", 10, 3), battle_id, 1, 0).unwrap(); // Strike
    let state = eng.play_turn(&ctx("bob", 11, 4), battle_id, 1, 7).unwrap(); // Forfeit
    assert_eq!(state, BattleState::ForfeitB);

    // Winner takes both stakes, no rake outside Ranked
    assert_eq!(eng.ledger().balance_of(TOKEN, "alice"), 1_100);
    assert_eq!(eng.ledger().balance_of(TOKEN, "bob"), 900);
    assert_eq!(eng.ledger().balance_of(TOKEN, "escrow"), 0);

    // Rating moved half of K each way
    assert_eq!(eng.account("alice").unwrap().elo, 1_216);
    assert_eq!(eng.account("bob").unwrap().elo, 1_184);

    // XP and the horoscope training boost landed on both wrestlers
    let a = eng.get_wrestler(wa).unwrap();
    let b = eng.get_wrestler(wb).unwrap();
    assert_eq!(a.experience(), 400 + 120);
    assert_eq!(b.experience(), 400 + 40);
    assert_eq!(a.training().total(), 2);
    assert_eq!(b.training().total(), 2);

    // Records, opponents and the turn-one finish trophy
    let alice = eng.account("alice").unwrap();
    assert_eq!(alice.unranked.wins, 1);
    assert_eq!(alice.unranked.streak, 1);
    assert_eq!(alice.last_opponent.as_deref(), Some("bob"));
    assert!(alice.trophies.contains(Trophies::ONE_HIT_KO));
    let bob = eng.account("bob").unwrap();
    assert_eq!(bob.unranked.losses, 1);
    assert_eq!(bob.unranked.streak, 0);
}

#[test]
fn test_double_xp_item_doubles_and_is_consumed() {
    let mut eng = engine(&[("alice", 1_000), ("bob", 1_000)]);
    let wa = seed_wrestler(&mut eng, 1, 3);
    let wb = seed_wrestler(&mut eng, 2, 3);
    equip_item(&mut eng, wa, 50, ItemKind::EnergyDrink);

    eng.join_queue(&ctx("alice", 0, 1), &[wa], 0, BattleMode::Unranked, None)
        .unwrap();
    let battle_id = eng
        .join_queue(&ctx("bob", 1, 2), &[wb], 0, BattleMode::Unranked, None)
        .unwrap()
        .unwrap();
    eng.play_turn(&ctx("alice", 10, 3), battle_id, 1, 0).unwrap();
    eng.play_turn(&ctx("bob", 11, 4), battle_id, 1, 7).unwrap();

    let a = eng.get_wrestler(wa).unwrap();
    assert_eq!(a.experience(), 400 + 240, "win XP doubled");
    assert_eq!(a.item(), None, "the consumable is spent");
}

#[test]
fn test_bot_fights_award_half_xp_and_no_rating() {
    let mut eng = engine(&[("alice", 1_000)]);
    let wa = seed_wrestler(&mut eng, 1, 5); // 1600 experience
    eng.join_queue(&ctx("alice", 0, 1), &[wa], 0, BattleMode::Unranked, None)
        .unwrap();
    let fallback = eng.params().unranked_bot_fallback_secs;
    let battle_id = eng.update_queue(&ctx("alice", fallback, 2)).unwrap().unwrap();

    let state = eng
        .play_turn(&ctx("alice", fallback + 5, 3), battle_id, 1, 7)
        .unwrap();
    assert_eq!(state, BattleState::ForfeitA);

    let a = eng.get_wrestler(wa).unwrap();
    assert_eq!(a.experience(), 1_600 + 20, "loss XP halved against a bot");
    assert_eq!(eng.account("alice").unwrap().elo, 1_200, "bot fights never move rating");
    assert_eq!(eng.account("alice").unwrap().unranked.losses, 1);
}

#[test]
fn test_drawn_match_refunds_and_leaves_rating_alone() {
    let mut eng = engine(&[("alice", 1_000), ("bob", 1_000)]);
    let wa = seed_wrestler(&mut eng, 1, 3);
    let wb = seed_wrestler(&mut eng, 2, 3);
    eng.join_queue(&ctx("alice", 0, 1), &[wa], 250, BattleMode::Unranked, None)
        .unwrap();
    let battle_id = eng
        .join_queue(&ctx("bob", 1, 2), &[wb], 250, BattleMode::Unranked, None)
        .unwrap()
        .unwrap();

    eng.play_turn(&ctx("alice", 10, 3), battle_id, 1, 7).unwrap();
    let state = eng.play_turn(&ctx("bob", 11, 4), battle_id, 1, 7).unwrap();
    assert_eq!(state, BattleState::Draw);

    assert_eq!(eng.ledger().balance_of(TOKEN, "alice"), 1_000);
    assert_eq!(eng.ledger().balance_of(TOKEN, "bob"), 1_000);
    assert_eq!(eng.account("alice").unwrap().elo, 1_200);
    assert_eq!(eng.account("bob").unwrap().elo, 1_200);
    assert_eq!(eng.account("alice").unwrap().unranked.draws, 1);
}

proptest! {
    #[test]
    fn prop_payouts_conserve_the_stake(
        bet in 0i64..10_000_000,
        mode in prop::sample::select(vec![
            BattleMode::Unranked,
            BattleMode::Versus,
            BattleMode::Ranked,
        ]),
    ) {
        let params = EngineParams::default();
        let p = decisive_payout(mode, bet, &params);
        prop_assert_eq!(p.total(), 2 * bet);
        prop_assert!(p.winner_amount >= 0 && p.loser_amount >= 0 && p.pot_amount >= 0);
        prop_assert_eq!(draw_payout(bet).total(), 2 * bet);
    }

    #[test]
    fn prop_win_deltas_are_complementary_and_bounded(
        elo_a in 400i32..2_800,
        elo_b in 400i32..2_800,
    ) {
        let favourite = win_delta(elo_a, elo_b, 32);
        let underdog = win_delta(elo_b, elo_a, 32);
        prop_assert_eq!(favourite + underdog, 32);
        prop_assert!(favourite >= 1 && favourite <= 31);
        prop_assert!(underdog >= 1 && underdog <= 31);
    }
}
