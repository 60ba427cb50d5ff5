//! End-to-end engine scenarios: full battles driven through the call surface.

mod common;

use battle_engine_core_rs::models::battle::{BattleMode, BattleState, SideIndex};
use battle_engine_core_rs::models::wrestler::Location;
use battle_engine_core_rs::{EngineError, TokenLedger};
use common::{ctx, engine, seed_wrestler, wrestler_at_level, TestEngine, TOKEN};

#[test]
fn test_ranked_battle_from_queue_to_settlement() {
    let mut eng = engine(&[("alice", 5_000), ("bob", 5_000)]);
    let wa = seed_wrestler(&mut eng, 1, 8);
    let wb = seed_wrestler(&mut eng, 2, 8);
    let fee = eng.params().ranked_fee;
    let supply_before = eng.ledger().total_supply(TOKEN);

    eng.join_queue(&ctx("alice", 100, 1), &[wa], fee, BattleMode::Ranked, None)
        .unwrap();
    let battle_id = eng
        .join_queue(&ctx("bob", 101, 2), &[wb], fee, BattleMode::Ranked, None)
        .unwrap()
        .expect("equal level-8 candidates pair at once");

    // During the battle both stakes sit in escrow
    assert_eq!(eng.ledger().balance_of(TOKEN, "escrow"), 2 * fee);
    assert_eq!(
        eng.get_wrestler(wa).unwrap().location(),
        Location::Battle { battle_id }
    );

    eng.play_turn(&ctx("alice", 110, 3), battle_id, 1, 0).unwrap();
    let state = eng.play_turn(&ctx("bob", 111, 4), battle_id, 1, 7).unwrap();
    assert_eq!(state, BattleState::ForfeitB);

    // Rake to the pot, the rest to the winner; supply is conserved
    let rake = 2 * fee * eng.params().rake_bps / 10_000;
    assert_eq!(eng.ledger().balance_of(TOKEN, "alice"), 2 * fee - rake);
    assert_eq!(eng.ledger().balance_of(TOKEN, "bob"), 0);
    assert_eq!(eng.ledger().balance_of(TOKEN, "pot"), rake);
    assert_eq!(eng.ledger().balance_of(TOKEN, "escrow"), 0);
    assert_eq!(eng.ledger().total_supply(TOKEN), supply_before);

    assert_eq!(eng.account("alice").unwrap().elo, 1_216);
    assert_eq!(eng.account("bob").unwrap().elo, 1_184);
    assert_eq!(eng.get_wrestler(wa).unwrap().location(), Location::None);
    assert_eq!(eng.get_wrestler(wb).unwrap().location(), Location::None);
    assert!(eng.account("alice").unwrap().battle_id().is_none());
}

#[test]
fn test_rejected_join_leaves_no_trace() {
    let mut eng = engine(&[("alice", 1_000)]);
    let mut w = wrestler_at_level(1, 3);
    w.set_location(Location::Gym);
    eng.put_wrestler(&w);

    let err = eng
        .join_queue(&ctx("alice", 0, 1), &[1], 100, BattleMode::Unranked, None)
        .unwrap_err();
    assert!(matches!(err, EngineError::Wrestler(_)));
    assert_eq!(eng.ledger().balance_of(TOKEN, "alice"), 1_000);
    assert!(eng.account("alice").unwrap().queue().is_none());

    // Team shape violations are caught before anything else
    seed_wrestler(&mut eng, 2, 3);
    let err = eng
        .join_queue(&ctx("alice", 1, 2), &[2, 2], 100, BattleMode::Unranked, None)
        .unwrap_err();
    assert!(matches!(err, EngineError::DuplicateWrestler(2)));
    let err = eng
        .join_queue(&ctx("alice", 2, 3), &[], 100, BattleMode::Unranked, None)
        .unwrap_err();
    assert!(matches!(err, EngineError::BadTeamSize { got: 0, .. }));
}

#[test]
fn test_strangers_and_bad_slots_are_rejected() {
    let mut eng = engine(&[("alice", 1_000), ("bob", 1_000)]);
    let wa = seed_wrestler(&mut eng, 1, 3);
    let wb = seed_wrestler(&mut eng, 2, 3);
    eng.join_queue(&ctx("alice", 0, 1), &[wa], 0, BattleMode::Unranked, None)
        .unwrap();
    let battle_id = eng
        .join_queue(&ctx("bob", 1, 2), &[wb], 0, BattleMode::Unranked, None)
        .unwrap()
        .unwrap();

    let err = eng
        .play_turn(&ctx("mallory", 5, 3), battle_id, 1, 0)
        .unwrap_err();
    assert!(matches!(err, EngineError::NotParticipant { .. }));
    let err = eng.play_turn(&ctx("alice", 6, 4), battle_id, 1, 9).unwrap_err();
    assert!(matches!(err, EngineError::Battle(_)));
    let err = eng.play_turn(&ctx("alice", 7, 5), 99, 1, 0).unwrap_err();
    assert!(matches!(err, EngineError::UnknownBattle(99)));
}

/// Mirror-image strike exchange: equal fighters knock each other out on the
/// same turn, including the tag partners, ending in a draw.
#[test]
fn test_tag_teams_trade_strikes_to_a_simultaneous_draw() {
    let mut eng = engine(&[("alice", 1_000), ("bob", 1_000)]);
    let team_a = [seed_wrestler(&mut eng, 1, 3), seed_wrestler(&mut eng, 2, 3)];
    let team_b = [seed_wrestler(&mut eng, 3, 3), seed_wrestler(&mut eng, 4, 3)];
    let supply_before = eng.ledger().total_supply(TOKEN);

    eng.join_queue(&ctx("alice", 0, 1), &team_a, 300, BattleMode::Unranked, None)
        .unwrap();
    let battle_id = eng
        .join_queue(&ctx("bob", 1, 2), &team_b, 300, BattleMode::Unranked, None)
        .unwrap()
        .unwrap();

    let mut state = BattleState::Active;
    let mut time = 10;
    for turn in 1..=40u32 {
        eng.play_turn(&ctx("alice", time, 10), battle_id, turn, 0).unwrap();
        state = eng.play_turn(&ctx("bob", time + 1, 11), battle_id, turn, 0).unwrap();
        time += 2;
        if state.is_terminal() {
            break;
        }
    }
    assert_eq!(state, BattleState::Draw, "mirror match must end simultaneous");

    // Full refund, every wrestler released, nothing minted or burned
    assert_eq!(eng.ledger().balance_of(TOKEN, "alice"), 1_000);
    assert_eq!(eng.ledger().balance_of(TOKEN, "bob"), 1_000);
    for id in team_a.iter().chain(team_b.iter()) {
        assert_eq!(eng.get_wrestler(*id).unwrap().location(), Location::None);
    }
    assert_eq!(eng.ledger().total_supply(TOKEN), supply_before);
    assert_eq!(eng.account("alice").unwrap().unranked.draws, 1);
}

#[test]
fn test_identical_call_sequences_replay_identically() {
    let run = || -> (TestEngine, u64) {
        let mut eng = engine(&[("alice", 1_000), ("bob", 1_000)]);
        let wa = seed_wrestler(&mut eng, 1, 4);
        let wb = seed_wrestler(&mut eng, 2, 4);
        eng.join_queue(&ctx("alice", 0, 1), &[wa], 200, BattleMode::Unranked, None)
            .unwrap();
        let battle_id = eng
            .join_queue(&ctx("bob", 1, 2), &[wb], 200, BattleMode::Unranked, None)
            .unwrap()
            .unwrap();
        for turn in 1..=3u32 {
            let t = 10 + u64::from(turn) * 2;
            eng.play_turn(&ctx("alice", t, turn as u8 + 10), battle_id, turn, 1).unwrap();
            eng.play_turn(&ctx("bob", t + 1, turn as u8 + 20), battle_id, turn, 0).unwrap();
        }
        (eng, battle_id)
    };

    let (mut x, bx) = run();
    let (mut y, by) = run();
    assert_eq!(x.get_battle(bx, 50).unwrap(), y.get_battle(by, 50).unwrap());
    assert_eq!(x.event_log().events(), y.event_log().events());
}

#[test]
fn test_auto_delegation_lets_one_caller_drive_the_battle() {
    let mut eng = engine(&[("alice", 1_000), ("bob", 1_000)]);
    let wa = seed_wrestler(&mut eng, 1, 4);
    let wb = seed_wrestler(&mut eng, 2, 4);
    eng.join_queue(&ctx("alice", 0, 1), &[wa], 0, BattleMode::Unranked, None)
        .unwrap();
    let battle_id = eng
        .join_queue(&ctx("bob", 1, 2), &[wb], 0, BattleMode::Unranked, None)
        .unwrap()
        .unwrap();

    eng.auto_turn(&ctx("alice", 5, 3), battle_id).unwrap();
    let err = eng.auto_turn(&ctx("bob", 6, 4), battle_id).unwrap_err();
    assert!(matches!(err, EngineError::AutoAlreadyDelegated));

    // Bob's single call completes the rendezvous against the forced move
    eng.play_turn(&ctx("bob", 10, 5), battle_id, 1, 0).unwrap();
    let battle = eng.get_battle(battle_id, 11).unwrap();
    assert_eq!(battle.turn, 2, "the turn resolved in one call");
}

#[test]
fn test_idle_opponent_is_forced_to_idle_after_the_timeout() {
    let mut eng = engine(&[("alice", 1_000), ("bob", 1_000)]);
    let wa = seed_wrestler(&mut eng, 1, 4);
    let wb = seed_wrestler(&mut eng, 2, 4);
    eng.join_queue(&ctx("alice", 0, 1), &[wa], 0, BattleMode::Unranked, None)
        .unwrap();
    let battle_id = eng
        .join_queue(&ctx("bob", 1, 2), &[wb], 0, BattleMode::Unranked, None)
        .unwrap()
        .unwrap();

    // Past the per-turn idle window the opponent is committed to Idle and
    // the turn resolves off a single call
    let idle = eng.params().turn_idle_secs;
    eng.play_turn(&ctx("alice", 1 + idle, 3), battle_id, 1, 0).unwrap();
    let battle = eng.get_battle(battle_id, 2 + idle).unwrap();
    assert_eq!(battle.turn, 2);
    // A strike against an idle target lands
    assert!(battle.side(SideIndex::B).active_fighter().stamina
        < battle.side(SideIndex::B).active_fighter().max_stamina);
}

#[test]
fn test_cancel_match_rewards_the_side_ahead() {
    let mut eng = engine(&[("alice", 1_000), ("bob", 1_000)]);
    let wa = seed_wrestler(&mut eng, 1, 4);
    let wb = seed_wrestler(&mut eng, 2, 4);
    eng.join_queue(&ctx("alice", 0, 1), &[wa], 100, BattleMode::Unranked, None)
        .unwrap();
    let battle_id = eng
        .join_queue(&ctx("bob", 1, 2), &[wb], 100, BattleMode::Unranked, None)
        .unwrap()
        .unwrap();

    eng.play_turn(&ctx("alice", 10, 3), battle_id, 1, 0).unwrap();

    // Only the committed side may cancel, and only after the grace period
    let err = eng.cancel_match(&ctx("bob", 20, 4), battle_id).unwrap_err();
    assert!(matches!(err, EngineError::CancelNotAhead));
    let err = eng.cancel_match(&ctx("alice", 30, 5), battle_id).unwrap_err();
    assert!(matches!(err, EngineError::CancelTooEarly { .. }));

    let grace = eng.params().turn_grace_secs;
    eng.cancel_match(&ctx("alice", 1 + grace, 6), battle_id).unwrap();
    let battle = eng.get_battle(battle_id, 2 + grace).unwrap();
    assert_eq!(battle.state, BattleState::Cancelled);
    assert_eq!(eng.ledger().balance_of(TOKEN, "alice"), 1_100);
    assert_eq!(eng.ledger().balance_of(TOKEN, "bob"), 900);
}

#[test]
fn test_broken_battle_recovers_with_a_full_refund() {
    let mut eng = engine(&[("alice", 1_000), ("bob", 1_000)]);
    let wa = seed_wrestler(&mut eng, 1, 4);
    let wb = seed_wrestler(&mut eng, 2, 4);
    eng.join_queue(&ctx("alice", 0, 1), &[wa], 250, BattleMode::Unranked, None)
        .unwrap();
    let battle_id = eng
        .join_queue(&ctx("bob", 1, 2), &[wb], 250, BattleMode::Unranked, None)
        .unwrap()
        .unwrap();

    // Nobody shows up again; a read far in the future runs the recovery
    let broken = eng.params().battle_broken_secs;
    let battle = eng.get_battle(battle_id, 2 + broken + 1).unwrap();
    assert_eq!(battle.state, BattleState::Cancelled);
    assert_eq!(eng.ledger().balance_of(TOKEN, "alice"), 1_000);
    assert_eq!(eng.ledger().balance_of(TOKEN, "bob"), 1_000);
    assert_eq!(eng.get_wrestler(wa).unwrap().location(), Location::None);
    assert!(eng.account("alice").unwrap().battle_id().is_none());
}
