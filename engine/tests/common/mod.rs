//! Shared fixtures for the engine integration tests.
#![allow(dead_code)]

use battle_engine_core_rs::{
    BattleEngine, CallContext, EngineParams, InMemoryLedger, InMemoryStore, Item, ItemKind,
    RecordingSink, TokenLedger, TrustingWitnessSet, Wrestler,
};

pub const TOKEN: &str = "LUCHA";

pub type TestEngine = BattleEngine<InMemoryLedger, InMemoryStore, TrustingWitnessSet, RecordingSink>;

/// Engine over in-memory collaborators, with starting balances minted
pub fn engine(funds: &[(&str, i64)]) -> TestEngine {
    let mut ledger = InMemoryLedger::new();
    for (address, amount) in funds {
        ledger.mint(TOKEN, address, *amount).unwrap();
    }
    BattleEngine::new(
        EngineParams::default(),
        ledger,
        InMemoryStore::new(),
        TrustingWitnessSet,
        RecordingSink::new(),
    )
}

/// Seed a wrestler at the given level into the engine's store
pub fn seed_wrestler(engine: &mut TestEngine, id: u64, level: u32) -> u64 {
    engine.put_wrestler(&wrestler_at_level(id, level));
    id
}

pub fn wrestler_at_level(id: u64, level: u32) -> Wrestler {
    let mut w = Wrestler::new(id, [40; 10], &format!("w{id}"));
    if level > 1 {
        // level = 1 + isqrt(experience / 100)
        w.add_experience(u64::from((level - 1) * (level - 1)) * 100);
    }
    w
}

/// Seed an item and hand it to a wrestler already in the store
pub fn equip_item(engine: &mut TestEngine, wrestler_id: u64, item_id: u64, kind: ItemKind) {
    let item = Item::new(item_id, kind);
    engine.put_item(&item);
    let mut w = engine.get_wrestler(wrestler_id).unwrap();
    w.set_item(Some(item_id));
    engine.put_wrestler(&w);
}

/// Call context with a recognizable transaction hash
pub fn ctx(caller: &str, time: u64, tx_tag: u8) -> CallContext {
    CallContext::new(caller, time, [tx_tag; 32])
}
