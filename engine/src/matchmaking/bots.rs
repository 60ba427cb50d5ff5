//! Synthetic opponents
//!
//! Practice mode resolves instantly against a bot; Unranked falls back to
//! one after a long idle wait. Bot wrestlers are derived deterministically
//! from the requested level plus a salt, so every replica materializes the
//! identical profile. Bot moves come from a small heuristic whose quality
//! scales with the bot's level.

use crate::models::account::DEFAULT_ELO;
use crate::models::battle::{FighterState, StatusFlags};
use crate::resolution::moves::{slot_move, MoveClass, MoveKind};
use crate::rng::TurnRng;

/// Slots a bot may pick from (everything except the Forfeit slot)
const BOT_SLOT_RANGE: u32 = 7;

/// How many re-draws the heuristic allows before settling
const MAX_REDRAWS: u32 = 8;

/// A deterministic synthetic opponent
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BotProfile {
    pub address: String,
    pub genes: [u8; 10],
    pub level: u32,
    pub elo: i32,
}

impl BotProfile {
    /// Materialize the bot for a target level
    ///
    /// The salt keeps consecutive bot matches at the same level from
    /// producing the same genes; callers pass something call-derived
    /// (the battle counter works well).
    pub fn for_level(level: u32, salt: u64) -> Self {
        let mut rng = TurnRng::new((u64::from(level) << 32) ^ salt ^ 0xB07);
        let mut genes = [0u8; 10];
        for gene in genes.iter_mut() {
            *gene = rng.roll(256) as u8;
        }
        // Rating scales linearly with level around the default
        let elo = DEFAULT_ELO + (level as i32 - 4) * 50;
        Self {
            address: format!("bot:{}:{}", level, salt),
            genes,
            level,
            elo,
        }
    }

    /// Experience placing the bot's wrestler exactly at `level`
    pub fn experience(&self) -> u64 {
        if self.level <= 1 {
            0
        } else {
            u64::from((self.level - 1) * (self.level - 1)) * 100
        }
    }
}

/// Pick a move slot for an automated side
///
/// Skill is the bot's level: low-skill bots accept almost any draw,
/// high-skill bots re-draw non-attacks and situational mistakes. Hard
/// rules regardless of skill: never Forfeit, never an item-dependent
/// move without an item, never repeat the last move while cursed.
pub fn bot_choose_slot(fighter: &FighterState, skill: u32, rng: &mut TurnRng) -> u8 {
    let mut slot = rng.roll(BOT_SLOT_RANGE) as u8;
    for _ in 0..MAX_REDRAWS {
        let Some(mv) = slot_move(fighter.stance, slot) else {
            slot = rng.roll(BOT_SLOT_RANGE) as u8;
            continue;
        };
        if violates_hard_rule(fighter, mv) {
            slot = rng.roll(BOT_SLOT_RANGE) as u8;
            continue;
        }
        // Skilled bots lean into attacks unless badly hurt
        let hurting = fighter.stamina * 4 <= fighter.max_stamina;
        let prefers_attack = !hurting && mv.class() != MoveClass::Attack;
        if prefers_attack && rng.roll(10) < skill {
            slot = rng.roll(BOT_SLOT_RANGE) as u8;
            continue;
        }
        return slot;
    }
    // Out of patience: the first slot is always a legal basic move
    0
}

fn violates_hard_rule(fighter: &FighterState, mv: MoveKind) -> bool {
    if mv == MoveKind::Forfeit {
        return true;
    }
    if mv.needs_item() && fighter.item.is_none() {
        return true;
    }
    if fighter.status.contains(StatusFlags::CURSED) && fighter.last_move == Some(mv) {
        return true;
    }
    false
}
