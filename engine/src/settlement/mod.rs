//! Settlement
//!
//! Everything that happens on a terminal transition: the payout table,
//! rating updates, XP/training progression, records and trophies. The
//! functions here compute; the orchestrator moves the tokens and persists
//! the records.

pub mod payout;
pub mod progression;
pub mod rating;

use crate::models::account::{Account, Trophies};
use crate::models::battle::{BattleMode, Stance};

pub use payout::{decisive_payout, draw_payout, Payout};
pub use progression::{
    apply_progression, apply_record, horoscope_training, note_opponent, xp_award, FightResult,
};
pub use rating::{draw_delta, win_delta};

/// Whether a mode moves ELO at all
pub fn rating_eligible(mode: BattleMode) -> bool {
    mode.is_matchmade()
}

/// Facts about a finished match that feed the trophy checks
#[derive(Debug, Clone, Copy)]
pub struct TrophyInput {
    pub won: bool,
    /// Stance of the winner's active fighter at the end
    pub final_stance: Stance,
    /// The battle ended on its very first resolved turn
    pub first_turn_finish: bool,
    /// Level of the bot opponent, if the opponent was synthetic
    pub bot_level: Option<u32>,
}

/// Grant any newly earned one-time trophies; returns what was granted
pub fn grant_trophies(account: &mut Account, input: &TrophyInput) -> Vec<Trophies> {
    let mut granted = Vec::new();
    if !input.won {
        return granted;
    }
    if input.final_stance == Stance::Clown && account.grant_trophy(Trophies::CLOWN_WIN) {
        granted.push(Trophies::CLOWN_WIN);
    }
    if input.first_turn_finish && account.grant_trophy(Trophies::ONE_HIT_KO) {
        granted.push(Trophies::ONE_HIT_KO);
    }
    if let Some(level) = input.bot_level {
        if level > account.bot_ladder_best {
            account.bot_ladder_best = level;
        }
        if level >= crate::models::wrestler::MAX_LEVEL
            && account.grant_trophy(Trophies::BOT_LADDER_CLEAR)
        {
            granted.push(Trophies::BOT_LADDER_CLEAR);
        }
    }
    granted
}
