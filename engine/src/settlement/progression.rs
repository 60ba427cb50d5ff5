//! Experience, training and record progression
//!
//! Applied once per participant on any terminal transition. XP is shaped by
//! the opponent (bots teach less), a DoubleXp consumable, and the mode;
//! training grows one stat chosen by the battle id, by an amount from the
//! opponent's horoscope.

use crate::core::params::EngineParams;
use crate::models::account::{Account, ModeRecord};
use crate::models::battle::BattleMode;
use crate::models::wrestler::Wrestler;

/// How the match ended, from one participant's point of view
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FightResult {
    Win,
    Loss,
    Draw,
}

/// Training amount per horoscope sign (`genes[9] % 12`)
const HOROSCOPE_TRAINING: [u32; 12] = [2, 1, 3, 1, 2, 2, 1, 3, 2, 1, 2, 3];

/// XP award for one participant
///
/// Practice mode never awards XP. Bot opponents teach half, a DoubleXp
/// consumable doubles the final figure. Clamping to the level-8 ceiling
/// happens inside [`Wrestler::add_experience`].
pub fn xp_award(
    result: FightResult,
    mode: BattleMode,
    vs_bot: bool,
    double_xp: bool,
    params: &EngineParams,
) -> u64 {
    if mode == BattleMode::Practice {
        return 0;
    }
    let mut xp = match result {
        FightResult::Win => params.xp_win,
        FightResult::Loss => params.xp_loss,
        FightResult::Draw => params.xp_draw,
    };
    if vs_bot {
        xp /= 2;
    }
    if double_xp {
        xp *= 2;
    }
    xp
}

/// Training amount granted by fighting an opponent of the given horoscope
pub fn horoscope_training(opponent_horoscope: u8) -> u32 {
    HOROSCOPE_TRAINING[(opponent_horoscope % 12) as usize]
}

/// Apply XP and the training boost to one wrestler
///
/// The boosted stat cycles with the battle id (attack, defense, stamina);
/// the amount comes from the opponent's horoscope, clamped to the training
/// cap inside the wrestler.
pub fn apply_progression(
    wrestler: &mut Wrestler,
    xp: u64,
    opponent_horoscope: u8,
    battle_id: u64,
) {
    wrestler.add_experience(xp);
    let slot = (battle_id % 3) as u8;
    let amount = horoscope_training(opponent_horoscope);
    wrestler.training_mut().add_clamped(slot, amount);
}

/// Update one mode record in place
pub fn apply_record(record: &mut ModeRecord, result: FightResult) {
    match result {
        FightResult::Win => {
            record.wins += 1;
            record.streak += 1;
        }
        FightResult::Loss => {
            record.losses += 1;
            record.streak = 0;
        }
        FightResult::Draw => {
            record.draws += 1;
            record.streak = 0;
        }
    }
}

/// Remember the opponent for the matchmaker's rematch penalty
pub fn note_opponent(account: &mut Account, opponent: &str) {
    account.last_opponent = Some(opponent.to_string());
}
