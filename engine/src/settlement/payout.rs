//! Bet payout table
//!
//! Every amount is integer minimal units. The table conserves value by
//! construction: `winner + loser + pot == 2 * bet` for all modes, with
//! truncating-division remainders from the rake absorbed by the pot.

use crate::core::params::EngineParams;
use crate::models::battle::BattleMode;

/// Where the two escrowed stakes end up
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Payout {
    pub winner_amount: i64,
    pub loser_amount: i64,
    pub pot_amount: i64,
}

impl Payout {
    pub fn total(&self) -> i64 {
        self.winner_amount + self.loser_amount + self.pot_amount
    }
}

/// Payout for a decisive result
///
/// Practice carries no bet; Unranked pays the winner both stakes; Ranked
/// pays `2*bet - rake` with the rake (and its rounding remainder) going to
/// the shared pot.
pub fn decisive_payout(mode: BattleMode, bet: i64, params: &EngineParams) -> Payout {
    match mode {
        BattleMode::Practice => Payout {
            winner_amount: 0,
            loser_amount: 0,
            pot_amount: 0,
        },
        BattleMode::Unranked | BattleMode::Versus => Payout {
            winner_amount: 2 * bet,
            loser_amount: 0,
            pot_amount: 0,
        },
        BattleMode::Ranked => {
            // The winner share truncates; the pot absorbs the remainder
            let stake = 2 * bet;
            let winner_amount = stake * (10_000 - params.rake_bps) / 10_000;
            Payout {
                winner_amount,
                loser_amount: 0,
                pot_amount: stake - winner_amount,
            }
        }
    }
}

/// Payout for a draw: both stakes go back where they came from
pub fn draw_payout(bet: i64) -> Payout {
    Payout {
        winner_amount: bet,
        loser_amount: bet,
        pot_amount: 0,
    }
}
