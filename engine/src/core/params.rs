//! Engine parameters
//!
//! Every tunable lives here with a documented default, so no call site
//! carries magic numbers. The struct is plain data and serializable: a
//! deployment pins one `EngineParams` value and every replica resolves
//! against the same numbers.

use serde::{Deserialize, Serialize};

/// All tunable constants of the battle engine
///
/// # Example
/// ```
/// use battle_engine_core_rs::EngineParams;
///
/// let params = EngineParams::default();
/// assert_eq!(params.elo_k, 32);
/// assert_eq!(params.challenge_ttl_secs, 300);
/// ```
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EngineParams {
    /// Token symbol bets are escrowed in
    pub bet_token: String,

    /// Address of the shared ranked pot
    pub pot_address: String,

    /// Address escrowed stakes are held at between join and settlement
    pub escrow_address: String,

    /// Fixed stake required for Ranked mode (minimal units)
    pub ranked_fee: i64,

    /// Rake taken from the Ranked winner payout, in basis points
    pub rake_bps: i64,

    /// Versus challenge lifetime, seconds
    pub challenge_ttl_secs: u64,

    /// Idle time after which a queue entry is evicted, seconds
    pub queue_idle_ttl_secs: u64,

    /// Minimum time between two UpdateQueue calls, seconds
    pub update_cooldown_secs: u64,

    /// Unranked idle time after which UpdateQueue falls back to a bot match
    pub unranked_bot_fallback_secs: u64,

    /// Minimum mutual wait before the tie-break bonus applies, seconds
    pub queue_wait_bonus_secs: u64,

    /// Idle time after which a lagging side is force-submitted Idle, seconds
    pub turn_idle_secs: u64,

    /// Grace period before CancelMatch may fire, seconds
    pub turn_grace_secs: u64,

    /// A battle untouched for this long is broken and force-cancelled
    pub battle_broken_secs: u64,

    /// ELO K-factor
    pub elo_k: i32,

    /// Experience award for a win
    pub xp_win: u64,

    /// Experience award for a loss
    pub xp_loss: u64,

    /// Experience award for a draw
    pub xp_draw: u64,

    /// Mojo pool cap per wrestler
    pub mojo_max: u32,

    /// Seconds to regenerate one mojo point
    pub mojo_regen_secs: u64,
}

impl Default for EngineParams {
    fn default() -> Self {
        Self {
            bet_token: "LUCHA".to_string(),
            pot_address: "pot".to_string(),
            escrow_address: "escrow".to_string(),
            ranked_fee: 5_000,
            rake_bps: 500,
            challenge_ttl_secs: 300,
            queue_idle_ttl_secs: 600,
            update_cooldown_secs: 15,
            unranked_bot_fallback_secs: 120,
            queue_wait_bonus_secs: 60,
            turn_idle_secs: 90,
            turn_grace_secs: 600,
            battle_broken_secs: 86_400,
            elo_k: 32,
            xp_win: 120,
            xp_loss: 40,
            xp_draw: 60,
            mojo_max: 10,
            mojo_regen_secs: 3_600,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults_are_consistent() {
        let p = EngineParams::default();
        // The rake must leave the winner with more than a single stake,
        // otherwise Ranked wins would pay worse than a refund.
        let rake = p.ranked_fee * p.rake_bps / 10_000;
        assert!(2 * p.ranked_fee - rake > p.ranked_fee);
        assert!(p.update_cooldown_secs < p.queue_idle_ttl_secs);
        assert!(p.turn_idle_secs < p.turn_grace_secs);
        assert!(p.turn_grace_secs < p.battle_broken_secs);
    }
}
