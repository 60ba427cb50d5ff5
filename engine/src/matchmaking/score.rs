//! Pair scoring and best-match selection
//!
//! `match_score` rates one candidate pair; `find_match` scans the queue for
//! the strict-best non-negative score. Both are pure functions over
//! [`Candidate`] snapshots, so the scoring rules are testable without an
//! engine instance.

use crate::core::params::EngineParams;
use crate::models::battle::BattleMode;

/// Score returned for an unmatchable pair
pub const INCOMPATIBLE: i32 = -1;

/// Snapshot of one queued account, as seen by the scorer
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Candidate {
    pub address: String,
    pub mode: BattleMode,
    /// Highest level among the queued wrestlers
    pub level: u32,
    pub elo: i32,
    pub join_time: u64,
    pub last_opponent: Option<String>,
}

/// Rate a candidate pair
///
/// Returns [`INCOMPATIBLE`] for a self-pair or a mode mismatch. Otherwise
/// the score is a level-gap component plus an ELO-gap component, with a
/// penalty when the two fought each other in their most recent match.
/// Only non-negative scores are matchable.
///
/// # Example
/// ```
/// use battle_engine_core_rs::matchmaking::{match_score, Candidate};
/// use battle_engine_core_rs::models::battle::BattleMode;
///
/// let a = Candidate {
///     address: "alice".into(),
///     mode: BattleMode::Ranked,
///     level: 8,
///     elo: 1200,
///     join_time: 0,
///     last_opponent: None,
/// };
/// let mut b = a.clone();
/// b.address = "bob".into();
/// assert_eq!(match_score(&a, &b), 7);
/// ```
pub fn match_score(a: &Candidate, b: &Candidate) -> i32 {
    if a.address == b.address || a.mode != b.mode {
        return INCOMPATIBLE;
    }

    let level_gap = a.level.abs_diff(b.level) as i32;
    let level_component = 3 - level_gap;

    let elo_gap = (a.elo.abs_diff(b.elo) / 32) as i32;
    let elo_component = 4 - elo_gap;

    let rematch_penalty = if a.last_opponent.as_deref() == Some(b.address.as_str())
        && b.last_opponent.as_deref() == Some(a.address.as_str())
    {
        1
    } else {
        0
    };

    level_component + elo_component - rematch_penalty
}

/// Pick the strict-best matchable pair among `candidates`
///
/// Ties go to the pair whose *mutual* wait exceeds the configured bonus
/// window (+1 to the effective score). Scan order is the caller's slice
/// order, which the matchmaker keeps sorted, so replicas agree on the
/// winner of an exact tie.
pub fn find_match(
    candidates: &[Candidate],
    now: u64,
    params: &EngineParams,
) -> Option<(usize, usize)> {
    let mut best: Option<(i32, usize, usize)> = None;
    for i in 0..candidates.len() {
        for j in (i + 1)..candidates.len() {
            let score = match_score(&candidates[i], &candidates[j]);
            if score < 0 {
                continue;
            }
            let wait_i = now.saturating_sub(candidates[i].join_time);
            let wait_j = now.saturating_sub(candidates[j].join_time);
            let bonus = if wait_i.min(wait_j) >= params.queue_wait_bonus_secs {
                1
            } else {
                0
            };
            let effective = score + bonus;
            if best.map_or(true, |(b, _, _)| effective > b) {
                best = Some((effective, i, j));
            }
        }
    }
    best.map(|(_, i, j)| (i, j))
}
