//! Integer ELO rating updates
//!
//! The expected score comes from a per-mille lookup on the rating
//! difference (the stepped table used in over-the-board rating rules), so
//! the whole computation stays in integer arithmetic. Deltas are symmetric:
//! what the winner gains the loser loses.

/// Expected score table: (max difference, per-mille expected score of the
/// higher-rated player). The last row is open-ended.
const EXPECTED_TABLE: &[(i32, i32)] = &[
    (3, 500),
    (10, 514),
    (17, 529),
    (25, 543),
    (32, 557),
    (39, 571),
    (46, 586),
    (53, 600),
    (61, 614),
    (68, 628),
    (76, 642),
    (83, 655),
    (91, 669),
    (98, 682),
    (106, 695),
    (113, 708),
    (121, 721),
    (129, 733),
    (137, 745),
    (145, 757),
    (153, 768),
    (162, 779),
    (170, 790),
    (179, 800),
    (188, 810),
    (197, 820),
    (206, 830),
    (215, 839),
    (225, 848),
    (235, 856),
    (245, 864),
    (256, 872),
    (267, 879),
    (278, 886),
    (290, 893),
    (302, 899),
    (315, 905),
    (328, 911),
    (344, 916),
    (357, 921),
    (374, 926),
    (391, 930),
    (411, 935),
    (432, 939),
    (456, 942),
    (484, 946),
    (517, 949),
    (559, 952),
    (619, 955),
    (735, 958),
];

/// Open-ended ceiling of the table
const EXPECTED_MAX: i32 = 960;

/// Expected score, in per-mille, of the higher-rated player at a given
/// non-negative rating difference
fn expected_per_mille(diff: i32) -> i32 {
    debug_assert!(diff >= 0);
    for &(max_diff, expected) in EXPECTED_TABLE {
        if diff <= max_diff {
            return expected;
        }
    }
    EXPECTED_MAX
}

/// Rating deltas for a decisive result: `(winner_gain, loser_loss)`
///
/// Both values are non-negative and equal in magnitude. Equal pre-match
/// ratings with K = 32 give exactly 16 each way.
///
/// # Example
/// ```
/// use battle_engine_core_rs::settlement::rating::win_delta;
///
/// assert_eq!(win_delta(1200, 1200, 32), 16);
/// assert!(win_delta(1400, 1200, 32) < 16); // favourite gains less
/// assert!(win_delta(1200, 1400, 32) > 16); // upset gains more
/// ```
pub fn win_delta(winner_elo: i32, loser_elo: i32, k: i32) -> i32 {
    let diff = (winner_elo - loser_elo).abs();
    let expected = if winner_elo >= loser_elo {
        expected_per_mille(diff)
    } else {
        1000 - expected_per_mille(diff)
    };
    // Rounded division keeps the two orderings complementary: the
    // favourite's gain and the underdog's gain always sum to exactly K
    (k * (1000 - expected) + 500) / 1000
}

/// Rating delta for a draw, applied as `(+delta, -delta)` to
/// `(lower_rated, higher_rated)`. Zero when ratings are equal.
pub fn draw_delta(elo_a: i32, elo_b: i32, k: i32) -> i32 {
    let diff = (elo_a - elo_b).abs();
    let expected = expected_per_mille(diff);
    (k * (expected - 500) + 500) / 1000
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_equal_ratings_give_half_k() {
        assert_eq!(win_delta(1200, 1200, 32), 16);
    }

    #[test]
    fn test_table_is_monotonic() {
        let mut last = 0;
        for &(max_diff, expected) in EXPECTED_TABLE {
            assert!(max_diff > 0);
            assert!(expected >= last);
            last = expected;
        }
        assert!(EXPECTED_MAX >= last);
    }

    #[test]
    fn test_favourite_gains_less_than_underdog() {
        let favourite = win_delta(1400, 1200, 32);
        let underdog = win_delta(1200, 1400, 32);
        assert!(favourite < 16);
        assert!(underdog > 16);
        // The two expected scores are complementary
        assert_eq!(favourite + underdog, 32);
    }

    #[test]
    fn test_extreme_gap_still_moves_a_point() {
        // Beyond the table's last row the favourite keeps a small gain
        assert_eq!(win_delta(2200, 1200, 32), 1);
        assert_eq!(win_delta(1200, 2200, 32), 31);
    }

    #[test]
    fn test_draw_moves_ratings_toward_each_other() {
        assert_eq!(draw_delta(1200, 1200, 32), 0);
        let delta = draw_delta(1300, 1200, 32);
        assert!(delta > 0 && delta < 16);
    }
}
