//! Ledger time
//!
//! The engine never reads wall-clock time. Every exposed call carries the
//! hosting ledger's block timestamp, and the clock only ever moves forward.
//! Timeouts (idle turns, queue expiry, challenge expiry) are decided against
//! this clock, never against local time.

use serde::{Deserialize, Serialize};

/// Monotonic ledger timestamp source, advanced only by incoming calls
///
/// # Example
/// ```
/// use battle_engine_core_rs::LedgerClock;
///
/// let mut clock = LedgerClock::new();
/// clock.observe(1_700_000_000);
/// assert_eq!(clock.now(), 1_700_000_000);
///
/// // A stale timestamp never moves the clock backwards
/// clock.observe(1_699_999_999);
/// assert_eq!(clock.now(), 1_700_000_000);
/// ```
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct LedgerClock {
    /// Latest block timestamp seen, in seconds
    now: u64,
}

impl LedgerClock {
    /// Create a clock at time zero (no block observed yet)
    pub fn new() -> Self {
        Self { now: 0 }
    }

    /// Fold in the timestamp of the current call's block
    ///
    /// The ledger serializes calls, so timestamps arrive non-decreasing in
    /// practice; a stale value is ignored rather than rewinding time.
    pub fn observe(&mut self, timestamp: u64) {
        if timestamp > self.now {
            self.now = timestamp;
        }
    }

    /// Current ledger time in seconds
    pub fn now(&self) -> u64 {
        self.now
    }

    /// Seconds elapsed since `earlier`, saturating at zero
    pub fn elapsed_since(&self, earlier: u64) -> u64 {
        self.now.saturating_sub(earlier)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_clock_never_rewinds() {
        let mut clock = LedgerClock::new();
        clock.observe(100);
        clock.observe(50);
        assert_eq!(clock.now(), 100);
    }

    #[test]
    fn test_elapsed_saturates() {
        let mut clock = LedgerClock::new();
        clock.observe(100);
        assert_eq!(clock.elapsed_since(300), 0);
        assert_eq!(clock.elapsed_since(40), 60);
    }
}
