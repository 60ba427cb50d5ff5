//! xorshift64* random number generator
//!
//! Fast, high-quality PRNG that is deterministic and suitable for replicated
//! resolution: same seed → same sequence on every validating node.
//!
//! # Seeding
//!
//! The stream for a resolved turn is derived with SHA-256 from the
//! triggering transaction hash, the battle id and the turn number, so two
//! turns of the same battle (or the same turn of two battles) never share a
//! stream even when resolved by the same transaction.

use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};

/// Deterministic random number generator using xorshift64*
///
/// # Example
/// ```
/// use battle_engine_core_rs::TurnRng;
///
/// let mut rng = TurnRng::new(12345);
/// let value = rng.next();
/// let roll = rng.roll(100); // [0, 100)
/// assert!(roll < 100);
/// ```
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TurnRng {
    /// Internal state (64-bit)
    state: u64,
}

impl TurnRng {
    /// Create a new RNG with given seed
    pub fn new(seed: u64) -> Self {
        // Ensure seed is never zero (xorshift requirement)
        let state = if seed == 0 { 1 } else { seed };
        Self { state }
    }

    /// Seed a stream from a 32-byte transaction hash
    ///
    /// # Example
    /// ```
    /// use battle_engine_core_rs::TurnRng;
    ///
    /// let mut a = TurnRng::from_hash(&[9u8; 32]);
    /// let mut b = TurnRng::from_hash(&[9u8; 32]);
    /// assert_eq!(a.next(), b.next());
    /// ```
    pub fn from_hash(hash: &[u8; 32]) -> Self {
        let mut seed_bytes = [0u8; 8];
        seed_bytes.copy_from_slice(&hash[..8]);
        Self::new(u64::from_le_bytes(seed_bytes))
    }

    /// Derive the stream for one resolved turn
    ///
    /// `SHA-256(tx_hash ‖ battle_id ‖ turn)` folded into a 64-bit seed.
    pub fn for_turn(tx_hash: &[u8; 32], battle_id: u64, turn: u32) -> Self {
        let mut hasher = Sha256::new();
        hasher.update(tx_hash);
        hasher.update(battle_id.to_le_bytes());
        hasher.update(turn.to_le_bytes());
        let digest: [u8; 32] = hasher.finalize().into();
        Self::from_hash(&digest)
    }

    /// Generate next random u64 value
    pub fn next(&mut self) -> u64 {
        // xorshift64* algorithm
        let mut x = self.state;
        x ^= x >> 12;
        x ^= x << 25;
        x ^= x >> 27;
        self.state = x;
        x.wrapping_mul(0x2545F4914F6CDD1D)
    }

    /// Uniform draw in `[0, bound)`
    ///
    /// # Panics
    /// Panics if bound == 0
    pub fn roll(&mut self, bound: u32) -> u32 {
        assert!(bound > 0, "bound must be positive");
        (self.next() % bound as u64) as u32
    }

    /// Uniform draw in `[min, max)`
    ///
    /// # Panics
    /// Panics if min >= max
    pub fn range(&mut self, min: i64, max: i64) -> i64 {
        assert!(min < max, "min must be less than max");
        let range_size = (max - min) as u64;
        min + (self.next() % range_size) as i64
    }

    /// Current state (for checkpointing/replay)
    pub fn get_state(&self) -> u64 {
        self.state
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_zero_seed_converted_to_nonzero() {
        let rng = TurnRng::new(0);
        assert_ne!(rng.get_state(), 0, "Zero seed should be converted to 1");
    }

    #[test]
    #[should_panic(expected = "min must be less than max")]
    fn test_range_invalid_bounds() {
        let mut rng = TurnRng::new(12345);
        rng.range(100, 50); // min > max should panic
    }

    #[test]
    fn test_roll_in_bound() {
        let mut rng = TurnRng::new(12345);
        for _ in 0..1000 {
            assert!(rng.roll(100) < 100);
        }
    }

    #[test]
    fn test_turn_streams_are_distinct() {
        let tx = [3u8; 32];
        let mut turn1 = TurnRng::for_turn(&tx, 7, 1);
        let mut turn2 = TurnRng::for_turn(&tx, 7, 2);
        let mut other_battle = TurnRng::for_turn(&tx, 8, 1);
        let first = turn1.next();
        assert_ne!(first, turn2.next());
        assert_ne!(first, other_battle.next());
    }

    #[test]
    fn test_turn_stream_replays_identically() {
        let tx = [0xAB; 32];
        let a: Vec<u64> = {
            let mut rng = TurnRng::for_turn(&tx, 42, 5);
            (0..32).map(|_| rng.next()).collect()
        };
        let b: Vec<u64> = {
            let mut rng = TurnRng::for_turn(&tx, 42, 5);
            (0..32).map(|_| rng.next()).collect()
        };
        assert_eq!(a, b);
    }
}
