//! Deterministic random number generation
//!
//! All simulation randomness flows through one explicit, seeded stream.
//! There is no hidden global: the stream is constructed per resolved turn
//! and passed by value through the pipeline.

pub mod xorshift;

pub use xorshift::TurnRng;
