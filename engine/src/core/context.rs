//! Call context
//!
//! Every exposed operation is one synchronous, all-or-nothing state
//! transition triggered by a ledger transaction. The context carries the
//! three ambient facts the engine is allowed to read: who signed the call,
//! when the block was sealed, and the transaction hash that seeds the
//! per-turn random stream.

use serde::{Deserialize, Serialize};

/// Ambient facts of one incoming call
///
/// # Example
/// ```
/// use battle_engine_core_rs::CallContext;
///
/// let ctx = CallContext::new("alice", 1_700_000_000, [7u8; 32]);
/// assert_eq!(ctx.caller, "alice");
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CallContext {
    /// Address that signed the triggering transaction
    pub caller: String,

    /// Block timestamp, seconds
    pub timestamp: u64,

    /// Hash of the triggering transaction, the only entropy source
    pub tx_hash: [u8; 32],
}

impl CallContext {
    pub fn new(caller: &str, timestamp: u64, tx_hash: [u8; 32]) -> Self {
        Self {
            caller: caller.to_string(),
            timestamp,
            tx_hash,
        }
    }
}
