//! External collaborator interfaces
//!
//! The engine is embedded in a hosting ledger and consumes a handful of
//! services through narrow traits: token movement, raw object storage for
//! Wrestler/Item records, witness (signature) verification, and the
//! fire-and-forget event sink. The traits are deliberately small; their
//! implementations are not part of this crate's concern.
//!
//! In-memory implementations ship alongside for tests and local simulation.

use std::collections::HashMap;

use thiserror::Error;

use crate::events::EngineEvent;

/// Errors surfaced by the token ledger
#[derive(Debug, Error, PartialEq, Eq)]
pub enum LedgerError {
    #[error("Insufficient balance: {address} holds {available}, needs {required}")]
    InsufficientBalance {
        address: String,
        available: i64,
        required: i64,
    },

    #[error("Transfer amount must be positive, got {0}")]
    NonPositiveAmount(i64),

    #[error("Unknown token symbol {0}")]
    UnknownSymbol(String),
}

/// Errors surfaced by the object store
#[derive(Debug, Error, PartialEq, Eq)]
pub enum StoreError {
    #[error("No record for key {symbol}:{id}")]
    Missing { symbol: String, id: u64 },

    #[error("Record for key {symbol}:{id} failed to decode: {reason}")]
    Corrupt {
        symbol: String,
        id: u64,
        reason: String,
    },
}

/// Token transfer/mint/burn by symbol, address and amount
///
/// Transfers are atomic: debit and credit both happen or neither does.
pub trait TokenLedger {
    fn transfer(&mut self, symbol: &str, from: &str, to: &str, amount: i64)
        -> Result<(), LedgerError>;
    fn mint(&mut self, symbol: &str, to: &str, amount: i64) -> Result<(), LedgerError>;
    fn burn(&mut self, symbol: &str, from: &str, amount: i64) -> Result<(), LedgerError>;
    fn balance_of(&self, symbol: &str, address: &str) -> i64;
}

/// Raw record storage keyed by a symbol + numeric-id pair
///
/// Records cross this boundary as bytes; the engine serializes through
/// `serde_json` on either side.
pub trait ObjectStore {
    fn get(&self, symbol: &str, id: u64) -> Result<Vec<u8>, StoreError>;
    fn set(&mut self, symbol: &str, id: u64, bytes: Vec<u8>);
    fn contains(&self, symbol: &str, id: u64) -> bool;
}

/// Witness (signature) verification for the current call
pub trait WitnessSet {
    fn is_witness(&self, address: &str) -> bool;
}

/// Fire-and-forget notification sink consumed by off-chain indexers
pub trait EventSink {
    fn emit(&mut self, event: &EngineEvent);
}

// ---------------------------------------------------------------------------
// In-memory implementations (tests, local simulation)
// ---------------------------------------------------------------------------

/// In-memory token ledger
///
/// # Example
/// ```
/// use battle_engine_core_rs::{InMemoryLedger, TokenLedger};
///
/// let mut ledger = InMemoryLedger::new();
/// ledger.mint("LUCHA", "alice", 1_000).unwrap();
/// ledger.transfer("LUCHA", "alice", "bob", 400).unwrap();
/// assert_eq!(ledger.balance_of("LUCHA", "alice"), 600);
/// assert_eq!(ledger.balance_of("LUCHA", "bob"), 400);
/// ```
#[derive(Debug, Clone, Default)]
pub struct InMemoryLedger {
    /// (symbol, address) -> balance
    balances: HashMap<(String, String), i64>,
}

impl InMemoryLedger {
    pub fn new() -> Self {
        Self::default()
    }

    /// Sum over all addresses for one symbol (conservation checks in tests)
    pub fn total_supply(&self, symbol: &str) -> i64 {
        self.balances
            .iter()
            .filter(|((s, _), _)| s == symbol)
            .map(|(_, v)| *v)
            .sum()
    }

    fn entry(&mut self, symbol: &str, address: &str) -> &mut i64 {
        self.balances
            .entry((symbol.to_string(), address.to_string()))
            .or_insert(0)
    }
}

impl TokenLedger for InMemoryLedger {
    fn transfer(
        &mut self,
        symbol: &str,
        from: &str,
        to: &str,
        amount: i64,
    ) -> Result<(), LedgerError> {
        if amount <= 0 {
            return Err(LedgerError::NonPositiveAmount(amount));
        }
        let available = self.balance_of(symbol, from);
        if available < amount {
            return Err(LedgerError::InsufficientBalance {
                address: from.to_string(),
                available,
                required: amount,
            });
        }
        *self.entry(symbol, from) -= amount;
        *self.entry(symbol, to) += amount;
        Ok(())
    }

    fn mint(&mut self, symbol: &str, to: &str, amount: i64) -> Result<(), LedgerError> {
        if amount <= 0 {
            return Err(LedgerError::NonPositiveAmount(amount));
        }
        *self.entry(symbol, to) += amount;
        Ok(())
    }

    fn burn(&mut self, symbol: &str, from: &str, amount: i64) -> Result<(), LedgerError> {
        if amount <= 0 {
            return Err(LedgerError::NonPositiveAmount(amount));
        }
        let available = self.balance_of(symbol, from);
        if available < amount {
            return Err(LedgerError::InsufficientBalance {
                address: from.to_string(),
                available,
                required: amount,
            });
        }
        *self.entry(symbol, from) -= amount;
        Ok(())
    }

    fn balance_of(&self, symbol: &str, address: &str) -> i64 {
        self.balances
            .get(&(symbol.to_string(), address.to_string()))
            .copied()
            .unwrap_or(0)
    }
}

/// In-memory object store
#[derive(Debug, Clone, Default)]
pub struct InMemoryStore {
    records: HashMap<(String, u64), Vec<u8>>,
}

impl InMemoryStore {
    pub fn new() -> Self {
        Self::default()
    }
}

impl ObjectStore for InMemoryStore {
    fn get(&self, symbol: &str, id: u64) -> Result<Vec<u8>, StoreError> {
        self.records
            .get(&(symbol.to_string(), id))
            .cloned()
            .ok_or_else(|| StoreError::Missing {
                symbol: symbol.to_string(),
                id,
            })
    }

    fn set(&mut self, symbol: &str, id: u64, bytes: Vec<u8>) {
        self.records.insert((symbol.to_string(), id), bytes);
    }

    fn contains(&self, symbol: &str, id: u64) -> bool {
        self.records.contains_key(&(symbol.to_string(), id))
    }
}

/// Witness set backed by a plain list of addresses
#[derive(Debug, Clone, Default)]
pub struct StaticWitnessSet {
    addresses: Vec<String>,
}

impl StaticWitnessSet {
    pub fn new(addresses: Vec<String>) -> Self {
        Self { addresses }
    }
}

impl WitnessSet for StaticWitnessSet {
    fn is_witness(&self, address: &str) -> bool {
        self.addresses.iter().any(|a| a == address)
    }
}

/// Witness set that trusts every caller (single-signer test setups)
#[derive(Debug, Clone, Copy, Default)]
pub struct TrustingWitnessSet;

impl WitnessSet for TrustingWitnessSet {
    fn is_witness(&self, _address: &str) -> bool {
        true
    }
}

/// Event sink that records everything it sees
#[derive(Debug, Clone, Default)]
pub struct RecordingSink {
    pub events: Vec<EngineEvent>,
}

impl RecordingSink {
    pub fn new() -> Self {
        Self::default()
    }
}

impl EventSink for RecordingSink {
    fn emit(&mut self, event: &EngineEvent) {
        self.events.push(event.clone());
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_transfer_is_atomic_on_insufficient_balance() {
        let mut ledger = InMemoryLedger::new();
        ledger.mint("LUCHA", "alice", 100).unwrap();

        let err = ledger.transfer("LUCHA", "alice", "bob", 200).unwrap_err();
        assert_eq!(
            err,
            LedgerError::InsufficientBalance {
                address: "alice".to_string(),
                available: 100,
                required: 200,
            }
        );
        // Neither leg applied
        assert_eq!(ledger.balance_of("LUCHA", "alice"), 100);
        assert_eq!(ledger.balance_of("LUCHA", "bob"), 0);
    }

    #[test]
    fn test_transfer_conserves_supply() {
        let mut ledger = InMemoryLedger::new();
        ledger.mint("LUCHA", "alice", 1_000).unwrap();
        ledger.transfer("LUCHA", "alice", "bob", 250).unwrap();
        assert_eq!(ledger.total_supply("LUCHA"), 1_000);
    }

    #[test]
    fn test_store_missing_record() {
        let store = InMemoryStore::new();
        let err = store.get("wrestler", 7).unwrap_err();
        assert_eq!(
            err,
            StoreError::Missing {
                symbol: "wrestler".to_string(),
                id: 7,
            }
        );
    }

    #[test]
    fn test_store_round_trip() {
        let mut store = InMemoryStore::new();
        store.set("item", 3, vec![1, 2, 3]);
        assert!(store.contains("item", 3));
        assert_eq!(store.get("item", 3).unwrap(), vec![1, 2, 3]);
    }
}
