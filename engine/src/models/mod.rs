//! Domain models
//!
//! Persistent record types the engine operates on. Wrestler and Item records
//! live behind the object-store boundary (serialized as JSON bytes); Account
//! and Battle records are engine-internal contract storage.

pub mod account;
pub mod battle;
pub mod item;
pub mod wrestler;
