//! Core primitives: ledger time, call context, engine parameters

pub mod clock;
pub mod context;
pub mod params;
