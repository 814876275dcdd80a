//! Flat-file persistence for ledger state and wallet keys

pub mod database;

pub use database::{Database, LedgerState, StoredKeys};
