//! blocklink - a single-node hash-linked ledger
//!
//! This library implements:
//! - Blocks and transactions hashed over a canonical JSON form
//! - Proof-of-work mining with a fixed leading-zeros target
//! - Balance accounting over committed blocks and the pending pool
//! - secp256k1 signed transfers with a reserved mining-reward sender
//! - Best-effort HTTP gossip of transactions and blocks to peers
//! - Flat-file persistence with atomic rewrites
//! - CLI and REST API front ends

pub mod core;
pub mod crypto;
pub mod wallet;
pub mod mining;
pub mod network;
pub mod storage;
pub mod cli;
pub mod api;
pub mod consensus;
pub mod error;
pub mod config;
pub mod node;

pub use error::{LedgerError, Result};
