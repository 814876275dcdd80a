//! Core ledger components

pub mod blockchain;
pub mod block;
pub mod transaction;

pub use blockchain::{Blockchain, ChainInfo, MiningJob, MINING_REWARD};
pub use block::Block;
pub use transaction::{Transaction, MINING_SENDER};
