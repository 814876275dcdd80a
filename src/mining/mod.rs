//! Proof-of-work search and verification

pub mod proof;
pub mod miner;

pub use proof::{valid_proof, proof_of_work, proof_hash, PROOF_PREFIX};
pub use miner::{Miner, MiningStats};
