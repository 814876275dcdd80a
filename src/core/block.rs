use crate::core::Transaction;
use crate::crypto::hash::{Canonical, Hash256, Hashable, hash_canonical};
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use chrono::Utc;

pub const GENESIS_PROOF: u64 = 100;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Block {
    pub index: u64,
    pub previous_hash: String,
    pub transactions: Vec<Transaction>,
    pub proof: u64,
    pub timestamp: f64,
}

impl Block {
    pub fn new(index: u64, previous_hash: String, transactions: Vec<Transaction>, proof: u64) -> Self {
        Self {
            index,
            previous_hash,
            transactions,
            proof,
            timestamp: current_timestamp(),
        }
    }

    pub fn genesis() -> Self {
        Self {
            index: 0,
            previous_hash: String::new(),
            transactions: Vec::new(),
            proof: GENESIS_PROOF,
            timestamp: 0.0,
        }
    }

    /// Only the exact fixed root counts; a block merely claiming index 0 does not.
    pub fn is_genesis(&self) -> bool {
        *self == Self::genesis()
    }

    /// Everything except the trailing reward transaction, i.e. what the proof
    /// of work was computed over.
    pub fn proof_transactions(&self) -> &[Transaction] {
        match self.transactions.split_last() {
            Some((_, rest)) => rest,
            None => &[],
        }
    }

}

impl Canonical for Block {
    fn to_canonical(&self) -> Value {
        let mut fields = Map::new();
        fields.insert("index".to_string(), Value::from(self.index));
        fields.insert("previous_hash".to_string(), Value::from(self.previous_hash.as_str()));
        fields.insert("transactions".to_string(), self.transactions.to_canonical());
        fields.insert("proof".to_string(), Value::from(self.proof));
        fields.insert("timestamp".to_string(), Value::from(self.timestamp));
        Value::Object(fields)
    }
}

impl Hashable for Block {
    fn hash(&self) -> Hash256 {
        hash_canonical(self)
    }
}

/// Seconds since the Unix epoch with millisecond resolution.
pub fn current_timestamp() -> f64 {
    Utc::now().timestamp_millis() as f64 / 1000.0
}
