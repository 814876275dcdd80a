use crate::core::{Block, Transaction};
use serde::{Deserialize, Serialize};

pub const BROADCAST_TRANSACTION_PATH: &str = "/broadcast-transaction";
pub const BROADCAST_BLOCK_PATH: &str = "/broadcast-block";

/// Body of `POST /broadcast-transaction`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BroadcastTransaction {
    pub sender: String,
    pub recipient: String,
    pub amount: f64,
    pub signature: String,
}

impl From<&Transaction> for BroadcastTransaction {
    fn from(tx: &Transaction) -> Self {
        Self {
            sender: tx.sender.clone(),
            recipient: tx.recipient.clone(),
            amount: tx.amount,
            signature: tx.signature.clone(),
        }
    }
}

/// Body of `POST /broadcast-block`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BroadcastBlock {
    pub block: Block,
}

/// What happened to one delivery attempt.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DeliveryOutcome {
    Accepted,
    /// The peer answered and refused.
    Declined(String),
    /// No usable answer: connection failure, timeout or garbage.
    Unreachable(String),
}

/// Per-peer results of one broadcast.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct BroadcastReport {
    pub accepted: Vec<String>,
    pub declined: Vec<(String, String)>,
    pub unreachable: Vec<(String, String)>,
}

impl BroadcastReport {
    pub fn record(&mut self, peer: &str, outcome: DeliveryOutcome) {
        match outcome {
            DeliveryOutcome::Accepted => self.accepted.push(peer.to_string()),
            DeliveryOutcome::Declined(reason) => self.declined.push((peer.to_string(), reason)),
            DeliveryOutcome::Unreachable(reason) => self.unreachable.push((peer.to_string(), reason)),
        }
    }

    pub fn attempted(&self) -> usize {
        self.accepted.len() + self.declined.len() + self.unreachable.len()
    }
}
