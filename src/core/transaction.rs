use crate::crypto::hash::{Canonical, Hash256, canonical_string};
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

/// Sender name carried by the synthetic reward transaction of a mined block.
pub const MINING_SENDER: &str = "MINING";

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Transaction {
    pub sender: String,
    pub recipient: String,
    pub signature: String,
    pub amount: f64,
}

impl Transaction {
    pub fn new(sender: String, recipient: String, signature: String, amount: f64) -> Self {
        Self {
            sender,
            recipient,
            signature,
            amount,
        }
    }

    pub fn new_reward(recipient: String, amount: f64) -> Self {
        Self {
            sender: MINING_SENDER.to_string(),
            recipient,
            signature: String::new(),
            amount,
        }
    }

    pub fn is_reward(&self) -> bool {
        self.sender == MINING_SENDER
    }

    /// Digest a wallet signs for `(sender, recipient, amount)`.
    pub fn signing_hash(sender: &str, recipient: &str, amount: f64) -> Hash256 {
        let mut payload = Map::new();
        payload.insert("sender".to_string(), Value::from(sender));
        payload.insert("recipient".to_string(), Value::from(recipient));
        payload.insert("amount".to_string(), Value::from(amount));

        Hash256::hash(canonical_string(&Value::Object(payload)).as_bytes())
    }

    pub fn signature_hash(&self) -> Hash256 {
        Self::signing_hash(&self.sender, &self.recipient, self.amount)
    }
}

impl Canonical for Transaction {
    fn to_canonical(&self) -> Value {
        let mut fields = Map::new();
        fields.insert("sender".to_string(), Value::from(self.sender.as_str()));
        fields.insert("recipient".to_string(), Value::from(self.recipient.as_str()));
        fields.insert("signature".to_string(), Value::from(self.signature.as_str()));
        fields.insert("amount".to_string(), Value::from(self.amount));
        Value::Object(fields)
    }
}
