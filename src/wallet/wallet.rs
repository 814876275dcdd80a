use crate::core::Transaction;
use crate::crypto::keys::{KeyPair, PrivateKey, PublicKey};
use crate::crypto::signatures::Signature;
use crate::storage::{Database, StoredKeys};
use crate::{LedgerError, Result};

/// Key material for one node. Keys are passed in explicitly; nothing here is
/// global.
#[derive(Debug, Clone)]
pub struct Wallet {
    node_id: String,
    keys: Option<KeyPair>,
}

impl Wallet {
    pub fn new(node_id: impl Into<String>) -> Self {
        Self {
            node_id: node_id.into(),
            keys: None,
        }
    }

    pub fn create_keys(&mut self) -> Result<&KeyPair> {
        let keys = KeyPair::new()?;
        log::info!("🔑 Created wallet keys for node {}", self.node_id);
        Ok(self.keys.insert(keys))
    }

    pub fn save_keys(&self, db: &Database) -> Result<()> {
        let keys = self.keys.as_ref().ok_or(LedgerError::NoWallet)?;

        db.save_keys(&self.node_id, &StoredKeys {
            public_key: keys.public_key.to_hex(),
            private_key: keys.private_key.to_hex(),
        })
    }

    /// Returns whether a key file was found.
    pub fn load_keys(&mut self, db: &Database) -> Result<bool> {
        let stored = match db.load_keys(&self.node_id)? {
            Some(stored) => stored,
            None => return Ok(false),
        };

        let private_key = PrivateKey::from_hex(&stored.private_key)?;
        let keys = KeyPair::from_private_key(private_key);

        if keys.public_key.to_hex() != stored.public_key {
            return Err(LedgerError::Wallet("Stored public key does not match private key".to_string()));
        }

        self.keys = Some(keys);
        Ok(true)
    }

    pub fn public_key(&self) -> Option<String> {
        self.keys.as_ref().map(|keys| keys.public_key.to_hex())
    }

    pub fn node_id(&self) -> &str {
        &self.node_id
    }

    pub fn sign_transaction(&self, sender: &str, recipient: &str, amount: f64) -> Result<String> {
        let keys = self.keys.as_ref().ok_or(LedgerError::NoWallet)?;
        let signature = keys.private_key.sign(&Transaction::signing_hash(sender, recipient, amount))?;
        Ok(signature.to_hex())
    }

    /// Checks `tx.signature` against the public key named by `tx.sender`.
    /// Malformed keys or signatures count as a failed verification.
    pub fn verify_transaction(tx: &Transaction) -> bool {
        let public_key = match PublicKey::from_hex(&tx.sender) {
            Ok(key) => key,
            Err(_) => return false,
        };
        let signature = match Signature::from_hex(&tx.signature) {
            Ok(signature) => signature,
            Err(_) => return false,
        };

        public_key.verify(&tx.signature_hash(), &signature).unwrap_or(false)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    fn signed_transaction(wallet: &Wallet, recipient: &str, amount: f64) -> Transaction {
        let sender = wallet.public_key().unwrap();
        let signature = wallet.sign_transaction(&sender, recipient, amount).unwrap();
        Transaction::new(sender, recipient.to_string(), signature, amount)
    }

    #[test]
    fn test_sign_and_verify() -> Result<()> {
        let mut wallet = Wallet::new("5000");
        wallet.create_keys()?;

        let tx = signed_transaction(&wallet, "bob", 5.0);

        assert!(Wallet::verify_transaction(&tx));
        Ok(())
    }

    #[test]
    fn test_tampered_transaction_fails() -> Result<()> {
        let mut wallet = Wallet::new("5000");
        wallet.create_keys()?;

        let mut tx = signed_transaction(&wallet, "bob", 5.0);
        tx.amount = 50.0;
        assert!(!Wallet::verify_transaction(&tx));

        let mut tx = signed_transaction(&wallet, "bob", 5.0);
        tx.recipient = "mallory".to_string();
        assert!(!Wallet::verify_transaction(&tx));

        Ok(())
    }

    #[test]
    fn test_signature_from_other_key_fails() -> Result<()> {
        let mut alice = Wallet::new("5000");
        alice.create_keys()?;
        let mut mallory = Wallet::new("5001");
        mallory.create_keys()?;

        let mut tx = signed_transaction(&mallory, "mallory", 5.0);
        tx.sender = alice.public_key().unwrap();

        assert!(!Wallet::verify_transaction(&tx));
        Ok(())
    }

    #[test]
    fn test_garbage_sender_fails() {
        let tx = Transaction::new("alice".to_string(), "bob".to_string(), "00".to_string(), 1.0);
        assert!(!Wallet::verify_transaction(&tx));
    }

    #[test]
    fn test_sign_without_keys() {
        let wallet = Wallet::new("5000");

        assert!(matches!(wallet.sign_transaction("a", "b", 1.0), Err(LedgerError::NoWallet)));
        assert!(wallet.public_key().is_none());
    }

    #[test]
    fn test_save_and_load_keys() -> Result<()> {
        let temp_dir = TempDir::new().unwrap();
        let db = Database::new(temp_dir.path())?;

        let mut wallet = Wallet::new("5000");
        wallet.create_keys()?;
        wallet.save_keys(&db)?;

        let mut restored = Wallet::new("5000");
        assert!(restored.load_keys(&db)?);
        assert_eq!(restored.public_key(), wallet.public_key());

        let mut other = Wallet::new("5001");
        assert!(!other.load_keys(&db)?);

        Ok(())
    }
}
