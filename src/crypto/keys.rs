use crate::crypto::hash::Hash256;
use crate::crypto::signatures::Signature;
use crate::{LedgerError, Result};
use secp256k1::{Secp256k1, SecretKey, PublicKey as Secp256k1PublicKey, Message};
use rand::{rngs::OsRng, RngCore};
use serde::{Deserialize, Serialize};
use std::fmt;

#[derive(Debug, Clone)]
pub struct PrivateKey {
    key: SecretKey,
}

/// Compressed SEC1 encoding. Its hex form is the participant identity used as
/// a transaction sender.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PublicKey {
    key: Vec<u8>,
}

#[derive(Debug, Clone)]
pub struct KeyPair {
    pub private_key: PrivateKey,
    pub public_key: PublicKey,
}

impl PrivateKey {
    pub fn new() -> Result<Self> {
        let mut rng = OsRng;
        let mut secret_bytes = [0u8; 32];
        rng.fill_bytes(&mut secret_bytes);

        let secret_key = SecretKey::from_slice(&secret_bytes)
            .map_err(|e| LedgerError::Crypto(format!("Failed to create private key: {}", e)))?;

        Ok(Self { key: secret_key })
    }

    pub fn from_bytes(bytes: &[u8]) -> Result<Self> {
        if bytes.len() != 32 {
            return Err(LedgerError::Crypto("Private key must be 32 bytes".to_string()));
        }

        let secret_key = SecretKey::from_slice(bytes)
            .map_err(|e| LedgerError::Crypto(format!("Invalid private key: {}", e)))?;

        Ok(Self { key: secret_key })
    }

    pub fn from_hex(hex_str: &str) -> Result<Self> {
        Self::from_bytes(&hex::decode(hex_str.trim())?)
    }

    pub fn to_bytes(&self) -> [u8; 32] {
        self.key.secret_bytes()
    }

    pub fn to_hex(&self) -> String {
        hex::encode(self.to_bytes())
    }

    pub fn public_key(&self) -> PublicKey {
        let secp = Secp256k1::new();
        let public_key = Secp256k1PublicKey::from_secret_key(&secp, &self.key);

        PublicKey {
            key: public_key.serialize().to_vec(),
        }
    }

    pub fn sign(&self, message: &Hash256) -> Result<Signature> {
        let secp = Secp256k1::new();
        let message = Message::from_slice(message.as_bytes())
            .map_err(|e| LedgerError::Crypto(format!("Invalid message: {}", e)))?;

        let signature = secp.sign_ecdsa(&message, &self.key);
        Ok(Signature::from_secp256k1(signature))
    }
}

impl PublicKey {
    pub fn from_bytes(bytes: &[u8]) -> Result<Self> {
        if bytes.len() != 33 && bytes.len() != 65 {
            return Err(LedgerError::Crypto("Invalid public key length".to_string()));
        }

        let _ = Secp256k1PublicKey::from_slice(bytes)
            .map_err(|e| LedgerError::Crypto(format!("Invalid public key: {}", e)))?;

        Ok(Self {
            key: bytes.to_vec(),
        })
    }

    pub fn from_hex(hex_str: &str) -> Result<Self> {
        Self::from_bytes(&hex::decode(hex_str.trim())?)
    }

    pub fn to_bytes(&self) -> &[u8] {
        &self.key
    }

    pub fn to_hex(&self) -> String {
        hex::encode(&self.key)
    }

    /// Returns `Ok(false)` for a well-formed signature that does not match.
    pub fn verify(&self, message: &Hash256, signature: &Signature) -> Result<bool> {
        let secp = Secp256k1::verification_only();

        let public_key = Secp256k1PublicKey::from_slice(&self.key)
            .map_err(|e| LedgerError::Crypto(format!("Invalid public key: {}", e)))?;

        let message = Message::from_slice(message.as_bytes())
            .map_err(|e| LedgerError::Crypto(format!("Invalid message: {}", e)))?;

        let secp_signature = signature.to_secp256k1()?;

        match secp.verify_ecdsa(&message, &secp_signature, &public_key) {
            Ok(()) => Ok(true),
            Err(_) => Ok(false),
        }
    }
}

impl KeyPair {
    pub fn new() -> Result<Self> {
        let private_key = PrivateKey::new()?;
        let public_key = private_key.public_key();

        Ok(Self {
            private_key,
            public_key,
        })
    }

    pub fn from_private_key(private_key: PrivateKey) -> Self {
        let public_key = private_key.public_key();

        Self {
            private_key,
            public_key,
        }
    }
}

impl fmt::Display for PublicKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.to_hex())
    }
}
