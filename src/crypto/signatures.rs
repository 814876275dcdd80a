use crate::{LedgerError, Result};
use secp256k1::ecdsa::Signature as Secp256k1Signature;
use serde::{Deserialize, Serialize};

/// Compact 64-byte ECDSA signature (`r || s`).
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Signature {
    r: [u8; 32],
    s: [u8; 32],
}

impl Signature {
    pub fn from_bytes(bytes: &[u8]) -> Result<Self> {
        if bytes.len() != 64 {
            return Err(LedgerError::Crypto("Invalid signature length".to_string()));
        }

        let mut r = [0u8; 32];
        let mut s = [0u8; 32];

        r.copy_from_slice(&bytes[0..32]);
        s.copy_from_slice(&bytes[32..64]);

        Ok(Self { r, s })
    }

    pub fn from_hex(hex_str: &str) -> Result<Self> {
        Self::from_bytes(&hex::decode(hex_str.trim())?)
    }

    pub fn to_bytes(&self) -> [u8; 64] {
        let mut bytes = [0u8; 64];
        bytes[..32].copy_from_slice(&self.r);
        bytes[32..].copy_from_slice(&self.s);
        bytes
    }

    pub fn to_hex(&self) -> String {
        hex::encode(self.to_bytes())
    }

    pub fn from_secp256k1(signature: Secp256k1Signature) -> Self {
        let compact = signature.serialize_compact();

        let mut r = [0u8; 32];
        let mut s = [0u8; 32];
        r.copy_from_slice(&compact[0..32]);
        s.copy_from_slice(&compact[32..64]);

        Self { r, s }
    }

    pub fn to_secp256k1(&self) -> Result<Secp256k1Signature> {
        Secp256k1Signature::from_compact(&self.to_bytes())
            .map_err(|e| LedgerError::Crypto(format!("Invalid signature: {}", e)))
    }
}
