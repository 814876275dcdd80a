use sha2::{Sha256, Digest};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::fmt;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Hash256([u8; 32]);

impl Hash256 {
    pub fn hash(data: &[u8]) -> Self {
        let mut hasher = Sha256::new();
        hasher.update(data);
        Self(hasher.finalize().into())
    }

    pub fn as_bytes(&self) -> &[u8; 32] {
        &self.0
    }

    pub fn to_hex(&self) -> String {
        hex::encode(self.0)
    }
}

impl fmt::Display for Hash256 {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.to_hex())
    }
}

pub trait Hashable {
    fn hash(&self) -> Hash256;
}

/// Values that have a single hashing representation independent of how they
/// were built or parsed.
pub trait Canonical {
    fn to_canonical(&self) -> Value;
}

impl<T: Canonical> Canonical for [T] {
    fn to_canonical(&self) -> Value {
        Value::Array(self.iter().map(Canonical::to_canonical).collect())
    }
}

/// Renders a canonical value as compact JSON.
///
/// `serde_json::Map` is backed by a `BTreeMap` unless the `preserve_order`
/// feature is enabled, so object keys always come out sorted. Nothing in this
/// crate may enable that feature.
pub fn canonical_string(value: &Value) -> String {
    value.to_string()
}

/// SHA-256 over the canonical rendering of `value`.
pub fn hash_canonical<T: Canonical + ?Sized>(value: &T) -> Hash256 {
    Hash256::hash(canonical_string(&value.to_canonical()).as_bytes())
}
