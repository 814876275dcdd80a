//! Cryptographic primitives: SHA-256 hashing, canonical encoding and secp256k1 keys

pub mod keys;
pub mod signatures;
pub mod hash;

pub use keys::{PrivateKey, PublicKey, KeyPair};
pub use signatures::Signature;
pub use hash::{Hash256, Hashable, Canonical, canonical_string, hash_canonical};
