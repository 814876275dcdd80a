//! Node wallet: key creation, persistence, signing and verification

pub mod wallet;

pub use wallet::Wallet;
