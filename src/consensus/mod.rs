//! Consensus rules: balance accounting, chain and transaction validation

pub mod balance;
pub mod validation;

pub use balance::get_balance;
pub use validation::Verification;
