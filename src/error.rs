use thiserror::Error;

pub type Result<T> = std::result::Result<T, LedgerError>;

#[derive(Error, Debug)]
pub enum LedgerError {
    #[error("Insufficient funds: required {required}, available {available}")]
    InsufficientFunds { required: f64, available: f64 },

    #[error("Invalid signature")]
    InvalidSignature,

    #[error("Invalid amount: {0}")]
    InvalidAmount(f64),

    #[error("Invalid previous block hash")]
    InvalidBlockLinkage,

    #[error("Invalid proof of work")]
    InvalidProofOfWork,

    #[error("Block out of order: expected index {expected}, got {got}")]
    BlockOutOfOrder { expected: u64, got: u64 },

    #[error("Malformed block: {0}")]
    MalformedBlock(String),

    #[error("Local chain failed verification; refusing mutations until repaired")]
    ChainCorrupted,

    #[error("No wallet loaded for this node")]
    NoWallet,

    #[error("Mining cancelled")]
    MiningCancelled,

    #[error("Mined work is stale: chain tip or pending pool changed")]
    StaleWork,

    #[error("Crypto error: {0}")]
    Crypto(String),

    #[error("Wallet error: {0}")]
    Wallet(String),

    #[error("Mining error: {0}")]
    Mining(String),

    #[error("Network error: {0}")]
    Network(String),

    #[error("Storage error: {0}")]
    Storage(String),

    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Invalid input: {0}")]
    InvalidInput(String),
}

impl LedgerError {
    /// Validation failures: the operation was refused and no state changed.
    pub fn is_rejection(&self) -> bool {
        matches!(
            self,
            LedgerError::InsufficientFunds { .. }
                | LedgerError::InvalidSignature
                | LedgerError::InvalidAmount(_)
                | LedgerError::InvalidBlockLinkage
                | LedgerError::InvalidProofOfWork
                | LedgerError::BlockOutOfOrder { .. }
                | LedgerError::MalformedBlock(_)
        )
    }
}

impl From<secp256k1::Error> for LedgerError {
    fn from(err: secp256k1::Error) -> Self {
        LedgerError::Crypto(err.to_string())
    }
}

impl From<hex::FromHexError> for LedgerError {
    fn from(err: hex::FromHexError) -> Self {
        LedgerError::Crypto(format!("Hex decoding error: {}", err))
    }
}
