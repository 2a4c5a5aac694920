use thiserror::Error;

#[derive(Error, Debug)]
pub enum LedgerError {
    #[error("Invalid amount: {0}")]
    InvalidAmount(String),
    #[error("Insufficient funds: {0}")]
    InsufficientFunds(String),
    #[error("Overdraft exceeded: {0}")]
    OverdraftExceeded(String),
    #[error("Account not found: {0}")]
    AccountNotFound(String),
    #[error("Malformed id: {0}")]
    MalformedId(String),
    #[error("Duplicate account number: {0}")]
    DuplicateAccountNumber(String),
    #[error("Capacity exceeded: {0}")]
    CapacityExceeded(String),
    #[error("Unsupported operation: {0}")]
    UnsupportedOperation(String),
    #[error("Transaction targets {found}, but was confirmed against {expected}")]
    AccountMismatch { expected: String, found: String },
    #[error("Corrupt snapshot: {0}")]
    CorruptSnapshot(String),
    #[error("Configuration error: {0}")]
    Config(String),
    #[error("CSV error: {0}")]
    Csv(#[from] csv::Error),
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),
    #[cfg(feature = "storage-rocksdb")]
    #[error("Storage error: {0}")]
    Storage(#[from] rocksdb::Error),
}

pub type Result<T> = std::result::Result<T, LedgerError>;
