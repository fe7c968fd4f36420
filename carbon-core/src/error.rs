//! Crate-level error taxonomy.
//!
//! Every fallible core operation returns a `CarbonResult<T>`. Subsystems
//! define their own small error enum and fold into `CarbonError` via
//! `#[from]`, so callers that only care about one subsystem can match on
//! the leaf type while the ledger actor can still propagate a single type.

use thiserror::Error;

/// Top-level error type returned by `carbon-core` operations.
#[derive(Debug, Error)]
pub enum CarbonError {
    #[error("panel registry error: {0}")]
    Registry(#[from] RegistryError),

    #[error("transaction error: {0}")]
    Transaction(#[from] TransactionError),

    #[error("mining error: {0}")]
    Mining(#[from] MiningError),

    #[error("chain validation error: {0}")]
    Chain(#[from] ChainError),

    #[error("persistence error: {0}")]
    Persistence(#[from] PersistenceError),

    #[error("contract error: {0}")]
    Contract(#[from] ContractError),
}

pub type CarbonResult<T> = Result<T, CarbonError>;

#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum RegistryError {
    #[error("panel {0} is already registered")]
    PanelAlreadyRegistered(String),

    #[error("panel {0} is not known to the registry")]
    PanelUnknown(String),
}

#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum TransactionError {
    #[error("invalid transaction: {0}")]
    Invalid(String),

    #[error("balance of {sender} ({balance}) is insufficient to send {amount}")]
    InsufficientBalance {
        sender: String,
        balance: String,
        amount: String,
    },
}

#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum MiningError {
    #[error("no pending samples or transactions to mine")]
    EmptyPending,

    #[error("chain tip moved while mining; mined block was discarded")]
    StaleTip,

    #[error("mining was cancelled")]
    Cancelled,
}

#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum ChainError {
    #[error("chain is invalid starting at block index {index}: {reason}")]
    Invalid { index: u64, reason: String },
}

#[derive(Debug, Error)]
pub enum PersistenceError {
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("snapshot is corrupt: {0}")]
    SnapshotCorrupt(String),

    #[error("loaded snapshot failed chain validation: {0}")]
    ValidationFailed(#[from] ChainError),
}

#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum ContractError {
    #[error("contract {0} is not registered")]
    NotFound(String),

    #[error("contract {0} received invalid arguments: {1}")]
    InvalidArguments(String, String),
}
