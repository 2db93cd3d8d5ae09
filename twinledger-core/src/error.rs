use thiserror::Error;

use crate::types::Address;

pub type Result<T> = std::result::Result<T, LedgerError>;

#[derive(Error, Debug)]
pub enum LedgerError {
    #[error("Storage error: {0}")]
    Storage(#[from] rusqlite::Error),

    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Invalid address: {0}")]
    InvalidAddress(String),

    #[error("Invalid hex value: {0}")]
    InvalidHex(String),

    #[error("Account not found: {name}")]
    AccountNotFound { name: String },

    #[error("Account already exists: {name}")]
    AccountExists { name: String },

    #[error("Contract not found: {0}")]
    ContractNotFound(String),

    #[error("No matching message from {from} to {to}")]
    MessageNotFound { from: Address, to: Address },

    #[error("Malformed message payload: {0}")]
    Payload(String),

    #[error("Invalid configuration: {0}")]
    Config(String),

    #[error("Operation timeout: {0}")]
    Timeout(String),

    #[error("Internal error: {0}")]
    Internal(String),
}

impl LedgerError {
    pub fn config(msg: impl Into<String>) -> Self {
        Self::Config(msg.into())
    }

    pub fn internal(msg: impl Into<String>) -> Self {
        Self::Internal(msg.into())
    }

    pub fn payload(msg: impl Into<String>) -> Self {
        Self::Payload(msg.into())
    }

    pub fn timeout(msg: impl Into<String>) -> Self {
        Self::Timeout(msg.into())
    }
}
