//! Realtime store errors

use estate_core::DomainError;
use thiserror::Error;

#[derive(Error, Debug, Clone, PartialEq)]
pub enum StoreError {
    #[error("store is offline")]
    Unavailable,

    #[error("{0} timed out")]
    Timeout(String),

    #[error("invalid path: {0}")]
    InvalidPath(String),

    #[error("serialization error: {0}")]
    Serialization(String),
}

impl From<serde_json::Error> for StoreError {
    fn from(e: serde_json::Error) -> Self {
        StoreError::Serialization(e.to_string())
    }
}

impl From<StoreError> for DomainError {
    fn from(e: StoreError) -> Self {
        match e {
            StoreError::Unavailable => DomainError::StoreUnavailable(e.to_string()),
            StoreError::Timeout(op) => DomainError::Timeout(op),
            StoreError::InvalidPath(p) => DomainError::invalid(format!("invalid key: {}", p)),
            StoreError::Serialization(msg) => DomainError::StoreUnavailable(msg),
        }
    }
}
