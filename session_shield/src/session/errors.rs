use thiserror::Error;

use crate::storage::StorageError;
use crate::utils::UtilError;

#[derive(Debug, Error, Clone)]
pub enum SessionError {
    #[error("Storage error: {0}")]
    Storage(String),

    #[error("Crypto error: {0}")]
    Crypto(String),

    #[error("Cookie error: {0}")]
    Cookie(String),

    #[error("Header error: {0}")]
    HeaderError(String),

    #[error("Serialization error: {0}")]
    Serde(String),

    /// A stored blob could not be decoded. Recovered internally by starting an
    /// empty session; never returned from `SessionManager::start`.
    #[error("Session payload corrupted: {0}")]
    Corrupted(String),

    #[error("Value out of range: {0}")]
    OutOfRange(String),

    #[error("Utils error: {0}")]
    Utils(#[from] UtilError),
}

impl From<StorageError> for SessionError {
    fn from(err: StorageError) -> Self {
        let error = Self::Storage(err.to_string());
        tracing::error!("Session storage failure: {}", error);
        error
    }
}

impl From<serde_json::Error> for SessionError {
    fn from(err: serde_json::Error) -> Self {
        Self::Serde(err.to_string())
    }
}
