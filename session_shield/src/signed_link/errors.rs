use thiserror::Error;

use crate::storage::StorageError;

/// Why a link was rejected.
///
/// The variants exist for logs and tests. Callers outside the crate should surface
/// every one of them with the same generic message.
#[derive(Debug, Error, Clone, PartialEq)]
pub enum SignedLinkError {
    #[error("Signed link is malformed: {0}")]
    Malformed(String),

    #[error("Signed link signature mismatch")]
    BadSignature,

    #[error("Signed link expired")]
    Expired,

    #[error("Signed link already used")]
    Consumed,

    #[error("Signed link uses a reserved parameter: {0}")]
    ReservedParameter(String),

    #[error("Storage error: {0}")]
    Storage(String),
}

impl SignedLinkError {
    /// True for the rejections a visitor can cause, false for infrastructure failures.
    pub fn is_rejection(&self) -> bool {
        !matches!(self, Self::Storage(_) | Self::ReservedParameter(_))
    }
}

impl From<StorageError> for SignedLinkError {
    fn from(err: StorageError) -> Self {
        let error = Self::Storage(err.to_string());
        tracing::error!("Signed link storage failure: {}", error);
        error
    }
}

impl From<url::ParseError> for SignedLinkError {
    fn from(err: url::ParseError) -> Self {
        Self::Malformed(err.to_string())
    }
}
