//! Error kinds surfaced to the HTTP boundary.

use thiserror::Error;

use crate::auth::AuthError;
use crate::config::ConfigError;
use crate::csrf::CsrfError;
use crate::session::SessionError;
use crate::signed_link::SignedLinkError;
use crate::storage::StorageError;
use crate::utils::UtilError;

/// Message shown for any rejected CSRF token.
pub const CSRF_FAILURE_MESSAGE: &str = "The link you followed expired. Please try again.";
/// Message shown for any rejected signed link, whatever the cause.
pub const SIGNED_LINK_FAILURE_MESSAGE: &str = "This link is expired or invalid.";

#[derive(Debug, Error, Clone)]
pub enum ShieldError {
    #[error("{}", CSRF_FAILURE_MESSAGE)]
    InvalidCsrfToken,

    #[error("{}", SIGNED_LINK_FAILURE_MESSAGE)]
    InvalidSignedLink,

    #[error("User not found")]
    UserNotFound,

    #[error("{message}")]
    AuthenticationFailed {
        message: String,
        redirect_route: String,
    },

    #[error("Bad request: {0}")]
    BadRequest(String),

    #[error("Storage error: {0}")]
    Storage(String),

    #[error("Configuration error: {0}")]
    Config(String),

    #[error("Crypto error: {0}")]
    Crypto(String),
}

impl ShieldError {
    /// True for errors caused by infrastructure rather than by the visitor.
    pub fn is_internal(&self) -> bool {
        matches!(self, Self::Storage(_) | Self::Config(_) | Self::Crypto(_))
    }
}

impl From<SessionError> for ShieldError {
    fn from(err: SessionError) -> Self {
        let error = match err {
            SessionError::Storage(msg) | SessionError::Serde(msg) | SessionError::Corrupted(msg) => {
                Self::Storage(msg)
            }
            SessionError::Crypto(msg) => Self::Crypto(msg),
            SessionError::OutOfRange(msg) => Self::Config(msg),
            SessionError::Utils(e) => Self::Crypto(e.to_string()),
            SessionError::Cookie(msg) | SessionError::HeaderError(msg) => Self::BadRequest(msg),
        };
        tracing::error!("{}", error);
        error
    }
}

impl From<CsrfError> for ShieldError {
    fn from(err: CsrfError) -> Self {
        match err {
            CsrfError::InvalidToken => {
                tracing::warn!("Rejected request with invalid CSRF token");
                Self::InvalidCsrfToken
            }
            CsrfError::InvalidMode(mode) => Self::Config(format!("Invalid CSRF mode: {mode}")),
            CsrfError::Session(e) => e.into(),
            CsrfError::Utils(e) => e.into(),
        }
    }
}

impl From<SignedLinkError> for ShieldError {
    fn from(err: SignedLinkError) -> Self {
        match err {
            SignedLinkError::Storage(msg) => Self::Storage(msg),
            SignedLinkError::ReservedParameter(name) => {
                Self::Config(format!("Reserved signed link parameter: {name}"))
            }
            cause => {
                // The cause stays in the logs only.
                tracing::info!("Rejected signed link: {}", cause);
                Self::InvalidSignedLink
            }
        }
    }
}

impl From<AuthError> for ShieldError {
    fn from(err: AuthError) -> Self {
        match err {
            AuthError::Failed {
                message,
                redirect_route,
            } => Self::AuthenticationFailed {
                message,
                redirect_route,
            },
            AuthError::Lookup(msg) => {
                let error = Self::Storage(msg);
                tracing::error!("{}", error);
                error
            }
            AuthError::PasswordHash(msg) => {
                let error = Self::Crypto(msg);
                tracing::error!("{}", error);
                error
            }
            AuthError::InvalidAuthenticator(name) => {
                Self::Config(format!("Invalid authenticator: {name}"))
            }
            AuthError::Session(e) => e.into(),
            AuthError::SignedLink(e) => e.into(),
            AuthError::Utils(e) => e.into(),
        }
    }
}

impl From<StorageError> for ShieldError {
    fn from(err: StorageError) -> Self {
        let error = Self::Storage(err.to_string());
        tracing::error!("{}", error);
        error
    }
}

impl From<ConfigError> for ShieldError {
    fn from(err: ConfigError) -> Self {
        let error = Self::Config(err.to_string());
        tracing::error!("{}", error);
        error
    }
}

impl From<UtilError> for ShieldError {
    fn from(err: UtilError) -> Self {
        let error = Self::Crypto(err.to_string());
        tracing::error!("{}", error);
        error
    }
}
