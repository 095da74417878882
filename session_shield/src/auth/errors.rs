use thiserror::Error;

use crate::session::SessionError;
use crate::signed_link::SignedLinkError;
use crate::utils::UtilError;

#[derive(Debug, Error, Clone)]
pub enum AuthError {
    /// The chain ended in failure. `message` is safe to show to the visitor.
    #[error("{message}")]
    Failed {
        message: String,
        redirect_route: String,
    },

    #[error("User lookup error: {0}")]
    Lookup(String),

    #[error("Password hash error: {0}")]
    PasswordHash(String),

    #[error("Invalid authenticator: {0}")]
    InvalidAuthenticator(String),

    #[error("Session error: {0}")]
    Session(SessionError),

    #[error("Signed link error: {0}")]
    SignedLink(SignedLinkError),

    #[error("Utils error: {0}")]
    Utils(UtilError),
}

impl From<SessionError> for AuthError {
    fn from(err: SessionError) -> Self {
        let error = Self::Session(err);
        tracing::error!("{}", error);
        error
    }
}

impl From<SignedLinkError> for AuthError {
    fn from(err: SignedLinkError) -> Self {
        let error = Self::SignedLink(err);
        tracing::error!("{}", error);
        error
    }
}

impl From<UtilError> for AuthError {
    fn from(err: UtilError) -> Self {
        let error = Self::Utils(err);
        tracing::error!("{}", error);
        error
    }
}
