use thiserror::Error;

use crate::session::SessionError;
use crate::utils::UtilError;

#[derive(Debug, Error, Clone)]
pub enum CsrfError {
    /// Submitted pair missing or mismatched. The token family has been wiped.
    #[error("Invalid CSRF token")]
    InvalidToken,

    #[error("Invalid CSRF mode: {0}")]
    InvalidMode(String),

    #[error("Session error: {0}")]
    Session(#[from] SessionError),

    #[error("Utils error: {0}")]
    Utils(#[from] UtilError),
}
