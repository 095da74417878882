use std::fmt;
use std::str::FromStr;

use async_trait::async_trait;
use serde::{Deserialize, Serialize};

use crate::auth::errors::AuthError;
use crate::auth::password_hash::verify_decoy_password;
use crate::request::ShieldRequest;

/// The one message shown for every authentication failure, whatever its cause.
pub const GENERIC_FAILURE_MESSAGE: &str = "The credentials you provided are invalid. Please try again.";

/// Route a failed login sends the visitor back to.
pub const LOGIN_ROUTE: &str = "auth.login";

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct User {
    pub id: String,
    pub login: String,
    pub display_name: String,
}

/// Read-only access to the host's user directory.
#[async_trait]
pub trait UserLookup: Send + Sync + 'static {
    async fn find_by_id(&self, id: &str) -> Result<Option<User>, AuthError>;

    async fn find_by_login_name(&self, login: &str) -> Result<Option<User>, AuthError>;

    /// Check a password for a known user.
    async fn verify_password(&self, user: &User, password: &str) -> Result<bool, AuthError>;

    /// Called instead of `verify_password` when the login name is unknown. Must cost
    /// as much as a real check and return false. The default verifies against an
    /// Argon2 decoy hash; lookups using another hash scheme should override it.
    async fn verify_unknown_password(&self, password: &str) -> Result<bool, AuthError> {
        Ok(verify_decoy_password(password))
    }
}

/// What one authenticator decided about a request.
#[derive(Debug, Clone, PartialEq)]
pub enum AuthOutcome {
    /// Not this authenticator's request; ask the next one.
    Continue,
    Success {
        user: User,
        remember_me: bool,
    },
    Fail {
        message: String,
        redirect_route: String,
    },
}

impl AuthOutcome {
    /// A failure carrying the generic message and the login route.
    pub fn fail() -> Self {
        Self::Fail {
            message: GENERIC_FAILURE_MESSAGE.to_string(),
            redirect_route: LOGIN_ROUTE.to_string(),
        }
    }
}

/// One link in the authentication chain.
#[async_trait]
pub trait Authenticator: Send + Sync + 'static {
    /// Return `Continue` when the request lacks this authenticator's credentials.
    async fn attempt(&self, request: &ShieldRequest) -> Result<AuthOutcome, AuthError>;
}

/// Built-in authenticators selectable through `AUTH_THROUGH`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AuthenticatorKind {
    Password,
    MagicLink,
}

impl fmt::Display for AuthenticatorKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Password => f.write_str("password"),
            Self::MagicLink => f.write_str("magic_link"),
        }
    }
}

impl FromStr for AuthenticatorKind {
    type Err = AuthError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().replace('-', "_").as_str() {
            "password" => Ok(Self::Password),
            "magic_link" | "magiclink" => Ok(Self::MagicLink),
            other => Err(AuthError::InvalidAuthenticator(other.to_string())),
        }
    }
}

/// Emitted once a login succeeded and the session has been updated.
///
/// The HTTP layer acts on it, for instance to set platform auth cookies.
#[derive(Debug, Clone, PartialEq)]
pub struct LoginCompleted {
    pub user: User,
    pub remember_me: bool,
}
