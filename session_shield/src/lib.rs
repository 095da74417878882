//! session-shield - session, CSRF, signed-link and authentication engine
//!
//! The crate is framework-neutral. An HTTP layer builds a [`Shield`] once, starts a
//! [`SessionStore`] per request through [`SessionManager::start`], runs the
//! coordination flows ([`login_core`], [`logout_core`], [`confirm_magic_link_core`])
//! against a [`ShieldRequest`], and writes the cookie returned by
//! [`SessionManager::finish`].

mod auth;
mod clock;
mod config;
mod coordination;
mod csrf;
mod errors;
mod keys;
mod request;
mod session;
mod signed_link;
mod storage;
mod utils;

#[cfg(test)]
mod test_utils;

pub use auth::{
    AUTH_CONFIRM_KEY, AuthConfirmation, AuthError, AuthOutcome, AuthenticationPipeline,
    Authenticator, AuthenticatorKind, GENERIC_FAILURE_MESSAGE, InMemoryUserLookup, LOGIN_FIELD,
    LOGIN_ROUTE, LoginCompleted, MagicLinkAuthenticator, PASSWORD_FIELD, PasswordAuthenticator,
    REMEMBER_FIELD, USER_ID_PARAM, User, UserLookup, complete_login, hash_password,
    verify_password_hash,
};
pub use clock::{Clock, SystemClock};
#[cfg(feature = "testing")]
pub use clock::MockClock;
pub use config::{AuthConfig, ConfigError, CsrfConfig, SessionConfig, ShieldConfig};
pub use coordination::{
    INTENDED_PARAM, INTERIM_LOGIN_FIELD, INTERIM_LOGIN_SUCCESS_KEY, LoginPage, LoginResponse,
    REAUTH_FIELD, REDIRECT_TO_FIELD, Shield, confirm_magic_link_core, is_local_path,
    issue_magic_link, login_core, login_page_core, logout_core, remember_intended_url,
};
pub use csrf::{
    CSRF_NAME_FIELD, CSRF_NAME_HEADER, CSRF_SESSION_KEY, CSRF_VALUE_FIELD, CSRF_VALUE_HEADER,
    CsrfError, CsrfGuard, CsrfMode, CsrfToken,
};
pub use errors::{CSRF_FAILURE_MESSAGE, SIGNED_LINK_FAILURE_MESSAGE, ShieldError};
pub use keys::AppKey;
pub use request::ShieldRequest;
pub use session::{
    Lottery, SameSite, SessionError, SessionId, SessionManager, SessionStore,
    expired_session_cookie, header_set_cookie, session_cookie, session_id_from_headers,
};
pub use signed_link::{
    DriverInvalidationSet, EXPIRES_PARAM, InvalidationSet, SIGNATURE_PARAM, SignedLink,
    SignedLinkError, VerifiedLink,
};
pub use storage::{
    DatabaseSessionDriver, DriverKind, FileSessionDriver, MemorySessionDriver,
    RedisSessionDriver, SessionDriver, StorageError, create_driver,
};
pub use utils::{UtilError, gen_random_string};
