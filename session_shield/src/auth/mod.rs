mod authenticators;
mod confirmation;
mod errors;
mod memory;
mod password_hash;
mod pipeline;
mod types;

pub use authenticators::{
    LOGIN_FIELD, MagicLinkAuthenticator, PASSWORD_FIELD, PasswordAuthenticator, REMEMBER_FIELD,
    USER_ID_PARAM,
};
pub use confirmation::{AUTH_CONFIRM_KEY, AuthConfirmation};
pub use errors::AuthError;
pub use memory::InMemoryUserLookup;
pub use password_hash::{hash_password, verify_password_hash};
pub use pipeline::{AuthenticationPipeline, complete_login};
pub use types::{
    AuthOutcome, Authenticator, AuthenticatorKind, GENERIC_FAILURE_MESSAGE, LOGIN_ROUTE,
    LoginCompleted, User, UserLookup,
};
