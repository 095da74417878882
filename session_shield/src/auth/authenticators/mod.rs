mod magic_link;
mod password;

pub use magic_link::{MagicLinkAuthenticator, USER_ID_PARAM};
pub use password::{LOGIN_FIELD, PASSWORD_FIELD, PasswordAuthenticator, REMEMBER_FIELD};
