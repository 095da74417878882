//! Request-level flows that stitch sessions, CSRF, signed links and the
//! authentication chain together.

mod login;
mod magic_link;
mod shield;

pub use login::{
    INTERIM_LOGIN_FIELD, INTERIM_LOGIN_SUCCESS_KEY, LoginPage, LoginResponse, REAUTH_FIELD,
    REDIRECT_TO_FIELD, is_local_path, login_core, login_page_core, logout_core,
    remember_intended_url,
};
pub use magic_link::{INTENDED_PARAM, confirm_magic_link_core, issue_magic_link};
pub use shield::Shield;
