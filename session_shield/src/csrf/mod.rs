mod errors;
mod guard;
mod types;

pub use errors::CsrfError;
pub use guard::{
    CSRF_NAME_FIELD, CSRF_NAME_HEADER, CSRF_SESSION_KEY, CSRF_VALUE_FIELD, CSRF_VALUE_HEADER,
    CsrfGuard,
};
pub use types::{CsrfMode, CsrfToken};
