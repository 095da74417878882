mod cookie;
mod encryption;
mod errors;
mod lottery;
mod manager;
mod store;
mod types;

pub use cookie::{
    SameSite, expired_session_cookie, header_set_cookie, session_cookie, session_id_from_headers,
};
pub use errors::SessionError;
pub use lottery::Lottery;
pub use manager::SessionManager;
pub use store::SessionStore;
pub use types::SessionId;
