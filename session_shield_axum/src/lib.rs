//! session-shield-axum - axum integration for the session-shield engine
//!
//! ```no_run
//! use axum::{Router, routing::get};
//! use session_shield_axum::{SHIELD_ROUTE_PREFIX, shield_router, with_session};
//!
//! # async fn build(shield: session_shield::Shield) -> Router {
//! let app = Router::new()
//!     .route("/", get(|| async { "home" }))
//!     .nest(SHIELD_ROUTE_PREFIX.as_str(), shield_router(shield.clone()));
//! with_session(app, shield)
//! # }
//! ```

mod config;
mod error;
mod middleware;
mod router;
mod session;

#[cfg(test)]
mod test_utils;

pub use config::{
    SHIELD_LOGIN_URL, SHIELD_MAGIC_LOGIN_URL, SHIELD_RESPOND_WITH_CSRF_HEADERS,
    SHIELD_ROUTE_PREFIX,
};
pub use error::IntoResponseError;
pub use middleware::{csrf_layer, session_layer};
pub use router::{ERRORS_FLASH_KEY, shield_router, with_session};
pub use session::{MissingSession, SessionHandle};

pub use session_shield::Shield;
