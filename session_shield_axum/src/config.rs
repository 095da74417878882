//! Route and response settings for the axum integration

use std::sync::LazyLock;

/// Mount point of [`crate::shield_router`]
/// Default: "/auth"
pub static SHIELD_ROUTE_PREFIX: LazyLock<String> = LazyLock::new(|| {
    std::env::var("SHIELD_ROUTE_PREFIX").unwrap_or_else(|_| "/auth".to_string())
});

/// URL of the login page, the target of the `auth.login` route name
/// Default: "/auth/login"
pub static SHIELD_LOGIN_URL: LazyLock<String> = LazyLock::new(|| {
    std::env::var("SHIELD_LOGIN_URL")
        .unwrap_or_else(|_| format!("{}/login", *SHIELD_ROUTE_PREFIX))
});

/// URL magic links point at
/// Default: "/auth/magic-login"
pub static SHIELD_MAGIC_LOGIN_URL: LazyLock<String> = LazyLock::new(|| {
    std::env::var("SHIELD_MAGIC_LOGIN_URL")
        .unwrap_or_else(|_| format!("{}/magic-login", *SHIELD_ROUTE_PREFIX))
});

/// Whether responses to checked requests carry the next CSRF pair as headers
pub static SHIELD_RESPOND_WITH_CSRF_HEADERS: LazyLock<bool> = LazyLock::new(|| {
    std::env::var("SHIELD_RESPOND_WITH_CSRF_HEADERS")
        .map(|val| val.to_lowercase() != "false")
        .unwrap_or(true)
});

/// Largest request body buffered for CSRF form fields
pub(crate) const FORM_BODY_LIMIT: usize = 64 * 1024;

/// Resolve a route name carried by an authentication failure to a URL.
pub(crate) fn route_url(route: &str) -> String {
    match route {
        session_shield::LOGIN_ROUTE => SHIELD_LOGIN_URL.clone(),
        path if session_shield::is_local_path(path) => path.to_string(),
        other => {
            tracing::warn!("Unknown route name {}, using the login page", other);
            SHIELD_LOGIN_URL.clone()
        }
    }
}
