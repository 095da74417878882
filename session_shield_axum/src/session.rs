use std::sync::Arc;

use axum::{
    extract::FromRequestParts,
    response::{IntoResponse, Response},
};
use http::{StatusCode, request::Parts};
use session_shield::SessionStore;
use tokio::sync::{Mutex, MutexGuard};

/// The request's live session, placed in the request extensions by
/// [`crate::session_layer`] and saved by it once the handler returns.
///
/// # Example
///
/// ```no_run
/// use session_shield_axum::SessionHandle;
///
/// async fn whoami(session: SessionHandle) -> String {
///     let session = session.lock().await;
///     session.user_id().unwrap_or("anonymous").to_string()
/// }
/// ```
#[derive(Clone)]
pub struct SessionHandle(Arc<Mutex<SessionStore>>);

impl SessionHandle {
    pub(crate) fn new(store: SessionStore) -> Self {
        Self(Arc::new(Mutex::new(store)))
    }

    pub async fn lock(&self) -> MutexGuard<'_, SessionStore> {
        self.0.lock().await
    }
}

impl std::fmt::Debug for SessionHandle {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str("SessionHandle")
    }
}

/// Rejection when no session layer ran for the request.
pub struct MissingSession;

impl IntoResponse for MissingSession {
    fn into_response(self) -> Response {
        tracing::error!("No session for this request; is the session layer installed and enabled?");
        (StatusCode::INTERNAL_SERVER_ERROR, "Internal server error").into_response()
    }
}

impl<S> FromRequestParts<S> for SessionHandle
where
    S: Send + Sync,
{
    type Rejection = MissingSession;

    async fn from_request_parts(parts: &mut Parts, _: &S) -> Result<Self, Self::Rejection> {
        parts
            .extensions
            .get::<SessionHandle>()
            .cloned()
            .ok_or(MissingSession)
    }
}
