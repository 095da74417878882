use axum::{
    Json,
    response::{IntoResponse, Redirect, Response},
};
use http::{HeaderMap, StatusCode, header::ACCEPT};
use serde_json::json;
use session_shield::ShieldError;

use crate::config::route_url;

/// Message shown for infrastructure failures; details stay in the logs.
const INTERNAL_ERROR_MESSAGE: &str = "Internal server error";

/// Helper trait for converting engine errors to responses
pub trait IntoResponseError<T> {
    fn into_response_error(self, headers: &HeaderMap) -> Result<T, Response>;
}

impl<T> IntoResponseError<T> for Result<T, ShieldError> {
    fn into_response_error(self, headers: &HeaderMap) -> Result<T, Response> {
        self.map_err(|e| error_response(e, wants_json(headers)))
    }
}

/// True for ajax-style callers that expect a JSON body instead of a redirect.
pub(crate) fn wants_json(headers: &HeaderMap) -> bool {
    let accepts_json = headers
        .get(ACCEPT)
        .and_then(|v| v.to_str().ok())
        .is_some_and(|v| v.contains("application/json"));
    let is_xhr = headers
        .get("x-requested-with")
        .and_then(|v| v.to_str().ok())
        .is_some_and(|v| v.eq_ignore_ascii_case("XMLHttpRequest"));
    accepts_json || is_xhr
}

pub(crate) fn status_of(err: &ShieldError) -> StatusCode {
    match err {
        ShieldError::InvalidCsrfToken | ShieldError::InvalidSignedLink => StatusCode::FORBIDDEN,
        ShieldError::UserNotFound => StatusCode::NOT_FOUND,
        ShieldError::AuthenticationFailed { .. } => StatusCode::UNAUTHORIZED,
        ShieldError::BadRequest(_) => StatusCode::BAD_REQUEST,
        ShieldError::Storage(_) | ShieldError::Config(_) | ShieldError::Crypto(_) => {
            StatusCode::INTERNAL_SERVER_ERROR
        }
    }
}

/// Map an engine error to a response.
///
/// Authentication failures redirect browsers to their route; JSON callers get
/// the status and message. Internal errors never expose their details.
pub(crate) fn error_response(err: ShieldError, json: bool) -> Response {
    let status = status_of(&err);
    let message = if err.is_internal() {
        INTERNAL_ERROR_MESSAGE.to_string()
    } else {
        err.to_string()
    };

    if let ShieldError::AuthenticationFailed { redirect_route, .. } = &err {
        if !json {
            return Redirect::to(&route_url(redirect_route)).into_response();
        }
    }

    if json {
        (status, Json(json!({ "error": message }))).into_response()
    } else {
        (status, message).into_response()
    }
}
