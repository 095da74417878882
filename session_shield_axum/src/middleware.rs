use axum::{
    body::{Body, Bytes, to_bytes},
    extract::{Request, State},
    middleware::Next,
    response::{IntoResponse, Response},
};
use http::{
    HeaderMap, HeaderName, HeaderValue, Method, StatusCode, Uri, header::CONTENT_TYPE,
};
use session_shield::{
    CsrfToken, Shield, ShieldError, ShieldRequest, header_set_cookie, session_id_from_headers,
};

use crate::config::{FORM_BODY_LIMIT, SHIELD_RESPOND_WITH_CSRF_HEADERS};
use crate::error::{error_response, wants_json};
use crate::session::SessionHandle;

// Response counterparts of the request headers the pair is accepted from.
const CSRF_NAME_RESPONSE_HEADER: HeaderName = HeaderName::from_static("x-csrf-name");
const CSRF_VALUE_RESPONSE_HEADER: HeaderName = HeaderName::from_static("x-csrf-value");

/// Build the engine's view of a request, parsing url-encoded form bodies.
pub(crate) fn shield_request(
    method: &Method,
    uri: &Uri,
    headers: &HeaderMap,
    body: &[u8],
) -> ShieldRequest {
    let request = ShieldRequest::new(method.clone(), uri.clone()).with_headers(headers.clone());

    let is_form = headers
        .get(CONTENT_TYPE)
        .and_then(|v| v.to_str().ok())
        .is_some_and(|v| v.starts_with("application/x-www-form-urlencoded"));
    if is_form {
        request.with_form_body(body)
    } else {
        request
    }
}

/// Start the session before the handler and save it afterwards, emitting the
/// session cookie on every response.
///
/// Does nothing when sessions are disabled.
pub async fn session_layer(State(shield): State<Shield>, mut req: Request, next: Next) -> Response {
    if !shield.config().session.enabled {
        return next.run(req).await;
    }

    let cookie = match session_id_from_headers(req.headers(), &shield.config().session.cookie) {
        Ok(value) => value.map(str::to_string),
        Err(e) => {
            tracing::warn!("Ignoring unreadable session cookie: {}", e);
            None
        }
    };

    let store = match shield.sessions().start(cookie.as_deref()).await {
        Ok(store) => store,
        Err(e) => return error_response(e.into(), wants_json(req.headers())),
    };

    let handle = SessionHandle::new(store);
    req.extensions_mut().insert(handle.clone());
    let mut response = next.run(req).await;

    let mut store = handle.lock().await;
    let set_cookie = match shield.sessions().finish(&mut store).await {
        Ok(set_cookie) => set_cookie,
        Err(e) => return error_response(e.into(), false),
    };
    if let Err(e) = header_set_cookie(response.headers_mut(), set_cookie) {
        tracing::error!("Failed to set session cookie: {}", e);
        return error_response(e.into(), false);
    }
    response
}

/// Reject state-changing requests that lack a valid CSRF pair.
///
/// Runs inside [`session_layer`]. The pair is read from the form body or the
/// `X-CSRF-Name`/`X-CSRF-Value` headers; the body is handed on untouched.
pub async fn csrf_layer(State(shield): State<Shield>, req: Request, next: Next) -> Response {
    if matches!(*req.method(), Method::GET | Method::HEAD | Method::OPTIONS) {
        return next.run(req).await;
    }

    let Some(handle) = req.extensions().get::<SessionHandle>().cloned() else {
        return crate::session::MissingSession.into_response();
    };

    let (parts, body) = req.into_parts();
    let bytes: Bytes = match to_bytes(body, FORM_BODY_LIMIT).await {
        Ok(bytes) => bytes,
        Err(e) => {
            tracing::debug!("Failed to buffer request body: {}", e);
            return (StatusCode::PAYLOAD_TOO_LARGE, "Request body too large").into_response();
        }
    };

    let request = shield_request(&parts.method, &parts.uri, &parts.headers, &bytes);
    let result = {
        let mut session = handle.lock().await;
        shield.csrf().validate_request(&mut session, &request)
    };

    match result {
        Ok(next_token) => {
            let req = Request::from_parts(parts, Body::from(bytes));
            let response = next.run(req).await;
            match next_token {
                Some(token) => add_csrf_headers(response, &token),
                None => response,
            }
        }
        Err(e) => error_response(ShieldError::from(e), wants_json(&parts.headers)),
    }
}

fn add_csrf_headers(mut response: Response, token: &CsrfToken) -> Response {
    if !*SHIELD_RESPOND_WITH_CSRF_HEADERS {
        return response;
    }

    match (
        HeaderValue::from_str(&token.name),
        HeaderValue::from_str(&token.value),
    ) {
        (Ok(name), Ok(value)) => {
            response.headers_mut().insert(CSRF_NAME_RESPONSE_HEADER, name);
            response.headers_mut().insert(CSRF_VALUE_RESPONSE_HEADER, value);
        }
        _ => tracing::error!("Failed to create CSRF header values from token"),
    }
    response
}
