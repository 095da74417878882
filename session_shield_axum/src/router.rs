//! Login, logout and magic-link endpoints

use axum::{
    Json, Router,
    body::Bytes,
    extract::{OriginalUri, State},
    middleware::from_fn_with_state,
    response::{IntoResponse, Redirect, Response},
    routing::{get, post},
};
use http::{HeaderMap, Method};
use serde_json::json;
use session_shield::{
    LoginPage, LoginResponse, Shield, ShieldError, confirm_magic_link_core, login_core,
    login_page_core, logout_core,
};

use crate::config::route_url;
use crate::error::{IntoResponseError, error_response, wants_json};
use crate::middleware::{csrf_layer, session_layer, shield_request};
use crate::session::SessionHandle;

/// Flash key holding authentication failure messages for the next page.
pub const ERRORS_FLASH_KEY: &str = "errors";

/// Create the router for the authentication endpoints
///
/// The endpoints are relative to where the router is nested, normally
/// [`crate::SHIELD_ROUTE_PREFIX`]:
/// - `GET  /login` login form state (CSRF pair and flashed errors) or a redirect
/// - `POST /login` run the authentication chain
/// - `GET  /csrf` a CSRF pair for ajax callers
/// - `POST /logout`
/// - `GET  /magic-login` follow a magic link
///
/// State-changing requests are CSRF-checked. The host installs the session
/// layer around its whole app with [`with_session`].
pub fn shield_router(shield: Shield) -> Router {
    Router::new()
        .route("/login", get(login_page).post(login))
        .route("/csrf", get(csrf_pair))
        .route("/logout", post(logout))
        .route("/magic-login", get(magic_login))
        .layer(from_fn_with_state(shield.clone(), csrf_layer))
        .with_state(shield)
}

/// Wrap `router` with the session layer.
pub fn with_session<S>(router: Router<S>, shield: Shield) -> Router<S>
where
    S: Clone + Send + Sync + 'static,
{
    router.layer(from_fn_with_state(shield, session_layer))
}

async fn login_page(
    State(shield): State<Shield>,
    session: SessionHandle,
    OriginalUri(uri): OriginalUri,
    headers: HeaderMap,
) -> Result<Response, Response> {
    let request = shield_request(&Method::GET, &uri, &headers, &[]);
    let mut session = session.lock().await;

    let page = login_page_core(&shield, &mut session, &request)
        .await
        .into_response_error(&headers)?;

    Ok(match page {
        LoginPage::Redirect(url) => Redirect::to(&url).into_response(),
        LoginPage::Form { csrf } => {
            let errors: Vec<String> = session.flashed(ERRORS_FLASH_KEY).unwrap_or_default();
            Json(json!({
                "csrf_name": csrf.name,
                "csrf_value": csrf.value,
                "errors": errors,
            }))
            .into_response()
        }
    })
}

async fn login(
    State(shield): State<Shield>,
    session: SessionHandle,
    OriginalUri(uri): OriginalUri,
    method: Method,
    headers: HeaderMap,
    body: Bytes,
) -> Result<Response, Response> {
    let request = shield_request(&method, &uri, &headers, &body);
    let json = wants_json(&headers);
    let mut session = session.lock().await;

    match login_core(&shield, &mut session, &request).await {
        Ok(LoginResponse {
            completed,
            redirect: Some(url),
        }) => {
            if json {
                Ok(Json(json!({ "redirect": url, "user": completed.user })).into_response())
            } else {
                Ok(Redirect::to(&url).into_response())
            }
        }
        Ok(LoginResponse {
            completed,
            redirect: None,
        }) => Ok(Json(json!({
            "interim_login_success": true,
            "user": completed.user,
        }))
        .into_response()),
        Err(ShieldError::AuthenticationFailed {
            message,
            redirect_route,
        }) if !json => {
            session
                .flash(ERRORS_FLASH_KEY, vec![message])
                .map_err(|e| error_response(e.into(), json))?;
            Ok(Redirect::to(&route_url(&redirect_route)).into_response())
        }
        Err(e) => Err(error_response(e, json)),
    }
}

async fn csrf_pair(
    State(shield): State<Shield>,
    session: SessionHandle,
    headers: HeaderMap,
) -> Result<Response, Response> {
    let mut session = session.lock().await;
    let token = shield
        .csrf()
        .create(&mut session)
        .map_err(ShieldError::from)
        .into_response_error(&headers)?;
    Ok(Json(json!({ "csrf_name": token.name, "csrf_value": token.value })).into_response())
}

async fn logout(
    State(shield): State<Shield>,
    session: SessionHandle,
    headers: HeaderMap,
) -> Result<Response, Response> {
    let mut session = session.lock().await;
    logout_core(&mut session)
        .await
        .into_response_error(&headers)?;

    if wants_json(&headers) {
        Ok(Json(json!({ "logged_out": true })).into_response())
    } else {
        Ok(Redirect::to(shield.home_url()).into_response())
    }
}

async fn magic_login(
    State(shield): State<Shield>,
    session: SessionHandle,
    OriginalUri(uri): OriginalUri,
    headers: HeaderMap,
) -> Result<Response, Response> {
    let request = shield_request(&Method::GET, &uri, &headers, &[]);
    let mut session = session.lock().await;

    let response = confirm_magic_link_core(&shield, &mut session, &request)
        .await
        .into_response_error(&headers)?;

    let url = response
        .redirect
        .unwrap_or_else(|| shield.home_url().to_string());
    Ok(Redirect::to(&url).into_response())
}
