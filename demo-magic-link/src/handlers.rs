use axum::response::{Html, IntoResponse, Redirect, Response};
use session_shield_axum::{SHIELD_LOGIN_URL, SessionHandle};

pub(crate) async fn index(session: SessionHandle) -> Html<String> {
    let session = session.lock().await;
    match session.user_id() {
        Some(id) => Html(format!(
            "<p>Logged in as user {id}.</p><p><a href=\"/protected\">Protected page</a></p>"
        )),
        None => Html(format!(
            "<p>Not logged in. Use the magic link from the server log, or POST credentials to <code>{}</code>.</p>",
            SHIELD_LOGIN_URL.as_str()
        )),
    }
}

pub(crate) async fn protected(session: SessionHandle) -> Response {
    let mut session = session.lock().await;
    match session.user_id().map(str::to_string) {
        Some(id) => Html(format!("<p>Protected content for user {id}.</p>")).into_response(),
        None => {
            if let Err(e) = session.set_intended_url("/protected") {
                tracing::error!("Failed to remember intended url: {}", e);
            }
            Redirect::to(SHIELD_LOGIN_URL.as_str()).into_response()
        }
    }
}
