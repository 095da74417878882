//! Helpers for driving the router in tests without a network listener

use std::sync::Arc;

use axum::{
    Router,
    body::{Body, to_bytes},
    response::Response,
};
use http::{
    Request, StatusCode,
    header::{CONTENT_TYPE, COOKIE, LOCATION, SET_COOKIE},
};
use session_shield::{
    InMemoryUserLookup, Lottery, MemorySessionDriver, Shield, ShieldConfig, SystemClock, User,
};
use tower::ServiceExt;

const COOKIE_NAME: &str = "shield_session";

/// Engine with `calvin`/`password` and an ephemeral key.
pub(crate) async fn test_shield(sessions_enabled: bool) -> Shield {
    let mut config = ShieldConfig::default();
    config.session.enabled = sessions_enabled;
    config.session.lottery = Lottery::never();

    let users = InMemoryUserLookup::new();
    users
        .insert(
            User {
                id: "1".to_string(),
                login: "calvin".to_string(),
                display_name: "Calvin".to_string(),
            },
            "password",
        )
        .await
        .unwrap();

    let clock = Arc::new(SystemClock);
    let driver = Arc::new(MemorySessionDriver::new(clock.clone()));
    Shield::with_driver(config, Arc::new(users), driver, clock).unwrap()
}

/// A browser stand-in that keeps the session cookie between requests.
pub(crate) struct TestClient {
    app: Router,
    cookie: Option<String>,
}

impl TestClient {
    pub(crate) fn new(app: Router) -> Self {
        Self { app, cookie: None }
    }

    pub(crate) fn cookie(&self) -> Option<&str> {
        self.cookie.as_deref()
    }

    pub(crate) fn location(response: &Response) -> Option<&str> {
        response
            .headers()
            .get(LOCATION)
            .and_then(|v| v.to_str().ok())
    }

    async fn send(&mut self, builder: http::request::Builder, body: Body) -> Response {
        let builder = match &self.cookie {
            Some(cookie) => builder.header(COOKIE, format!("{COOKIE_NAME}={cookie}")),
            None => builder,
        };
        let response = self
            .app
            .clone()
            .oneshot(builder.body(body).unwrap())
            .await
            .unwrap();

        if let Some(value) = response
            .headers()
            .get_all(SET_COOKIE)
            .iter()
            .filter_map(|v| v.to_str().ok())
            .find_map(|v| {
                v.split(';')
                    .next()
                    .and_then(|pair| pair.trim().strip_prefix(&format!("{COOKIE_NAME}=")))
                    .map(str::to_string)
            })
        {
            self.cookie = Some(value);
        }
        response
    }

    pub(crate) async fn get(&mut self, uri: &str) -> Response {
        self.send(Request::get(uri), Body::empty()).await
    }

    pub(crate) async fn get_json(&mut self, uri: &str) -> (StatusCode, serde_json::Value) {
        let response = self.get(uri).await;
        let status = response.status();
        let body = to_bytes(response.into_body(), usize::MAX).await.unwrap();
        (status, serde_json::from_slice(&body).unwrap_or_default())
    }

    pub(crate) async fn post_form(&mut self, uri: &str, form: &str) -> Response {
        let builder = Request::post(uri).header(CONTENT_TYPE, "application/x-www-form-urlencoded");
        self.send(builder, Body::from(form.to_string())).await
    }

    pub(crate) async fn post_with_csrf_headers(
        &mut self,
        uri: &str,
        name: &str,
        value: &str,
    ) -> Response {
        let builder = Request::post(uri)
            .header("x-csrf-name", name)
            .header("x-csrf-value", value);
        self.send(builder, Body::empty()).await
    }
}
