use std::sync::Arc;

use axum::{Router, routing::get};
use session_shield::{InMemoryUserLookup, Shield, ShieldConfig, User, issue_magic_link};
use session_shield_axum::{SHIELD_MAGIC_LOGIN_URL, SHIELD_ROUTE_PREFIX, shield_router, with_session};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

mod handlers;

use crate::handlers::{index, protected};

const DEFAULT_PORT: u16 = 3001;

fn demo_user() -> User {
    User {
        id: "42".to_string(),
        login: "hobbes".to_string(),
        display_name: "Hobbes".to_string(),
    }
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    dotenvy::dotenv().ok();
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| format!("{}=debug,session_shield=debug", env!("CARGO_CRATE_NAME")).into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    let mut config = ShieldConfig::from_env()?;
    if !config.session.enabled {
        tracing::info!("Enabling sessions for the demo");
        config.session.enabled = true;
    }

    let users = InMemoryUserLookup::new();
    let password = std::env::var("DEMO_PASSWORD").unwrap_or_else(|_| "tiger".to_string());
    users.insert(demo_user(), &password).await?;

    let shield = Shield::from_config(config, Arc::new(users)).await?;

    let port = std::env::var("DEMO_PORT")
        .ok()
        .and_then(|p| p.parse().ok())
        .unwrap_or(DEFAULT_PORT);
    let link = issue_magic_link(
        &shield,
        SHIELD_MAGIC_LOGIN_URL.as_str(),
        &demo_user(),
        Some("/protected"),
        None,
    )?;
    tracing::info!("Magic link for {}: http://localhost:{}{}", demo_user().login, port, link);

    let app = Router::new()
        .route("/", get(index))
        .route("/protected", get(protected))
        .nest(SHIELD_ROUTE_PREFIX.as_str(), shield_router(shield.clone()));
    let app = with_session(app, shield);

    let listener = tokio::net::TcpListener::bind(("0.0.0.0", port)).await?;
    tracing::info!("Listening on http://localhost:{}", port);
    axum::serve(listener, app).await?;
    Ok(())
}
