//! Shared fixtures for unit tests: a controllable clock, a ready session and
//! signed-link engine, and a user directory holding `calvin`.

use std::sync::Arc;

use async_trait::async_trait;
use chrono::{Duration, Utc};

use crate::auth::{
    AuthError, AuthOutcome, Authenticator, InMemoryUserLookup, User, UserLookup,
};
use crate::clock::MockClock;
use crate::config::{AuthConfig, SessionConfig, ShieldConfig};
use crate::coordination::Shield;
use crate::keys::AppKey;
use crate::request::ShieldRequest;
use crate::session::{Lottery, SessionManager, SessionStore};
use crate::signed_link::{DriverInvalidationSet, SignedLink};
use crate::storage::MemorySessionDriver;

pub(crate) const TEST_APP_KEY: &str = "base64:L0L/nXmGaFVpJ795dFRPt9c5eUrqIqkvJqkb98KbC10=";

pub(crate) fn test_session_manager(clock: Arc<MockClock>) -> SessionManager {
    let config = SessionConfig {
        lottery: Lottery::never(),
        ..SessionConfig::default()
    };
    let driver = Arc::new(MemorySessionDriver::new(clock.clone()));
    SessionManager::new(config, &AuthConfig::default(), None, driver, clock).unwrap()
}

pub(crate) async fn test_session() -> SessionStore {
    test_session_with_clock().await.1
}

pub(crate) async fn test_session_with_clock() -> (Arc<MockClock>, SessionStore) {
    let clock = Arc::new(MockClock::new(Utc::now()));
    let session = test_session_manager(clock.clone())
        .start(None)
        .await
        .unwrap();
    (clock, session)
}

pub(crate) fn calvin() -> User {
    User {
        id: "1".to_string(),
        login: "calvin".to_string(),
        display_name: "Calvin".to_string(),
    }
}

/// User directory holding `calvin` with password `password`.
pub(crate) async fn users_with_calvin() -> Arc<dyn UserLookup> {
    let users = InMemoryUserLookup::new();
    users.insert(calvin(), "password").await.unwrap();
    Arc::new(users)
}

pub(crate) fn test_signed_link() -> (Arc<MockClock>, SignedLink) {
    let clock = Arc::new(MockClock::new(Utc::now()));
    let key: AppKey = TEST_APP_KEY.parse().unwrap();
    let driver = Arc::new(MemorySessionDriver::new(clock.clone()));
    let links = SignedLink::new(
        &key,
        clock.clone(),
        Arc::new(DriverInvalidationSet::new(driver)),
        Duration::hours(8),
    );
    (clock, links)
}

/// Logs in whoever `allow_login_for_id` names, without remembering.
pub(crate) struct AllowLoginAuthenticator {
    users: Arc<dyn UserLookup>,
}

impl AllowLoginAuthenticator {
    pub(crate) fn new(users: Arc<dyn UserLookup>) -> Self {
        Self { users }
    }
}

#[async_trait]
impl Authenticator for AllowLoginAuthenticator {
    async fn attempt(&self, request: &ShieldRequest) -> Result<AuthOutcome, AuthError> {
        let Some(id) = request.input("allow_login_for_id") else {
            return Ok(AuthOutcome::Continue);
        };
        match self.users.find_by_id(&id).await? {
            Some(user) => Ok(AuthOutcome::Success {
                user,
                remember_me: false,
            }),
            None => Ok(AuthOutcome::fail()),
        }
    }
}

pub(crate) async fn test_shield() -> (Arc<MockClock>, Shield) {
    let clock = Arc::new(MockClock::new(Utc::now()));
    let driver = Arc::new(MemorySessionDriver::new(clock.clone()));
    let mut config = ShieldConfig {
        app_key: Some(TEST_APP_KEY.parse().unwrap()),
        ..ShieldConfig::default()
    };
    config.session.lottery = Lottery::never();
    let shield = Shield::with_driver(config, users_with_calvin().await, driver, clock.clone()).unwrap();
    (clock, shield)
}
