use std::sync::Arc;

use chrono::Utc;
use session_shield::{
    AppKey, InMemoryUserLookup, Lottery, MemorySessionDriver, MockClock, Shield, ShieldConfig,
    User,
};

pub const TEST_APP_KEY: &str = "base64:L0L/nXmGaFVpJ795dFRPt9c5eUrqIqkvJqkb98KbC10=";
pub const MAGIC_LOGIN_PATH: &str = "/auth/magic-login";

/// Test user fixtures
pub struct TestUsers;

impl TestUsers {
    /// Standard user, password `password`
    pub fn calvin() -> User {
        User {
            id: "1".to_string(),
            login: "calvin".to_string(),
            display_name: "Calvin".to_string(),
        }
    }

    /// User reached through magic links, password `tiger`
    pub fn user_42() -> User {
        User {
            id: "42".to_string(),
            login: "hobbes".to_string(),
            display_name: "Hobbes".to_string(),
        }
    }

    pub async fn directory() -> Arc<InMemoryUserLookup> {
        let users = InMemoryUserLookup::new();
        users.insert(Self::calvin(), "password").await.unwrap();
        users.insert(Self::user_42(), "tiger").await.unwrap();
        Arc::new(users)
    }
}

/// A wired engine over an in-memory driver and a mock clock.
pub struct TestEnv {
    pub clock: Arc<MockClock>,
    pub driver: Arc<MemorySessionDriver>,
    pub shield: Shield,
}

impl TestEnv {
    pub async fn new() -> Self {
        Self::with_config(Self::config()).await
    }

    /// Defaults with a fixed key and no garbage collection lottery.
    pub fn config() -> ShieldConfig {
        let mut config = ShieldConfig {
            app_key: Some(TEST_APP_KEY.parse::<AppKey>().expect("valid test key")),
            ..ShieldConfig::default()
        };
        config.session.lottery = Lottery::never();
        config
    }

    pub async fn with_config(config: ShieldConfig) -> Self {
        let clock = Arc::new(MockClock::new(Utc::now()));
        let driver = Arc::new(MemorySessionDriver::new(clock.clone()));
        let shield = Shield::with_driver(
            config,
            TestUsers::directory().await,
            driver.clone(),
            clock.clone(),
        )
        .expect("engine should assemble");
        Self {
            clock,
            driver,
            shield,
        }
    }
}
