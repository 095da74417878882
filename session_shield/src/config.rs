//! Central configuration for the session-shield crate
//!
//! Every option has a default matching a conservative production setup. Values are
//! read from the process environment by [`ShieldConfig::from_env`]; binaries are
//! expected to call `dotenvy::dotenv()` first.

use std::str::FromStr;

use chrono::Duration;
use thiserror::Error;

use crate::auth::AuthenticatorKind;
use crate::csrf::CsrfMode;
use crate::keys::AppKey;
use crate::session::{Lottery, SameSite};
use crate::storage::DriverKind;

pub(crate) const HOUR_IN_SEC: i64 = 3600;

/// Upper bound for every configured duration: ten years.
pub(crate) const MAX_DURATION_SEC: i64 = HOUR_IN_SEC * 24 * 365 * 10;

#[derive(Debug, Error, Clone, PartialEq)]
pub enum ConfigError {
    #[error("Invalid value for {key}: {value}")]
    InvalidValue { key: String, value: String },

    #[error("Missing required setting: {0}")]
    Missing(String),
}

#[derive(Debug, Clone)]
pub struct SessionConfig {
    pub enabled: bool,
    pub driver: DriverKind,
    pub driver_url: Option<String>,
    pub table: String,
    /// Absolute lifetime of a session, counted from its creation.
    pub lifetime: Duration,
    /// Interval after which a live session receives a fresh id.
    pub rotate: Duration,
    pub lottery: Lottery,
    pub cookie: String,
    pub path: String,
    pub domain: Option<String>,
    pub secure: bool,
    pub http_only: bool,
    pub same_site: SameSite,
    pub encrypt: bool,
}

impl Default for SessionConfig {
    fn default() -> Self {
        let lifetime = Duration::seconds(HOUR_IN_SEC * 8);
        Self {
            enabled: false,
            driver: DriverKind::Memory,
            driver_url: None,
            table: "sessions".to_string(),
            lifetime,
            rotate: lifetime / 2,
            lottery: Lottery::new(2, 100),
            cookie: "shield_session".to_string(),
            path: "/".to_string(),
            domain: None,
            secure: true,
            http_only: true,
            same_site: SameSite::Lax,
            encrypt: false,
        }
    }
}

#[derive(Debug, Clone, Copy, Default)]
pub struct CsrfConfig {
    pub mode: CsrfMode,
}

#[derive(Debug, Clone)]
pub struct AuthConfig {
    pub confirmation_duration: Duration,
    pub through: Vec<AuthenticatorKind>,
    pub remember_enabled: bool,
    pub remember_lifetime: Duration,
    pub magic_link_ttl: Duration,
}

impl Default for AuthConfig {
    fn default() -> Self {
        Self {
            confirmation_duration: Duration::minutes(180),
            through: vec![AuthenticatorKind::Password],
            remember_enabled: false,
            remember_lifetime: Duration::days(14),
            magic_link_ttl: Duration::minutes(5),
        }
    }
}

#[derive(Debug, Clone, Default)]
pub struct ShieldConfig {
    pub session: SessionConfig,
    pub csrf: CsrfConfig,
    pub auth: AuthConfig,
    pub app_key: Option<AppKey>,
}

impl ShieldConfig {
    /// Build the configuration from the process environment.
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_source(|key| std::env::var(key).ok())
    }

    /// Build the configuration from any key lookup; missing keys keep their defaults.
    pub fn from_source<F>(source: F) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let defaults = Self::default();
        let mut session = defaults.session;
        let mut auth = defaults.auth;

        session.enabled = bool_or(&source, "SESSION_ENABLED", session.enabled);
        if let Some(driver) = parsed(&source, "SESSION_DRIVER")? {
            session.driver = driver;
        }
        session.driver_url = source("SESSION_DRIVER_URL").or(session.driver_url);
        session.table = source("SESSION_TABLE").unwrap_or(session.table);

        let lifetime = seconds_or(&source, "SESSION_LIFETIME", session.lifetime);
        session.lifetime = lifetime;
        session.rotate = seconds_or(&source, "SESSION_ROTATE", lifetime / 2);
        if let Some(lottery) = parsed(&source, "SESSION_LOTTERY")? {
            session.lottery = lottery;
        }
        session.cookie = source("SESSION_COOKIE").unwrap_or(session.cookie);
        session.path = source("SESSION_PATH").unwrap_or(session.path);
        session.domain = source("SESSION_DOMAIN").filter(|d| !d.is_empty());
        session.secure = bool_or(&source, "SESSION_SECURE", session.secure);
        session.http_only = bool_or(&source, "SESSION_HTTP_ONLY", session.http_only);
        if let Some(same_site) = parsed(&source, "SESSION_SAME_SITE")? {
            session.same_site = same_site;
        }
        session.encrypt = bool_or(&source, "SESSION_ENCRYPT", session.encrypt);

        let csrf = CsrfConfig {
            mode: parsed(&source, "CSRF_MODE")?.unwrap_or_default(),
        };

        auth.confirmation_duration = seconds_or(
            &source,
            "AUTH_CONFIRMATION_DURATION",
            auth.confirmation_duration,
        );
        if let Some(list) = source("AUTH_THROUGH") {
            auth.through = list
                .split(',')
                .map(str::trim)
                .filter(|s| !s.is_empty())
                .map(|name| {
                    name.parse().map_err(|_| ConfigError::InvalidValue {
                        key: "AUTH_THROUGH".to_string(),
                        value: name.to_string(),
                    })
                })
                .collect::<Result<_, _>>()?;
        }
        auth.remember_enabled = bool_or(&source, "AUTH_REMEMBER_ENABLED", auth.remember_enabled);
        auth.remember_lifetime =
            seconds_or(&source, "AUTH_REMEMBER_LIFETIME", auth.remember_lifetime);
        auth.magic_link_ttl = seconds_or(&source, "AUTH_MAGIC_LINK_TTL", auth.magic_link_ttl);

        let app_key = match source("APP_KEY") {
            Some(raw) => Some(raw.parse().map_err(|_| ConfigError::InvalidValue {
                key: "APP_KEY".to_string(),
                value: "<redacted>".to_string(),
            })?),
            None => None,
        };

        let config = Self {
            session,
            csrf,
            auth,
            app_key,
        };
        config.validate()?;
        Ok(config)
    }

    /// Reject combinations that cannot work at runtime.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.session.encrypt && self.app_key.is_none() {
            return Err(ConfigError::Missing(
                "APP_KEY (required by SESSION_ENCRYPT)".to_string(),
            ));
        }
        if self.session.driver.needs_url() && self.session.driver_url.is_none() {
            return Err(ConfigError::Missing(format!(
                "SESSION_DRIVER_URL (required by the {} driver)",
                self.session.driver
            )));
        }
        if self.session.lifetime <= Duration::zero() {
            return Err(ConfigError::InvalidValue {
                key: "SESSION_LIFETIME".to_string(),
                value: self.session.lifetime.num_seconds().to_string(),
            });
        }
        for (key, duration) in [
            ("SESSION_LIFETIME", self.session.lifetime),
            ("SESSION_ROTATE", self.session.rotate),
            ("AUTH_CONFIRMATION_DURATION", self.auth.confirmation_duration),
            ("AUTH_REMEMBER_LIFETIME", self.auth.remember_lifetime),
            ("AUTH_MAGIC_LINK_TTL", self.auth.magic_link_ttl),
        ] {
            if duration < Duration::zero() || duration.num_seconds() > MAX_DURATION_SEC {
                return Err(ConfigError::InvalidValue {
                    key: key.to_string(),
                    value: duration.num_seconds().to_string(),
                });
            }
        }
        Ok(())
    }
}

fn bool_or<F>(source: &F, key: &str, default: bool) -> bool
where
    F: Fn(&str) -> Option<String>,
{
    match source(key) {
        Some(value) => match value.to_lowercase().as_str() {
            "1" | "true" | "yes" | "on" => true,
            "0" | "false" | "no" | "off" => false,
            _ => {
                tracing::warn!("Ignoring invalid boolean for {}: {}", key, value);
                default
            }
        },
        None => default,
    }
}

fn seconds_or<F>(source: &F, key: &str, default: Duration) -> Duration
where
    F: Fn(&str) -> Option<String>,
{
    let Some(value) = source(key) else {
        return default;
    };
    match value
        .parse::<i64>()
        .ok()
        .filter(|secs| (0..=MAX_DURATION_SEC).contains(secs))
        .and_then(Duration::try_seconds)
    {
        Some(duration) => duration,
        None => {
            tracing::warn!("Ignoring invalid duration for {}: {}", key, value);
            default
        }
    }
}

fn parsed<F, T>(source: &F, key: &str) -> Result<Option<T>, ConfigError>
where
    F: Fn(&str) -> Option<String>,
    T: FromStr,
{
    match source(key) {
        Some(value) => value
            .parse()
            .map(Some)
            .map_err(|_| ConfigError::InvalidValue {
                key: key.to_string(),
                value,
            }),
        None => Ok(None),
    }
}
