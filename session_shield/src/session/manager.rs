use std::sync::Arc;

use chrono::Duration;

use crate::clock::Clock;
use crate::config::{AuthConfig, SessionConfig};
use crate::keys::AppKey;
use crate::session::cookie::{expired_session_cookie, session_cookie};
use crate::session::encryption::SessionCipher;
use crate::session::errors::SessionError;
use crate::session::store::{SessionBackend, SessionStore};
use crate::session::types::SessionId;
use crate::storage::SessionDriver;

/// Lifecycle policy over [`SessionStore`]: id acceptance, timeouts, rotation,
/// probabilistic garbage collection and cookie emission.
#[derive(Clone)]
pub struct SessionManager {
    config: SessionConfig,
    backend: SessionBackend,
}

impl SessionManager {
    pub fn new(
        config: SessionConfig,
        auth: &AuthConfig,
        app_key: Option<&AppKey>,
        driver: Arc<dyn SessionDriver>,
        clock: Arc<dyn Clock>,
    ) -> Result<Self, SessionError> {
        let cipher = match (config.encrypt, app_key) {
            (true, Some(key)) => Some(Arc::new(SessionCipher::new(key)?)),
            (true, None) => {
                return Err(SessionError::Crypto(
                    "Session encryption requires an application key".to_string(),
                ));
            }
            (false, _) => None,
        };

        let remember_lifetime = if auth.remember_enabled {
            auth.remember_lifetime
        } else {
            config.lifetime
        };

        let backend = SessionBackend {
            driver,
            cipher,
            clock,
            lifetime: config.lifetime,
            remember_lifetime,
        };
        Ok(Self { config, backend })
    }

    pub fn config(&self) -> &SessionConfig {
        &self.config
    }

    pub fn driver(&self) -> Arc<dyn SessionDriver> {
        self.backend.driver.clone()
    }

    pub fn clock(&self) -> Arc<dyn Clock> {
        self.backend.clock.clone()
    }

    /// Resolve the session for an incoming request.
    ///
    /// `cookie_value` is the raw session cookie, if any. Malformed or unknown ids
    /// are never adopted: a fresh id is issued instead.
    #[tracing::instrument(skip_all)]
    pub async fn start(&self, cookie_value: Option<&str>) -> Result<SessionStore, SessionError> {
        let candidate = cookie_value.and_then(|raw| {
            let parsed = SessionId::parse(raw);
            if parsed.is_none() {
                tracing::debug!("Ignoring malformed session id");
            }
            parsed
        });

        let mut store = match candidate {
            Some(id) => {
                let store = SessionStore::start(self.backend.clone(), id).await?;
                if store.was_loaded() {
                    store
                } else {
                    tracing::debug!("Unknown session id, issuing a fresh one");
                    self.fresh().await?
                }
            }
            None => self.fresh().await?,
        };

        let now = self.backend.clock.now();

        if now >= store.expires_at() {
            tracing::info!("Session reached its absolute lifetime, starting a new one");
            store.destroy().await?;
            store = self.fresh().await?;
        } else if self.config.rotate > Duration::zero()
            && store.was_loaded()
            && now - store.rotated_at() >= self.config.rotate
        {
            tracing::info!("Rotating session id");
            store.regenerate_id().await?;
        }

        store.age_flash();
        self.collect_garbage().await?;

        Ok(store)
    }

    async fn fresh(&self) -> Result<SessionStore, SessionError> {
        SessionStore::start(self.backend.clone(), SessionId::generate()?).await
    }

    /// Sweep the driver on a `lottery` fraction of calls.
    async fn collect_garbage(&self) -> Result<(), SessionError> {
        if !self.config.lottery.wins()? {
            return Ok(());
        }
        let max_lifetime = self.backend.lifetime.max(self.backend.remember_lifetime);
        let removed = self.backend.driver.gc(max_lifetime).await?;
        tracing::info!("Session garbage collection removed {} entries", removed);
        Ok(())
    }

    /// Persist the store and return the `Set-Cookie` value for the response.
    pub async fn finish(&self, store: &mut SessionStore) -> Result<String, SessionError> {
        store.save().await?;
        Ok(self.cookie_for(store))
    }

    /// Remembered sessions get a persistent cookie; others end with the browser.
    pub fn cookie_for(&self, store: &SessionStore) -> String {
        let max_age = store
            .has_remember_me_token()
            .then(|| store.expires_at() - self.backend.clock.now());
        session_cookie(&self.config, store.id(), max_age)
    }

    pub fn expired_cookie(&self) -> String {
        expired_session_cookie(&self.config)
    }
}
