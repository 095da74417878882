use std::sync::Arc;

use crate::auth::{AuthConfirmation, AuthenticationPipeline, Authenticator, UserLookup};
use crate::clock::{Clock, SystemClock};
use crate::config::ShieldConfig;
use crate::csrf::CsrfGuard;
use crate::errors::ShieldError;
use crate::keys::AppKey;
use crate::session::SessionManager;
use crate::signed_link::{DriverInvalidationSet, SignedLink};
use crate::storage::{SessionDriver, create_driver};

const DEFAULT_HOME_URL: &str = "/";

/// Everything a request needs, wired once at startup and shared by clone.
#[derive(Clone)]
pub struct Shield {
    config: Arc<ShieldConfig>,
    sessions: SessionManager,
    csrf: CsrfGuard,
    links: SignedLink,
    pipeline: AuthenticationPipeline,
    confirmation: AuthConfirmation,
    users: Arc<dyn UserLookup>,
    clock: Arc<dyn Clock>,
    home_url: String,
}

impl Shield {
    /// Open the configured driver and assemble the engine on the system clock.
    pub async fn from_config(
        config: ShieldConfig,
        users: Arc<dyn UserLookup>,
    ) -> Result<Self, ShieldError> {
        let clock: Arc<dyn Clock> = Arc::new(SystemClock);
        let driver = create_driver(&config.session, clock.clone()).await?;
        Self::with_driver(config, users, driver, clock)
    }

    /// Assemble the engine over an existing driver and clock.
    pub fn with_driver(
        mut config: ShieldConfig,
        users: Arc<dyn UserLookup>,
        driver: Arc<dyn SessionDriver>,
        clock: Arc<dyn Clock>,
    ) -> Result<Self, ShieldError> {
        config.validate()?;

        let app_key = match config.app_key.clone() {
            Some(key) => key,
            None => {
                tracing::warn!(
                    "APP_KEY is not set; using an ephemeral key. Signed links will not survive a restart"
                );
                let key: AppKey = AppKey::generate()?.parse()?;
                config.app_key = Some(key.clone());
                key
            }
        };
        tracing::info!("Application key fingerprint: {}", app_key.fingerprint());

        let sessions = SessionManager::new(
            config.session.clone(),
            &config.auth,
            Some(&app_key),
            driver.clone(),
            clock.clone(),
        )?;
        let links = SignedLink::new(
            &app_key,
            clock.clone(),
            Arc::new(DriverInvalidationSet::new(driver)),
            config.session.lifetime,
        );
        let pipeline = AuthenticationPipeline::from_kinds(&config.auth.through, users.clone(), &links);

        Ok(Self {
            csrf: CsrfGuard::new(config.csrf.mode),
            confirmation: AuthConfirmation::new(clock.clone()),
            config: Arc::new(config),
            sessions,
            links,
            pipeline,
            users,
            clock,
            home_url: DEFAULT_HOME_URL.to_string(),
        })
    }

    /// Where successful logins land when no intended URL is known.
    pub fn with_home_url(mut self, url: impl Into<String>) -> Self {
        self.home_url = url.into();
        self
    }

    /// Put a host-specific authenticator in front of the configured chain.
    pub fn with_authenticator(mut self, authenticator: Arc<dyn Authenticator>) -> Self {
        self.pipeline.prepend(authenticator);
        self
    }

    pub fn config(&self) -> &ShieldConfig {
        &self.config
    }

    pub fn sessions(&self) -> &SessionManager {
        &self.sessions
    }

    pub fn csrf(&self) -> &CsrfGuard {
        &self.csrf
    }

    pub fn links(&self) -> &SignedLink {
        &self.links
    }

    pub fn pipeline(&self) -> &AuthenticationPipeline {
        &self.pipeline
    }

    pub fn confirmation(&self) -> &AuthConfirmation {
        &self.confirmation
    }

    pub fn users(&self) -> Arc<dyn UserLookup> {
        self.users.clone()
    }

    pub fn clock(&self) -> Arc<dyn Clock> {
        self.clock.clone()
    }

    pub fn home_url(&self) -> &str {
        &self.home_url
    }
}
