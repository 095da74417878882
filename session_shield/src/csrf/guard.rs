use std::collections::BTreeMap;

use subtle::ConstantTimeEq;

use crate::csrf::errors::CsrfError;
use crate::csrf::types::{CsrfMode, CsrfToken};
use crate::request::ShieldRequest;
use crate::session::SessionStore;
use crate::utils::gen_random_string;

/// Session key holding the token family.
pub const CSRF_SESSION_KEY: &str = "csrf";
pub const CSRF_NAME_FIELD: &str = "csrf_name";
pub const CSRF_VALUE_FIELD: &str = "csrf_value";
pub const CSRF_NAME_HEADER: &str = "X-CSRF-Name";
pub const CSRF_VALUE_HEADER: &str = "X-CSRF-Value";

const NAME_PREFIX: &str = "csrf";
/// Outstanding pairs kept per session. Further pairs evict an existing one.
const FAMILY_LIMIT: usize = 100;

type TokenFamily = BTreeMap<String, String>;

#[derive(Debug, Clone, Copy, Default)]
pub struct CsrfGuard {
    mode: CsrfMode,
}

impl CsrfGuard {
    pub fn new(mode: CsrfMode) -> Self {
        Self { mode }
    }

    pub fn mode(&self) -> CsrfMode {
        self.mode
    }

    /// Mint a pair and store it in the session's family.
    ///
    /// In persist mode an existing pair is handed out again instead.
    pub fn create(&self, session: &mut SessionStore) -> Result<CsrfToken, CsrfError> {
        let mut family = family(session);

        if self.mode == CsrfMode::Persist {
            if let Some((name, value)) = family.iter().next() {
                return Ok(CsrfToken {
                    name: name.clone(),
                    value: value.clone(),
                });
            }
        }

        if family.len() >= FAMILY_LIMIT {
            // Names are random, so the first key is an arbitrary victim.
            if let Some(victim) = family.keys().next().cloned() {
                family.remove(&victim);
            }
        }

        let token = mint()?;
        family.insert(token.name.clone(), token.value.clone());
        session.put(CSRF_SESSION_KEY, &family)?;
        Ok(token)
    }

    /// Check a submitted pair against the session's family.
    ///
    /// On success returns the pair the client should use next: a fresh one in
    /// rotate mode, the same one in persist mode. On failure the whole family is
    /// removed from the session.
    pub fn validate(
        &self,
        session: &mut SessionStore,
        name: &str,
        value: &str,
    ) -> Result<CsrfToken, CsrfError> {
        let family = family(session);

        let matched = family
            .get(name)
            .is_some_and(|stored| bool::from(stored.as_bytes().ct_eq(value.as_bytes())));

        if !matched {
            tracing::warn!("CSRF validation failed, wiping token family");
            session.forget(CSRF_SESSION_KEY);
            return Err(CsrfError::InvalidToken);
        }

        match self.mode {
            CsrfMode::Persist => Ok(CsrfToken {
                name: name.to_string(),
                value: value.to_string(),
            }),
            CsrfMode::Rotate => {
                let token = mint()?;
                let mut fresh = TokenFamily::new();
                fresh.insert(token.name.clone(), token.value.clone());
                session.put(CSRF_SESSION_KEY, &fresh)?;
                tracing::debug!("CSRF token rotated");
                Ok(token)
            }
        }
    }

    /// Validate a state-changing request. Read-only methods pass through with `None`.
    ///
    /// The pair is taken from the `csrf_name`/`csrf_value` form fields, falling back
    /// to the `X-CSRF-Name`/`X-CSRF-Value` headers.
    pub fn validate_request(
        &self,
        session: &mut SessionStore,
        request: &ShieldRequest,
    ) -> Result<Option<CsrfToken>, CsrfError> {
        if request.is_read_only() {
            return Ok(None);
        }

        let name = request
            .form(CSRF_NAME_FIELD)
            .or_else(|| request.header(CSRF_NAME_HEADER))
            .unwrap_or_default()
            .to_string();
        let value = request
            .form(CSRF_VALUE_FIELD)
            .or_else(|| request.header(CSRF_VALUE_HEADER))
            .unwrap_or_default()
            .to_string();

        self.validate(session, &name, &value).map(Some)
    }

    /// Number of outstanding pairs.
    pub fn outstanding(&self, session: &SessionStore) -> usize {
        family(session).len()
    }
}

fn family(session: &SessionStore) -> TokenFamily {
    session.get(CSRF_SESSION_KEY).unwrap_or_default()
}

fn mint() -> Result<CsrfToken, CsrfError> {
    Ok(CsrfToken {
        name: format!("{NAME_PREFIX}{}", gen_random_string(8)?),
        value: gen_random_string(32)?,
    })
}
