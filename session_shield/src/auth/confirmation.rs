use std::sync::Arc;

use chrono::{DateTime, Duration, Utc};

use crate::clock::Clock;
use crate::session::{SessionError, SessionStore};

/// Session key holding the end of the confirmation window.
pub const AUTH_CONFIRM_KEY: &str = "auth.confirm.until";

/// "Recently proved identity" window, tracked in the session and independent of
/// whether the session is logged in.
#[derive(Clone)]
pub struct AuthConfirmation {
    clock: Arc<dyn Clock>,
}

impl AuthConfirmation {
    pub fn new(clock: Arc<dyn Clock>) -> Self {
        Self { clock }
    }

    /// Open or extend the window until `now + duration`.
    pub fn confirm(
        &self,
        session: &mut SessionStore,
        duration: Duration,
    ) -> Result<DateTime<Utc>, SessionError> {
        let until = self
            .clock
            .now()
            .checked_add_signed(duration)
            .ok_or_else(|| {
                SessionError::OutOfRange(format!(
                    "Confirmation duration {}s",
                    duration.num_seconds()
                ))
            })?;
        session.put(AUTH_CONFIRM_KEY, until)?;
        Ok(until)
    }

    pub fn is_confirmed(&self, session: &SessionStore) -> bool {
        self.confirmed_until(session)
            .is_some_and(|until| self.clock.now() < until)
    }

    pub fn confirmed_until(&self, session: &SessionStore) -> Option<DateTime<Utc>> {
        session.get(AUTH_CONFIRM_KEY)
    }

    pub fn revoke(&self, session: &mut SessionStore) {
        session.forget(AUTH_CONFIRM_KEY);
    }
}
