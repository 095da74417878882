use std::sync::Arc;

use async_trait::async_trait;

use crate::auth::errors::AuthError;
use crate::auth::types::{AuthOutcome, Authenticator, UserLookup};
use crate::request::ShieldRequest;

pub const LOGIN_FIELD: &str = "log";
pub const PASSWORD_FIELD: &str = "pwd";
pub const REMEMBER_FIELD: &str = "remember_me";

/// Login name and password from the `log`/`pwd` form fields.
pub struct PasswordAuthenticator {
    users: Arc<dyn UserLookup>,
}

impl PasswordAuthenticator {
    pub fn new(users: Arc<dyn UserLookup>) -> Self {
        Self { users }
    }
}

#[async_trait]
impl Authenticator for PasswordAuthenticator {
    async fn attempt(&self, request: &ShieldRequest) -> Result<AuthOutcome, AuthError> {
        let (Some(login), Some(password)) =
            (request.form(LOGIN_FIELD), request.form(PASSWORD_FIELD))
        else {
            return Ok(AuthOutcome::Continue);
        };

        if login.is_empty() || password.is_empty() {
            tracing::debug!("Password login with empty credentials");
            return Ok(AuthOutcome::fail());
        }

        let Some(user) = self.users.find_by_login_name(login).await? else {
            self.users.verify_unknown_password(password).await?;
            tracing::debug!("Password login for unknown login name");
            return Ok(AuthOutcome::fail());
        };

        if !self.users.verify_password(&user, password).await? {
            tracing::debug!("Password login with wrong password for user {}", user.id);
            return Ok(AuthOutcome::fail());
        }

        Ok(AuthOutcome::Success {
            user,
            remember_me: request.boolean(REMEMBER_FIELD),
        })
    }
}
