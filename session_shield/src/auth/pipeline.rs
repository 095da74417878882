use std::sync::Arc;

use crate::auth::authenticators::{MagicLinkAuthenticator, PasswordAuthenticator};
use crate::auth::confirmation::AuthConfirmation;
use crate::auth::errors::AuthError;
use crate::auth::types::{
    AuthOutcome, Authenticator, AuthenticatorKind, GENERIC_FAILURE_MESSAGE, LOGIN_ROUTE,
    LoginCompleted, User, UserLookup,
};
use crate::config::AuthConfig;
use crate::request::ShieldRequest;
use crate::session::SessionStore;
use crate::signed_link::SignedLink;

/// Ordered chain of authenticators. The first `Success` or `Fail` ends the chain;
/// a chain where everyone answers `Continue` fails.
#[derive(Clone, Default)]
pub struct AuthenticationPipeline {
    authenticators: Vec<Arc<dyn Authenticator>>,
}

impl AuthenticationPipeline {
    pub fn new(authenticators: Vec<Arc<dyn Authenticator>>) -> Self {
        Self { authenticators }
    }

    /// Build the chain named by `auth.through`.
    pub fn from_kinds(
        kinds: &[AuthenticatorKind],
        users: Arc<dyn UserLookup>,
        links: &SignedLink,
    ) -> Self {
        let authenticators = kinds
            .iter()
            .map(|kind| -> Arc<dyn Authenticator> {
                match kind {
                    AuthenticatorKind::Password => {
                        Arc::new(PasswordAuthenticator::new(users.clone()))
                    }
                    AuthenticatorKind::MagicLink => {
                        Arc::new(MagicLinkAuthenticator::new(links.clone(), users.clone()))
                    }
                }
            })
            .collect();
        Self { authenticators }
    }

    /// Put an authenticator in front of the chain.
    pub fn prepend(&mut self, authenticator: Arc<dyn Authenticator>) {
        self.authenticators.insert(0, authenticator);
    }

    pub fn push(&mut self, authenticator: Arc<dyn Authenticator>) {
        self.authenticators.push(authenticator);
    }

    pub fn len(&self) -> usize {
        self.authenticators.len()
    }

    pub fn is_empty(&self) -> bool {
        self.authenticators.is_empty()
    }

    /// Run the chain. Returns the authenticated user and the remember-me request,
    /// or `AuthError::Failed` with the generic message.
    pub async fn authenticate(&self, request: &ShieldRequest) -> Result<(User, bool), AuthError> {
        for authenticator in &self.authenticators {
            match authenticator.attempt(request).await? {
                AuthOutcome::Continue => continue,
                AuthOutcome::Success { user, remember_me } => {
                    tracing::debug!("Authenticated user {}", user.id);
                    return Ok((user, remember_me));
                }
                AuthOutcome::Fail {
                    message,
                    redirect_route,
                } => {
                    tracing::info!("Authentication failed");
                    return Err(AuthError::Failed {
                        message,
                        redirect_route,
                    });
                }
            }
        }

        tracing::info!("No authenticator accepted the request");
        Err(AuthError::Failed {
            message: GENERIC_FAILURE_MESSAGE.to_string(),
            redirect_route: LOGIN_ROUTE.to_string(),
        })
    }
}

/// Update the session for a freshly authenticated user.
///
/// Moves the session to a new id, records the user, opens the confirmation
/// window and stores the remember-me preference when remembering is enabled.
#[tracing::instrument(skip_all, fields(user_id = %user.id))]
pub async fn complete_login(
    session: &mut SessionStore,
    user: User,
    remember_me: bool,
    config: &AuthConfig,
    confirmation: &AuthConfirmation,
) -> Result<LoginCompleted, AuthError> {
    let remember_me = remember_me && config.remember_enabled;

    session.restart_lifetime();
    session.set_user_id(Some(user.id.clone()));
    session.set_remember(remember_me);
    confirmation.confirm(session, config.confirmation_duration)?;
    session.regenerate_id().await?;

    tracing::info!("User {} logged in (remember_me={})", user.id, remember_me);
    Ok(LoginCompleted { user, remember_me })
}
