use crate::auth::{AuthError, LoginCompleted, User, complete_login};
use crate::coordination::shield::Shield;
use crate::csrf::CsrfToken;
use crate::errors::ShieldError;
use crate::request::ShieldRequest;
use crate::session::SessionStore;

pub const REDIRECT_TO_FIELD: &str = "redirect_to";
pub const REAUTH_FIELD: &str = "reauth";
pub const INTERIM_LOGIN_FIELD: &str = "is_interim_login";
/// Session flag set after a successful interim (modal) login.
pub const INTERIM_LOGIN_SUCCESS_KEY: &str = "interim_login_success";

/// What the login page should do for a GET request.
#[derive(Debug, Clone, PartialEq)]
pub enum LoginPage {
    /// The visitor is already logged in.
    Redirect(String),
    /// Render the form with this CSRF pair.
    Form { csrf: CsrfToken },
}

/// Result of a successful login for the HTTP layer to act on.
#[derive(Debug, Clone, PartialEq)]
pub struct LoginResponse {
    pub completed: LoginCompleted,
    /// `None` for interim logins, which answer in place.
    pub redirect: Option<String>,
}

/// True for same-origin paths such as `/dashboard?tab=1`.
pub fn is_local_path(url: &str) -> bool {
    url.starts_with('/') && !url.starts_with("//") && !url.starts_with("/\\")
}

/// Save `url` as the place to go after login. Only same-origin paths are kept.
pub fn remember_intended_url(session: &mut SessionStore, url: &str) -> Result<bool, ShieldError> {
    if !is_local_path(url) {
        tracing::debug!("Ignoring non-local intended url");
        return Ok(false);
    }
    session.set_intended_url(url)?;
    Ok(true)
}

/// Decide what GET on the login route shows.
///
/// `reauth=1` logs the current user out first. `redirect_to` is remembered as
/// the intended URL.
#[tracing::instrument(skip_all)]
pub async fn login_page_core(
    shield: &Shield,
    session: &mut SessionStore,
    request: &ShieldRequest,
) -> Result<LoginPage, ShieldError> {
    if request.boolean(REAUTH_FIELD) {
        if session.is_authenticated() {
            tracing::info!("Re-authentication requested, logging out");
            logout_core(session).await?;
        }
    } else if session.is_authenticated() {
        let target = session
            .take_intended_url()
            .unwrap_or_else(|| shield.home_url().to_string());
        return Ok(LoginPage::Redirect(target));
    }

    if let Some(url) = request.input(REDIRECT_TO_FIELD) {
        remember_intended_url(session, &url)?;
    }

    let csrf = shield.csrf().create(session)?;
    Ok(LoginPage::Form { csrf })
}

/// Run the authentication chain for a login submission and update the session.
///
/// CSRF is checked by the HTTP layer before this runs.
#[tracing::instrument(skip_all)]
pub async fn login_core(
    shield: &Shield,
    session: &mut SessionStore,
    request: &ShieldRequest,
) -> Result<LoginResponse, ShieldError> {
    if let Some(url) = request.input(REDIRECT_TO_FIELD) {
        remember_intended_url(session, &url)?;
    }

    let (user, remember_me) = match shield.pipeline().authenticate(request).await {
        Ok(found) => found,
        Err(AuthError::Failed {
            message,
            redirect_route,
        }) => {
            return Err(ShieldError::AuthenticationFailed {
                message,
                redirect_route,
            });
        }
        Err(e) => return Err(e.into()),
    };

    let completed = log_in(shield, session, user, remember_me).await?;

    if request.boolean(INTERIM_LOGIN_FIELD) {
        session.put(INTERIM_LOGIN_SUCCESS_KEY, true)?;
        return Ok(LoginResponse {
            completed,
            redirect: None,
        });
    }

    let redirect = session
        .take_intended_url()
        .unwrap_or_else(|| shield.home_url().to_string());
    Ok(LoginResponse {
        completed,
        redirect: Some(redirect),
    })
}

/// Log the session in as `user`.
///
/// Data of a different user never carries over: such a session is invalidated
/// first, keeping only the intended URL.
pub(crate) async fn log_in(
    shield: &Shield,
    session: &mut SessionStore,
    user: User,
    remember_me: bool,
) -> Result<LoginCompleted, ShieldError> {
    if session.user_id().is_some_and(|current| current != user.id) {
        tracing::info!("Switching user, discarding previous session data");
        let intended = session.intended_url();
        session.invalidate().await?;
        if let Some(url) = intended {
            session.set_intended_url(&url)?;
        }
    }

    Ok(complete_login(
        session,
        user,
        remember_me,
        &shield.config().auth,
        shield.confirmation(),
    )
    .await?)
}

/// End the login: drop all session data and move to a fresh id.
#[tracing::instrument(skip_all)]
pub async fn logout_core(session: &mut SessionStore) -> Result<(), ShieldError> {
    if let Some(user_id) = session.user_id() {
        tracing::info!("User {} logged out", user_id);
    }
    session.invalidate().await?;
    Ok(())
}
