use chrono::Duration;

use crate::auth::{LoginCompleted, USER_ID_PARAM, User};
use crate::coordination::login::{LoginResponse, log_in};
use crate::coordination::shield::Shield;
use crate::errors::ShieldError;
use crate::request::ShieldRequest;
use crate::session::SessionStore;

/// Query parameter naming where to go after a confirmed magic link.
pub const INTENDED_PARAM: &str = "intended";

/// Issue a single-use login link for `user` pointing at `target`.
///
/// The link lives for `auth.magic_link_ttl` unless `ttl` overrides it.
pub fn issue_magic_link(
    shield: &Shield,
    target: &str,
    user: &User,
    intended: Option<&str>,
    ttl: Option<Duration>,
) -> Result<String, ShieldError> {
    let mut payload = vec![(USER_ID_PARAM, user.id.as_str())];
    if let Some(url) = intended {
        payload.push((INTENDED_PARAM, url));
    }
    let ttl = ttl.unwrap_or(shield.config().auth.magic_link_ttl);

    let link = shield.links().sign(target, &payload, ttl)?;
    tracing::info!("Issued magic link for user {}", user.id);
    Ok(link)
}

/// Follow a magic link: verify and consume it, log its user in and confirm
/// the session.
///
/// Redirects to the signed `intended` parameter, then to the session's intended
/// URL, then home. A link for an unknown user is `UserNotFound`.
#[tracing::instrument(skip_all)]
pub async fn confirm_magic_link_core(
    shield: &Shield,
    session: &mut SessionStore,
    request: &ShieldRequest,
) -> Result<LoginResponse, ShieldError> {
    let verified = shield.links().verify_request(request, true).await?;

    let Some(user_id) = verified.param(USER_ID_PARAM) else {
        tracing::info!("Magic link carries no user id");
        return Err(ShieldError::InvalidSignedLink);
    };
    let Some(user) = shield.users().find_by_id(user_id).await? else {
        tracing::info!("Magic link for unknown user {}", user_id);
        return Err(ShieldError::UserNotFound);
    };

    let completed = if session.user_id() == Some(user.id.as_str()) {
        // Already logged in: refresh the confirmation window and migrate.
        shield
            .confirmation()
            .confirm(session, shield.config().auth.confirmation_duration)?;
        session.regenerate_id().await?;
        LoginCompleted {
            remember_me: session.has_remember_me_token(),
            user,
        }
    } else {
        log_in(shield, session, user, false).await?
    };

    let redirect = verified
        .param(INTENDED_PARAM)
        .filter(|url| !url.is_empty())
        .map(str::to_string)
        .or_else(|| session.take_intended_url())
        .unwrap_or_else(|| shield.home_url().to_string());

    Ok(LoginResponse {
        completed,
        redirect: Some(redirect),
    })
}
