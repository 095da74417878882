use chrono::{DateTime, Duration, Utc};
use session_shield::{
    AUTH_CONFIRM_KEY, AuthenticatorKind, Clock, GENERIC_FAILURE_MESSAGE, ShieldError,
    ShieldRequest, confirm_magic_link_core, issue_magic_link, login_core,
};

use crate::common::{MAGIC_LOGIN_PATH, MockBrowser, TestEnv, TestUsers};

/// Magic link for user 42 carrying `intended=/dashboard`
///
/// Flow: issue link → visit once → logged in, confirmed, redirected → visit again → rejected
#[tokio::test]
async fn test_magic_link_for_user_42_end_to_end() -> Result<(), Box<dyn std::error::Error>> {
    let env = TestEnv::new().await;
    let mut browser = MockBrowser::new(&env.shield);

    let link = issue_magic_link(
        &env.shield,
        MAGIC_LOGIN_PATH,
        &TestUsers::user_42(),
        Some("/dashboard"),
        None,
    )?;
    let request = ShieldRequest::get(&link)?;

    // First visit
    let mut session = browser.begin().await;
    let response = confirm_magic_link_core(&env.shield, &mut session, &request).await?;
    assert_eq!(response.completed.user.id, "42");
    assert_eq!(response.redirect.as_deref(), Some("/dashboard"));
    assert_eq!(
        session.get::<DateTime<Utc>>(AUTH_CONFIRM_KEY),
        Some(env.clock.now() + Duration::minutes(180))
    );
    browser.end(session).await;

    // The login sticks for the next request
    let session = browser.begin().await;
    assert_eq!(session.user_id(), Some("42"));
    assert!(env.shield.confirmation().is_confirmed(&session));
    browser.end(session).await;

    // Second visit to the identical URL
    let mut session = browser.begin().await;
    let second = confirm_magic_link_core(&env.shield, &mut session, &request).await;
    assert!(matches!(second, Err(ShieldError::InvalidSignedLink)));
    assert_eq!(
        second.unwrap_err().to_string(),
        session_shield::SIGNED_LINK_FAILURE_MESSAGE
    );

    Ok(())
}

/// Expiry boundary: valid up to and including `issued + ttl`, rejected after
#[tokio::test]
async fn test_magic_link_expiry_boundary() -> Result<(), Box<dyn std::error::Error>> {
    let env = TestEnv::new().await;
    // Whole seconds keep the boundary exact
    let start = DateTime::from_timestamp(env.clock.now().timestamp(), 0).ok_or("timestamp")?;
    env.clock.set(start);

    let ttl = Duration::minutes(10);
    let link = issue_magic_link(
        &env.shield,
        MAGIC_LOGIN_PATH,
        &TestUsers::calvin(),
        None,
        Some(ttl),
    )?;

    env.clock.set(start + ttl);
    assert!(env.shield.links().check(&link).is_ok());

    env.clock.set(start + ttl + Duration::seconds(1));
    assert!(env.shield.links().check(&link).is_err());

    Ok(())
}

/// Links signed under one application key are worthless under another
#[tokio::test]
async fn test_links_do_not_survive_key_change() -> Result<(), Box<dyn std::error::Error>> {
    let env = TestEnv::new().await;
    let link = issue_magic_link(&env.shield, MAGIC_LOGIN_PATH, &TestUsers::calvin(), None, None)?;

    let mut config = TestEnv::config();
    config.app_key = Some(session_shield::AppKey::generate()?.parse()?);
    let other = TestEnv::with_config(config).await;
    let mut session = other.shield.sessions().start(None).await?;

    let result =
        confirm_magic_link_core(&other.shield, &mut session, &ShieldRequest::get(&link)?).await;
    assert!(matches!(result, Err(ShieldError::InvalidSignedLink)));

    Ok(())
}

/// The magic-link authenticator inside the login chain
///
/// Flow: link to the login route → chain accepts it once → replay fails generically
#[tokio::test]
async fn test_magic_link_authenticator_in_chain() -> Result<(), Box<dyn std::error::Error>> {
    let mut config = TestEnv::config();
    config.auth.through = vec![AuthenticatorKind::MagicLink, AuthenticatorKind::Password];
    let env = TestEnv::with_config(config).await;
    let mut browser = MockBrowser::new(&env.shield);

    let link = issue_magic_link(&env.shield, "/login", &TestUsers::user_42(), None, None)?;
    let request = ShieldRequest::get(&link)?;

    let mut session = browser.begin().await;
    let response = login_core(&env.shield, &mut session, &request).await?;
    assert_eq!(response.completed.user, TestUsers::user_42());
    // Remembering is off unless enabled in configuration
    assert!(!response.completed.remember_me);
    browser.end(session).await;

    let mut session = browser.begin().await;
    match login_core(&env.shield, &mut session, &request).await {
        Err(ShieldError::AuthenticationFailed { message, .. }) => {
            assert_eq!(message, GENERIC_FAILURE_MESSAGE);
        }
        other => return Err(format!("expected authentication failure, got {other:?}").into()),
    }

    Ok(())
}
