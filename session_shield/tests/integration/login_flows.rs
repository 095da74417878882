use std::sync::Arc;

use async_trait::async_trait;
use chrono::Duration;
use session_shield::{
    AuthError, AuthOutcome, Authenticator, Clock, GENERIC_FAILURE_MESSAGE, LOGIN_ROUTE,
    LoginPage, ShieldError, ShieldRequest, UserLookup, login_core, login_page_core, logout_core,
};

use crate::common::{MockBrowser, TestEnv, TestUsers};

/// Continues unless `allow_login_for_id` names a user.
struct AllowLoginAuthenticator {
    users: Arc<dyn UserLookup>,
}

#[async_trait]
impl Authenticator for AllowLoginAuthenticator {
    async fn attempt(&self, request: &ShieldRequest) -> Result<AuthOutcome, AuthError> {
        let Some(id) = request.input("allow_login_for_id") else {
            return Ok(AuthOutcome::Continue);
        };
        Ok(match self.users.find_by_id(&id).await? {
            Some(user) => AuthOutcome::Success {
                user,
                remember_me: false,
            },
            None => AuthOutcome::fail(),
        })
    }
}

fn password_request(login: &str, password: &str) -> ShieldRequest {
    ShieldRequest::post("/login")
        .expect("static uri")
        .with_form([("log", login), ("pwd", password)])
}

async fn failure_message(env: &TestEnv, request: &ShieldRequest) -> (String, String) {
    let mut session = env.shield.sessions().start(None).await.expect("session");
    match login_core(&env.shield, &mut session, request).await {
        Err(ShieldError::AuthenticationFailed {
            message,
            redirect_route,
        }) => (message, redirect_route),
        other => panic!("expected authentication failure, got {other:?}"),
    }
}

/// A custom authenticator in front of the chain does not change what failures look like
#[tokio::test]
async fn test_failure_message_is_identical_across_chains() {
    let plain = TestEnv::new().await;
    let custom = TestEnv::new().await;
    let shield = custom.shield.clone().with_authenticator(Arc::new(AllowLoginAuthenticator {
        users: custom.shield.users(),
    }));
    let custom = TestEnv { shield, ..custom };

    let wrong_password = password_request("calvin", "bogus");
    let unknown_user = password_request("nobody", "bogus");

    let expected = (GENERIC_FAILURE_MESSAGE.to_string(), LOGIN_ROUTE.to_string());
    assert_eq!(failure_message(&plain, &wrong_password).await, expected);
    assert_eq!(failure_message(&custom, &wrong_password).await, expected);
    assert_eq!(failure_message(&plain, &unknown_user).await, expected);
    assert_eq!(failure_message(&custom, &unknown_user).await, expected);
}

/// The custom authenticator logs in without remembering
#[tokio::test]
async fn test_custom_authenticator_logs_in() -> Result<(), Box<dyn std::error::Error>> {
    let env = TestEnv::new().await;
    let shield = env.shield.clone().with_authenticator(Arc::new(AllowLoginAuthenticator {
        users: env.shield.users(),
    }));
    let mut session = shield.sessions().start(None).await?;
    let request = ShieldRequest::post("/login")?.with_form([("allow_login_for_id", "42")]);

    let response = login_core(&shield, &mut session, &request).await?;

    assert_eq!(response.completed.user, TestUsers::user_42());
    assert!(!response.completed.remember_me);
    assert!(!session.has_remember_me_token());
    Ok(())
}

/// Full browser flow: login page → password login → intended redirect → logout
#[tokio::test]
async fn test_password_login_and_logout() -> Result<(), Box<dyn std::error::Error>> {
    let env = TestEnv::new().await;
    let mut browser = MockBrowser::new(&env.shield);

    let mut session = browser.begin().await;
    let page = login_page_core(
        &env.shield,
        &mut session,
        &ShieldRequest::get("/login?redirect_to=%2Faccount")?,
    )
    .await?;
    assert!(matches!(page, LoginPage::Form { .. }));
    browser.end(session).await;
    let anonymous_cookie = browser.cookie().map(str::to_string);

    let mut session = browser.begin().await;
    let response = login_core(&env.shield, &mut session, &password_request("calvin", "password"))
        .await?;
    assert_eq!(response.redirect.as_deref(), Some("/account"));
    browser.end(session).await;

    // Login moved the session to a new id
    assert_ne!(browser.cookie().map(str::to_string), anonymous_cookie);

    let mut session = browser.begin().await;
    assert_eq!(session.user_id(), Some("1"));
    logout_core(&mut session).await?;
    browser.end(session).await;

    let session = browser.begin().await;
    assert!(!session.is_authenticated());
    Ok(())
}

/// Remembered logins get the longer lifetime and a persistent cookie
#[tokio::test]
async fn test_remember_me() -> Result<(), Box<dyn std::error::Error>> {
    let mut config = TestEnv::config();
    config.auth.remember_enabled = true;
    let env = TestEnv::with_config(config).await;
    let mut session = env.shield.sessions().start(None).await?;
    let request = ShieldRequest::post("/login")?.with_form([
        ("log", "calvin"),
        ("pwd", "password"),
        ("remember_me", "on"),
    ]);

    let response = login_core(&env.shield, &mut session, &request).await?;

    assert!(response.completed.remember_me);
    assert!(session.has_remember_me_token());
    assert_eq!(session.expires_at(), env.clock.now() + Duration::days(14));
    let cookie = env.shield.sessions().finish(&mut session).await?;
    assert!(cookie.contains("Max-Age=1209600"));
    Ok(())
}
