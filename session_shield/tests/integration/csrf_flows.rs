use http::{HeaderMap, HeaderValue};
use session_shield::{
    CSRF_SESSION_KEY, CsrfMode, ShieldError, ShieldRequest,
};

use crate::common::{MockBrowser, TestEnv};

/// Rotating mode: a pair works once, and a failure wipes every outstanding pair
#[tokio::test]
async fn test_rotating_tokens_across_requests() -> Result<(), Box<dyn std::error::Error>> {
    let env = TestEnv::new().await;
    let csrf = env.shield.csrf();
    let mut browser = MockBrowser::new(&env.shield);

    // Two forms rendered in separate requests
    let mut session = browser.begin().await;
    let first = csrf.create(&mut session)?;
    browser.end(session).await;
    let mut session = browser.begin().await;
    let second = csrf.create(&mut session)?;
    assert_eq!(csrf.outstanding(&session), 2);
    browser.end(session).await;

    // Submitting the first one succeeds and hands out a replacement
    let mut session = browser.begin().await;
    let request = ShieldRequest::post("/profile")?
        .with_form([("csrf_name", first.name.as_str()), ("csrf_value", first.value.as_str())]);
    let next = csrf.validate_request(&mut session, &request)?.ok_or("token expected")?;
    assert_ne!(next, first);
    browser.end(session).await;

    // Replaying it fails, and the family is gone
    let mut session = browser.begin().await;
    let result = csrf.validate_request(&mut session, &request);
    assert!(result.is_err());
    assert_eq!(
        ShieldError::from(result.unwrap_err()).to_string(),
        session_shield::CSRF_FAILURE_MESSAGE
    );
    assert!(!session.has(CSRF_SESSION_KEY));
    assert!(csrf.validate(&mut session, &second.name, &second.value).is_err());
    Ok(())
}

/// Persisting mode: one pair, reusable until a failure
#[tokio::test]
async fn test_persisting_tokens_via_headers() -> Result<(), Box<dyn std::error::Error>> {
    let mut config = TestEnv::config();
    config.csrf.mode = CsrfMode::Persist;
    let env = TestEnv::with_config(config).await;
    let csrf = env.shield.csrf();
    let mut browser = MockBrowser::new(&env.shield);

    let mut session = browser.begin().await;
    let token = csrf.create(&mut session)?;
    assert_eq!(csrf.create(&mut session)?, token);
    browser.end(session).await;

    let mut headers = HeaderMap::new();
    headers.insert("x-csrf-name", HeaderValue::from_str(&token.name)?);
    headers.insert("x-csrf-value", HeaderValue::from_str(&token.value)?);
    let request = ShieldRequest::post("/api/items")?.with_headers(headers);

    for _ in 0..3 {
        let mut session = browser.begin().await;
        assert_eq!(csrf.validate_request(&mut session, &request)?, Some(token.clone()));
        browser.end(session).await;
    }

    // Read-only requests are not checked at all
    let mut session = browser.begin().await;
    assert_eq!(csrf.validate_request(&mut session, &ShieldRequest::get("/api/items")?)?, None);
    Ok(())
}
