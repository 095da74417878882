use std::sync::Arc;

use chrono::Duration;
use session_shield::{Clock, DatabaseSessionDriver, Shield, ShieldRequest, login_core};

use crate::common::{MockBrowser, TestEnv, TestUsers};

/// A session started at T0 is gone for any request at `T0 + lifetime + 1`
#[tokio::test]
async fn test_absolute_timeout_issues_fresh_session() -> Result<(), Box<dyn std::error::Error>> {
    let env = TestEnv::new().await;
    let mut browser = MockBrowser::new(&env.shield);
    let lifetime = env.shield.config().session.lifetime;

    let mut session = browser.begin().await;
    session.put("cart", vec!["book"])?;
    browser.end(session).await;
    let first_cookie = browser.cookie().map(str::to_string);

    // Keep the session busy right up to the end of its lifetime
    env.clock.advance(lifetime - Duration::minutes(1));
    let session = browser.begin().await;
    assert!(session.has("cart"));
    browser.end(session).await;

    env.clock.advance(Duration::minutes(1) + Duration::seconds(1));
    let session = browser.begin().await;
    assert!(!session.was_loaded());
    assert!(!session.has("cart"));
    browser.end(session).await;

    assert_ne!(browser.cookie().map(str::to_string), first_cookie);
    Ok(())
}

/// Regeneration keeps the data and retires the old id
#[tokio::test]
async fn test_regenerated_id_retires_old_cookie() -> Result<(), Box<dyn std::error::Error>> {
    let env = TestEnv::new().await;
    let mut browser = MockBrowser::new(&env.shield);

    let mut session = browser.begin().await;
    session.put("theme", "dark")?;
    browser.end(session).await;
    let old_cookie = browser.cookie().map(str::to_string);

    let mut session = browser.begin().await;
    session.regenerate_id().await?;
    assert_eq!(session.get::<String>("theme").as_deref(), Some("dark"));
    browser.end(session).await;

    // The new cookie resolves to the data
    let session = browser.begin().await;
    assert_eq!(session.get::<String>("theme").as_deref(), Some("dark"));

    // The old cookie does not
    let mut attacker = MockBrowser::new(&env.shield);
    attacker.set_cookie(old_cookie.clone());
    let stolen = attacker.begin().await;
    assert!(!stolen.was_loaded());
    assert_ne!(Some(stolen.id().as_str().to_string()), old_cookie);
    Ok(())
}

/// Ids are rotated once the interval has passed, keeping the login
#[tokio::test]
async fn test_rotation_after_interval() -> Result<(), Box<dyn std::error::Error>> {
    let env = TestEnv::new().await;
    let mut browser = MockBrowser::new(&env.shield);
    let rotate = env.shield.config().session.rotate;
    assert_eq!(rotate, Duration::hours(4));

    let mut session = browser.begin().await;
    session.set_user_id(Some("1".to_string()));
    browser.end(session).await;
    let before = browser.cookie().map(str::to_string);

    env.clock.advance(rotate - Duration::seconds(1));
    let session = browser.begin().await;
    browser.end(session).await;
    assert_eq!(browser.cookie().map(str::to_string), before);

    env.clock.advance(Duration::seconds(1));
    let session = browser.begin().await;
    assert_eq!(session.user_id(), Some("1"));
    browser.end(session).await;
    assert_ne!(browser.cookie().map(str::to_string), before);
    Ok(())
}

/// Ids the store never issued are not adopted
#[tokio::test]
async fn test_unknown_session_id_is_not_adopted() {
    let env = TestEnv::new().await;
    let mut browser = MockBrowser::new(&env.shield);
    let planted = "A".repeat(43);
    browser.set_cookie(Some(planted.clone()));

    let session = browser.begin().await;

    assert!(!session.was_loaded());
    assert_ne!(session.id().as_str(), planted);
}

/// Flash values survive exactly one following request
#[tokio::test]
async fn test_flash_across_requests() -> Result<(), Box<dyn std::error::Error>> {
    let env = TestEnv::new().await;
    let mut browser = MockBrowser::new(&env.shield);

    let mut session = browser.begin().await;
    session.flash("status", "Saved")?;
    browser.end(session).await;

    let session = browser.begin().await;
    assert_eq!(session.flashed::<String>("status").as_deref(), Some("Saved"));
    browser.end(session).await;

    let session = browser.begin().await;
    assert_eq!(session.flashed::<String>("status"), None);
    Ok(())
}

/// The whole engine over the sqlite driver
#[tokio::test]
async fn test_login_over_sqlite_driver() -> Result<(), Box<dyn std::error::Error>> {
    let env = TestEnv::new().await;
    let clock: Arc<dyn Clock> = env.clock.clone();
    let driver = Arc::new(DatabaseSessionDriver::sqlite("sqlite::memory:", "sessions", clock.clone()).await?);
    let shield = Shield::with_driver(TestEnv::config(), TestUsers::directory().await, driver, clock)?;
    let mut browser = MockBrowser::new(&shield);

    let mut session = browser.begin().await;
    let request = ShieldRequest::post("/login")?.with_form([("log", "calvin"), ("pwd", "password")]);
    login_core(&shield, &mut session, &request).await?;
    browser.end(session).await;

    let session = browser.begin().await;
    assert!(session.was_loaded());
    assert_eq!(session.user_id(), Some("1"));
    Ok(())
}
