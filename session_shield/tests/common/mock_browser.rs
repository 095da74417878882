use session_shield::{SessionStore, Shield};

/// Carries the session cookie between requests like a browser would.
pub struct MockBrowser {
    shield: Shield,
    cookie: Option<String>,
}

impl MockBrowser {
    pub fn new(shield: &Shield) -> Self {
        Self {
            shield: shield.clone(),
            cookie: None,
        }
    }

    pub fn cookie(&self) -> Option<&str> {
        self.cookie.as_deref()
    }

    pub fn set_cookie(&mut self, value: Option<String>) {
        self.cookie = value;
    }

    /// Start the session for the next request.
    pub async fn begin(&self) -> SessionStore {
        self.shield
            .sessions()
            .start(self.cookie.as_deref())
            .await
            .expect("session should start")
    }

    /// Save the session and keep the cookie the response would set.
    pub async fn end(&mut self, mut session: SessionStore) {
        let set_cookie = self
            .shield
            .sessions()
            .finish(&mut session)
            .await
            .expect("session should save");
        self.cookie = cookie_value(&set_cookie, &self.shield.config().session.cookie);
    }
}

/// Value of cookie `name` in a `Set-Cookie` header.
pub fn cookie_value(set_cookie: &str, name: &str) -> Option<String> {
    set_cookie
        .split(';')
        .next()
        .and_then(|pair| pair.trim().strip_prefix(&format!("{name}=")))
        .map(str::to_string)
}
