use std::collections::HashMap;

use async_trait::async_trait;
use tokio::sync::RwLock;

use crate::auth::errors::AuthError;
use crate::auth::password_hash::{hash_password, verify_password_hash};
use crate::auth::types::{User, UserLookup};

/// Process-local user directory for demos and tests. Passwords are kept as
/// Argon2 PHC strings.
#[derive(Default)]
pub struct InMemoryUserLookup {
    users: RwLock<HashMap<String, (User, String)>>,
}

impl InMemoryUserLookup {
    pub fn new() -> Self {
        Self::default()
    }

    pub async fn insert(&self, user: User, password: &str) -> Result<(), AuthError> {
        let phc = hash_password(password)?;
        self.users.write().await.insert(user.id.clone(), (user, phc));
        Ok(())
    }
}

#[async_trait]
impl UserLookup for InMemoryUserLookup {
    async fn find_by_id(&self, id: &str) -> Result<Option<User>, AuthError> {
        Ok(self.users.read().await.get(id).map(|(u, _)| u.clone()))
    }

    async fn find_by_login_name(&self, login: &str) -> Result<Option<User>, AuthError> {
        Ok(self
            .users
            .read()
            .await
            .values()
            .find(|(u, _)| u.login == login)
            .map(|(u, _)| u.clone()))
    }

    async fn verify_password(&self, user: &User, password: &str) -> Result<bool, AuthError> {
        let users = self.users.read().await;
        let Some((_, stored)) = users.get(&user.id) else {
            return Ok(false);
        };
        Ok(verify_password_hash(password, stored))
    }
}
