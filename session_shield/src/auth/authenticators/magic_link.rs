use std::sync::Arc;

use async_trait::async_trait;

use crate::auth::errors::AuthError;
use crate::auth::types::{AuthOutcome, Authenticator, UserLookup};
use crate::request::ShieldRequest;
use crate::signed_link::{SIGNATURE_PARAM, SignedLink};

pub const USER_ID_PARAM: &str = "user_id";

/// Login through a single-use signed link carrying `user_id`.
pub struct MagicLinkAuthenticator {
    links: SignedLink,
    users: Arc<dyn UserLookup>,
}

impl MagicLinkAuthenticator {
    pub fn new(links: SignedLink, users: Arc<dyn UserLookup>) -> Self {
        Self { links, users }
    }
}

#[async_trait]
impl Authenticator for MagicLinkAuthenticator {
    async fn attempt(&self, request: &ShieldRequest) -> Result<AuthOutcome, AuthError> {
        if request.query(SIGNATURE_PARAM).is_none() {
            return Ok(AuthOutcome::Continue);
        }

        let verified = match self.links.verify_request(request, true).await {
            Ok(verified) => verified,
            Err(e) if e.is_rejection() => {
                tracing::debug!("Magic link login rejected: {}", e);
                return Ok(AuthOutcome::fail());
            }
            Err(e) => return Err(e.into()),
        };

        let Some(user_id) = verified.param(USER_ID_PARAM) else {
            tracing::debug!("Magic link without user id");
            return Ok(AuthOutcome::fail());
        };

        let Some(user) = self.users.find_by_id(user_id).await? else {
            tracing::debug!("Magic link for unknown user {}", user_id);
            return Ok(AuthOutcome::fail());
        };

        Ok(AuthOutcome::Success {
            user,
            remember_me: true,
        })
    }
}
