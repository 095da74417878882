use std::sync::Arc;

use async_trait::async_trait;
use chrono::Duration;

use crate::signed_link::errors::SignedLinkError;
use crate::storage::SessionDriver;

/// Record of consumed single-use links.
#[async_trait]
pub trait InvalidationSet: Send + Sync + 'static {
    /// Mark `id` as consumed for `ttl`. Returns false if it already was.
    async fn consume(&self, id: &str, ttl: Duration) -> Result<bool, SignedLinkError>;

    async fn contains(&self, id: &str) -> Result<bool, SignedLinkError>;
}

const LINK_KEY_PREFIX: &str = "link-";

/// Invalidation set kept in the session driver next to session records.
///
/// Session records live under 64-char hex keys; link records are prefixed so the
/// two never collide.
pub struct DriverInvalidationSet {
    driver: Arc<dyn SessionDriver>,
}

impl DriverInvalidationSet {
    pub fn new(driver: Arc<dyn SessionDriver>) -> Self {
        Self { driver }
    }

    fn make_key(id: &str) -> String {
        format!("{LINK_KEY_PREFIX}{id}")
    }
}

#[async_trait]
impl InvalidationSet for DriverInvalidationSet {
    async fn consume(&self, id: &str, ttl: Duration) -> Result<bool, SignedLinkError> {
        let stored = self
            .driver
            .write_if_absent(&Self::make_key(id), "1", ttl)
            .await?;
        Ok(stored)
    }

    async fn contains(&self, id: &str) -> Result<bool, SignedLinkError> {
        Ok(self.driver.read(&Self::make_key(id)).await?.is_some())
    }
}
