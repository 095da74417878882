use async_trait::async_trait;
use chrono::Duration;
use redis::{AsyncCommands, ExistenceCheck, SetExpiry, SetOptions};

use crate::storage::errors::StorageError;
use crate::storage::types::{SessionDriver, validate_key};

const SESSION_PREFIX: &str = "session_shield";

/// Redis-backed driver. Expiry is delegated to Redis key TTLs.
pub struct RedisSessionDriver {
    client: redis::Client,
}

impl RedisSessionDriver {
    pub async fn new(url: &str) -> Result<Self, StorageError> {
        let client = redis::Client::open(url)?;
        // Verify the connection works
        let _conn = client.get_multiplexed_async_connection().await?;
        tracing::info!("Using redis session driver");
        Ok(Self { client })
    }

    fn make_key(id: &str) -> Result<String, StorageError> {
        validate_key(id)?;
        Ok(format!("{SESSION_PREFIX}:{id}"))
    }
}

/// Redis rejects a zero expiry, so the shortest TTL is one second.
fn ttl_secs(ttl: Duration) -> u64 {
    ttl.num_seconds().max(1) as u64
}

#[async_trait]
impl SessionDriver for RedisSessionDriver {
    async fn read(&self, id: &str) -> Result<Option<String>, StorageError> {
        let key = Self::make_key(id)?;
        let mut conn = self.client.get_multiplexed_async_connection().await?;
        let value: Option<String> = conn.get(&key).await?;
        Ok(value)
    }

    async fn write(&self, id: &str, payload: &str, ttl: Duration) -> Result<(), StorageError> {
        let key = Self::make_key(id)?;
        let mut conn = self.client.get_multiplexed_async_connection().await?;
        let _: () = conn.set_ex(&key, payload, ttl_secs(ttl)).await?;
        Ok(())
    }

    async fn write_if_absent(
        &self,
        id: &str,
        payload: &str,
        ttl: Duration,
    ) -> Result<bool, StorageError> {
        let key = Self::make_key(id)?;
        let mut conn = self.client.get_multiplexed_async_connection().await?;
        let options = SetOptions::default()
            .conditional_set(ExistenceCheck::NX)
            .with_expiration(SetExpiry::EX(ttl_secs(ttl)));
        let stored: Option<String> = conn.set_options(&key, payload, options).await?;
        Ok(stored.is_some())
    }

    async fn destroy(&self, id: &str) -> Result<(), StorageError> {
        let key = Self::make_key(id)?;
        let mut conn = self.client.get_multiplexed_async_connection().await?;
        let _: () = conn.del(&key).await?;
        Ok(())
    }

    async fn gc(&self, _max_lifetime: Duration) -> Result<u64, StorageError> {
        // Keys carry their own TTL.
        Ok(0)
    }
}
