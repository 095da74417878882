use std::collections::HashMap;
use std::sync::Arc;

use async_trait::async_trait;
use chrono::{DateTime, Duration, Utc};
use tokio::sync::Mutex;

use crate::clock::Clock;
use crate::storage::errors::StorageError;
use crate::storage::types::{SessionDriver, expiry_after, idle_cutoff, validate_key};

#[derive(Debug, Clone)]
struct MemoryEntry {
    payload: String,
    last_activity: DateTime<Utc>,
    expires_at: DateTime<Utc>,
}

/// Process-local driver. Data does not survive a restart.
pub struct MemorySessionDriver {
    entries: Mutex<HashMap<String, MemoryEntry>>,
    clock: Arc<dyn Clock>,
}

impl MemorySessionDriver {
    pub fn new(clock: Arc<dyn Clock>) -> Self {
        tracing::info!("Creating new in-memory session driver");
        Self {
            entries: Mutex::new(HashMap::new()),
            clock,
        }
    }

    pub async fn len(&self) -> usize {
        self.entries.lock().await.len()
    }

    pub async fn is_empty(&self) -> bool {
        self.entries.lock().await.is_empty()
    }

    fn entry(&self, payload: &str, ttl: Duration) -> MemoryEntry {
        let now = self.clock.now();
        MemoryEntry {
            payload: payload.to_string(),
            last_activity: now,
            expires_at: expiry_after(now, ttl),
        }
    }
}

#[async_trait]
impl SessionDriver for MemorySessionDriver {
    async fn read(&self, id: &str) -> Result<Option<String>, StorageError> {
        validate_key(id)?;
        let now = self.clock.now();
        let entries = self.entries.lock().await;
        Ok(entries
            .get(id)
            .filter(|entry| entry.expires_at > now)
            .map(|entry| entry.payload.clone()))
    }

    async fn write(&self, id: &str, payload: &str, ttl: Duration) -> Result<(), StorageError> {
        validate_key(id)?;
        let entry = self.entry(payload, ttl);
        self.entries.lock().await.insert(id.to_string(), entry);
        Ok(())
    }

    async fn write_if_absent(
        &self,
        id: &str,
        payload: &str,
        ttl: Duration,
    ) -> Result<bool, StorageError> {
        validate_key(id)?;
        let now = self.clock.now();
        let mut entries = self.entries.lock().await;
        if entries.get(id).is_some_and(|entry| entry.expires_at > now) {
            return Ok(false);
        }
        entries.insert(id.to_string(), self.entry(payload, ttl));
        Ok(true)
    }

    async fn destroy(&self, id: &str) -> Result<(), StorageError> {
        validate_key(id)?;
        self.entries.lock().await.remove(id);
        Ok(())
    }

    async fn gc(&self, max_lifetime: Duration) -> Result<u64, StorageError> {
        let now = self.clock.now();
        let cutoff = idle_cutoff(now, max_lifetime);
        let mut entries = self.entries.lock().await;
        let before = entries.len();
        entries.retain(|_, entry| entry.expires_at > now && entry.last_activity > cutoff);
        Ok((before - entries.len()) as u64)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::clock::MockClock;

    fn driver() -> (Arc<MockClock>, MemorySessionDriver) {
        let clock = Arc::new(MockClock::new(Utc::now()));
        let driver = MemorySessionDriver::new(clock.clone());
        (clock, driver)
    }

    #[tokio::test]
    async fn test_write_and_read() {
        let (_, driver) = driver();
        driver
            .write("key1", "payload", Duration::hours(1))
            .await
            .unwrap();

        assert_eq!(
            driver.read("key1").await.unwrap().as_deref(),
            Some("payload")
        );
        assert_eq!(driver.read("missing").await.unwrap(), None);
    }

    #[tokio::test]
    async fn test_overwrite_existing_key() {
        let (_, driver) = driver();
        driver.write("key1", "old", Duration::hours(1)).await.unwrap();
        driver.write("key1", "new", Duration::hours(1)).await.unwrap();
        assert_eq!(driver.read("key1").await.unwrap().as_deref(), Some("new"));
        assert_eq!(driver.len().await, 1);
    }

    #[tokio::test]
    async fn test_expired_entries_read_as_absent() {
        let (clock, driver) = driver();
        driver
            .write("key1", "payload", Duration::seconds(10))
            .await
            .unwrap();

        clock.advance(Duration::seconds(10));
        assert_eq!(driver.read("key1").await.unwrap(), None);
    }

    #[tokio::test]
    async fn test_destroy() {
        let (_, driver) = driver();
        driver.write("key1", "payload", Duration::hours(1)).await.unwrap();
        driver.destroy("key1").await.unwrap();
        assert_eq!(driver.read("key1").await.unwrap(), None);

        // Removing a missing key is fine
        assert!(driver.destroy("key1").await.is_ok());
    }

    #[tokio::test]
    async fn test_write_if_absent() {
        let (clock, driver) = driver();
        assert!(
            driver
                .write_if_absent("once", "1", Duration::seconds(5))
                .await
                .unwrap()
        );
        assert!(
            !driver
                .write_if_absent("once", "2", Duration::seconds(5))
                .await
                .unwrap()
        );
        assert_eq!(driver.read("once").await.unwrap().as_deref(), Some("1"));

        // An expired entry no longer blocks the slot
        clock.advance(Duration::seconds(6));
        assert!(
            driver
                .write_if_absent("once", "3", Duration::seconds(5))
                .await
                .unwrap()
        );
    }

    #[tokio::test]
    async fn test_gc_removes_idle_and_expired_entries() {
        let (clock, driver) = driver();
        driver.write("idle", "a", Duration::days(1)).await.unwrap();
        driver.write("short", "b", Duration::seconds(30)).await.unwrap();

        clock.advance(Duration::minutes(30));
        driver.write("fresh", "c", Duration::days(1)).await.unwrap();

        clock.advance(Duration::minutes(31));
        let removed = driver.gc(Duration::hours(1)).await.unwrap();

        assert_eq!(removed, 2);
        assert_eq!(driver.read("fresh").await.unwrap().as_deref(), Some("c"));
        assert_eq!(driver.len().await, 1);
    }

    #[tokio::test]
    async fn test_rejects_unsafe_keys() {
        let (_, driver) = driver();
        let result = driver.write("../evil", "x", Duration::hours(1)).await;
        assert!(matches!(result, Err(StorageError::InvalidInput(_))));
    }
}
