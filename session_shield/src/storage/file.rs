//! File-based session storage.
//!
//! Each entry is a JSON envelope stored as `{id}.json` in the configured directory.

use std::path::{Path, PathBuf};
use std::sync::Arc;

use async_trait::async_trait;
use chrono::{DateTime, Duration, Utc};
use serde::{Deserialize, Serialize};
use tokio::io::AsyncWriteExt;

use crate::clock::Clock;
use crate::storage::errors::StorageError;
use crate::storage::types::{SessionDriver, expiry_after, idle_cutoff, validate_key};

#[derive(Debug, Serialize, Deserialize)]
struct FileEnvelope {
    payload: String,
    last_activity: DateTime<Utc>,
    expires_at: DateTime<Utc>,
}

pub struct FileSessionDriver {
    directory: PathBuf,
    clock: Arc<dyn Clock>,
}

impl FileSessionDriver {
    /// Create the driver, creating the directory if it does not exist.
    pub async fn new(
        directory: impl Into<PathBuf>,
        clock: Arc<dyn Clock>,
    ) -> Result<Self, StorageError> {
        let directory = directory.into();
        tokio::fs::create_dir_all(&directory).await.map_err(|e| {
            StorageError::Storage(format!("Failed to create session directory: {e}"))
        })?;
        tracing::info!("Using file session driver at {}", directory.display());
        Ok(Self { directory, clock })
    }

    fn entry_path(&self, id: &str) -> Result<PathBuf, StorageError> {
        validate_key(id)?;
        Ok(self.directory.join(format!("{id}.json")))
    }

    fn envelope(&self, payload: &str, ttl: Duration) -> FileEnvelope {
        let now = self.clock.now();
        FileEnvelope {
            payload: payload.to_string(),
            last_activity: now,
            expires_at: expiry_after(now, ttl),
        }
    }

    async fn read_envelope(path: &Path) -> Result<Option<FileEnvelope>, StorageError> {
        match tokio::fs::read_to_string(path).await {
            Ok(content) => match serde_json::from_str(&content) {
                Ok(envelope) => Ok(Some(envelope)),
                Err(e) => {
                    tracing::warn!("Unreadable session file {}: {}", path.display(), e);
                    Ok(None)
                }
            },
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(None),
            Err(e) => Err(e.into()),
        }
    }
}

#[async_trait]
impl SessionDriver for FileSessionDriver {
    async fn read(&self, id: &str) -> Result<Option<String>, StorageError> {
        let path = self.entry_path(id)?;
        let now = self.clock.now();
        Ok(Self::read_envelope(&path)
            .await?
            .filter(|envelope| envelope.expires_at > now)
            .map(|envelope| envelope.payload))
    }

    async fn write(&self, id: &str, payload: &str, ttl: Duration) -> Result<(), StorageError> {
        let path = self.entry_path(id)?;
        let content = serde_json::to_string(&self.envelope(payload, ttl))?;

        // Write-then-rename so a reader never sees a half-written file.
        let tmp = self.directory.join(format!("{id}.json.tmp"));
        tokio::fs::write(&tmp, content).await?;
        tokio::fs::rename(&tmp, &path).await?;
        Ok(())
    }

    async fn write_if_absent(
        &self,
        id: &str,
        payload: &str,
        ttl: Duration,
    ) -> Result<bool, StorageError> {
        let path = self.entry_path(id)?;

        // Stale entries do not block the slot.
        if let Some(existing) = Self::read_envelope(&path).await? {
            if existing.expires_at > self.clock.now() {
                return Ok(false);
            }
            tokio::fs::remove_file(&path).await.ok();
        }

        let content = serde_json::to_string(&self.envelope(payload, ttl))?;
        let file = tokio::fs::OpenOptions::new()
            .write(true)
            .create_new(true)
            .open(&path)
            .await;

        match file {
            Ok(mut file) => {
                file.write_all(content.as_bytes()).await?;
                file.flush().await?;
                Ok(true)
            }
            Err(e) if e.kind() == std::io::ErrorKind::AlreadyExists => Ok(false),
            Err(e) => Err(e.into()),
        }
    }

    async fn destroy(&self, id: &str) -> Result<(), StorageError> {
        let path = self.entry_path(id)?;
        match tokio::fs::remove_file(&path).await {
            Ok(()) => Ok(()),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(()),
            Err(e) => Err(e.into()),
        }
    }

    async fn gc(&self, max_lifetime: Duration) -> Result<u64, StorageError> {
        let now = self.clock.now();
        let cutoff = idle_cutoff(now, max_lifetime);
        let mut pruned = 0u64;

        let mut entries = tokio::fs::read_dir(&self.directory).await?;
        while let Some(entry) = entries.next_entry().await? {
            let path = entry.path();
            if path.extension().is_none_or(|ext| ext != "json") {
                continue;
            }
            let stale = match Self::read_envelope(&path).await? {
                Some(envelope) => envelope.expires_at <= now || envelope.last_activity <= cutoff,
                None => true,
            };
            if stale && tokio::fs::remove_file(&path).await.is_ok() {
                pruned += 1;
            }
        }

        Ok(pruned)
    }
}
