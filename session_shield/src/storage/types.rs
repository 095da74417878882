use std::fmt;
use std::str::FromStr;

use async_trait::async_trait;
use chrono::{DateTime, Duration, Utc};

use crate::storage::errors::StorageError;

/// Raw persistence for opaque session blobs.
///
/// Drivers know nothing about what a blob means. Keys are chosen by the caller and
/// are always URL-safe (`[A-Za-z0-9_-]`).
#[async_trait]
pub trait SessionDriver: Send + Sync + 'static {
    /// Read a blob. Entries past their TTL read as absent.
    async fn read(&self, id: &str) -> Result<Option<String>, StorageError>;

    /// Write a blob, replacing any previous value, and refresh its activity stamp.
    async fn write(&self, id: &str, payload: &str, ttl: Duration) -> Result<(), StorageError>;

    /// Write a blob only if no live entry exists under `id`.
    /// Returns true if the blob was stored.
    ///
    /// The default is a read followed by a write and is not atomic; drivers with a
    /// native check-and-set override it.
    async fn write_if_absent(
        &self,
        id: &str,
        payload: &str,
        ttl: Duration,
    ) -> Result<bool, StorageError> {
        if self.read(id).await?.is_some() {
            return Ok(false);
        }
        self.write(id, payload, ttl).await?;
        Ok(true)
    }

    /// Remove a blob. Removing a missing entry is not an error.
    async fn destroy(&self, id: &str) -> Result<(), StorageError>;

    /// Remove entries that expired or saw no write for `max_lifetime`.
    /// Returns the number of removed entries when the backend can tell.
    async fn gc(&self, max_lifetime: Duration) -> Result<u64, StorageError>;
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum DriverKind {
    #[default]
    Memory,
    File,
    Sqlite,
    Postgres,
    Redis,
}

impl DriverKind {
    pub(crate) fn needs_url(&self) -> bool {
        !matches!(self, Self::Memory)
    }
}

impl fmt::Display for DriverKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Self::Memory => "memory",
            Self::File => "file",
            Self::Sqlite => "sqlite",
            Self::Postgres => "postgres",
            Self::Redis => "redis",
        };
        f.write_str(name)
    }
}

impl FromStr for DriverKind {
    type Err = StorageError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "memory" | "array" => Ok(Self::Memory),
            "file" => Ok(Self::File),
            "sqlite" => Ok(Self::Sqlite),
            "postgres" | "postgresql" => Ok(Self::Postgres),
            "redis" => Ok(Self::Redis),
            other => Err(StorageError::InvalidInput(format!(
                "Unsupported session driver: {other}"
            ))),
        }
    }
}

/// `now + ttl`, saturating at the latest representable instant.
pub(crate) fn expiry_after(now: DateTime<Utc>, ttl: Duration) -> DateTime<Utc> {
    now.checked_add_signed(ttl)
        .unwrap_or(DateTime::<Utc>::MAX_UTC)
}

/// `now - max_lifetime`, saturating at the earliest representable instant.
pub(crate) fn idle_cutoff(now: DateTime<Utc>, max_lifetime: Duration) -> DateTime<Utc> {
    now.checked_sub_signed(max_lifetime)
        .unwrap_or(DateTime::<Utc>::MIN_UTC)
}

pub(crate) fn validate_key(id: &str) -> Result<(), StorageError> {
    if id.is_empty()
        || !id
            .chars()
            .all(|c| c.is_ascii_alphanumeric() || c == '-' || c == '_')
    {
        return Err(StorageError::InvalidInput(
            "Storage key contains unsupported characters".to_string(),
        ));
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_driver_kind_parse() {
        assert_eq!("memory".parse::<DriverKind>().unwrap(), DriverKind::Memory);
        assert_eq!("array".parse::<DriverKind>().unwrap(), DriverKind::Memory);
        assert_eq!("SQLite".parse::<DriverKind>().unwrap(), DriverKind::Sqlite);
        assert_eq!(
            "postgresql".parse::<DriverKind>().unwrap(),
            DriverKind::Postgres
        );
        assert!("mongodb".parse::<DriverKind>().is_err());
    }

    #[test]
    fn test_driver_kind_display_roundtrip() {
        for kind in [
            DriverKind::Memory,
            DriverKind::File,
            DriverKind::Sqlite,
            DriverKind::Postgres,
            DriverKind::Redis,
        ] {
            assert_eq!(kind.to_string().parse::<DriverKind>().unwrap(), kind);
        }
    }

    #[test]
    fn test_validate_key() {
        assert!(validate_key("abcDEF012-_").is_ok());
        assert!(validate_key("").is_err());
        assert!(validate_key("../etc/passwd").is_err());
        assert!(validate_key("a b").is_err());
        assert!(validate_key("a.b").is_err());
    }
}
