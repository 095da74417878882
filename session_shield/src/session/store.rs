use std::sync::Arc;

use chrono::{DateTime, Duration, Utc};
use serde::Serialize;
use serde::de::DeserializeOwned;
use serde_json::{Map, Value};

use crate::clock::Clock;
use crate::config::MAX_DURATION_SEC;
use crate::session::encryption::SessionCipher;
use crate::session::errors::SessionError;
use crate::session::types::{SessionId, SessionRecord};
use crate::storage::SessionDriver;

const INTENDED_URL_KEY: &str = "url.intended";
const FLASH_KEY: &str = "_flash";
const FLASH_CURRENT: &str = "current";
const FLASH_NEXT: &str = "next";

/// Everything a store needs to reach persistence. Cheap to clone.
#[derive(Clone)]
pub(crate) struct SessionBackend {
    pub(crate) driver: Arc<dyn SessionDriver>,
    pub(crate) cipher: Option<Arc<SessionCipher>>,
    pub(crate) clock: Arc<dyn Clock>,
    pub(crate) lifetime: Duration,
    pub(crate) remember_lifetime: Duration,
}

impl SessionBackend {
    fn encode(&self, record: &SessionRecord) -> Result<String, SessionError> {
        let json = serde_json::to_string(record)?;
        match &self.cipher {
            Some(cipher) => cipher.seal(&json),
            None => Ok(json),
        }
    }

    fn decode(&self, blob: &str) -> Result<SessionRecord, SessionError> {
        let json = match &self.cipher {
            Some(cipher) => cipher.open(blob)?,
            None => blob.to_string(),
        };
        serde_json::from_str(&json).map_err(|e| SessionError::Corrupted(e.to_string()))
    }

    /// Absolute lifetime of a record, counted from its creation.
    pub(crate) fn lifetime_of(&self, record: &SessionRecord) -> Duration {
        if record.remember {
            self.remember_lifetime
        } else {
            self.lifetime
        }
    }
}

/// One session's live state for the duration of a request.
///
/// A store only exists once started, so its data is never visible before the
/// backing blob has been loaded.
pub struct SessionStore {
    id: SessionId,
    record: SessionRecord,
    backend: SessionBackend,
    dirty: bool,
    loaded: bool,
}

impl SessionStore {
    /// Load the record stored under `id`, or start empty if it is absent or corrupt.
    pub(crate) async fn start(backend: SessionBackend, id: SessionId) -> Result<Self, SessionError> {
        let now = backend.clock.now();
        let blob = backend.driver.read(&id.storage_key()).await?;

        let (record, loaded) = match blob {
            Some(blob) => match backend.decode(&blob) {
                Ok(record) => (record, true),
                Err(e) => {
                    tracing::warn!("Discarding unreadable session payload: {}", e);
                    (SessionRecord::new(now), false)
                }
            },
            None => (SessionRecord::new(now), false),
        };

        Ok(Self {
            id,
            record,
            backend,
            // A new session must be written once so its id becomes known to the driver.
            dirty: !loaded,
            loaded,
        })
    }

    /// Whether the record was found in the driver when the store started.
    pub fn was_loaded(&self) -> bool {
        self.loaded
    }

    pub fn id(&self) -> &SessionId {
        &self.id
    }

    pub fn is_dirty(&self) -> bool {
        self.dirty
    }

    pub fn created_at(&self) -> DateTime<Utc> {
        self.record.created_at
    }

    pub fn last_activity(&self) -> DateTime<Utc> {
        self.record.last_activity
    }

    pub fn rotated_at(&self) -> DateTime<Utc> {
        self.record.rotated_at
    }

    /// Absolute expiry of the session.
    pub fn expires_at(&self) -> DateTime<Utc> {
        self.record
            .created_at
            .checked_add_signed(self.backend.lifetime_of(&self.record))
            .unwrap_or(DateTime::<Utc>::MAX_UTC)
    }

    pub fn get<T: DeserializeOwned>(&self, key: &str) -> Option<T> {
        self.record
            .data
            .get(key)
            .and_then(|v| serde_json::from_value(v.clone()).ok())
    }

    pub fn get_or<T: DeserializeOwned>(&self, key: &str, default: T) -> T {
        self.get(key).unwrap_or(default)
    }

    pub fn get_value(&self, key: &str) -> Option<&Value> {
        self.record.data.get(key)
    }

    pub fn has(&self, key: &str) -> bool {
        self.record.data.contains_key(key)
    }

    pub fn put<T: Serialize>(&mut self, key: &str, value: T) -> Result<(), SessionError> {
        let value = serde_json::to_value(value)?;
        self.record.data.insert(key.to_string(), value);
        self.dirty = true;
        Ok(())
    }

    pub fn forget(&mut self, key: &str) {
        if self.record.data.remove(key).is_some() {
            self.dirty = true;
        }
    }

    /// Get a value and remove it.
    pub fn pull<T: DeserializeOwned>(&mut self, key: &str) -> Option<T> {
        let value = self.get(key);
        self.forget(key);
        value
    }

    /// Remove every data entry. Identity fields are kept.
    pub fn flush(&mut self) {
        if !self.record.data.is_empty() {
            self.record.data.clear();
            self.dirty = true;
        }
    }

    pub fn user_id(&self) -> Option<&str> {
        self.record.user_id.as_deref()
    }

    pub fn set_user_id(&mut self, user_id: Option<String>) {
        self.record.user_id = user_id;
        self.dirty = true;
    }

    pub fn is_authenticated(&self) -> bool {
        self.record.user_id.is_some()
    }

    pub fn has_remember_me_token(&self) -> bool {
        self.record.remember
    }

    /// Count the absolute lifetime from now. Used on privilege changes.
    pub(crate) fn restart_lifetime(&mut self) {
        let now = self.backend.clock.now();
        self.record.created_at = now;
        self.record.rotated_at = now;
        self.dirty = true;
    }

    pub(crate) fn set_remember(&mut self, remember: bool) {
        self.record.remember = remember;
        self.dirty = true;
    }

    pub fn set_intended_url(&mut self, url: &str) -> Result<(), SessionError> {
        self.put(INTENDED_URL_KEY, url)
    }

    pub fn intended_url(&self) -> Option<String> {
        self.get(INTENDED_URL_KEY)
    }

    pub fn take_intended_url(&mut self) -> Option<String> {
        self.pull(INTENDED_URL_KEY)
    }

    /// Store a value readable during the next request only.
    pub fn flash<T: Serialize>(&mut self, key: &str, value: T) -> Result<(), SessionError> {
        let value = serde_json::to_value(value)?;
        let mut flash = self.flash_bag();
        flash
            .entry(FLASH_NEXT)
            .or_insert_with(|| Value::Object(Map::new()));
        if let Some(Value::Object(next)) = flash.get_mut(FLASH_NEXT) {
            next.insert(key.to_string(), value);
        }
        self.record
            .data
            .insert(FLASH_KEY.to_string(), Value::Object(flash));
        self.dirty = true;
        Ok(())
    }

    /// A value flashed by the previous request.
    pub fn flashed<T: DeserializeOwned>(&self, key: &str) -> Option<T> {
        self.record
            .data
            .get(FLASH_KEY)
            .and_then(|flash| flash.get(FLASH_CURRENT))
            .and_then(|current| current.get(key))
            .and_then(|v| serde_json::from_value(v.clone()).ok())
    }

    /// Promote values flashed last request and drop the ones already shown.
    pub(crate) fn age_flash(&mut self) {
        let mut flash = self.flash_bag();
        if flash.is_empty() {
            return;
        }
        flash.remove(FLASH_CURRENT);
        if let Some(next) = flash.remove(FLASH_NEXT) {
            flash.insert(FLASH_CURRENT.to_string(), next);
        }
        if flash.is_empty() {
            self.record.data.remove(FLASH_KEY);
        } else {
            self.record
                .data
                .insert(FLASH_KEY.to_string(), Value::Object(flash));
        }
        self.dirty = true;
    }

    fn flash_bag(&self) -> Map<String, Value> {
        match self.record.data.get(FLASH_KEY) {
            Some(Value::Object(map)) => map.clone(),
            _ => Map::new(),
        }
    }

    /// Persist the record if anything changed. Returns whether a write happened.
    pub async fn save(&mut self) -> Result<bool, SessionError> {
        if !self.dirty {
            return Ok(false);
        }
        self.write().await?;
        self.dirty = false;
        Ok(true)
    }

    async fn write(&mut self) -> Result<(), SessionError> {
        let now = self.backend.clock.now();
        self.record.last_activity = now;

        // The driver keeps the entry until the session's absolute expiry.
        let ttl = (self.expires_at() - now)
            .clamp(Duration::seconds(1), Duration::seconds(MAX_DURATION_SEC));
        let blob = self.backend.encode(&self.record)?;
        self.backend
            .driver
            .write(&self.id.storage_key(), &blob, ttl)
            .await?;
        Ok(())
    }

    /// Move the data to a fresh id.
    ///
    /// The record is written under the new id before the old entry is destroyed,
    /// so at every point one of the two ids resolves.
    #[tracing::instrument(skip(self))]
    pub async fn regenerate_id(&mut self) -> Result<(), SessionError> {
        let old = std::mem::replace(&mut self.id, SessionId::generate()?);
        self.record.rotated_at = self.backend.clock.now();

        self.write().await?;
        self.dirty = false;
        self.loaded = true;
        self.backend.driver.destroy(&old.storage_key()).await?;

        tracing::debug!("Session id regenerated");
        Ok(())
    }

    /// Drop all data and identity, then move to a fresh id.
    pub async fn invalidate(&mut self) -> Result<(), SessionError> {
        let now = self.backend.clock.now();
        self.record = SessionRecord::new(now);
        self.regenerate_id().await
    }

    /// Remove the backing entry. The store is consumed; its id is never used again.
    pub async fn destroy(self) -> Result<(), SessionError> {
        self.backend.driver.destroy(&self.id.storage_key()).await?;
        Ok(())
    }

    #[cfg(test)]
    pub(crate) fn record(&self) -> &SessionRecord {
        &self.record
    }

    #[cfg(test)]
    pub(crate) fn lifetime(&self) -> Duration {
        self.backend.lifetime_of(&self.record)
    }
}

impl std::fmt::Debug for SessionStore {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SessionStore")
            .field("id", &self.id)
            .field("user_id", &self.record.user_id)
            .field("dirty", &self.dirty)
            .finish()
    }
}
