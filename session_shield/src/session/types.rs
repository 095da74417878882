use std::fmt;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

use crate::utils::{UtilError, gen_random_string, sha256_hex};

/// Bytes of entropy in a session id.
const SESSION_ID_BYTES: usize = 32;
/// Length of a base64url-encoded id without padding.
const SESSION_ID_LEN: usize = 43;

/// Opaque session identifier carried in the session cookie.
#[derive(Clone, PartialEq, Eq, Hash)]
pub struct SessionId(String);

impl SessionId {
    pub fn generate() -> Result<Self, UtilError> {
        Ok(Self(gen_random_string(SESSION_ID_BYTES)?))
    }

    /// Accept a candidate id only if it has the exact shape of a generated one.
    pub fn parse(candidate: &str) -> Option<Self> {
        let well_formed = candidate.len() == SESSION_ID_LEN
            && candidate
                .chars()
                .all(|c| c.is_ascii_alphanumeric() || c == '-' || c == '_');
        well_formed.then(|| Self(candidate.to_string()))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// Key under which the record is stored. Drivers never see the raw id.
    pub(crate) fn storage_key(&self) -> String {
        sha256_hex(&self.0)
    }
}

impl fmt::Debug for SessionId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "SessionId({}…)", &self.0[..6.min(self.0.len())])
    }
}

impl fmt::Display for SessionId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// Serialized form of one session.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub(crate) struct SessionRecord {
    pub(crate) data: Map<String, Value>,
    pub(crate) created_at: DateTime<Utc>,
    pub(crate) last_activity: DateTime<Utc>,
    pub(crate) rotated_at: DateTime<Utc>,
    #[serde(default)]
    pub(crate) user_id: Option<String>,
    #[serde(default)]
    pub(crate) remember: bool,
}

impl SessionRecord {
    pub(crate) fn new(now: DateTime<Utc>) -> Self {
        Self {
            data: Map::new(),
            created_at: now,
            last_activity: now,
            rotated_at: now,
            user_id: None,
            remember: false,
        }
    }
}
