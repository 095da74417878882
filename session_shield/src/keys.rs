//! Application key handling and derivation of purpose-bound sub-keys.
//!
//! The signed-link HMAC key and the session encryption key are never the raw
//! application key. Each is `HMAC-SHA256(app_key, label)` with a distinct label.

use std::fmt;
use std::str::FromStr;

use hmac::{Hmac, Mac};
use sha2::Sha256;

use crate::utils::{UtilError, base64url_encode, random_bytes};

type HmacSha256 = Hmac<Sha256>;

const KEY_LEN: usize = 32;
const BASE64_PREFIX: &str = "base64:";

const SIGNED_LINK_LABEL: &[u8] = b"session-shield/signed-link/v1";
const SESSION_ENCRYPTION_LABEL: &[u8] = b"session-shield/session-encryption/v1";

/// A 32-byte application secret.
#[derive(Clone, PartialEq, Eq)]
pub struct AppKey([u8; KEY_LEN]);

impl AppKey {
    pub fn from_bytes(bytes: [u8; KEY_LEN]) -> Self {
        Self(bytes)
    }

    /// Generate a fresh key, formatted the way `APP_KEY` expects it.
    pub fn generate() -> Result<String, UtilError> {
        let bytes = random_bytes(KEY_LEN)?;
        Ok(format!(
            "{BASE64_PREFIX}{}",
            base64::Engine::encode(&base64::engine::general_purpose::STANDARD, bytes)
        ))
    }

    pub(crate) fn signed_link_key(&self) -> Vec<u8> {
        self.derive(SIGNED_LINK_LABEL)
    }

    pub(crate) fn session_encryption_key(&self) -> Vec<u8> {
        self.derive(SESSION_ENCRYPTION_LABEL)
    }

    fn derive(&self, label: &[u8]) -> Vec<u8> {
        let mut mac = <HmacSha256 as Mac>::new_from_slice(&self.0)
            .expect("HMAC can take key of any size");
        mac.update(label);
        mac.finalize().into_bytes().to_vec()
    }

    /// Short, non-reversible identifier for logs.
    pub fn fingerprint(&self) -> String {
        let digest = self.derive(b"fingerprint");
        base64url_encode(&digest[..6])
    }
}

impl fmt::Debug for AppKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "AppKey({})", self.fingerprint())
    }
}

impl FromStr for AppKey {
    type Err = UtilError;

    fn from_str(raw: &str) -> Result<Self, Self::Err> {
        let bytes = match raw.strip_prefix(BASE64_PREFIX) {
            Some(encoded) => {
                base64::Engine::decode(&base64::engine::general_purpose::STANDARD, encoded)
                    .map_err(|_| UtilError::Format("APP_KEY is not valid base64".to_string()))?
            }
            None => raw.as_bytes().to_vec(),
        };

        let key: [u8; KEY_LEN] = bytes
            .try_into()
            .map_err(|_| UtilError::Format(format!("APP_KEY must be {KEY_LEN} bytes")))?;
        Ok(Self(key))
    }
}
