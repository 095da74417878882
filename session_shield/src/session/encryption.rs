//! AES-256-GCM sealing of session payloads at rest.

use ring::aead::{AES_256_GCM, Aad, LessSafeKey, NONCE_LEN, Nonce, UnboundKey};

use crate::keys::AppKey;
use crate::session::errors::SessionError;
use crate::utils::{base64url_decode, base64url_encode, random_bytes};

pub(crate) struct SessionCipher {
    key: LessSafeKey,
}

impl SessionCipher {
    pub(crate) fn new(app_key: &AppKey) -> Result<Self, SessionError> {
        let unbound = UnboundKey::new(&AES_256_GCM, &app_key.session_encryption_key())
            .map_err(|_| SessionError::Crypto("Invalid session encryption key".to_string()))?;
        Ok(Self {
            key: LessSafeKey::new(unbound),
        })
    }

    /// Returns `base64url(nonce || ciphertext || tag)`.
    pub(crate) fn seal(&self, plaintext: &str) -> Result<String, SessionError> {
        let nonce_bytes = random_bytes(NONCE_LEN)?;
        let nonce = Nonce::try_assume_unique_for_key(&nonce_bytes)
            .map_err(|_| SessionError::Crypto("Invalid nonce".to_string()))?;

        let mut in_out = plaintext.as_bytes().to_vec();
        self.key
            .seal_in_place_append_tag(nonce, Aad::empty(), &mut in_out)
            .map_err(|_| SessionError::Crypto("Failed to seal session".to_string()))?;

        let mut sealed = nonce_bytes;
        sealed.extend_from_slice(&in_out);
        Ok(base64url_encode(&sealed))
    }

    pub(crate) fn open(&self, sealed: &str) -> Result<String, SessionError> {
        let mut bytes = base64url_decode(sealed)
            .map_err(|_| SessionError::Corrupted("Sealed payload is not base64url".to_string()))?;
        if bytes.len() < NONCE_LEN {
            return Err(SessionError::Corrupted("Sealed payload too short".to_string()));
        }

        let mut in_out = bytes.split_off(NONCE_LEN);
        let nonce = Nonce::try_assume_unique_for_key(&bytes)
            .map_err(|_| SessionError::Corrupted("Invalid nonce".to_string()))?;
        let plaintext = self
            .key
            .open_in_place(nonce, Aad::empty(), &mut in_out)
            .map_err(|_| SessionError::Corrupted("Failed to open sealed payload".to_string()))?;

        String::from_utf8(plaintext.to_vec())
            .map_err(|_| SessionError::Corrupted("Payload is not UTF-8".to_string()))
    }
}
