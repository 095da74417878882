//! Argon2 password hashing in PHC string form.

use std::sync::LazyLock;

use argon2::password_hash::SaltString;
use argon2::{Argon2, PasswordHash, PasswordHasher, PasswordVerifier};

use crate::auth::errors::AuthError;
use crate::utils::random_bytes;

/// Verified against when the login name is unknown, so that branch costs one
/// Argon2 verification like a wrong password does.
static DECOY_HASH: LazyLock<Option<String>> =
    LazyLock::new(|| hash_password("session-shield decoy password").ok());

fn salt() -> Result<SaltString, AuthError> {
    let bytes = random_bytes(16)?;
    SaltString::encode_b64(&bytes).map_err(|e| AuthError::PasswordHash(e.to_string()))
}

/// Hash `password` with a fresh salt and the default Argon2id parameters.
pub fn hash_password(password: &str) -> Result<String, AuthError> {
    Argon2::default()
        .hash_password(password.as_bytes(), &salt()?)
        .map(|hash| hash.to_string())
        .map_err(|e| AuthError::PasswordHash(e.to_string()))
}

/// False for a wrong password and for a malformed PHC string.
pub fn verify_password_hash(password: &str, phc: &str) -> bool {
    PasswordHash::new(phc)
        .ok()
        .as_ref()
        .map(|hash| {
            Argon2::default()
                .verify_password(password.as_bytes(), hash)
                .is_ok()
        })
        .unwrap_or(false)
}

/// Run one verification against a throwaway hash. Always false.
pub fn verify_decoy_password(password: &str) -> bool {
    match DECOY_HASH.as_deref() {
        Some(phc) => {
            verify_password_hash(password, phc);
        }
        None => tracing::warn!("Decoy password hash unavailable"),
    }
    false
}
