use std::sync::OnceLock;

use argon2::{
    password_hash::{PasswordHash, PasswordHasher, PasswordVerifier, SaltString},
    Argon2,
};
use rand::rngs::OsRng;
use tracing::error;

use crate::users::error::CredentialError;

pub fn hash_password(plain: &str) -> Result<String, CredentialError> {
    let salt = SaltString::generate(&mut OsRng);
    let argon2 = Argon2::default();
    let hash = argon2
        .hash_password(plain.as_bytes(), &salt)
        .map_err(|e| {
            error!(error = %e, "argon2 hash_password error");
            CredentialError::Hashing(e.to_string())
        })?
        .to_string();
    Ok(hash)
}

pub fn verify_password(plain: &str, hash: &str) -> Result<bool, CredentialError> {
    let parsed = PasswordHash::new(hash).map_err(|e| {
        error!(error = %e, "argon2 parse hash error");
        CredentialError::Hashing(e.to_string())
    })?;
    Ok(Argon2::default()
        .verify_password(plain.as_bytes(), &parsed)
        .is_ok())
}

/// Hashes on the blocking pool so request tasks keep running.
pub async fn hash_password_async(plain: String) -> Result<String, CredentialError> {
    tokio::task::spawn_blocking(move || hash_password(&plain))
        .await
        .map_err(|e| CredentialError::Hashing(format!("hash task failed: {e}")))?
}

/// Compares on the blocking pool; same cost as [`hash_password_async`].
pub async fn verify_password_async(plain: String, hash: String) -> Result<bool, CredentialError> {
    tokio::task::spawn_blocking(move || verify_password(&plain, &hash))
        .await
        .map_err(|e| CredentialError::Hashing(format!("verify task failed: {e}")))?
}

pub(crate) static DUMMY: OnceLock<String> = OnceLock::new();

/// Hash compared against when the username is unknown, so that path costs
/// as much as a real mismatch.
pub fn dummy_hash() -> &'static str {
    DUMMY.get_or_init(|| {
        hash_password("dummy-password-for-unknown-users").unwrap_or_else(|e| {
            error!(error = %e, "dummy hash generation failed");
            String::new()
        })
    })
}

/// Runs a throwaway comparison against [`dummy_hash`] on the blocking pool.
pub async fn verify_dummy_async(plain: String) {
    let res = tokio::task::spawn_blocking(move || verify_password(&plain, dummy_hash())).await;
    if let Ok(Err(e)) = res {
        tracing::debug!(error = %e, "dummy comparison failed");
    }
}
