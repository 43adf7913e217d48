//! Password digests (Argon2id, PHC string format).

use argon2::{
    Argon2, PasswordHash, PasswordHasher, PasswordVerifier,
    password_hash::{Error as HashError, SaltString},
};
use thiserror::Error;

#[derive(Debug, Error)]
pub enum PasswordError {
    #[error("random source unavailable: {0}")]
    Rng(getrandom::Error),
    #[error("password hashing failed: {0}")]
    Hash(HashError),
    #[error("password worker failed: {0}")]
    Worker(#[from] tokio::task::JoinError),
}

impl From<HashError> for PasswordError {
    fn from(e: HashError) -> Self {
        Self::Hash(e)
    }
}

pub fn hash_password(plaintext: &str) -> Result<String, PasswordError> {
    let mut salt = [0u8; 16];
    getrandom::fill(&mut salt).map_err(PasswordError::Rng)?;
    let salt = SaltString::encode_b64(&salt)?;

    let hash = Argon2::default().hash_password(plaintext.as_bytes(), &salt)?;
    Ok(hash.to_string())
}

/// `Ok(false)` on mismatch; `Err` only when the stored digest is unusable.
pub fn verify_password(plaintext: &str, phc: &str) -> Result<bool, PasswordError> {
    let parsed = PasswordHash::new(phc)?;

    match Argon2::default().verify_password(plaintext.as_bytes(), &parsed) {
        Ok(()) => Ok(true),
        Err(HashError::Password) => Ok(false),
        Err(e) => Err(e.into()),
    }
}

/// `hash_password` on the blocking pool; Argon2 is too slow for a runtime worker.
pub async fn hash_password_off_runtime(plaintext: String) -> Result<String, PasswordError> {
    tokio::task::spawn_blocking(move || hash_password(&plaintext)).await?
}

pub async fn verify_password_off_runtime(
    plaintext: String,
    phc: String,
) -> Result<bool, PasswordError> {
    tokio::task::spawn_blocking(move || verify_password(&plaintext, &phc)).await?
}
