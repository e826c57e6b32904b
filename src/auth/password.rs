//! Password hashing and verification.
//!
//! Argon2 is CPU-bound; request handlers go through [`hash_blocking`] and
//! [`verify_blocking`], which run on tokio's blocking pool.

use argon2::{
    password_hash::{rand_core::OsRng, PasswordHash, PasswordHasher, PasswordVerifier, SaltString},
    Argon2,
};

use crate::error::Error;

/// Hash a password with a fresh random salt. The result is a PHC string carrying its own
/// parameters and salt.
pub fn hash(plaintext: &str) -> Result<String, Error> {
    let salt = SaltString::generate(&mut OsRng);
    Argon2::default()
        .hash_password(plaintext.as_bytes(), &salt)
        .map(|hash| hash.to_string())
        .map_err(|e| Error::Internal {
            operation: format!("hash password: {e}"),
        })
}

/// Check a password against a stored hash. A stored hash that does not parse counts as a
/// mismatch.
pub fn verify(plaintext: &str, stored_hash: &str) -> bool {
    let parsed = match PasswordHash::new(stored_hash) {
        Ok(h) => h,
        Err(e) => {
            tracing::warn!("stored password hash is malformed: {}", e);
            return false;
        }
    };

    Argon2::default()
        .verify_password(plaintext.as_bytes(), &parsed)
        .is_ok()
}

pub async fn hash_blocking(plaintext: String) -> Result<String, Error> {
    tokio::task::spawn_blocking(move || hash(&plaintext))
        .await
        .map_err(|e| Error::Internal {
            operation: format!("join password hashing task: {e}"),
        })?
}

pub async fn verify_blocking(plaintext: String, stored_hash: String) -> Result<bool, Error> {
    tokio::task::spawn_blocking(move || verify(&plaintext, &stored_hash))
        .await
        .map_err(|e| Error::Internal {
            operation: format!("join password verification task: {e}"),
        })
}
