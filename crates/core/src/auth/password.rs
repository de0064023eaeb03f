//! Argon2id password hashing.
//!
//! Plaintext passwords cross this boundary exactly twice: once at
//! registration (hashed, then discarded) and once at login (verified against
//! the stored hash). Nothing else in the workspace sees them.

use argon2::{
    password_hash::{rand_core::OsRng, PasswordHash, PasswordHasher, PasswordVerifier, SaltString},
    Argon2,
};
use thiserror::Error;

/// Failures at the hashing boundary.
#[derive(Debug, Error)]
pub enum PasswordError {
    /// The hasher itself failed. Does not carry the cause: error sources from
    /// the hashing backend may reference password material.
    #[error("password hashing failed")]
    Hashing,

    /// The stored hash string is not a valid PHC string.
    #[error("stored password hash is malformed")]
    MalformedHash,
}

/// Hashes a plaintext password with Argon2id and a fresh random salt.
///
/// The returned PHC string embeds the algorithm, parameters, and salt, so it
/// is the only value that needs to be persisted.
pub fn hash_password(password: &str) -> Result<String, PasswordError> {
    let salt = SaltString::generate(&mut OsRng);
    Argon2::default()
        .hash_password(password.as_bytes(), &salt)
        .map(|hash| hash.to_string())
        .map_err(|_| PasswordError::Hashing)
}

/// Verifies a plaintext password against a stored PHC string.
///
/// Returns `Ok(false)` for a well-formed hash that does not match; a
/// malformed stored hash is an error, not a failed login.
pub fn verify_password(password: &str, stored_hash: &str) -> Result<bool, PasswordError> {
    let parsed = PasswordHash::new(stored_hash).map_err(|_| PasswordError::MalformedHash)?;
    Ok(Argon2::default()
        .verify_password(password.as_bytes(), &parsed)
        .is_ok())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn hash_then_verify_round_trip() {
        let hash = hash_password("tr3sor-secret").unwrap();
        assert!(verify_password("tr3sor-secret", &hash).unwrap());
        assert!(!verify_password("tr3sor-Secret", &hash).unwrap());
    }

    #[test]
    fn hashes_are_salted() {
        let a = hash_password("same-password").unwrap();
        let b = hash_password("same-password").unwrap();
        assert_ne!(a, b);
    }

    #[test]
    fn malformed_stored_hash_is_an_error() {
        let err = verify_password("whatever", "not-a-phc-string").unwrap_err();
        assert!(matches!(err, PasswordError::MalformedHash));
    }

    #[test]
    fn hash_is_a_phc_string() {
        let hash = hash_password("tr3sor-secret").unwrap();
        assert!(hash.starts_with("$argon2"));
    }
}
