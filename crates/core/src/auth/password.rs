//! Argon2id password hashing for staff logins.

use argon2::{
    Argon2, PasswordHash,
    password_hash::{PasswordHasher, PasswordVerifier, SaltString, rand_core::OsRng},
};
use thiserror::Error;

/// Errors from hashing or checking a password.
#[derive(Debug, Error)]
pub enum PasswordError {
    /// Hashing failed.
    #[error("failed to hash password: {0}")]
    HashError(String),

    /// Verification failed for a reason other than a mismatch.
    #[error("failed to verify password: {0}")]
    VerifyError(String),

    /// The stored hash is not a PHC string.
    #[error("invalid password hash format")]
    InvalidHash,
}

/// Hashes a password into a PHC string with a fresh random salt.
///
/// # Errors
///
/// Returns `PasswordError::HashError` if hashing fails.
pub fn hash_password(password: &str) -> Result<String, PasswordError> {
    let salt = SaltString::generate(&mut OsRng);

    Argon2::default()
        .hash_password(password.as_bytes(), &salt)
        .map(|hash| hash.to_string())
        .map_err(|e| PasswordError::HashError(e.to_string()))
}

/// Checks a password against a stored PHC hash.
///
/// A mismatch is `Ok(false)`, not an error.
///
/// # Errors
///
/// Returns `PasswordError::InvalidHash` if `stored` cannot be parsed.
pub fn verify_password(password: &str, stored: &str) -> Result<bool, PasswordError> {
    let parsed = PasswordHash::new(stored).map_err(|_| PasswordError::InvalidHash)?;

    match Argon2::default().verify_password(password.as_bytes(), &parsed) {
        Ok(()) => Ok(true),
        Err(argon2::password_hash::Error::Password) => Ok(false),
        Err(e) => Err(PasswordError::VerifyError(e.to_string())),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_hash_then_verify() {
        let hash = hash_password("kaikei-2026!").unwrap();

        assert!(hash.starts_with("$argon2id$"));
        assert!(verify_password("kaikei-2026!", &hash).unwrap());
        assert!(!verify_password("kaikei-2025!", &hash).unwrap());
    }

    #[test]
    fn test_salt_differs_per_hash() {
        assert_ne!(hash_password("same").unwrap(), hash_password("same").unwrap());
    }

    #[test]
    fn test_rejects_garbage_hash() {
        assert!(matches!(
            verify_password("x", "plaintext"),
            Err(PasswordError::InvalidHash)
        ));
    }
}
