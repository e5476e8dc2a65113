//! Argon2id password hashing.
//!
//! Hashing is CPU-bound (tens of milliseconds), so the async wrappers run it on
//! Tokio's blocking pool instead of a runtime worker.

use argon2::{
    Argon2,
    password_hash::{PasswordHash, PasswordHasher, PasswordVerifier, SaltString, rand_core::OsRng},
};

use super::AuthError;

/// Minimum password length.
pub const MIN_PASSWORD_LENGTH: usize = 8;

/// Maximum password length, to bound hashing cost.
pub const MAX_PASSWORD_LENGTH: usize = 128;

/// Validate password meets requirements.
///
/// # Errors
///
/// Returns `AuthError::WeakPassword` describing the failed rule.
pub fn validate_password(password: &str) -> Result<(), AuthError> {
    let len = password.chars().count();
    if len < MIN_PASSWORD_LENGTH {
        return Err(AuthError::WeakPassword(format!(
            "password must be at least {MIN_PASSWORD_LENGTH} characters"
        )));
    }
    if len > MAX_PASSWORD_LENGTH {
        return Err(AuthError::WeakPassword(format!(
            "password must be at most {MAX_PASSWORD_LENGTH} characters"
        )));
    }
    Ok(())
}

/// Hash a password into a PHC string with a fresh random salt.
///
/// # Errors
///
/// Returns `AuthError::PasswordHash` if the hasher fails.
pub fn hash_password(password: &str) -> Result<String, AuthError> {
    let salt = SaltString::generate(&mut OsRng);

    Argon2::default()
        .hash_password(password.as_bytes(), &salt)
        .map(|hash| hash.to_string())
        .map_err(|_| AuthError::PasswordHash)
}

/// Check a password against a stored PHC string.
///
/// A wrong password and an unparsable stored hash both return `false`.
#[must_use]
pub fn verify_password(hash: &str, password: &str) -> bool {
    let Ok(parsed_hash) = PasswordHash::new(hash) else {
        tracing::warn!("stored password hash is not a valid PHC string");
        return false;
    };

    Argon2::default()
        .verify_password(password.as_bytes(), &parsed_hash)
        .is_ok()
}

/// [`hash_password`] on the blocking pool.
///
/// # Errors
///
/// Returns `AuthError::PasswordHash` if hashing fails or the task panics.
pub async fn hash_password_blocking(password: String) -> Result<String, AuthError> {
    tokio::task::spawn_blocking(move || hash_password(&password))
        .await
        .map_err(|_| AuthError::PasswordHash)?
}

/// [`verify_password`] on the blocking pool.
///
/// # Errors
///
/// Returns `AuthError::PasswordHash` if the task panics.
pub async fn verify_password_blocking(hash: String, password: String) -> Result<bool, AuthError> {
    tokio::task::spawn_blocking(move || verify_password(&hash, &password))
        .await
        .map_err(|_| AuthError::PasswordHash)
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    #[test]
    fn test_hash_then_verify() {
        let hash = hash_password("correct horse battery").unwrap();
        assert!(hash.starts_with("$argon2id$"));
        assert!(verify_password(&hash, "correct horse battery"));
        assert!(!verify_password(&hash, "correct horse battery!"));
    }

    #[test]
    fn test_same_password_gets_different_salts() {
        let a = hash_password("password123").unwrap();
        let b = hash_password("password123").unwrap();
        assert_ne!(a, b);
    }

    #[test]
    fn test_verify_garbage_hash_is_mismatch() {
        assert!(!verify_password("not-a-phc-string", "anything"));
        assert!(!verify_password("", "anything"));
    }

    #[test]
    fn test_validate_password_length() {
        assert!(validate_password("1234567").is_err());
        assert!(validate_password("12345678").is_ok());
        assert!(validate_password(&"x".repeat(MAX_PASSWORD_LENGTH + 1)).is_err());
    }

    #[tokio::test]
    async fn test_blocking_wrappers() {
        let hash = hash_password_blocking("hunter22hunter22".to_string())
            .await
            .unwrap();
        let ok = verify_password_blocking(hash, "hunter22hunter22".to_string())
            .await
            .unwrap();
        assert!(ok);
    }
}
