//! Authentication error types.

use thiserror::Error;

use crate::db::RepositoryError;

/// Errors that can occur during authentication operations.
#[derive(Debug, Error)]
pub enum AuthError {
    #[error("invalid email: {0}")]
    InvalidEmail(#[from] ecom_core::EmailError),

    /// Unknown email or wrong password. Deliberately indistinguishable.
    #[error("invalid credentials")]
    InvalidCredentials,

    #[error("user already exists")]
    UserAlreadyExists,

    #[error("password validation failed: {0}")]
    WeakPassword(String),

    /// Missing or malformed registration field.
    #[error("{0}")]
    InvalidField(String),

    /// Token is malformed, has a bad signature, or has expired.
    #[error("invalid token")]
    InvalidToken,

    #[error("token signing error: {0}")]
    TokenSigning(#[source] jsonwebtoken::errors::Error),

    #[error("database error: {0}")]
    Repository(#[from] RepositoryError),

    #[error("password hashing error")]
    PasswordHash,
}
