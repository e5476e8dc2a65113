//! Signed session tokens (HS256 JWT).

use std::time::Duration;

use chrono::Utc;
use jsonwebtoken::{Algorithm, DecodingKey, EncodingKey, Header, Validation, decode, encode};
use serde::{Deserialize, Serialize};

use ecom_core::{Role, UserId};

use super::AuthError;
use crate::config::JwtConfig;
use crate::models::CurrentUser;

/// Claims carried by a session token.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Claims {
    /// User id, as a decimal string.
    pub sub: String,
    pub role: Role,
    /// Issued at (Unix seconds).
    pub iat: i64,
    /// Expires at (Unix seconds).
    pub exp: i64,
}

/// Issues and validates session tokens.
///
/// Built once from [`JwtConfig`] at startup and shared through the app state.
#[derive(Clone)]
pub struct TokenService {
    encoding: EncodingKey,
    decoding: DecodingKey,
    validation: Validation,
    ttl: Duration,
}

impl std::fmt::Debug for TokenService {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("TokenService")
            .field("ttl", &self.ttl)
            .finish_non_exhaustive()
    }
}

impl TokenService {
    #[must_use]
    pub fn new(config: &JwtConfig) -> Self {
        let secret = config.secret_bytes();
        let mut validation = Validation::new(Algorithm::HS256);
        validation.leeway = 0;

        Self {
            encoding: EncodingKey::from_secret(secret),
            decoding: DecodingKey::from_secret(secret),
            validation,
            ttl: config.ttl,
        }
    }

    /// Sign a token for `user_id` expiring after the configured TTL.
    ///
    /// # Errors
    ///
    /// Returns `AuthError::TokenSigning` if encoding fails.
    pub fn issue(&self, user_id: UserId, role: Role) -> Result<String, AuthError> {
        let now = Utc::now().timestamp();
        let ttl = i64::try_from(self.ttl.as_secs()).unwrap_or(i64::MAX);
        let claims = Claims {
            sub: user_id.to_string(),
            role,
            iat: now,
            exp: now.saturating_add(ttl),
        };

        self.sign(&claims)
    }

    fn sign(&self, claims: &Claims) -> Result<String, AuthError> {
        encode(&Header::new(Algorithm::HS256), claims, &self.encoding)
            .map_err(AuthError::TokenSigning)
    }

    /// Verify a token's signature and expiry and recover the caller.
    ///
    /// # Errors
    ///
    /// Returns `AuthError::InvalidToken` if the token is malformed, signed
    /// with another key, expired, or carries a non-numeric subject.
    pub fn validate(&self, token: &str) -> Result<CurrentUser, AuthError> {
        let data = decode::<Claims>(token, &self.decoding, &self.validation).map_err(|e| {
            tracing::debug!(error = %e, "rejected session token");
            AuthError::InvalidToken
        })?;

        let id = data
            .claims
            .sub
            .parse::<UserId>()
            .map_err(|_| AuthError::InvalidToken)?;

        Ok(CurrentUser {
            id,
            role: data.claims.role,
        })
    }
}
