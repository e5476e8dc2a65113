//! API configuration loaded from environment variables.
//!
//! # Environment Variables
//!
//! ## Required
//! - `API_DATABASE_URL` - `PostgreSQL` connection string (falls back to `DATABASE_URL`)
//! - `JWT_SECRET` - Token signing secret (min 32 chars, high entropy)
//!
//! ## Optional
//! - `API_HOST` - Bind address (default: 127.0.0.1)
//! - `API_PORT` - Listen port (default: 8080)
//! - `JWT_EXPIRES_IN_SECONDS` - Token lifetime (default: 604800, one week)
//! - `ORDER_DEFAULT_ADDRESS` - Shipping address recorded on new orders (default: "default address")
//! - `SENTRY_DSN` - Sentry error tracking DSN
//! - `SENTRY_ENVIRONMENT` - Sentry environment tag

use std::collections::HashMap;
use std::net::{IpAddr, SocketAddr};
use std::time::Duration;

use secrecy::{ExposeSecret, SecretString};
use thiserror::Error;

const MIN_JWT_SECRET_LENGTH: usize = 32;
const MIN_ENTROPY_BITS_PER_CHAR: f64 = 3.3;
const DEFAULT_JWT_TTL_SECONDS: u64 = 7 * 24 * 60 * 60;

/// Blocklist of common placeholder patterns (case-insensitive)
const PLACEHOLDER_PATTERNS: &[&str] = &[
    "your-",
    "changeme",
    "replace",
    "placeholder",
    "example",
    "secret",
    "password",
    "xxx",
    "todo",
    "fixme",
    "insert",
    "enter-",
    "put-your",
    "add-your",
];

/// Configuration errors that can occur during loading.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Missing environment variable: {0}")]
    MissingEnvVar(String),
    #[error("Invalid environment variable {0}: {1}")]
    InvalidEnvVar(String, String),
    #[error("Insecure secret in {0}: {1}")]
    InsecureSecret(String, String),
}

/// API server configuration.
#[derive(Debug, Clone)]
pub struct ApiConfig {
    /// `PostgreSQL` database connection URL (contains password)
    pub database_url: SecretString,
    pub host: IpAddr,
    pub port: u16,
    pub jwt: JwtConfig,
    /// Address stored on orders until checkout collects one
    pub default_address: String,
    pub sentry_dsn: Option<String>,
    pub sentry_environment: Option<String>,
}

/// Session token signing configuration.
///
/// Implements `Debug` manually to redact the signing secret.
#[derive(Clone)]
pub struct JwtConfig {
    pub secret: SecretString,
    pub ttl: Duration,
}

impl std::fmt::Debug for JwtConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("JwtConfig")
            .field("secret", &"[REDACTED]")
            .field("ttl", &self.ttl)
            .finish()
    }
}

impl ApiConfig {
    /// Load configuration from environment variables.
    ///
    /// Calls `dotenvy::dotenv()` to load from `.env` file if present.
    ///
    /// # Errors
    ///
    /// Returns `ConfigError` if required variables are missing, invalid, or
    /// if the signing secret fails validation (length, placeholder, entropy).
    pub fn from_env() -> Result<Self, ConfigError> {
        // Load .env file if present (ignore errors if not found)
        let _ = dotenvy::dotenv();

        let database_url = get_database_url("API_DATABASE_URL")?;
        let host = parse_env("API_HOST", "127.0.0.1")?;
        let port = parse_env("API_PORT", "8080")?;

        Ok(Self {
            database_url,
            host,
            port,
            jwt: JwtConfig::from_env()?,
            default_address: get_env_or_default("ORDER_DEFAULT_ADDRESS", "default address"),
            sentry_dsn: get_optional_env("SENTRY_DSN"),
            sentry_environment: get_optional_env("SENTRY_ENVIRONMENT"),
        })
    }

    /// Returns the socket address for binding the server.
    #[must_use]
    pub const fn socket_addr(&self) -> SocketAddr {
        SocketAddr::new(self.host, self.port)
    }
}

impl JwtConfig {
    fn from_env() -> Result<Self, ConfigError> {
        let secret = get_required_env("JWT_SECRET")?;
        validate_jwt_secret(&secret, "JWT_SECRET")?;

        let ttl_seconds: u64 = parse_env(
            "JWT_EXPIRES_IN_SECONDS",
            &DEFAULT_JWT_TTL_SECONDS.to_string(),
        )?;
        if ttl_seconds == 0 {
            return Err(ConfigError::InvalidEnvVar(
                "JWT_EXPIRES_IN_SECONDS".to_string(),
                "must be greater than zero".to_string(),
            ));
        }

        Ok(Self {
            secret: SecretString::from(secret),
            ttl: Duration::from_secs(ttl_seconds),
        })
    }

    /// Expose the raw signing key bytes.
    #[must_use]
    pub fn secret_bytes(&self) -> &[u8] {
        self.secret.expose_secret().as_bytes()
    }
}

// =============================================================================
// Helper Functions
// =============================================================================

fn get_required_env(key: &str) -> Result<String, ConfigError> {
    std::env::var(key).map_err(|_| ConfigError::MissingEnvVar(key.to_string()))
}

/// Get database URL with fallback to generic `DATABASE_URL`.
fn get_database_url(primary_key: &str) -> Result<SecretString, ConfigError> {
    if let Ok(value) = std::env::var(primary_key) {
        return Ok(SecretString::from(value));
    }
    if let Ok(value) = std::env::var("DATABASE_URL") {
        return Ok(SecretString::from(value));
    }
    Err(ConfigError::MissingEnvVar(primary_key.to_string()))
}

fn get_optional_env(key: &str) -> Option<String> {
    std::env::var(key).ok().filter(|v| !v.is_empty())
}

fn get_env_or_default(key: &str, default: &str) -> String {
    std::env::var(key).unwrap_or_else(|_| default.to_string())
}

fn parse_env<T>(key: &str, default: &str) -> Result<T, ConfigError>
where
    T: std::str::FromStr,
    T::Err: std::fmt::Display,
{
    get_env_or_default(key, default)
        .parse::<T>()
        .map_err(|e| ConfigError::InvalidEnvVar(key.to_string(), e.to_string()))
}

/// Calculate Shannon entropy in bits per character.
fn shannon_entropy(s: &str) -> f64 {
    if s.is_empty() {
        return 0.0;
    }

    let mut freq: HashMap<char, usize> = HashMap::new();
    for c in s.chars() {
        *freq.entry(c).or_insert(0) += 1;
    }

    #[allow(clippy::cast_precision_loss)] // String length will never exceed f64 precision
    let len = s.chars().count() as f64;
    freq.values()
        .map(|&count| {
            #[allow(clippy::cast_precision_loss)]
            let p = count as f64 / len;
            -p * p.log2()
        })
        .sum()
}

/// Reject short, placeholder-looking, or low-entropy signing secrets.
fn validate_jwt_secret(secret: &str, var_name: &str) -> Result<(), ConfigError> {
    if secret.len() < MIN_JWT_SECRET_LENGTH {
        return Err(ConfigError::InsecureSecret(
            var_name.to_string(),
            format!(
                "must be at least {MIN_JWT_SECRET_LENGTH} characters (got {})",
                secret.len()
            ),
        ));
    }

    let lower = secret.to_lowercase();
    if let Some(pattern) = PLACEHOLDER_PATTERNS.iter().find(|p| lower.contains(**p)) {
        return Err(ConfigError::InsecureSecret(
            var_name.to_string(),
            format!("appears to be a placeholder (contains '{pattern}')"),
        ));
    }

    let entropy = shannon_entropy(secret);
    if entropy < MIN_ENTROPY_BITS_PER_CHAR {
        return Err(ConfigError::InsecureSecret(
            var_name.to_string(),
            format!(
                "entropy too low ({entropy:.2} bits/char, need >= {MIN_ENTROPY_BITS_PER_CHAR:.1}). Use a randomly generated secret."
            ),
        ));
    }

    Ok(())
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    const STRONG: &str = "aB3$xY9!mK2@nL5#pQ7&rT0*uW4^zC6";

    #[test]
    fn test_shannon_entropy_uniform() {
        assert!((shannon_entropy("") - 0.0).abs() < f64::EPSILON);
        assert!((shannon_entropy("aaaaaaa") - 0.0).abs() < f64::EPSILON);
        assert!((shannon_entropy("ab") - 1.0).abs() < 0.01);
    }

    #[test]
    fn test_jwt_secret_too_short() {
        let err = validate_jwt_secret("aB3$xY9!", "JWT_SECRET").unwrap_err();
        assert!(err.to_string().contains("at least 32 characters"));
    }

    #[test]
    fn test_jwt_secret_placeholder() {
        let err = validate_jwt_secret("changeme-aB3$xY9!mK2@nL5#pQ7&rT0*", "JWT_SECRET").unwrap_err();
        assert!(matches!(err, ConfigError::InsecureSecret(_, _)));
        assert!(err.to_string().contains("changeme"));
    }

    #[test]
    fn test_jwt_secret_low_entropy() {
        let err = validate_jwt_secret(&"ab".repeat(20), "JWT_SECRET").unwrap_err();
        assert!(err.to_string().contains("entropy too low"));
    }

    #[test]
    fn test_jwt_secret_valid() {
        assert!(validate_jwt_secret(STRONG, "JWT_SECRET").is_ok());
    }

    #[test]
    fn test_jwt_config_debug_redacts_secret() {
        let config = JwtConfig {
            secret: SecretString::from(STRONG),
            ttl: Duration::from_secs(60),
        };
        let debug_output = format!("{config:?}");
        assert!(debug_output.contains("[REDACTED]"));
        assert!(!debug_output.contains(STRONG));
    }

    #[test]
    fn test_socket_addr() {
        let config = ApiConfig {
            database_url: SecretString::from("postgres://localhost/test"),
            host: "0.0.0.0".parse().unwrap(),
            port: 8080,
            jwt: JwtConfig {
                secret: SecretString::from(STRONG),
                ttl: Duration::from_secs(DEFAULT_JWT_TTL_SECONDS),
            },
            default_address: "default address".to_string(),
            sentry_dsn: None,
            sentry_environment: None,
        };

        let addr = config.socket_addr();
        assert_eq!(addr.to_string(), "0.0.0.0:8080");
    }
}
