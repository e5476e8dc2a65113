//! Authentication service.
//!
//! Registration, password login and session token handling.

mod error;
pub mod password;
pub mod token;

pub use error::AuthError;
pub use password::{
    hash_password, hash_password_blocking, validate_password, verify_password,
};
pub use token::{Claims, TokenService};

use sqlx::PgPool;
use tracing::instrument;

use ecom_core::{Email, Role};

use crate::db::RepositoryError;
use crate::db::users::UserRepository;
use crate::models::{NewUser, RegisterUser, User};

/// Maximum length of a first or last name.
const MAX_NAME_LENGTH: usize = 100;

/// Authentication service.
pub struct AuthService<'a> {
    users: UserRepository<'a>,
    tokens: &'a TokenService,
}

impl<'a> AuthService<'a> {
    #[must_use]
    pub const fn new(pool: &'a PgPool, tokens: &'a TokenService) -> Self {
        Self {
            users: UserRepository::new(pool),
            tokens,
        }
    }

    /// Register a new account.
    ///
    /// # Errors
    ///
    /// Returns `AuthError::InvalidField`, `AuthError::InvalidEmail` or
    /// `AuthError::WeakPassword` if the request is invalid.
    /// Returns `AuthError::UserAlreadyExists` if the email is already registered.
    #[instrument(skip_all, fields(email = %request.email))]
    pub async fn register(&self, request: RegisterUser) -> Result<User, AuthError> {
        let first_name = required_name("firstName", &request.first_name)?;
        let last_name = required_name("lastName", &request.last_name)?;
        let email = Email::parse(&request.email)?;
        validate_password(&request.password)?;
        let role = match request.role.as_deref().map(str::trim) {
            None | Some("") => Role::default(),
            Some(label) => label
                .parse::<Role>()
                .map_err(|e| AuthError::InvalidField(e.to_string()))?,
        };

        let password_hash = password::hash_password_blocking(request.password).await?;

        let user = self
            .users
            .create(&NewUser {
                first_name,
                last_name,
                email,
                role,
                password_hash,
            })
            .await
            .map_err(|e| match e {
                RepositoryError::Conflict(_) => AuthError::UserAlreadyExists,
                other => AuthError::Repository(other),
            })?;

        tracing::info!(user_id = %user.id, role = %user.role, "user registered");
        Ok(user)
    }

    /// Check credentials and issue a session token.
    ///
    /// # Errors
    ///
    /// Returns `AuthError::InvalidCredentials` for an unknown email, a
    /// malformed email, or a wrong password alike.
    #[instrument(skip_all)]
    pub async fn login(&self, email: &str, password: &str) -> Result<String, AuthError> {
        let email = Email::parse(email).map_err(|_| AuthError::InvalidCredentials)?;

        let (user, password_hash) = self
            .users
            .get_credentials(&email)
            .await?
            .ok_or(AuthError::InvalidCredentials)?;

        if !password::verify_password_blocking(password_hash, password.to_owned()).await? {
            return Err(AuthError::InvalidCredentials);
        }

        tracing::info!(user_id = %user.id, "user logged in");
        self.tokens.issue(user.id, user.role)
    }
}

/// Trim a required name field and check its length.
fn required_name(field: &str, value: &str) -> Result<String, AuthError> {
    let value = value.trim();
    if value.is_empty() {
        return Err(AuthError::InvalidField(format!("{field} is required")));
    }
    if value.chars().count() > MAX_NAME_LENGTH {
        return Err(AuthError::InvalidField(format!(
            "{field} must be at most {MAX_NAME_LENGTH} characters"
        )));
    }
    Ok(value.to_owned())
}
