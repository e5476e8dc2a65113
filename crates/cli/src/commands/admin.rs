//! Admin account management.
//!
//! Self-registration creates `user` accounts by default; this is the
//! operator path for bootstrapping an `admin`.
//!
//! ```bash
//! ECOM_ADMIN_PASSWORD=... ecom-cli admin create -e admin@example.com -f Ada -l Lovelace
//! ```

use secrecy::ExposeSecret;
use sqlx::PgPool;
use thiserror::Error;

use ecom_api::db::{RepositoryError, UserRepository};
use ecom_api::models::NewUser;
use ecom_api::services::auth::{AuthError, hash_password_blocking, validate_password};
use ecom_core::{Email, EmailError, Role};

/// Errors that can occur during admin operations.
#[derive(Debug, Error)]
pub enum AdminError {
    #[error("Missing environment variable: API_DATABASE_URL (or DATABASE_URL)")]
    MissingDatabaseUrl,

    #[error("Invalid email: {0}")]
    InvalidEmail(#[from] EmailError),

    #[error("Invalid name: {0} is required")]
    MissingName(&'static str),

    #[error("Invalid password: {0}")]
    Password(#[from] AuthError),

    #[error("User already exists with email: {0}")]
    UserExists(Email),

    #[error("Database connection error: {0}")]
    Database(#[from] sqlx::Error),

    #[error("Repository error: {0}")]
    Repository(#[from] RepositoryError),
}

/// Validated admin account input, checked before any connection is made.
#[derive(Debug)]
struct AdminInput {
    email: Email,
    first_name: String,
    last_name: String,
}

fn validate(
    email: &str,
    first_name: &str,
    last_name: &str,
    password: &str,
) -> Result<AdminInput, AdminError> {
    let email = Email::parse(email)?;

    let first_name = first_name.trim();
    if first_name.is_empty() {
        return Err(AdminError::MissingName("first name"));
    }
    let last_name = last_name.trim();
    if last_name.is_empty() {
        return Err(AdminError::MissingName("last name"));
    }

    validate_password(password)?;

    Ok(AdminInput {
        email,
        first_name: first_name.to_owned(),
        last_name: last_name.to_owned(),
    })
}

/// Validate the input and hash the password off the async runtime.
async fn new_admin(
    email: &str,
    first_name: &str,
    last_name: &str,
    password: &str,
) -> Result<NewUser, AdminError> {
    let input = validate(email, first_name, last_name, password)?;
    let password_hash = hash_password_blocking(password.to_owned()).await?;

    Ok(NewUser {
        first_name: input.first_name,
        last_name: input.last_name,
        email: input.email,
        role: Role::Admin,
        password_hash,
    })
}

/// Create a new admin account.
///
/// # Returns
///
/// The ID of the created user.
///
/// # Errors
///
/// Returns `AdminError` if the input is invalid, the email is taken, or the
/// database is unreachable.
pub async fn create_user(
    email: &str,
    first_name: &str,
    last_name: &str,
    password: &str,
) -> Result<i32, AdminError> {
    let admin = new_admin(email, first_name, last_name, password).await?;

    let database_url = super::database_url().ok_or(AdminError::MissingDatabaseUrl)?;

    tracing::info!("Connecting to database...");
    let pool = PgPool::connect(database_url.expose_secret()).await?;

    tracing::info!("Creating admin user: {}", admin.email);

    let user = UserRepository::new(&pool)
        .create(&admin)
        .await
        .map_err(|e| match e {
            RepositoryError::Conflict(_) => AdminError::UserExists(admin.email.clone()),
            other => other.into(),
        })?;

    tracing::info!(
        "Admin user created successfully! ID: {}, Email: {}",
        user.id,
        user.email
    );

    Ok(user.id.as_i32())
}
