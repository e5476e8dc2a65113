//! Database migration command.
//!
//! ```bash
//! ecom-cli migrate
//! ```
//!
//! Migration files live in `crates/api/migrations/` and are embedded at
//! compile time. Already-applied migrations are skipped.

use secrecy::ExposeSecret;
use sqlx::PgPool;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum MigrationError {
    #[error("Missing environment variable: API_DATABASE_URL (or DATABASE_URL)")]
    MissingDatabaseUrl,

    #[error("Database error: {0}")]
    Database(#[from] sqlx::Error),

    #[error("Migration error: {0}")]
    Migration(#[from] sqlx::migrate::MigrateError),
}

/// Run all pending migrations.
///
/// # Errors
///
/// Returns `MigrationError` if the URL is missing, the database is
/// unreachable, or a migration fails.
pub async fn run() -> Result<(), MigrationError> {
    let database_url = super::database_url().ok_or(MigrationError::MissingDatabaseUrl)?;

    tracing::info!("Connecting to database...");
    let pool = PgPool::connect(database_url.expose_secret()).await?;

    tracing::info!("Running migrations...");
    sqlx::migrate!("../api/migrations").run(&pool).await?;

    tracing::info!("Migrations complete!");
    Ok(())
}
