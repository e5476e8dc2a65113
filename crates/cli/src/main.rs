//! Ecom CLI - Database migrations and management tools.
//!
//! # Usage
//!
//! ```bash
//! # Run database migrations
//! ecom-cli migrate
//!
//! # Create an admin account (password from ECOM_ADMIN_PASSWORD if omitted)
//! ecom-cli admin create -e admin@example.com -f Ada -l Lovelace
//!
//! # Load products from a YAML file
//! ecom-cli seed products catalog.yaml
//! ```
//!
//! # Environment Variables
//!
//! - `API_DATABASE_URL` - `PostgreSQL` connection string (falls back to `DATABASE_URL`)

#![cfg_attr(not(test), forbid(unsafe_code))]

use clap::{Parser, Subcommand};

mod commands;

#[derive(Debug, Parser)]
#[command(name = "ecom-cli")]
#[command(author, version, about = "Ecom API CLI tools")]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Debug, Subcommand)]
enum Commands {
    /// Run database migrations
    Migrate,
    /// Manage admin accounts
    Admin {
        #[command(subcommand)]
        action: AdminAction,
    },
    /// Seed the database
    Seed {
        #[command(subcommand)]
        target: SeedTarget,
    },
}

#[derive(Debug, Subcommand)]
enum AdminAction {
    /// Create a new admin account
    Create {
        /// Admin email address
        #[arg(short, long)]
        email: String,

        /// First name
        #[arg(short, long)]
        first_name: String,

        /// Last name
        #[arg(short, long)]
        last_name: String,

        /// Password (min 8 characters)
        #[arg(short, long, env = "ECOM_ADMIN_PASSWORD", hide_env_values = true)]
        password: String,
    },
}

#[derive(Debug, Subcommand)]
enum SeedTarget {
    /// Insert products listed in a YAML file
    Products {
        /// Path to the YAML file
        file: String,
    },
}

#[tokio::main]
async fn main() {
    tracing_subscriber::fmt::init();

    let cli = Cli::parse();

    if let Err(e) = run(cli).await {
        tracing::error!("Command failed: {e}");
        std::process::exit(1);
    }
}

async fn run(cli: Cli) -> Result<(), Box<dyn std::error::Error>> {
    match cli.command {
        Commands::Migrate => commands::migrate::run().await?,
        Commands::Admin { action } => match action {
            AdminAction::Create {
                email,
                first_name,
                last_name,
                password,
            } => {
                commands::admin::create_user(&email, &first_name, &last_name, &password).await?;
            }
        },
        Commands::Seed { target } => match target {
            SeedTarget::Products { file } => commands::seed::products(&file).await?,
        },
    }
    Ok(())
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_admin_create() {
        let cli = Cli::try_parse_from([
            "ecom-cli",
            "admin",
            "create",
            "-e",
            "root@example.com",
            "-f",
            "Ada",
            "-l",
            "Lovelace",
            "-p",
            "correct horse battery",
        ])
        .unwrap();

        match cli.command {
            Commands::Admin {
                action: AdminAction::Create { email, password, .. },
            } => {
                assert_eq!(email, "root@example.com");
                assert_eq!(password, "correct horse battery");
            }
            other => panic!("unexpected command: {other:?}"),
        }
    }

    #[test]
    fn test_parse_seed_products() {
        let cli = Cli::try_parse_from(["ecom-cli", "seed", "products", "catalog.yaml"]).unwrap();
        assert!(matches!(
            cli.command,
            Commands::Seed { target: SeedTarget::Products { file } } if file == "catalog.yaml"
        ));
    }

    #[test]
    fn test_migrate_takes_no_target() {
        assert!(Cli::try_parse_from(["ecom-cli", "migrate"]).is_ok());
        assert!(Cli::try_parse_from(["ecom-cli", "migrate", "admin"]).is_err());
    }
}
