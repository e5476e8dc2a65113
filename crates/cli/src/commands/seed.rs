//! Seed the catalog from a YAML file.
//!
//! ```yaml
//! products:
//!   - name: Mug
//!     description: Stoneware, 350ml
//!     image: https://cdn.example.com/mug.png
//!     price: "12.50"
//!     quantity: 40
//! ```
//!
//! The whole file is parsed and validated before connecting, so a typo
//! never leaves the catalog half-seeded.

use std::path::Path;

use serde::Deserialize;
use tracing::{error, info};

use ecom_api::db::{self, ProductRepository};
use ecom_api::models::ProductInput;

#[derive(Debug, Deserialize)]
struct SeedFile {
    products: Vec<ProductInput>,
}

/// Parse a seed file and validate every entry.
///
/// Returns the products, or one message per invalid entry.
fn parse_products(content: &str) -> Result<Vec<ProductInput>, Vec<String>> {
    let file: SeedFile = serde_yaml::from_str(content).map_err(|e| vec![e.to_string()])?;

    let errors: Vec<String> = file
        .products
        .iter()
        .enumerate()
        .filter_map(|(i, p)| {
            p.validate()
                .err()
                .map(|e| format!("product #{} ({}): {e}", i + 1, p.name.trim()))
        })
        .collect();

    if errors.is_empty() {
        Ok(file.products)
    } else {
        Err(errors)
    }
}

/// Insert the products listed in `file_path`.
///
/// # Errors
///
/// Returns an error if the database URL is missing, the file cannot be read
/// or fails validation, or an insert fails.
pub async fn products(file_path: &str) -> Result<(), Box<dyn std::error::Error>> {
    let database_url =
        super::database_url().ok_or("API_DATABASE_URL (or DATABASE_URL) not set")?;

    let path = Path::new(file_path);
    if !path.exists() {
        return Err(format!("File not found: {file_path}").into());
    }

    info!(path = %file_path, "Loading products from file");
    let content = tokio::fs::read_to_string(path).await?;

    let products = match parse_products(&content) {
        Ok(products) => products,
        Err(errors) => {
            error!("Seed file validation failed:");
            for err in &errors {
                error!("  - {err}");
            }
            return Err(format!("{} validation errors found", errors.len()).into());
        }
    };
    info!(products = products.len(), "Parsed seed file");

    let pool = db::create_pool(&database_url).await?;
    info!("Connected to database");

    let repo = ProductRepository::new(&pool);
    for input in &products {
        let product = repo.create(input).await?;
        info!(product_id = %product.id, name = %product.name, "Inserted product");
    }

    info!("Seeding complete! {} products inserted", products.len());
    Ok(())
}
