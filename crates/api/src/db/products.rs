//! Product catalog repository.

use std::collections::BTreeSet;

use chrono::{DateTime, Utc};
use sqlx::{PgPool, Postgres, Transaction};

use ecom_core::{Price, ProductId};

use super::RepositoryError;
use crate::models::{Product, ProductInput};

const PRODUCT_COLUMNS: &str = "id, name, description, image, price, quantity, created_at";

// =============================================================================
// Internal Row Types
// =============================================================================

#[derive(Debug, sqlx::FromRow)]
struct ProductRow {
    id: ProductId,
    name: String,
    description: String,
    image: String,
    price: Price,
    quantity: i32,
    created_at: DateTime<Utc>,
}

impl TryFrom<ProductRow> for Product {
    type Error = RepositoryError;

    fn try_from(row: ProductRow) -> Result<Self, Self::Error> {
        if row.quantity < 0 {
            return Err(RepositoryError::DataCorruption(format!(
                "product {} has negative quantity {}",
                row.id, row.quantity
            )));
        }

        Ok(Self {
            id: row.id,
            name: row.name,
            description: row.description,
            image: row.image,
            price: row.price,
            quantity: row.quantity,
            created_at: row.created_at,
        })
    }
}

fn into_products(rows: Vec<ProductRow>) -> Result<Vec<Product>, RepositoryError> {
    rows.into_iter().map(TryInto::try_into).collect()
}

// =============================================================================
// Repository
// =============================================================================

/// Repository for product catalog operations.
pub struct ProductRepository<'a> {
    pool: &'a PgPool,
}

impl<'a> ProductRepository<'a> {
    #[must_use]
    pub const fn new(pool: &'a PgPool) -> Self {
        Self { pool }
    }

    /// # Errors
    ///
    /// Returns `RepositoryError::NotFound` if no product has this id.
    pub async fn get_by_id(&self, id: ProductId) -> Result<Product, RepositoryError> {
        let sql = format!("SELECT {PRODUCT_COLUMNS} FROM products WHERE id = $1");
        sqlx::query_as::<_, ProductRow>(&sql)
            .bind(id)
            .fetch_optional(self.pool)
            .await?
            .ok_or(RepositoryError::NotFound)?
            .try_into()
    }

    /// List the whole catalog in id order.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the query fails.
    pub async fn get_all(&self) -> Result<Vec<Product>, RepositoryError> {
        let sql = format!("SELECT {PRODUCT_COLUMNS} FROM products ORDER BY id");
        let rows = sqlx::query_as::<_, ProductRow>(&sql)
            .fetch_all(self.pool)
            .await?;

        into_products(rows)
    }

    /// Fetch a set of products in id order.
    ///
    /// Duplicate ids are collapsed. An empty set returns an empty list
    /// without touching the database.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::NotFound` if any requested id has no product.
    pub async fn get_by_ids(&self, ids: &[ProductId]) -> Result<Vec<Product>, RepositoryError> {
        let wanted: BTreeSet<ProductId> = ids.iter().copied().collect();
        if wanted.is_empty() {
            return Ok(Vec::new());
        }
        let ids: Vec<ProductId> = wanted.into_iter().collect();

        let sql = format!("SELECT {PRODUCT_COLUMNS} FROM products WHERE id = ANY($1) ORDER BY id");
        let rows = sqlx::query_as::<_, ProductRow>(&sql)
            .bind(&ids)
            .fetch_all(self.pool)
            .await?;

        if rows.len() != ids.len() {
            return Err(RepositoryError::NotFound);
        }
        into_products(rows)
    }

    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the insert fails.
    pub async fn create(&self, input: &ProductInput) -> Result<Product, RepositoryError> {
        let sql = format!(
            "INSERT INTO products (name, description, image, price, quantity)
             VALUES ($1, $2, $3, $4, $5)
             RETURNING {PRODUCT_COLUMNS}"
        );
        sqlx::query_as::<_, ProductRow>(&sql)
            .bind(input.name.trim())
            .bind(&input.description)
            .bind(&input.image)
            .bind(input.price)
            .bind(input.quantity)
            .fetch_one(self.pool)
            .await?
            .try_into()
    }

    /// Overwrite every mutable field. Last write wins.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::NotFound` if no product has this id.
    pub async fn update(
        &self,
        id: ProductId,
        input: &ProductInput,
    ) -> Result<Product, RepositoryError> {
        let sql = format!(
            "UPDATE products
             SET name = $2, description = $3, image = $4, price = $5, quantity = $6
             WHERE id = $1
             RETURNING {PRODUCT_COLUMNS}"
        );
        sqlx::query_as::<_, ProductRow>(&sql)
            .bind(id)
            .bind(input.name.trim())
            .bind(&input.description)
            .bind(&input.image)
            .bind(input.price)
            .bind(input.quantity)
            .fetch_optional(self.pool)
            .await?
            .ok_or(RepositoryError::NotFound)?
            .try_into()
    }

    /// # Errors
    ///
    /// Returns `RepositoryError::NotFound` if no product has this id.
    pub async fn delete(&self, id: ProductId) -> Result<(), RepositoryError> {
        let result = sqlx::query("DELETE FROM products WHERE id = $1")
            .bind(id)
            .execute(self.pool)
            .await?;

        if result.rows_affected() == 0 {
            return Err(RepositoryError::NotFound);
        }
        Ok(())
    }

    // =========================================================================
    // Transaction-scoped operations
    // =========================================================================

    /// Lock the given products for the rest of the transaction.
    ///
    /// Rows are locked in ascending id order. Ids with no product are simply
    /// absent from the result; the caller decides whether that is an error.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the query fails.
    pub async fn lock_by_ids(
        &self,
        tx: &mut Transaction<'_, Postgres>,
        ids: &[ProductId],
    ) -> Result<Vec<Product>, RepositoryError> {
        if ids.is_empty() {
            return Ok(Vec::new());
        }

        let sql = format!(
            "SELECT {PRODUCT_COLUMNS} FROM products WHERE id = ANY($1) ORDER BY id FOR UPDATE"
        );
        let rows = sqlx::query_as::<_, ProductRow>(&sql)
            .bind(ids)
            .fetch_all(&mut **tx)
            .await?;

        into_products(rows)
    }

    /// Add `delta` (which may be negative) to a product's stock on hand.
    ///
    /// The `quantity >= 0` check constraint rejects any change that would
    /// drive stock negative.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::NotFound` if no product has this id.
    pub async fn adjust_quantity(
        &self,
        tx: &mut Transaction<'_, Postgres>,
        id: ProductId,
        delta: i32,
    ) -> Result<(), RepositoryError> {
        let result = sqlx::query("UPDATE products SET quantity = quantity + $2 WHERE id = $1")
            .bind(id)
            .bind(delta)
            .execute(&mut **tx)
            .await?;

        if result.rows_affected() == 0 {
            return Err(RepositoryError::NotFound);
        }
        Ok(())
    }
}
