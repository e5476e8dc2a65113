//! Product catalog handlers.

use axum::{extract::State, http::StatusCode};
use serde::Deserialize;
use tracing::instrument;

use ecom_core::ProductId;

use crate::db::{ProductRepository, RepositoryError};
use crate::error::{AppError, Result};
use crate::extract::{Json, Path, Query};
use crate::middleware::{RequireAdmin, RequireAuth};
use crate::models::{Product, ProductInput};
use crate::state::AppState;

/// Query string for `GET /products`.
#[derive(Debug, Default, Deserialize)]
pub struct ListQuery {
    /// Comma-separated product ids, e.g. `?ids=1,2,3`.
    pub ids: Option<String>,
}

fn parse_ids(raw: &str) -> Result<Vec<ProductId>> {
    raw.split(',')
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .map(|s| {
            s.parse::<ProductId>()
                .map_err(|_| AppError::Validation(format!("invalid product id: {s}")))
        })
        .collect()
}

/// `GET /products`, optionally restricted to `?ids=`.
#[instrument(skip_all)]
pub async fn list(
    RequireAuth(_user): RequireAuth,
    State(state): State<AppState>,
    Query(query): Query<ListQuery>,
) -> Result<Json<Vec<Product>>> {
    let products = ProductRepository::new(state.pool());

    let list = match query.ids.as_deref() {
        Some(raw) => products.get_by_ids(&parse_ids(raw)?).await?,
        None => products.get_all().await?,
    };

    Ok(Json(list))
}

/// `GET /products/{id}`
#[instrument(skip_all, fields(product_id = %id))]
pub async fn get(
    RequireAuth(_user): RequireAuth,
    State(state): State<AppState>,
    Path(id): Path<ProductId>,
) -> Result<Json<Product>> {
    let product = ProductRepository::new(state.pool())
        .get_by_id(id)
        .await
        .map_err(|e| match e {
            RepositoryError::NotFound => AppError::NotFound(format!("product {id} not found")),
            other => other.into(),
        })?;

    Ok(Json(product))
}

/// `POST /products` (admin)
#[instrument(skip_all, fields(admin_id = %admin.id))]
pub async fn create(
    RequireAdmin(admin): RequireAdmin,
    State(state): State<AppState>,
    Json(body): Json<ProductInput>,
) -> Result<(StatusCode, Json<Product>)> {
    body.validate().map_err(AppError::Validation)?;

    let product = ProductRepository::new(state.pool()).create(&body).await?;
    tracing::info!(product_id = %product.id, "product created");

    Ok((StatusCode::CREATED, Json(product)))
}

/// `PUT /products/{id}` (admin)
#[instrument(skip_all, fields(admin_id = %admin.id, product_id = %id))]
pub async fn update(
    RequireAdmin(admin): RequireAdmin,
    State(state): State<AppState>,
    Path(id): Path<ProductId>,
    Json(body): Json<ProductInput>,
) -> Result<Json<Product>> {
    body.validate().map_err(AppError::Validation)?;

    let product = ProductRepository::new(state.pool())
        .update(id, &body)
        .await?;
    tracing::info!(product_id = %product.id, "product updated");

    Ok(Json(product))
}

/// `DELETE /products/{id}` (admin)
///
/// Past order lines keep their snapshot of the product id and price.
#[instrument(skip_all, fields(admin_id = %admin.id, product_id = %id))]
pub async fn delete(
    RequireAdmin(admin): RequireAdmin,
    State(state): State<AppState>,
    Path(id): Path<ProductId>,
) -> Result<StatusCode> {
    ProductRepository::new(state.pool()).delete(id).await?;
    tracing::info!(product_id = %id, "product deleted");

    Ok(StatusCode::NO_CONTENT)
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_ids() {
        let ids = parse_ids(" 3, 1,,2 ").unwrap();
        assert_eq!(ids, vec![ProductId::new(3), ProductId::new(1), ProductId::new(2)]);
        assert!(parse_ids("").unwrap().is_empty());
    }

    #[test]
    fn test_parse_ids_rejects_garbage() {
        let err = parse_ids("1,two").unwrap_err();
        assert_eq!(err.to_string(), "Validation error: invalid product id: two");
    }
}
