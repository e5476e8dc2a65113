//! Order and checkout handlers.

use axum::{extract::State, http::StatusCode};
use serde::Deserialize;
use tracing::instrument;

use ecom_core::{OrderId, OrderStatus};

use crate::db::{OrderRepository, RepositoryError};
use crate::error::{AppError, Result};
use crate::extract::{Json, Path};
use crate::middleware::{RequireAdmin, RequireAuth};
use crate::models::{Order, OrderDetail};
use crate::services::checkout::{CartLine, CheckoutReceipt, CheckoutService};
use crate::state::AppState;

/// Checkout request body.
#[derive(Debug, Deserialize)]
pub struct CheckoutRequest {
    pub items: Vec<CartLine>,
}

/// Status update request body.
#[derive(Debug, Deserialize)]
pub struct UpdateStatusRequest {
    pub status: String,
}

/// `GET /orders`: the caller's own orders, newest first.
#[instrument(skip_all, fields(user_id = %user.id))]
pub async fn list(
    RequireAuth(user): RequireAuth,
    State(state): State<AppState>,
) -> Result<Json<Vec<Order>>> {
    let orders = OrderRepository::new(state.pool())
        .get_by_user_id(user.id)
        .await?;

    Ok(Json(orders))
}

/// `GET /orders/{id}`: one order with its lines, for its owner or an admin.
#[instrument(skip_all, fields(user_id = %user.id, order_id = %id))]
pub async fn get(
    RequireAuth(user): RequireAuth,
    State(state): State<AppState>,
    Path(id): Path<OrderId>,
) -> Result<Json<OrderDetail>> {
    let repo = OrderRepository::new(state.pool());

    let order = repo.get_by_id(id).await.map_err(|e| match e {
        RepositoryError::NotFound => AppError::NotFound(format!("order {id} not found")),
        other => other.into(),
    })?;
    if !user.can_view(order.user_id) {
        return Err(AppError::Forbidden("permission denied".to_string()));
    }

    let items = repo.get_items_by_order_id(id).await?;
    Ok(Json(OrderDetail { order, items }))
}

/// `POST /orders`: check out a cart.
#[instrument(skip_all, fields(user_id = %user.id))]
pub async fn checkout(
    RequireAuth(user): RequireAuth,
    State(state): State<AppState>,
    Json(body): Json<CheckoutRequest>,
) -> Result<Json<CheckoutReceipt>> {
    let receipt = CheckoutService::new(state.pool(), &state.config().default_address)
        .checkout(user.id, &body.items)
        .await?;

    Ok(Json(receipt))
}

/// `DELETE /orders/{id}`: cancel a pending order and restock it.
#[instrument(skip_all, fields(user_id = %user.id, order_id = %id))]
pub async fn cancel(
    RequireAuth(user): RequireAuth,
    State(state): State<AppState>,
    Path(id): Path<OrderId>,
) -> Result<StatusCode> {
    CheckoutService::new(state.pool(), &state.config().default_address)
        .cancel(id, user.id)
        .await?;

    Ok(StatusCode::NO_CONTENT)
}

/// `PUT /orders/{id}/status` (admin): advance fulfillment.
#[instrument(skip_all, fields(admin_id = %admin.id, order_id = %id))]
pub async fn update_status(
    RequireAdmin(admin): RequireAdmin,
    State(state): State<AppState>,
    Path(id): Path<OrderId>,
    Json(body): Json<UpdateStatusRequest>,
) -> Result<Json<Order>> {
    let status = body
        .status
        .trim()
        .parse::<OrderStatus>()
        .map_err(|e| AppError::Validation(e.to_string()))?;

    let order = CheckoutService::new(state.pool(), &state.config().default_address)
        .update_status(id, status)
        .await?;

    Ok(Json(order))
}
