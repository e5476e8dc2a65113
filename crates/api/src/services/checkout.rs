//! Checkout, cancellation and fulfillment status updates.
//!
//! Every operation here runs in one database transaction. Stock is checked
//! and decremented against rows locked with `SELECT ... FOR UPDATE`, so two
//! concurrent checkouts for the last unit of a product cannot both succeed,
//! and a failure at any step leaves inventory and orders untouched.
//!
//! The arithmetic lives in [`merge_lines`] and [`plan`], which are pure and
//! unit-tested without a database.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};
use sqlx::PgPool;
use thiserror::Error;
use tracing::instrument;

use ecom_core::{OrderId, OrderStatus, Price, PriceError, ProductId, UserId};

use crate::db::{OrderRepository, ProductRepository, RepositoryError};
use crate::models::{NewOrder, NewOrderItem, Order, Product};

/// One requested cart line.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
pub struct CartLine {
    #[serde(rename = "productID")]
    pub product_id: ProductId,
    pub quantity: i32,
}

/// Result of a successful checkout.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct CheckoutReceipt {
    #[serde(rename = "orderID")]
    pub order_id: OrderId,
    #[serde(rename = "totalPrice")]
    pub total_price: Price,
}

/// A cart line priced against the locked catalog rows.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PlannedLine {
    pub product_id: ProductId,
    pub quantity: i32,
    pub unit_price: Price,
}

/// Everything checkout needs to write, computed before any write happens.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CheckoutPlan {
    pub lines: Vec<PlannedLine>,
    pub total: Price,
}

/// Errors from checkout, cancellation and status updates.
#[derive(Debug, Error)]
pub enum CheckoutError {
    #[error("cart is empty")]
    EmptyCart,

    #[error("invalid quantity {quantity} for product {product_id}")]
    InvalidQuantity { product_id: ProductId, quantity: i32 },

    #[error("product {0} not found")]
    ProductNotFound(ProductId),

    #[error("product {product_id} is not available in the quantity requested ({requested} requested, {available} in stock)")]
    InsufficientStock {
        product_id: ProductId,
        requested: i32,
        available: i32,
    },

    #[error("order total is too large")]
    TotalTooLarge,

    #[error("order not found")]
    OrderNotFound,

    #[error("order belongs to another user")]
    NotOwner,

    #[error("cannot {action} order in status {status}")]
    InvalidState {
        status: OrderStatus,
        action: &'static str,
    },

    #[error("database error: {0}")]
    Repository(#[from] RepositoryError),
}

impl From<sqlx::Error> for CheckoutError {
    fn from(e: sqlx::Error) -> Self {
        Self::Repository(RepositoryError::Database(e))
    }
}

impl From<PriceError> for CheckoutError {
    fn from(_: PriceError) -> Self {
        Self::TotalTooLarge
    }
}

/// Validate quantities and merge repeated products into one line each.
///
/// Lines keep the order in which each product first appears.
///
/// # Errors
///
/// Returns `CheckoutError::InvalidQuantity` for any quantity below one (or a
/// merged quantity that overflows) and `CheckoutError::EmptyCart` for no lines.
pub fn merge_lines(lines: &[CartLine]) -> Result<Vec<CartLine>, CheckoutError> {
    let mut merged: Vec<CartLine> = Vec::with_capacity(lines.len());
    // product id -> position in `merged`
    let mut index: BTreeMap<ProductId, usize> = BTreeMap::new();

    for line in lines {
        if line.quantity <= 0 {
            return Err(CheckoutError::InvalidQuantity {
                product_id: line.product_id,
                quantity: line.quantity,
            });
        }

        match index.get(&line.product_id).and_then(|&i| merged.get_mut(i)) {
            Some(existing) => {
                existing.quantity = existing.quantity.checked_add(line.quantity).ok_or(
                    CheckoutError::InvalidQuantity {
                        product_id: line.product_id,
                        quantity: i32::MAX,
                    },
                )?;
            }
            None => {
                index.insert(line.product_id, merged.len());
                merged.push(*line);
            }
        }
    }

    if merged.is_empty() {
        return Err(CheckoutError::EmptyCart);
    }
    Ok(merged)
}

/// Price merged cart lines against current catalog rows and check stock.
///
/// Prices always come from `products`; nothing the client sent is trusted
/// beyond product ids and quantities.
///
/// # Errors
///
/// Returns `CheckoutError::ProductNotFound` for an id missing from `products`,
/// `CheckoutError::InsufficientStock` when a quantity exceeds stock on hand,
/// and `CheckoutError::TotalTooLarge` if the total does not fit an order.
pub fn plan(lines: &[CartLine], products: &[Product]) -> Result<CheckoutPlan, CheckoutError> {
    let by_id: BTreeMap<ProductId, &Product> = products.iter().map(|p| (p.id, p)).collect();

    let mut planned = Vec::with_capacity(lines.len());
    let mut total = Price::ZERO;

    for line in lines {
        let product = by_id
            .get(&line.product_id)
            .ok_or(CheckoutError::ProductNotFound(line.product_id))?;

        if line.quantity > product.quantity {
            return Err(CheckoutError::InsufficientStock {
                product_id: product.id,
                requested: line.quantity,
                available: product.quantity,
            });
        }

        total = total.checked_add(product.price.times(line.quantity)?)?;
        planned.push(PlannedLine {
            product_id: product.id,
            quantity: line.quantity,
            unit_price: product.price,
        });
    }

    if total > Price::MAX {
        return Err(CheckoutError::TotalTooLarge);
    }

    Ok(CheckoutPlan {
        lines: planned,
        total,
    })
}

/// Transactional order workflows.
pub struct CheckoutService<'a> {
    pool: &'a PgPool,
    products: ProductRepository<'a>,
    orders: OrderRepository<'a>,
    default_address: &'a str,
}

impl<'a> CheckoutService<'a> {
    #[must_use]
    pub const fn new(pool: &'a PgPool, default_address: &'a str) -> Self {
        Self {
            pool,
            products: ProductRepository::new(pool),
            orders: OrderRepository::new(pool),
            default_address,
        }
    }

    /// Turn a cart into a `pending` order, decrementing stock.
    ///
    /// # Errors
    ///
    /// Returns the validation and stock errors of [`merge_lines`] and
    /// [`plan`], or `CheckoutError::Repository` if the database fails. In
    /// every error case nothing is written.
    #[instrument(skip(self, lines), fields(lines = lines.len()))]
    pub async fn checkout(
        &self,
        user_id: UserId,
        lines: &[CartLine],
    ) -> Result<CheckoutReceipt, CheckoutError> {
        let lines = merge_lines(lines)?;
        let mut ids: Vec<ProductId> = lines.iter().map(|l| l.product_id).collect();
        ids.sort_unstable();

        let mut tx = self.pool.begin().await?;

        let locked = self.products.lock_by_ids(&mut tx, &ids).await?;
        let priced = plan(&lines, &locked)?;

        for line in &priced.lines {
            self.products
                .adjust_quantity(&mut tx, line.product_id, -line.quantity)
                .await?;
        }

        let order = self
            .orders
            .create(
                &mut tx,
                &NewOrder {
                    user_id,
                    total: priced.total,
                    address: self.default_address.to_owned(),
                },
            )
            .await?;

        for line in &priced.lines {
            self.orders
                .create_item(
                    &mut tx,
                    &NewOrderItem {
                        order_id: order.id,
                        product_id: line.product_id,
                        quantity: line.quantity,
                        price: line.unit_price,
                    },
                )
                .await?;
        }

        tx.commit().await?;

        tracing::info!(order_id = %order.id, total = %priced.total, "order placed");
        Ok(CheckoutReceipt {
            order_id: order.id,
            total_price: priced.total,
        })
    }

    /// Cancel a `pending` order owned by `user_id` and restock its lines.
    ///
    /// The status change is made first, with a conditional update, and stock
    /// is restored only if that update took effect. Concurrent duplicate
    /// cancels queue on the order row lock; the second one sees `cancelled`
    /// and fails, so stock is restored exactly once.
    ///
    /// # Errors
    ///
    /// Returns `CheckoutError::OrderNotFound`, `CheckoutError::NotOwner`, or
    /// `CheckoutError::InvalidState` if the order is not pending.
    #[instrument(skip(self))]
    pub async fn cancel(&self, order_id: OrderId, user_id: UserId) -> Result<(), CheckoutError> {
        let mut tx = self.pool.begin().await?;

        let order = self
            .orders
            .lock_by_id(&mut tx, order_id)
            .await
            .map_err(not_found_as_order)?;

        if order.user_id != user_id {
            return Err(CheckoutError::NotOwner);
        }
        if !order.status.is_cancellable() {
            return Err(CheckoutError::InvalidState {
                status: order.status,
                action: "cancel",
            });
        }
        if !self.orders.cancel(&mut tx, order_id, user_id).await? {
            return Err(CheckoutError::InvalidState {
                status: order.status,
                action: "cancel",
            });
        }

        let mut restock: BTreeMap<ProductId, i32> = BTreeMap::new();
        for item in self.orders.items_in_tx(&mut tx, order_id).await? {
            *restock.entry(item.product_id).or_default() += item.quantity;
        }

        let ids: Vec<ProductId> = restock.keys().copied().collect();
        let present: Vec<ProductId> = self
            .products
            .lock_by_ids(&mut tx, &ids)
            .await?
            .into_iter()
            .map(|p| p.id)
            .collect();

        for (product_id, quantity) in restock {
            if present.binary_search(&product_id).is_err() {
                tracing::warn!(%order_id, %product_id, quantity, "product deleted, skipping restock");
                continue;
            }
            self.products
                .adjust_quantity(&mut tx, product_id, quantity)
                .await?;
        }

        tx.commit().await?;

        tracing::info!(%order_id, "order cancelled");
        Ok(())
    }

    /// Move an order along its fulfillment path (admin only).
    ///
    /// # Errors
    ///
    /// Returns `CheckoutError::OrderNotFound` or, when the transition is not
    /// allowed from the current status, `CheckoutError::InvalidState`.
    #[instrument(skip(self))]
    pub async fn update_status(
        &self,
        order_id: OrderId,
        status: OrderStatus,
    ) -> Result<Order, CheckoutError> {
        let mut tx = self.pool.begin().await?;

        let order = self
            .orders
            .lock_by_id(&mut tx, order_id)
            .await
            .map_err(not_found_as_order)?;

        if !order.status.can_fulfill_to(status) {
            return Err(CheckoutError::InvalidState {
                status: order.status,
                action: match status {
                    OrderStatus::Pending => "reopen",
                    OrderStatus::Shipped => "ship",
                    OrderStatus::Delivered => "deliver",
                    OrderStatus::Cancelled => "administratively cancel",
                },
            });
        }

        let updated = self.orders.update_status(&mut tx, order_id, status).await?;
        tx.commit().await?;

        tracing::info!(%order_id, from = %order.status, to = %status, "order status updated");
        Ok(updated)
    }
}

fn not_found_as_order(e: RepositoryError) -> CheckoutError {
    match e {
        RepositoryError::NotFound => CheckoutError::OrderNotFound,
        other => CheckoutError::Repository(other),
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use chrono::Utc;

    use super::*;

    fn line(id: i32, quantity: i32) -> CartLine {
        CartLine {
            product_id: ProductId::new(id),
            quantity,
        }
    }

    fn product(id: i32, price: &str, quantity: i32) -> Product {
        Product {
            id: ProductId::new(id),
            name: format!("product {id}"),
            description: String::new(),
            image: String::new(),
            price: Price::new(price.parse().unwrap()).unwrap(),
            quantity,
            created_at: Utc::now(),
        }
    }

    #[test]
    fn test_merge_sums_duplicates_in_first_seen_order() {
        let merged = merge_lines(&[line(3, 1), line(1, 2), line(3, 4)]).unwrap();
        assert_eq!(merged, vec![line(3, 5), line(1, 2)]);
    }

    #[test]
    fn test_merge_rejects_non_positive_quantities() {
        for bad in [0, -1] {
            let err = merge_lines(&[line(1, 1), line(2, bad)]).unwrap_err();
            assert!(matches!(
                err,
                CheckoutError::InvalidQuantity { quantity, .. } if quantity == bad
            ));
        }
    }

    #[test]
    fn test_merge_rejects_overflowing_sum() {
        let err = merge_lines(&[line(1, i32::MAX), line(1, 1)]).unwrap_err();
        assert!(matches!(err, CheckoutError::InvalidQuantity { .. }));
    }

    #[test]
    fn test_merge_large_cart_is_fast() {
        let lines: Vec<CartLine> = (1..=70_000).chain(1..=70_000).map(|id| line(id, 1)).collect();

        let started = std::time::Instant::now();
        let merged = merge_lines(&lines).unwrap();

        assert!(started.elapsed() < std::time::Duration::from_secs(1));
        assert_eq!(merged.len(), 70_000);
        assert_eq!(merged[0], line(1, 2));
        assert_eq!(merged[69_999], line(70_000, 2));
    }

    #[test]
    fn test_merge_empty_cart() {
        assert!(matches!(merge_lines(&[]), Err(CheckoutError::EmptyCart)));
    }

    #[test]
    fn test_plan_totals_catalog_prices() {
        let products = [product(1, "19.99", 10), product(2, "5.00", 1)];
        let plan = plan(&[line(1, 3), line(2, 1)], &products).unwrap();

        assert_eq!(plan.total, Price::new("64.97".parse().unwrap()).unwrap());
        assert_eq!(plan.lines.len(), 2);
        assert_eq!(plan.lines[0].unit_price, products[0].price);
        assert_eq!(plan.lines[1].quantity, 1);
    }

    #[test]
    fn test_plan_exact_stock_is_enough() {
        let plan = plan(&[line(1, 2)], &[product(1, "1", 2)]).unwrap();
        assert_eq!(plan.lines[0].quantity, 2);
    }

    #[test]
    fn test_plan_insufficient_stock() {
        let err = plan(&[line(1, 3)], &[product(1, "1", 2)]).unwrap_err();
        assert!(matches!(
            err,
            CheckoutError::InsufficientStock {
                requested: 3,
                available: 2,
                ..
            }
        ));
    }

    #[test]
    fn test_plan_missing_product() {
        let err = plan(&[line(1, 1), line(9, 1)], &[product(1, "1", 5)]).unwrap_err();
        assert!(matches!(err, CheckoutError::ProductNotFound(id) if id == ProductId::new(9)));
    }

    #[test]
    fn test_plan_rejects_total_beyond_column() {
        let err = plan(&[line(1, 2)], &[product(1, "9999999999.99", 5)]).unwrap_err();
        assert!(matches!(err, CheckoutError::TotalTooLarge));
    }

    #[test]
    fn test_receipt_json_shape() {
        let receipt = CheckoutReceipt {
            order_id: OrderId::new(7),
            total_price: Price::new("12.5".parse().unwrap()).unwrap(),
        };
        let json = serde_json::to_value(receipt).unwrap();
        assert_eq!(json, serde_json::json!({"orderID": 7, "totalPrice": "12.50"}));
    }

    #[test]
    fn test_cart_line_field_names() {
        let parsed: CartLine = serde_json::from_str(r#"{"productID": 4, "quantity": 2}"#).unwrap();
        assert_eq!(parsed, line(4, 2));
    }
}
