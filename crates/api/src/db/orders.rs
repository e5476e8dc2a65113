//! Order and order line repository.

use chrono::{DateTime, Utc};
use sqlx::{PgPool, Postgres, Transaction};

use ecom_core::{OrderId, OrderItemId, OrderStatus, Price, ProductId, UserId};

use super::RepositoryError;
use crate::models::{NewOrder, NewOrderItem, Order, OrderItem};

const ORDER_COLUMNS: &str = "id, user_id, total, status, address, created_at";
const ITEM_COLUMNS: &str = "id, order_id, product_id, quantity, price, created_at";

// =============================================================================
// Internal Row Types
// =============================================================================

#[derive(Debug, sqlx::FromRow)]
struct OrderRow {
    id: OrderId,
    user_id: UserId,
    total: Price,
    status: OrderStatus,
    address: String,
    created_at: DateTime<Utc>,
}

impl From<OrderRow> for Order {
    fn from(row: OrderRow) -> Self {
        Self {
            id: row.id,
            user_id: row.user_id,
            total: row.total,
            status: row.status,
            address: row.address,
            created_at: row.created_at,
        }
    }
}

#[derive(Debug, sqlx::FromRow)]
struct OrderItemRow {
    id: OrderItemId,
    order_id: OrderId,
    product_id: ProductId,
    quantity: i32,
    price: Price,
    created_at: DateTime<Utc>,
}

impl From<OrderItemRow> for OrderItem {
    fn from(row: OrderItemRow) -> Self {
        Self {
            id: row.id,
            order_id: row.order_id,
            product_id: row.product_id,
            quantity: row.quantity,
            price: row.price,
            created_at: row.created_at,
        }
    }
}

// =============================================================================
// Repository
// =============================================================================

/// Repository for orders and their lines.
pub struct OrderRepository<'a> {
    pool: &'a PgPool,
}

impl<'a> OrderRepository<'a> {
    #[must_use]
    pub const fn new(pool: &'a PgPool) -> Self {
        Self { pool }
    }

    /// A user's orders, newest first.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the query fails.
    pub async fn get_by_user_id(&self, user_id: UserId) -> Result<Vec<Order>, RepositoryError> {
        let sql = format!(
            "SELECT {ORDER_COLUMNS} FROM orders WHERE user_id = $1 ORDER BY created_at DESC, id DESC"
        );
        let rows = sqlx::query_as::<_, OrderRow>(&sql)
            .bind(user_id)
            .fetch_all(self.pool)
            .await?;

        Ok(rows.into_iter().map(Order::from).collect())
    }

    /// # Errors
    ///
    /// Returns `RepositoryError::NotFound` if no order has this id.
    pub async fn get_by_id(&self, id: OrderId) -> Result<Order, RepositoryError> {
        let sql = format!("SELECT {ORDER_COLUMNS} FROM orders WHERE id = $1");
        sqlx::query_as::<_, OrderRow>(&sql)
            .bind(id)
            .fetch_optional(self.pool)
            .await?
            .map(Order::from)
            .ok_or(RepositoryError::NotFound)
    }

    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the query fails.
    pub async fn get_items_by_order_id(
        &self,
        order_id: OrderId,
    ) -> Result<Vec<OrderItem>, RepositoryError> {
        let sql = format!("SELECT {ITEM_COLUMNS} FROM order_items WHERE order_id = $1 ORDER BY id");
        let rows = sqlx::query_as::<_, OrderItemRow>(&sql)
            .bind(order_id)
            .fetch_all(self.pool)
            .await?;

        Ok(rows.into_iter().map(OrderItem::from).collect())
    }

    // =========================================================================
    // Transaction-scoped operations
    // =========================================================================

    /// Insert a new `pending` order.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the insert fails.
    pub async fn create(
        &self,
        tx: &mut Transaction<'_, Postgres>,
        order: &NewOrder,
    ) -> Result<Order, RepositoryError> {
        let sql = format!(
            "INSERT INTO orders (user_id, total, status, address)
             VALUES ($1, $2, $3, $4)
             RETURNING {ORDER_COLUMNS}"
        );
        let row = sqlx::query_as::<_, OrderRow>(&sql)
            .bind(order.user_id)
            .bind(order.total)
            .bind(OrderStatus::Pending)
            .bind(&order.address)
            .fetch_one(&mut **tx)
            .await?;

        Ok(row.into())
    }

    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the insert fails.
    pub async fn create_item(
        &self,
        tx: &mut Transaction<'_, Postgres>,
        item: &NewOrderItem,
    ) -> Result<OrderItem, RepositoryError> {
        let sql = format!(
            "INSERT INTO order_items (order_id, product_id, quantity, price)
             VALUES ($1, $2, $3, $4)
             RETURNING {ITEM_COLUMNS}"
        );
        let row = sqlx::query_as::<_, OrderItemRow>(&sql)
            .bind(item.order_id)
            .bind(item.product_id)
            .bind(item.quantity)
            .bind(item.price)
            .fetch_one(&mut **tx)
            .await?;

        Ok(row.into())
    }

    /// Lock an order row for the rest of the transaction.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::NotFound` if no order has this id.
    pub async fn lock_by_id(
        &self,
        tx: &mut Transaction<'_, Postgres>,
        id: OrderId,
    ) -> Result<Order, RepositoryError> {
        let sql = format!("SELECT {ORDER_COLUMNS} FROM orders WHERE id = $1 FOR UPDATE");
        sqlx::query_as::<_, OrderRow>(&sql)
            .bind(id)
            .fetch_optional(&mut **tx)
            .await?
            .map(Order::from)
            .ok_or(RepositoryError::NotFound)
    }

    /// Lines of an order, read inside the transaction that holds its lock.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the query fails.
    pub async fn items_in_tx(
        &self,
        tx: &mut Transaction<'_, Postgres>,
        order_id: OrderId,
    ) -> Result<Vec<OrderItem>, RepositoryError> {
        let sql = format!("SELECT {ITEM_COLUMNS} FROM order_items WHERE order_id = $1 ORDER BY id");
        let rows = sqlx::query_as::<_, OrderItemRow>(&sql)
            .bind(order_id)
            .fetch_all(&mut **tx)
            .await?;

        Ok(rows.into_iter().map(OrderItem::from).collect())
    }

    /// # Errors
    ///
    /// Returns `RepositoryError::NotFound` if no order has this id.
    pub async fn update_status(
        &self,
        tx: &mut Transaction<'_, Postgres>,
        id: OrderId,
        status: OrderStatus,
    ) -> Result<Order, RepositoryError> {
        let sql = format!("UPDATE orders SET status = $2 WHERE id = $1 RETURNING {ORDER_COLUMNS}");
        sqlx::query_as::<_, OrderRow>(&sql)
            .bind(id)
            .bind(status)
            .fetch_optional(&mut **tx)
            .await?
            .map(Order::from)
            .ok_or(RepositoryError::NotFound)
    }

    /// Move an order from `pending` to `cancelled` if, and only if, it is
    /// still pending and belongs to `user_id`.
    ///
    /// Returns whether a row changed.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the update fails.
    pub async fn cancel(
        &self,
        tx: &mut Transaction<'_, Postgres>,
        id: OrderId,
        user_id: UserId,
    ) -> Result<bool, RepositoryError> {
        let result = sqlx::query(
            "UPDATE orders SET status = $3 WHERE id = $1 AND user_id = $2 AND status = $4",
        )
        .bind(id)
        .bind(user_id)
        .bind(OrderStatus::Cancelled)
        .bind(OrderStatus::Pending)
        .execute(&mut **tx)
        .await?;

        Ok(result.rows_affected() == 1)
    }
}
