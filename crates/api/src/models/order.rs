//! Order and order line types.

use chrono::{DateTime, Utc};
use serde::Serialize;

use ecom_core::{OrderId, OrderItemId, OrderStatus, Price, ProductId, UserId};

/// A placed order.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Order {
    pub id: OrderId,
    #[serde(rename = "userID")]
    pub user_id: UserId,
    /// Sum of the line totals at checkout time.
    pub total: Price,
    pub status: OrderStatus,
    pub address: String,
    pub created_at: DateTime<Utc>,
}

/// One line of an order.
///
/// `price` is the unit price captured at checkout. `product_id` is a snapshot
/// reference and may point at a product that has since been deleted.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct OrderItem {
    pub id: OrderItemId,
    #[serde(rename = "orderID")]
    pub order_id: OrderId,
    #[serde(rename = "productID")]
    pub product_id: ProductId,
    pub quantity: i32,
    pub price: Price,
    pub created_at: DateTime<Utc>,
}

/// An order together with its lines.
#[derive(Debug, Clone, Serialize)]
pub struct OrderDetail {
    pub order: Order,
    pub items: Vec<OrderItem>,
}

#[derive(Debug, Clone)]
pub struct NewOrder {
    pub user_id: UserId,
    pub total: Price,
    pub address: String,
}

#[derive(Debug, Clone, Copy)]
pub struct NewOrderItem {
    pub order_id: OrderId,
    pub product_id: ProductId,
    pub quantity: i32,
    pub price: Price,
}
