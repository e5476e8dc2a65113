//! User roles and the order status state machine.

use serde::{Deserialize, Serialize};

/// Error returned when parsing a [`Role`] or [`OrderStatus`] label.
#[derive(thiserror::Error, Debug, Clone, PartialEq, Eq)]
#[error("invalid {kind}: {value}")]
pub struct ParseLabelError {
    kind: &'static str,
    value: String,
}

/// Account role used for access control.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[cfg_attr(feature = "postgres", derive(sqlx::Type))]
#[cfg_attr(
    feature = "postgres",
    sqlx(type_name = "user_role", rename_all = "snake_case")
)]
#[serde(rename_all = "snake_case")]
pub enum Role {
    /// Catalog management and order fulfillment.
    Admin,
    /// Browse, check out and manage their own orders.
    #[default]
    User,
}

impl Role {
    #[must_use]
    pub const fn as_str(&self) -> &'static str {
        match self {
            Self::Admin => "admin",
            Self::User => "user",
        }
    }

    #[must_use]
    pub const fn is_admin(&self) -> bool {
        matches!(self, Self::Admin)
    }
}

impl std::fmt::Display for Role {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

impl std::str::FromStr for Role {
    type Err = ParseLabelError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "admin" => Ok(Self::Admin),
            "user" => Ok(Self::User),
            _ => Err(ParseLabelError {
                kind: "role",
                value: s.to_owned(),
            }),
        }
    }
}

/// Order lifecycle status.
///
/// ```text
/// pending ──> shipped ──> delivered
///    │                       ^
///    ├───────────────────────┘
///    └──> cancelled
/// ```
///
/// `delivered` and `cancelled` are terminal. Only `pending` orders can be
/// cancelled, and only by their owner; fulfillment transitions are made by
/// admins.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[cfg_attr(feature = "postgres", derive(sqlx::Type))]
#[cfg_attr(
    feature = "postgres",
    sqlx(type_name = "order_status", rename_all = "snake_case")
)]
#[serde(rename_all = "snake_case")]
pub enum OrderStatus {
    #[default]
    Pending,
    Shipped,
    Delivered,
    Cancelled,
}

impl OrderStatus {
    pub const ALL: [Self; 4] = [Self::Pending, Self::Shipped, Self::Delivered, Self::Cancelled];

    #[must_use]
    pub const fn as_str(&self) -> &'static str {
        match self {
            Self::Pending => "pending",
            Self::Shipped => "shipped",
            Self::Delivered => "delivered",
            Self::Cancelled => "cancelled",
        }
    }

    /// Whether the owner may still cancel the order.
    #[must_use]
    pub const fn is_cancellable(&self) -> bool {
        matches!(self, Self::Pending)
    }

    /// Whether an admin fulfillment update may move an order from `self` to `next`.
    ///
    /// Cancellation is not a fulfillment transition and is always rejected
    /// here; it goes through the owner's cancel operation instead.
    #[must_use]
    pub const fn can_fulfill_to(&self, next: Self) -> bool {
        matches!(
            (self, next),
            (Self::Pending, Self::Shipped | Self::Delivered) | (Self::Shipped, Self::Delivered)
        )
    }
}

impl std::fmt::Display for OrderStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

impl std::str::FromStr for OrderStatus {
    type Err = ParseLabelError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::ALL
            .into_iter()
            .find(|status| status.as_str() == s)
            .ok_or_else(|| ParseLabelError {
                kind: "order status",
                value: s.to_owned(),
            })
    }
}
