//! Domain models for the API.
//!
//! These are validated domain objects, separate from the database row types
//! in [`crate::db`]. They serialize with the camelCase field names clients see.

pub mod order;
pub mod product;
pub mod user;

pub use order::{NewOrder, NewOrderItem, Order, OrderDetail, OrderItem};
pub use product::{Product, ProductInput};
pub use user::{CurrentUser, LoginUser, NewUser, RegisterUser, User};
