//! Business logic services.
//!
//! - [`auth`] - Password hashing, session tokens, registration and login
//! - [`checkout`] - Checkout, cancellation and fulfillment status updates

pub mod auth;
pub mod checkout;
