//! Ecom Core - Shared domain types.
//!
//! This crate provides the types shared by every ecom component:
//! - `api` - HTTP API server (catalog, orders, checkout)
//! - `cli` - Command-line tools for migrations, admin creation and seeding
//!
//! # Architecture
//!
//! The core crate contains only types and pure logic - no I/O, no database
//! access, no HTTP. The optional `postgres` feature adds sqlx encoding so the
//! same types can be bound and decoded directly by the repositories.
//!
//! # Modules
//!
//! - [`types`] - Newtype wrappers for type-safe IDs, prices, emails, roles and
//!   the order status state machine

#![cfg_attr(not(test), forbid(unsafe_code))]

pub mod types;

pub use types::*;
