//! Ecom API library.
//!
//! The JSON API (users, catalog, orders and checkout) as a library so the
//! router can be exercised in tests and the CLI can reuse repositories.

#![cfg_attr(not(test), forbid(unsafe_code))]

pub mod config;
pub mod db;
pub mod error;
pub mod extract;
pub mod middleware;
pub mod models;
pub mod routes;
pub mod services;
pub mod state;
