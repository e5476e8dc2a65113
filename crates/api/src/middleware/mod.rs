//! HTTP middleware and extractors.
//!
//! # Middleware Order (outermost first)
//!
//! 1. Sentry layers (capture errors, transactions)
//! 2. `TraceLayer` (request span)
//! 3. Request ID (add unique ID to each request)
//!
//! Authentication is not a layer: handlers opt in with the
//! [`RequireAuth`] and [`RequireAdmin`] extractors.

pub mod auth;
pub mod request_id;

pub use auth::{RequireAdmin, RequireAuth};
pub use request_id::request_id_middleware;
