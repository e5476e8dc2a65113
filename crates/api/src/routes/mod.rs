//! HTTP route handlers.
//!
//! # Route Structure
//!
//! ```text
//! GET    /health                      - Liveness
//! GET    /health/ready                - Readiness (database reachable)
//!
//! # Users (base path /api/v1)
//! POST   /users/register              - Create an account
//! POST   /users/login                 - Exchange credentials for a token
//!
//! # Products (bearer token)
//! GET    /products                    - Catalog, optionally ?ids=1,2
//! GET    /products/{id}               - One product
//! POST   /products                    - Create (admin)
//! PUT    /products/{id}               - Replace (admin)
//! DELETE /products/{id}               - Delete (admin)
//!
//! # Orders (bearer token)
//! GET    /orders                      - Caller's orders
//! POST   /orders                      - Checkout
//! GET    /orders/{id}                 - Order with lines (owner or admin)
//! DELETE /orders/{id}                 - Cancel a pending order (owner)
//! PUT    /orders/{id}/status          - Advance fulfillment (admin)
//! ```

pub mod orders;
pub mod products;
pub mod users;

use axum::{
    Router,
    body::Body,
    extract::State,
    http::{Request, StatusCode},
    middleware,
    routing::{get, post, put},
};
use tower_http::trace::TraceLayer;

use crate::middleware::request_id_middleware;
use crate::state::AppState;

/// Base path for the JSON API.
pub const API_BASE_PATH: &str = "/api/v1";

/// Routes under [`API_BASE_PATH`].
pub fn api_routes() -> Router<AppState> {
    Router::new()
        .route("/users/register", post(users::register))
        .route("/users/login", post(users::login))
        .route("/products", get(products::list).post(products::create))
        .route(
            "/products/{id}",
            get(products::get)
                .put(products::update)
                .delete(products::delete),
        )
        .route("/orders", get(orders::list).post(orders::checkout))
        .route("/orders/{id}", get(orders::get).delete(orders::cancel))
        .route("/orders/{id}/status", put(orders::update_status))
}

/// The complete application: health checks, API routes, tracing and
/// request IDs. Sentry layers are added by the binary.
pub fn app(state: AppState) -> Router {
    Router::new()
        .route("/health", get(health))
        .route("/health/ready", get(readiness))
        .nest(API_BASE_PATH, api_routes())
        .layer(middleware::from_fn(request_id_middleware))
        .layer(TraceLayer::new_for_http().make_span_with(|request: &Request<Body>| {
            tracing::info_span!(
                "request",
                method = %request.method(),
                uri = %request.uri(),
                request_id = tracing::field::Empty,
                user_id = tracing::field::Empty,
            )
        }))
        .with_state(state)
}

/// Liveness health check endpoint.
///
/// Returns "ok" if the server is running. Does not check dependencies.
async fn health() -> &'static str {
    "ok"
}

/// Readiness health check endpoint.
///
/// Returns 503 Service Unavailable if the database is not reachable.
async fn readiness(State(state): State<AppState>) -> StatusCode {
    match sqlx::query("SELECT 1").fetch_one(state.pool()).await {
        Ok(_) => StatusCode::OK,
        Err(e) => {
            tracing::warn!(error = %e, "readiness check failed");
            StatusCode::SERVICE_UNAVAILABLE
        }
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use std::time::Duration;

    use axum::body::to_bytes;
    use secrecy::{ExposeSecret, SecretString};
    use serde_json::{Value, json};
    use sqlx::postgres::PgPoolOptions;
    use tower::ServiceExt;

    use ecom_core::{Role, UserId};

    use super::*;
    use crate::config::{ApiConfig, JwtConfig};

    const SECRET: &str = "k1-aB3$xY9!mK2@nL5#pQ7&rT0*uW4^zC6";

    /// State backed by a pool that never connects. Only requests rejected
    /// before touching the database can be exercised here.
    fn state() -> AppState {
        let database_url = SecretString::from("postgres://nobody@127.0.0.1:1/none");
        let pool = PgPoolOptions::new()
            .connect_lazy(database_url.expose_secret())
            .unwrap();
        AppState::new(test_config(database_url), pool)
    }

    fn test_config(database_url: SecretString) -> ApiConfig {
        ApiConfig {
            database_url,
            host: "127.0.0.1".parse().unwrap(),
            port: 0,
            jwt: JwtConfig {
                secret: SecretString::from(SECRET),
                ttl: Duration::from_secs(3600),
            },
            default_address: "default address".to_string(),
            sentry_dsn: None,
            sentry_environment: None,
        }
    }

    fn token(state: &AppState, role: Role) -> String {
        state.tokens().issue(UserId::new(1), role).unwrap()
    }

    async fn send(
        state: AppState,
        method: &str,
        uri: &str,
        token: Option<&str>,
        body: Option<Value>,
    ) -> (StatusCode, Value) {
        let mut builder = Request::builder().method(method).uri(uri);
        if let Some(t) = token {
            builder = builder.header("authorization", format!("Bearer {t}"));
        }
        let request = match body {
            Some(json) => builder
                .header("content-type", "application/json")
                .body(Body::from(json.to_string()))
                .unwrap(),
            None => builder.body(Body::empty()).unwrap(),
        };

        let response = app(state).oneshot(request).await.unwrap();
        let status = response.status();
        let bytes = to_bytes(response.into_body(), usize::MAX).await.unwrap();
        let value = serde_json::from_slice(&bytes).unwrap_or(Value::Null);
        (status, value)
    }

    #[tokio::test]
    async fn test_health() {
        let response = app(state())
            .oneshot(Request::get("/health").body(Body::empty()).unwrap())
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::OK);
    }

    #[tokio::test]
    async fn test_products_require_token() {
        let (status, body) = send(state(), "GET", "/api/v1/products", None, None).await;
        assert_eq!(status, StatusCode::UNAUTHORIZED);
        assert_eq!(body, json!({"error": "missing authorization token"}));
    }

    #[tokio::test]
    async fn test_forged_token_rejected() {
        let (status, _) = send(
            state(),
            "GET",
            "/api/v1/orders",
            Some("eyJhbGciOiJIUzI1NiJ9.eyJzdWIiOiIxIn0.bogus"),
            None,
        )
        .await;
        assert_eq!(status, StatusCode::UNAUTHORIZED);
    }

    #[tokio::test]
    async fn test_non_admin_cannot_create_product() {
        let state = state();
        let user_token = token(&state, Role::User);
        let (status, body) = send(
            state,
            "POST",
            "/api/v1/products",
            Some(&user_token),
            Some(json!({"name": "Mug", "price": "9.99", "quantity": 5})),
        )
        .await;
        assert_eq!(status, StatusCode::FORBIDDEN);
        assert_eq!(body, json!({"error": "permission denied"}));
    }

    #[tokio::test]
    async fn test_auth_checked_before_body() {
        // An invalid body from a non-admin is still a 403, not a 400.
        let state = state();
        let user_token = token(&state, Role::User);
        let (status, _) = send(
            state,
            "PUT",
            "/api/v1/orders/1/status",
            Some(&user_token),
            Some(json!({"nonsense": true})),
        )
        .await;
        assert_eq!(status, StatusCode::FORBIDDEN);
    }

    #[tokio::test]
    async fn test_admin_invalid_status_label() {
        let state = state();
        let admin_token = token(&state, Role::Admin);
        let (status, body) = send(
            state,
            "PUT",
            "/api/v1/orders/1/status",
            Some(&admin_token),
            Some(json!({"status": "teleported"})),
        )
        .await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert_eq!(body, json!({"error": "invalid order status: teleported"}));
    }

    #[tokio::test]
    async fn test_admin_invalid_product_body() {
        let state = state();
        let admin_token = token(&state, Role::Admin);
        let (status, body) = send(
            state,
            "POST",
            "/api/v1/products",
            Some(&admin_token),
            Some(json!({"name": "Mug", "price": "9.99", "quantity": -1})),
        )
        .await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert_eq!(body, json!({"error": "quantity cannot be negative"}));
    }

    #[tokio::test]
    async fn test_admin_price_beyond_column_is_validation_error() {
        let state = state();
        let admin_token = token(&state, Role::Admin);
        let (status, body) = send(
            state,
            "POST",
            "/api/v1/products",
            Some(&admin_token),
            Some(json!({"name": "Mug", "price": "100000000000.00", "quantity": 1})),
        )
        .await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert_eq!(body, json!({"error": "price must be at most 9999999999.99"}));
    }

    #[tokio::test]
    async fn test_malformed_json_is_json_error() {
        let state = state();
        let user_token = token(&state, Role::User);
        let (status, body) = send(
            state,
            "POST",
            "/api/v1/orders",
            Some(&user_token),
            Some(json!({"items": "not-a-list"})),
        )
        .await;
        assert!(status.is_client_error());
        assert!(body["error"].is_string());
    }

    #[tokio::test]
    async fn test_checkout_rejects_zero_quantity_without_database() {
        let state = state();
        let user_token = token(&state, Role::User);
        let (status, body) = send(
            state,
            "POST",
            "/api/v1/orders",
            Some(&user_token),
            Some(json!({"items": [{"productID": 1, "quantity": 0}]})),
        )
        .await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert_eq!(body, json!({"error": "invalid quantity 0 for product 1"}));
    }

    #[tokio::test]
    async fn test_empty_ids_filter_returns_empty_list_without_database() {
        let state = state();
        let user_token = token(&state, Role::User);
        let (status, body) =
            send(state, "GET", "/api/v1/products?ids=", Some(&user_token), None).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body, json!([]));
    }

    #[tokio::test]
    async fn test_bad_path_id_is_json_error() {
        let state = state();
        let user_token = token(&state, Role::User);
        let (status, body) =
            send(state, "GET", "/api/v1/products/abc", Some(&user_token), None).await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert!(body["error"].is_string());
    }

    #[tokio::test]
    async fn test_register_validation_without_database() {
        let (status, body) = send(
            state(),
            "POST",
            "/api/v1/users/register",
            None,
            Some(json!({
                "firstName": "Ada",
                "lastName": "Lovelace",
                "email": "ada@example.com",
                "password": "short"
            })),
        )
        .await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert_eq!(body, json!({"error": "password must be at least 8 characters"}));
    }
}
