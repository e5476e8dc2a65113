//! End-to-end test helpers for the ecom API.
//!
//! # Running Tests
//!
//! ```bash
//! # Migrate and start the server
//! cargo run -p ecom-cli -- migrate
//! cargo run -p ecom-api
//!
//! # Run the ignored end-to-end tests against it
//! ECOM_API_URL=http://127.0.0.1:8080 cargo test -p ecom-integration-tests -- --ignored
//! ```
//!
//! Every test registers fresh accounts with random emails and creates its
//! own products, so runs do not interfere with each other or with existing
//! data.

#![allow(clippy::missing_panics_doc)]

use reqwest::{Client, Response, StatusCode};
use serde_json::{Value, json};
use uuid::Uuid;

/// Password used for every account the tests register.
pub const PASSWORD: &str = "integration-pass-1";

/// Base URL of the running API, including the `/api/v1` prefix.
#[must_use]
pub fn api_url() -> String {
    let base =
        std::env::var("ECOM_API_URL").unwrap_or_else(|_| "http://127.0.0.1:8080".to_string());
    format!("{}/api/v1", base.trim_end_matches('/'))
}

/// A random, unique email address.
#[must_use]
pub fn unique_email() -> String {
    format!("it-{}@example.com", Uuid::new_v4().simple())
}

/// HTTP client bound to the API under test.
#[derive(Debug, Clone)]
pub struct Api {
    client: Client,
    base: String,
}

impl Default for Api {
    fn default() -> Self {
        Self::new()
    }
}

impl Api {
    #[must_use]
    pub fn new() -> Self {
        Self {
            client: Client::new(),
            base: api_url(),
        }
    }

    /// Send a JSON request, optionally authenticated.
    pub async fn send(
        &self,
        method: reqwest::Method,
        path: &str,
        token: Option<&str>,
        body: Option<Value>,
    ) -> Response {
        let mut request = self.client.request(method, format!("{}{path}", self.base));
        if let Some(token) = token {
            request = request.bearer_auth(token);
        }
        if let Some(body) = body {
            request = request.json(&body);
        }
        request.send().await.expect("request failed")
    }

    /// Register an account and return the raw response.
    pub async fn register(&self, email: &str, role: Option<&str>) -> Response {
        let mut body = json!({
            "firstName": "Integration",
            "lastName": "Test",
            "email": email,
            "password": PASSWORD,
        });
        if let Some(role) = role {
            body["role"] = json!(role);
        }
        self.send(reqwest::Method::POST, "/users/register", None, Some(body))
            .await
    }

    /// Log in and return the session token.
    pub async fn login(&self, email: &str) -> String {
        let resp = self
            .send(
                reqwest::Method::POST,
                "/users/login",
                None,
                Some(json!({"email": email, "password": PASSWORD})),
            )
            .await;
        assert_eq!(resp.status(), StatusCode::OK);
        let body: Value = resp.json().await.expect("login body");
        body["token"].as_str().expect("token").to_owned()
    }

    /// Register a fresh account with the given role and log it in.
    pub async fn session(&self, role: &str) -> String {
        let email = unique_email();
        let resp = self.register(&email, Some(role)).await;
        assert_eq!(resp.status(), StatusCode::CREATED);
        self.login(&email).await
    }

    /// Create a product as an admin and return its JSON.
    pub async fn create_product(&self, admin_token: &str, price: &str, quantity: i32) -> Value {
        let resp = self
            .send(
                reqwest::Method::POST,
                "/products",
                Some(admin_token),
                Some(json!({
                    "name": format!("Item {}", Uuid::new_v4().simple()),
                    "description": "integration test product",
                    "image": "",
                    "price": price,
                    "quantity": quantity,
                })),
            )
            .await;
        assert_eq!(resp.status(), StatusCode::CREATED);
        resp.json().await.expect("product body")
    }

    /// Current stock of a product.
    pub async fn stock(&self, token: &str, product_id: i64) -> i64 {
        let resp = self
            .send(
                reqwest::Method::GET,
                &format!("/products/{product_id}"),
                Some(token),
                None,
            )
            .await;
        assert_eq!(resp.status(), StatusCode::OK);
        let body: Value = resp.json().await.expect("product body");
        body["quantity"].as_i64().expect("quantity")
    }

    /// Check out `(product_id, quantity)` lines.
    pub async fn checkout(&self, token: &str, lines: &[(i64, i64)]) -> Response {
        let items: Vec<Value> = lines
            .iter()
            .map(|(id, qty)| json!({"productID": id, "quantity": qty}))
            .collect();
        self.send(
            reqwest::Method::POST,
            "/orders",
            Some(token),
            Some(json!({ "items": items })),
        )
        .await
    }

    /// Cancel an order.
    pub async fn cancel(&self, token: &str, order_id: i64) -> Response {
        self.send(
            reqwest::Method::DELETE,
            &format!("/orders/{order_id}"),
            Some(token),
            None,
        )
        .await
    }
}

/// Extract the numeric `id` field of a JSON object.
#[must_use]
pub fn id_of(value: &Value, field: &str) -> i64 {
    value[field].as_i64().expect("numeric id")
}
