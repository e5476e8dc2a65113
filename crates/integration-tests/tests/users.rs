//! Registration and login against a running API.
//!
//! Run with: `cargo test -p ecom-integration-tests -- --ignored`

#![allow(clippy::unwrap_used)]

use reqwest::{Method, StatusCode};
use serde_json::{Value, json};

use ecom_integration_tests::{Api, PASSWORD, unique_email};

#[tokio::test]
#[ignore = "Requires running API server and database"]
async fn test_register_then_login() {
    let api = Api::new();
    let email = unique_email();

    let resp = api.register(&email, None).await;
    assert_eq!(resp.status(), StatusCode::CREATED);
    let body: Value = resp.json().await.unwrap();
    assert!(body["userID"].as_i64().is_some());

    let token = api.login(&email).await;
    assert!(!token.is_empty());

    // Login is case-insensitive on the email
    let resp = api
        .send(
            Method::POST,
            "/users/login",
            None,
            Some(json!({"email": email.to_uppercase(), "password": PASSWORD})),
        )
        .await;
    assert_eq!(resp.status(), StatusCode::OK);
}

#[tokio::test]
#[ignore = "Requires running API server and database"]
async fn test_duplicate_registration_conflicts() {
    let api = Api::new();
    let email = unique_email();

    assert_eq!(api.register(&email, None).await.status(), StatusCode::CREATED);
    let resp = api.register(&email, None).await;
    assert_eq!(resp.status(), StatusCode::CONFLICT);
}

#[tokio::test]
#[ignore = "Requires running API server and database"]
async fn test_wrong_password_and_unknown_email_look_the_same() {
    let api = Api::new();
    let email = unique_email();
    assert_eq!(api.register(&email, None).await.status(), StatusCode::CREATED);

    let wrong_password = api
        .send(
            Method::POST,
            "/users/login",
            None,
            Some(json!({"email": email, "password": "not-the-password"})),
        )
        .await;
    let unknown_email = api
        .send(
            Method::POST,
            "/users/login",
            None,
            Some(json!({"email": unique_email(), "password": PASSWORD})),
        )
        .await;

    assert_eq!(wrong_password.status(), StatusCode::UNAUTHORIZED);
    assert_eq!(unknown_email.status(), StatusCode::UNAUTHORIZED);
    let a: Value = wrong_password.json().await.unwrap();
    let b: Value = unknown_email.json().await.unwrap();
    assert_eq!(a, b);
}
