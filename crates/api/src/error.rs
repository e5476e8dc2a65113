//! Unified error handling with Sentry integration.
//!
//! Every handler returns `Result<T, AppError>`. The response body is always
//! `{"error": "<message>"}`; server-side failures are captured to Sentry and
//! logged, and their details are never sent to the client.

use axum::{
    Json,
    extract::rejection::{JsonRejection, PathRejection, QueryRejection},
    http::StatusCode,
    response::{IntoResponse, Response},
};
use serde_json::json;
use thiserror::Error;

use crate::db::RepositoryError;
use crate::services::auth::AuthError;
use crate::services::checkout::CheckoutError;

/// Application-level error type for the API.
#[derive(Debug, Error)]
pub enum AppError {
    #[error("Database error: {0}")]
    Database(#[from] RepositoryError),

    #[error("Auth error: {0}")]
    Auth(#[from] AuthError),

    #[error("Checkout error: {0}")]
    Checkout(#[from] CheckoutError),

    /// Malformed or missing request fields.
    #[error("Validation error: {0}")]
    Validation(String),

    #[error("Unauthorized: {0}")]
    Unauthorized(String),

    #[error("Forbidden: {0}")]
    Forbidden(String),

    #[error("Not found: {0}")]
    NotFound(String),
}

impl AppError {
    fn status(&self) -> StatusCode {
        match self {
            Self::Database(err) => match err {
                RepositoryError::NotFound => StatusCode::NOT_FOUND,
                RepositoryError::Conflict(_) => StatusCode::CONFLICT,
                RepositoryError::Database(_) | RepositoryError::DataCorruption(_) => {
                    StatusCode::INTERNAL_SERVER_ERROR
                }
            },
            Self::Auth(err) => match err {
                AuthError::InvalidCredentials | AuthError::InvalidToken => StatusCode::UNAUTHORIZED,
                AuthError::UserAlreadyExists => StatusCode::CONFLICT,
                AuthError::WeakPassword(_)
                | AuthError::InvalidEmail(_)
                | AuthError::InvalidField(_) => StatusCode::BAD_REQUEST,
                AuthError::Repository(_) | AuthError::PasswordHash | AuthError::TokenSigning(_) => {
                    StatusCode::INTERNAL_SERVER_ERROR
                }
            },
            Self::Checkout(err) => match err {
                CheckoutError::EmptyCart
                | CheckoutError::InvalidQuantity { .. }
                | CheckoutError::ProductNotFound(_)
                | CheckoutError::InsufficientStock { .. }
                | CheckoutError::TotalTooLarge
                | CheckoutError::InvalidState { .. } => StatusCode::BAD_REQUEST,
                CheckoutError::OrderNotFound => StatusCode::NOT_FOUND,
                CheckoutError::NotOwner => StatusCode::FORBIDDEN,
                CheckoutError::Repository(RepositoryError::NotFound) => StatusCode::NOT_FOUND,
                CheckoutError::Repository(_) => StatusCode::INTERNAL_SERVER_ERROR,
            },
            Self::Validation(_) => StatusCode::BAD_REQUEST,
            Self::Unauthorized(_) => StatusCode::UNAUTHORIZED,
            Self::Forbidden(_) => StatusCode::FORBIDDEN,
            Self::NotFound(_) => StatusCode::NOT_FOUND,
        }
    }

    /// The message shown to the client.
    fn client_message(&self) -> String {
        match self {
            Self::Database(RepositoryError::NotFound) => "not found".to_string(),
            Self::Database(RepositoryError::Conflict(msg)) => msg.clone(),
            Self::Auth(err) => match err {
                AuthError::InvalidCredentials => "invalid email or password".to_string(),
                AuthError::InvalidToken => "invalid or expired token".to_string(),
                AuthError::UserAlreadyExists => {
                    "a user with this email already exists".to_string()
                }
                AuthError::WeakPassword(msg) | AuthError::InvalidField(msg) => msg.clone(),
                AuthError::InvalidEmail(e) => format!("invalid email: {e}"),
                _ => "internal server error".to_string(),
            },
            Self::Checkout(CheckoutError::NotOwner) => "permission denied".to_string(),
            Self::Checkout(CheckoutError::Repository(RepositoryError::NotFound)) => {
                "not found".to_string()
            }
            Self::Checkout(err) if !self.status().is_server_error() => err.to_string(),
            Self::Validation(msg)
            | Self::Unauthorized(msg)
            | Self::Forbidden(msg)
            | Self::NotFound(msg) => msg.clone(),
            _ => "internal server error".to_string(),
        }
    }
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let status = self.status();

        // Capture server errors to Sentry
        if status.is_server_error() {
            let event_id = sentry::capture_error(&self);
            tracing::error!(
                error = %self,
                sentry_event_id = %event_id,
                "Request error"
            );
        } else {
            tracing::debug!(error = %self, %status, "request rejected");
        }

        (status, Json(json!({ "error": self.client_message() }))).into_response()
    }
}

impl From<JsonRejection> for AppError {
    fn from(rejection: JsonRejection) -> Self {
        Self::Validation(rejection.body_text())
    }
}

impl From<PathRejection> for AppError {
    fn from(rejection: PathRejection) -> Self {
        Self::Validation(rejection.body_text())
    }
}

impl From<QueryRejection> for AppError {
    fn from(rejection: QueryRejection) -> Self {
        Self::Validation(rejection.body_text())
    }
}

/// Result type alias for `AppError`.
pub type Result<T> = std::result::Result<T, AppError>;

/// Set the Sentry user context for the authenticated caller.
pub fn set_sentry_user(user_id: &impl ToString) {
    sentry::configure_scope(|scope| {
        scope.set_user(Some(sentry::User {
            id: Some(user_id.to_string()),
            ..Default::default()
        }));
    });
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use axum::body::to_bytes;
    use ecom_core::{OrderStatus, ProductId};

    use super::*;

    async fn render(err: AppError) -> (StatusCode, serde_json::Value) {
        let response = err.into_response();
        let status = response.status();
        let bytes = to_bytes(response.into_body(), usize::MAX).await.unwrap();
        (status, serde_json::from_slice(&bytes).unwrap())
    }

    #[tokio::test]
    async fn test_body_shape() {
        let (status, body) = render(AppError::NotFound("product 3 not found".to_string())).await;
        assert_eq!(status, StatusCode::NOT_FOUND);
        assert_eq!(body, json!({"error": "product 3 not found"}));
    }

    #[tokio::test]
    async fn test_status_codes() {
        let cases = [
            (AppError::Validation("x".into()), StatusCode::BAD_REQUEST),
            (AppError::Unauthorized("x".into()), StatusCode::UNAUTHORIZED),
            (AppError::Forbidden("x".into()), StatusCode::FORBIDDEN),
            (AppError::Auth(AuthError::UserAlreadyExists), StatusCode::CONFLICT),
            (AppError::Auth(AuthError::InvalidCredentials), StatusCode::UNAUTHORIZED),
            (AppError::Checkout(CheckoutError::EmptyCart), StatusCode::BAD_REQUEST),
            (AppError::Checkout(CheckoutError::NotOwner), StatusCode::FORBIDDEN),
            (AppError::Checkout(CheckoutError::OrderNotFound), StatusCode::NOT_FOUND),
            (AppError::Database(RepositoryError::NotFound), StatusCode::NOT_FOUND),
        ];
        for (err, expected) in cases {
            assert_eq!(render(err).await.0, expected);
        }
    }

    #[tokio::test]
    async fn test_insufficient_stock_message() {
        let err = AppError::Checkout(CheckoutError::InsufficientStock {
            product_id: ProductId::new(4),
            requested: 3,
            available: 2,
        });
        let (status, body) = render(err).await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert_eq!(
            body["error"],
            "product 4 is not available in the quantity requested (3 requested, 2 in stock)"
        );
    }

    #[tokio::test]
    async fn test_invalid_state_message() {
        let err = AppError::Checkout(CheckoutError::InvalidState {
            status: OrderStatus::Shipped,
            action: "cancel",
        });
        let (status, body) = render(err).await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert_eq!(body["error"], "cannot cancel order in status shipped");
    }

    #[tokio::test]
    async fn test_internal_details_hidden() {
        let err = AppError::Database(RepositoryError::DataCorruption(
            "users.email row 9 is garbage".to_string(),
        ));
        let (status, body) = render(err).await;
        assert_eq!(status, StatusCode::INTERNAL_SERVER_ERROR);
        assert_eq!(body, json!({"error": "internal server error"}));
    }
}
