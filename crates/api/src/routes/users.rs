//! Registration and login handlers.

use axum::{extract::State, http::StatusCode};
use serde::Serialize;
use tracing::instrument;

use ecom_core::UserId;

use crate::error::Result;
use crate::extract::Json;
use crate::models::{LoginUser, RegisterUser};
use crate::services::auth::AuthService;
use crate::state::AppState;

#[derive(Debug, Serialize)]
pub struct RegisterResponse {
    pub message: &'static str,
    #[serde(rename = "userID")]
    pub user_id: UserId,
}

#[derive(Debug, Serialize)]
pub struct LoginResponse {
    pub token: String,
}

/// `POST /users/register`
#[instrument(skip_all)]
pub async fn register(
    State(state): State<AppState>,
    Json(body): Json<RegisterUser>,
) -> Result<(StatusCode, Json<RegisterResponse>)> {
    let user = AuthService::new(state.pool(), state.tokens())
        .register(body)
        .await?;

    Ok((
        StatusCode::CREATED,
        Json(RegisterResponse {
            message: "user created",
            user_id: user.id,
        }),
    ))
}

/// `POST /users/login`
#[instrument(skip_all)]
pub async fn login(
    State(state): State<AppState>,
    Json(body): Json<LoginUser>,
) -> Result<Json<LoginResponse>> {
    let token = AuthService::new(state.pool(), state.tokens())
        .login(&body.email, &body.password)
        .await?;

    Ok(Json(LoginResponse { token }))
}
