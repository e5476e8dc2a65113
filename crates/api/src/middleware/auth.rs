//! Bearer-token authentication extractors.
//!
//! The token is read from `Authorization: Bearer <token>` (a bare token in
//! the header is also accepted), falling back to a `token` query parameter.
//!
//! # Example
//!
//! ```rust,ignore
//! async fn my_orders(RequireAuth(user): RequireAuth) -> impl IntoResponse {
//!     format!("Hello, user {}!", user.id)
//! }
//! ```

use axum::{
    extract::{FromRef, FromRequestParts, Query},
    http::{header::AUTHORIZATION, request::Parts},
    response::{IntoResponse, Response},
};
use serde::Deserialize;

use crate::error::{AppError, set_sentry_user};
use crate::models::CurrentUser;
use crate::state::AppState;

/// Extractor that requires a valid session token.
pub struct RequireAuth(pub CurrentUser);

/// Extractor that requires a valid session token with the `admin` role.
pub struct RequireAdmin(pub CurrentUser);

/// Error returned when authentication or authorization fails.
#[derive(Debug, PartialEq, Eq)]
pub enum AuthRejection {
    /// No token in the header or query string.
    MissingToken,
    /// Token present but malformed, forged or expired.
    InvalidToken,
    /// Authenticated, but not an admin.
    Forbidden,
}

impl IntoResponse for AuthRejection {
    fn into_response(self) -> Response {
        let err = match self {
            Self::MissingToken => AppError::Unauthorized("missing authorization token".to_string()),
            Self::InvalidToken => AppError::Unauthorized("invalid or expired token".to_string()),
            Self::Forbidden => AppError::Forbidden("permission denied".to_string()),
        };
        err.into_response()
    }
}

#[derive(Deserialize)]
struct TokenQuery {
    token: Option<String>,
}

/// Pull the raw token out of the request, header first.
fn token_from_parts(parts: &Parts) -> Option<String> {
    let from_header = parts
        .headers
        .get(AUTHORIZATION)
        .and_then(|v| v.to_str().ok())
        .map(str::trim)
        .map(|v| match v.split_once(' ') {
            Some((scheme, token)) if scheme.eq_ignore_ascii_case("bearer") => token.trim(),
            None if v.eq_ignore_ascii_case("bearer") => "",
            _ => v,
        })
        .filter(|t| !t.is_empty())
        .map(str::to_owned);

    from_header.or_else(|| {
        Query::<TokenQuery>::try_from_uri(&parts.uri)
            .ok()
            .and_then(|Query(q)| q.token)
            .filter(|t| !t.is_empty())
    })
}

fn authenticate(parts: &Parts, state: &AppState) -> Result<CurrentUser, AuthRejection> {
    let token = token_from_parts(parts).ok_or(AuthRejection::MissingToken)?;
    let user = state
        .tokens()
        .validate(&token)
        .map_err(|_| AuthRejection::InvalidToken)?;

    set_sentry_user(&user.id);
    tracing::Span::current().record("user_id", tracing::field::display(user.id));
    Ok(user)
}

impl<S> FromRequestParts<S> for RequireAuth
where
    S: Send + Sync,
    AppState: FromRef<S>,
{
    type Rejection = AuthRejection;

    async fn from_request_parts(parts: &mut Parts, state: &S) -> Result<Self, Self::Rejection> {
        let state = AppState::from_ref(state);
        authenticate(parts, &state).map(Self)
    }
}

impl<S> FromRequestParts<S> for RequireAdmin
where
    S: Send + Sync,
    AppState: FromRef<S>,
{
    type Rejection = AuthRejection;

    async fn from_request_parts(parts: &mut Parts, state: &S) -> Result<Self, Self::Rejection> {
        let state = AppState::from_ref(state);
        let user = authenticate(parts, &state)?;

        if !user.is_admin() {
            tracing::warn!(user_id = %user.id, "non-admin attempted admin action");
            return Err(AuthRejection::Forbidden);
        }

        Ok(Self(user))
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use axum::http::Request;

    use super::*;

    fn parts(uri: &str, auth: Option<&str>) -> Parts {
        let mut builder = Request::get(uri);
        if let Some(value) = auth {
            builder = builder.header(AUTHORIZATION, value);
        }
        builder.body(()).unwrap().into_parts().0
    }

    #[test]
    fn test_bearer_header() {
        let p = parts("/", Some("Bearer abc.def.ghi"));
        assert_eq!(token_from_parts(&p).as_deref(), Some("abc.def.ghi"));

        let p = parts("/", Some("bearer   abc.def.ghi "));
        assert_eq!(token_from_parts(&p).as_deref(), Some("abc.def.ghi"));
    }

    #[test]
    fn test_bare_header_token() {
        let p = parts("/", Some("abc.def.ghi"));
        assert_eq!(token_from_parts(&p).as_deref(), Some("abc.def.ghi"));
    }

    #[test]
    fn test_query_fallback() {
        let p = parts("/api/v1/orders?token=abc.def.ghi&x=1", None);
        assert_eq!(token_from_parts(&p).as_deref(), Some("abc.def.ghi"));
    }

    #[test]
    fn test_header_wins_over_query() {
        let p = parts("/?token=from-query", Some("Bearer from-header"));
        assert_eq!(token_from_parts(&p).as_deref(), Some("from-header"));
    }

    #[test]
    fn test_missing_token() {
        assert_eq!(token_from_parts(&parts("/", None)), None);
        assert_eq!(token_from_parts(&parts("/?token=", Some("Bearer "))), None);
    }
}
