//! User domain types.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use ecom_core::{Email, Role, UserId};

/// A registered account.
///
/// The password hash is deliberately not a field; it is only read by the
/// login path through [`crate::db::users::UserRepository::get_credentials`].
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct User {
    pub id: UserId,
    pub first_name: String,
    pub last_name: String,
    pub email: Email,
    pub role: Role,
    pub created_at: DateTime<Utc>,
}

/// Validated registration data, ready to insert.
#[derive(Debug, Clone)]
pub struct NewUser {
    pub first_name: String,
    pub last_name: String,
    pub email: Email,
    pub role: Role,
    pub password_hash: String,
}

/// The authenticated caller, as proven by a valid session token.
///
/// Handlers receive this explicitly from the auth extractors.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CurrentUser {
    pub id: UserId,
    pub role: Role,
}

impl CurrentUser {
    #[must_use]
    pub const fn is_admin(&self) -> bool {
        self.role.is_admin()
    }

    /// Whether the caller may read a resource owned by `owner`.
    #[must_use]
    pub fn can_view(&self, owner: UserId) -> bool {
        self.id == owner || self.is_admin()
    }
}

/// Registration request body.
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RegisterUser {
    pub first_name: String,
    pub last_name: String,
    pub email: String,
    pub password: String,
    /// `admin` or `user`; absent means `user`.
    #[serde(default)]
    pub role: Option<String>,
}

/// Login request body.
#[derive(Debug, Clone, Deserialize)]
pub struct LoginUser {
    pub email: String,
    pub password: String,
}
