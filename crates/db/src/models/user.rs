//! User entity model and DTOs.

use noteally_core::types::{DbId, Timestamp};
use serde::Serialize;
use sqlx::FromRow;

/// Full user row from the `users` table.
///
/// Contains the password hash -- NEVER serialize this to API responses
/// directly. Use [`UserResponse`] for external-facing output.
///
/// Anonymous users are first-class identities: they own notes like any
/// registered user but carry no email or password hash.
#[derive(Debug, Clone, FromRow)]
pub struct User {
    pub id: DbId,
    pub email: Option<String>,
    pub display_name: Option<String>,
    pub password_hash: Option<String>,
    pub is_anonymous: bool,
    pub is_active: bool,
    pub failed_login_count: i32,
    pub locked_until: Option<Timestamp>,
    pub last_login_at: Option<Timestamp>,
    pub created_at: Timestamp,
    pub updated_at: Timestamp,
}

/// Safe user representation for API responses (no password hash).
#[derive(Debug, Clone, Serialize)]
pub struct UserResponse {
    pub id: DbId,
    pub email: Option<String>,
    pub display_name: Option<String>,
    pub is_anonymous: bool,
    pub created_at: Timestamp,
}

impl From<&User> for UserResponse {
    fn from(user: &User) -> Self {
        Self {
            id: user.id,
            email: user.email.clone(),
            display_name: user.display_name.clone(),
            is_anonymous: user.is_anonymous,
            created_at: user.created_at,
        }
    }
}

/// DTO for creating a registered user.
pub struct CreateUser {
    pub email: String,
    pub display_name: Option<String>,
    pub password_hash: String,
}
