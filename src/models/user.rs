use chrono::{DateTime, Utc};
use serde::Serialize;
use sqlx::FromRow;

/// A user account row. The password hash never leaves the database layer;
/// API responses go through [`UserResponse`].
#[derive(Debug, Clone, FromRow)]
pub struct User {
    pub id: i32,
    pub username: String,
    pub email: String,
    pub password_hash: String,
    pub first_name: String,
    pub last_name: String,
    /// Application-level administrator flag.
    pub is_admin: bool,
    /// Platform-level flag, distinct from `is_admin`. Set administratively.
    pub is_superuser: bool,
    pub date_joined: DateTime<Utc>,
}

/// Public representation of a user. The password (hashed or not) is never echoed.
#[derive(Debug, Serialize)]
pub struct UserResponse {
    pub id: i32,
    pub username: String,
    pub email: String,
    pub first_name: String,
    pub last_name: String,
    pub is_admin: bool,
}

impl From<User> for UserResponse {
    fn from(user: User) -> Self {
        Self {
            id: user.id,
            username: user.username,
            email: user.email,
            first_name: user.first_name,
            last_name: user.last_name,
            is_admin: user.is_admin,
        }
    }
}
