use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use validator::Validate;

/// A task list row joined with its owner's username.
///
/// The internal `owner_id` column drives authorization checks but is never
/// serialized; responses carry the owner's username instead.
#[derive(Debug, Serialize, Deserialize, FromRow)]
pub struct TaskListRecord {
    pub id: i32,
    pub name: String,
    pub is_public: bool,
    #[serde(skip_serializing, default)]
    pub owner_id: i32,
    /// Owner's username, from a JOIN on `users`.
    pub owner: String,
}

/// Input payload for creating or fully replacing a task list.
/// Any client-supplied owner is ignored; the authenticated identity owns the list.
#[derive(Debug, Serialize, Deserialize, Validate)]
pub struct TaskListInput {
    #[validate(length(min = 1, max = 100))]
    pub name: String,
    #[serde(default)]
    pub is_public: bool,
}

/// Query parameters accepted by the task-list collection endpoint.
#[derive(Debug, Deserialize)]
pub struct TaskListQuery {
    pub is_public: Option<bool>,
    /// Case-insensitive match against the list name or the owner's username.
    pub search: Option<String>,
    /// One of id, name, owner, is_public; prefix with `-` for descending.
    pub ordering: Option<String>,
}
