use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use validator::Validate;

/// A comment row joined with its task title and author username.
/// Comments are immutable once created; there is no update or delete endpoint.
#[derive(Debug, Serialize, Deserialize, FromRow)]
pub struct CommentRecord {
    pub id: i32,
    pub comment: String,
    #[serde(skip_serializing, default)]
    pub task_id: i32,
    #[serde(skip_serializing, default)]
    pub author_id: i32,
    /// Title of the task being commented on.
    pub task: String,
    /// Username of the author, server-set at creation.
    pub author: String,
    pub created_at: DateTime<Utc>,
}

/// Input payload for creating a comment. When posting under
/// `/tasks/{task_id}/comments/` the path wins over any `task` in the body.
#[derive(Debug, Deserialize, Validate)]
pub struct CommentInput {
    #[validate(length(min = 1))]
    pub comment: String,
    pub task: Option<i32>,
}
