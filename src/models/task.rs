use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use validator::{Validate, ValidationError};

/// Represents the priority of a task.
/// Corresponds to the `task_priority` SQL enum.
#[derive(Debug, Serialize, Deserialize, Clone, Copy, PartialEq, Eq, sqlx::Type)]
#[sqlx(type_name = "task_priority", rename_all = "lowercase")]
#[serde(rename_all = "lowercase")]
pub enum TaskPriority {
    High,
    Medium,
    Low,
}

/// Represents the status of a task.
/// Corresponds to the `task_status` SQL enum. Transitions are not ordered;
/// the status is a plain client-settable attribute.
#[derive(Debug, Serialize, Deserialize, Clone, Copy, PartialEq, Eq, sqlx::Type)]
#[sqlx(type_name = "task_status", rename_all = "snake_case")]
#[serde(rename_all = "snake_case")]
pub enum TaskStatus {
    Created,
    InProgress,
    Completed,
}

/// A task row joined with the display names of its related rows.
///
/// Foreign-key columns drive authorization and are never serialized; the
/// response substitutes the list name and the usernames of creator/assignee.
#[derive(Debug, Serialize, Deserialize, FromRow)]
pub struct TaskRecord {
    pub id: i32,
    pub title: String,
    pub description: String,
    pub created_date: DateTime<Utc>,
    pub due_date: DateTime<Utc>,
    pub priority: TaskPriority,
    pub status: TaskStatus,
    #[serde(skip_serializing, default)]
    pub task_list_id: i32,
    #[serde(skip_serializing, default)]
    pub created_by_id: i32,
    #[serde(skip_serializing, default)]
    pub assigned_to_id: Option<i32>,
    /// Name of the parent task list.
    pub task_list: String,
    /// Username of the creator.
    pub created_by: String,
    /// Username of the assignee, or null when unassigned.
    pub assigned_to: Option<String>,
}

/// Input payload for creating or fully replacing a task.
///
/// `created_by` is server-set from the authenticated identity and cannot be
/// supplied here. `priority` and `status` fall back to their defaults.
#[derive(Debug, Serialize, Deserialize, Validate)]
pub struct TaskInput {
    #[validate(length(min = 1, max = 100))]
    pub title: String,
    #[validate(length(min = 1))]
    pub description: String,
    #[validate(custom = "validate_due_date")]
    pub due_date: DateTime<Utc>,
    pub priority: Option<TaskPriority>,
    pub status: Option<TaskStatus>,
    /// Id of the parent task list.
    pub task_list: i32,
    /// Id of the assignee, if any.
    pub assigned_to: Option<i32>,
}

impl TaskInput {
    pub fn priority(&self) -> TaskPriority {
        self.priority.unwrap_or(TaskPriority::Low)
    }

    pub fn status(&self) -> TaskStatus {
        self.status.unwrap_or(TaskStatus::Created)
    }
}

/// The due date must be strictly later than the current server time,
/// on creation and on every update.
pub fn validate_due_date(value: &DateTime<Utc>) -> Result<(), ValidationError> {
    if *value <= Utc::now() {
        let mut err = ValidationError::new("due_date_in_past");
        err.message = Some("Due date must be greater than the current date and time.".into());
        return Err(err);
    }
    Ok(())
}

/// Input for the dedicated assignment endpoint: a partial update of only the
/// assignee field.
#[derive(Debug, Deserialize)]
pub struct TaskAssignInput {
    pub assigned_to: i32,
}

/// Query parameters accepted by the task collection endpoint.
#[derive(Debug, Deserialize)]
pub struct TaskQuery {
    pub status: Option<TaskStatus>,
    pub priority: Option<TaskPriority>,
    /// Exact-match filter on the due date.
    pub due_date: Option<DateTime<Utc>>,
    /// Case-insensitive match on title, assignee username, or creator username.
    pub search: Option<String>,
    /// One of id, title, due_date, priority, status; prefix with `-` for descending.
    pub ordering: Option<String>,
}
