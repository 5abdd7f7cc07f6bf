pub mod comment;
pub mod task;
pub mod task_list;
pub mod user;

pub use comment::{CommentInput, CommentRecord};
pub use task::{TaskAssignInput, TaskInput, TaskPriority, TaskQuery, TaskRecord, TaskStatus};
pub use task_list::{TaskListInput, TaskListQuery, TaskListRecord};
pub use user::{User, UserResponse};
