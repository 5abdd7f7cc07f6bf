//!
//! # Authorization Engine
//!
//! Two layers of access control, both of which must pass:
//!
//! 1. **Verb-level**: an explicit table mapping `(Resource, Verb)` to the
//!    minimum [`Role`] required to attempt the operation at all. Checked
//!    before any object is loaded. Reads require authentication only.
//! 2. **Object-level**: per-resource predicates evaluated against a loaded
//!    instance (ownership, creatorship, assignment).
//!
//! Role resolution happens in exactly one place ([`Role::of`]); the rest of
//! the codebase never inspects the `is_admin`/`is_superuser` flags directly.

use serde::{Deserialize, Serialize};

use crate::error::AppError;
use crate::models::user::User;

/// Effective capability level of an identity.
///
/// The ordering matters: `Regular < Admin < Super`, and a check for a role
/// passes for any role greater than or equal to it.
#[derive(Debug, Serialize, Deserialize, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    Regular,
    Admin,
    Super,
}

impl Role {
    /// Resolves the effective role of a user from its stored flags.
    ///
    /// This is the only place the `is_admin`/`is_superuser` booleans are read.
    pub fn of(user: &User) -> Role {
        if user.is_superuser {
            Role::Super
        } else if user.is_admin {
            Role::Admin
        } else {
            Role::Regular
        }
    }

    /// True for Admin and Super. Used for list scoping: administrators see
    /// every row, everyone else only their own.
    pub fn is_admin(&self) -> bool {
        *self >= Role::Admin
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Resource {
    TaskList,
    Task,
    Comment,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Verb {
    List,
    Retrieve,
    Create,
    Update,
    Delete,
    /// Reassigning a task's assignee; a distinct verb because it carries a
    /// stricter requirement than a plain update.
    Assign,
}

/// The verb-level permission table.
///
/// `None` means authentication alone is sufficient (all reads). `Some(role)`
/// is the minimum role required.
pub fn required_role(resource: Resource, verb: Verb) -> Option<Role> {
    match (resource, verb) {
        (_, Verb::List) | (_, Verb::Retrieve) => None,
        (Resource::Task, Verb::Assign) => Some(Role::Admin),
        // Assign is only meaningful for tasks; treat it as a plain update elsewhere.
        (_, Verb::Assign) => Some(Role::Regular),
        (_, Verb::Create) | (_, Verb::Update) | (_, Verb::Delete) => Some(Role::Regular),
    }
}

/// Verb-level check, rejecting with `Forbidden` before any object is loaded.
pub fn check_verb(role: Role, resource: Resource, verb: Verb) -> Result<(), AppError> {
    match required_role(resource, verb) {
        Some(required) if role < required => Err(AppError::Forbidden(
            "You do not have permission to perform this action".into(),
        )),
        _ => Ok(()),
    }
}

/// A task list may be read or mutated by its owner or an administrator.
pub fn can_access_task_list(role: Role, user_id: i32, owner_id: i32) -> bool {
    role.is_admin() || owner_id == user_id
}

/// A task may be read by its creator, its assignee, or an administrator.
pub fn can_read_task(role: Role, user_id: i32, created_by: i32, assigned_to: Option<i32>) -> bool {
    role.is_admin() || created_by == user_id || assigned_to == Some(user_id)
}

/// A task may be mutated or deleted only by its creator or an administrator.
/// The assignee alone may read but never mutate.
pub fn can_write_task(role: Role, user_id: i32, created_by: i32) -> bool {
    role.is_admin() || created_by == user_id
}

/// Uniform denial for object-level failures, so no handler invents its own.
pub fn object_denied() -> AppError {
    AppError::Forbidden("You do not have permission to access this object".into())
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Utc;

    fn user(is_admin: bool, is_superuser: bool) -> User {
        User {
            id: 1,
            username: "u".into(),
            email: "u@example.com".into(),
            password_hash: "x".into(),
            first_name: String::new(),
            last_name: String::new(),
            is_admin,
            is_superuser,
            date_joined: Utc::now(),
        }
    }

    #[test]
    fn test_role_resolution() {
        assert_eq!(Role::of(&user(false, false)), Role::Regular);
        assert_eq!(Role::of(&user(true, false)), Role::Admin);
        assert_eq!(Role::of(&user(false, true)), Role::Super);
        // Superuser wins over admin.
        assert_eq!(Role::of(&user(true, true)), Role::Super);
    }

    #[test]
    fn test_reads_require_no_permission() {
        for resource in [Resource::TaskList, Resource::Task, Resource::Comment] {
            assert_eq!(required_role(resource, Verb::List), None);
            assert_eq!(required_role(resource, Verb::Retrieve), None);
        }
    }

    #[test]
    fn test_assign_requires_admin() {
        assert_eq!(required_role(Resource::Task, Verb::Assign), Some(Role::Admin));
        assert!(check_verb(Role::Regular, Resource::Task, Verb::Assign).is_err());
        assert!(check_verb(Role::Admin, Resource::Task, Verb::Assign).is_ok());
        assert!(check_verb(Role::Super, Resource::Task, Verb::Assign).is_ok());
    }

    #[test]
    fn test_writes_require_regular() {
        for verb in [Verb::Create, Verb::Update, Verb::Delete] {
            assert!(check_verb(Role::Regular, Resource::Task, verb).is_ok());
            assert!(check_verb(Role::Regular, Resource::TaskList, verb).is_ok());
        }
    }

    #[test]
    fn test_task_list_object_permission() {
        assert!(can_access_task_list(Role::Regular, 1, 1));
        assert!(!can_access_task_list(Role::Regular, 1, 2));
        assert!(can_access_task_list(Role::Admin, 1, 2));
        assert!(can_access_task_list(Role::Super, 1, 2));
    }

    #[test]
    fn test_assignee_may_read_but_not_write() {
        // user 5 is the assignee of a task created by user 9
        assert!(can_read_task(Role::Regular, 5, 9, Some(5)));
        assert!(!can_write_task(Role::Regular, 5, 9));
    }

    #[test]
    fn test_creator_and_admin_may_write() {
        assert!(can_write_task(Role::Regular, 9, 9));
        assert!(can_write_task(Role::Admin, 5, 9));
        assert!(can_write_task(Role::Super, 5, 9));
    }

    #[test]
    fn test_unrelated_user_may_not_read() {
        assert!(!can_read_task(Role::Regular, 5, 9, None));
        assert!(!can_read_task(Role::Regular, 5, 9, Some(7)));
    }
}
