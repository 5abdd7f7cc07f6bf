pub mod auth;
pub mod comments;
pub mod health;
pub mod task_lists;
pub mod tasks;

use actix_web::web;

use crate::auth::AuthMiddleware;

/// Registers every route. Auth and password-reset endpoints are public;
/// the resource scopes are wrapped in `AuthMiddleware`.
pub fn config(cfg: &mut web::ServiceConfig) {
    cfg.service(health::health)
        .service(auth::register)
        .service(auth::login)
        .service(auth::refresh_token)
        .service(auth::password_reset_request)
        .service(auth::password_reset_confirm)
        .service(
            web::scope("/task-lists")
                .wrap(AuthMiddleware)
                .service(task_lists::list_task_lists)
                .service(task_lists::create_task_list)
                .service(task_lists::get_task_list)
                .service(task_lists::update_task_list)
                .service(task_lists::delete_task_list),
        )
        .service(
            web::scope("/tasks")
                .wrap(AuthMiddleware)
                .service(tasks::list_tasks)
                .service(tasks::create_task)
                .service(tasks::assign_task)
                .service(tasks::get_task)
                .service(tasks::update_task)
                .service(tasks::delete_task)
                .service(comments::list_task_comments)
                .service(comments::create_task_comment),
        )
        .service(
            web::scope("/comments")
                .wrap(AuthMiddleware)
                .service(comments::create_comment),
        );
}

/// Resolves a client-supplied ordering parameter against a whitelist of
/// `(external name, SQL expression)` pairs. A `-` prefix flips the direction.
/// Anything outside the whitelist falls back to the default, so nothing
/// client-controlled ever reaches the SQL layer verbatim.
pub(crate) fn ordering_clause(
    requested: Option<&str>,
    allowed: &[(&str, &str)],
    default: &str,
) -> String {
    if let Some(raw) = requested {
        let (field, descending) = match raw.strip_prefix('-') {
            Some(rest) => (rest, true),
            None => (raw, false),
        };
        for (name, expr) in allowed {
            if *name == field {
                return if descending {
                    format!("{} DESC", expr)
                } else {
                    (*expr).to_string()
                };
            }
        }
    }
    default.to_string()
}

#[cfg(test)]
mod tests {
    use super::*;

    const ALLOWED: &[(&str, &str)] = &[("id", "t.id"), ("title", "t.title")];

    #[test]
    fn test_ordering_clause_maps_whitelisted_fields() {
        assert_eq!(ordering_clause(Some("title"), ALLOWED, "t.id"), "t.title");
        assert_eq!(
            ordering_clause(Some("-title"), ALLOWED, "t.id"),
            "t.title DESC"
        );
        assert_eq!(ordering_clause(Some("id"), ALLOWED, "t.id"), "t.id");
    }

    #[test]
    fn test_ordering_clause_rejects_unknown_fields() {
        assert_eq!(
            ordering_clause(Some("password_hash"), ALLOWED, "t.id"),
            "t.id"
        );
        assert_eq!(
            ordering_clause(Some("1; DROP TABLE tasks"), ALLOWED, "t.id"),
            "t.id"
        );
        assert_eq!(ordering_clause(None, ALLOWED, "t.id"), "t.id");
    }
}
