use crate::{
    auth::CurrentUser,
    error::AppError,
    models::{CommentInput, CommentRecord},
    perms::{self, Resource, Verb},
};
use actix_web::{get, post, web, HttpResponse, Responder};
use serde_json::json;
use sqlx::PgPool;
use validator::Validate;

pub const COMMENT_ADDED: &str = "Comment added successfully";

const COMMENT_SELECT: &str = "SELECT c.id, c.comment, c.task_id, c.author_id, \
     t.title AS task, u.username AS author, c.created_at \
     FROM comments c \
     JOIN tasks t ON t.id = c.task_id \
     JOIN users u ON u.id = c.author_id";

async fn insert_comment(
    pool: &PgPool,
    task_id: i32,
    author_id: i32,
    body: &str,
) -> Result<CommentRecord, AppError> {
    // A dangling task id trips the FK constraint and surfaces as a 400.
    let record = sqlx::query_as::<_, CommentRecord>(
        "WITH ins AS ( \
             INSERT INTO comments (comment, task_id, author_id) \
             VALUES ($1, $2, $3) \
             RETURNING id, comment, task_id, author_id, created_at \
         ) \
         SELECT ins.id, ins.comment, ins.task_id, ins.author_id, \
                t.title AS task, u.username AS author, ins.created_at \
         FROM ins \
         JOIN tasks t ON t.id = ins.task_id \
         JOIN users u ON u.id = ins.author_id",
    )
    .bind(body)
    .bind(task_id)
    .bind(author_id)
    .fetch_one(pool)
    .await?;
    Ok(record)
}

/// Creates a comment; the task id comes from the request body.
/// The author is always the authenticated identity.
#[post("/")]
pub async fn create_comment(
    pool: web::Data<PgPool>,
    comment_data: web::Json<CommentInput>,
    user: CurrentUser,
) -> Result<impl Responder, AppError> {
    perms::check_verb(user.role, Resource::Comment, Verb::Create)?;
    comment_data.validate()?;

    let task_id = comment_data
        .task
        .ok_or_else(|| AppError::BadRequest("task is required".into()))?;

    let record = insert_comment(&pool, task_id, user.id, &comment_data.comment).await?;
    Ok(HttpResponse::Created().json(json!({
        "message": COMMENT_ADDED,
        "data": record
    })))
}

/// Creates a comment nested under a task; the path segment wins over any
/// task id in the body.
#[post("/{task_id}/comments/")]
pub async fn create_task_comment(
    pool: web::Data<PgPool>,
    task_id: web::Path<i32>,
    comment_data: web::Json<CommentInput>,
    user: CurrentUser,
) -> Result<impl Responder, AppError> {
    perms::check_verb(user.role, Resource::Comment, Verb::Create)?;
    comment_data.validate()?;

    let record =
        insert_comment(&pool, task_id.into_inner(), user.id, &comment_data.comment).await?;
    Ok(HttpResponse::Created().json(json!({
        "message": COMMENT_ADDED,
        "data": record
    })))
}

/// Lists the comments on one task, oldest first.
#[get("/{task_id}/comments/")]
pub async fn list_task_comments(
    pool: web::Data<PgPool>,
    task_id: web::Path<i32>,
    user: CurrentUser,
) -> Result<impl Responder, AppError> {
    perms::check_verb(user.role, Resource::Comment, Verb::List)?;

    let comments = sqlx::query_as::<_, CommentRecord>(&format!(
        "{} WHERE c.task_id = $1 ORDER BY c.created_at",
        COMMENT_SELECT
    ))
    .bind(task_id.into_inner())
    .fetch_all(&**pool)
    .await?;

    Ok(HttpResponse::Ok().json(comments))
}
