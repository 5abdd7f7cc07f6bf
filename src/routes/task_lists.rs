use crate::{
    auth::CurrentUser,
    error::AppError,
    models::{TaskListInput, TaskListQuery, TaskListRecord},
    perms::{self, Resource, Verb},
    routes::ordering_clause,
};
use actix_web::{delete, get, post, put, web, HttpResponse, Responder};
use serde_json::json;
use sqlx::PgPool;
use validator::Validate;

pub const TASK_LIST_CREATED: &str = "Task list created successfully";
pub const TASK_LIST_UPDATED: &str = "Task list updated successfully";

const TASK_LIST_SELECT: &str = "SELECT tl.id, tl.name, tl.is_public, tl.owner_id, \
     u.username AS owner \
     FROM task_lists tl JOIN users u ON u.id = tl.owner_id";

const TASK_LIST_ORDERING: &[(&str, &str)] = &[
    ("id", "tl.id"),
    ("name", "tl.name"),
    ("owner", "u.username"),
    ("is_public", "tl.is_public"),
];

/// Lists task lists visible to the authenticated user.
///
/// Non-admins see only the lists they own; admins see all. Supports an exact
/// filter on `is_public`, a case-insensitive `search` over the list name and
/// owner username, and whitelisted `ordering`.
#[get("/")]
pub async fn list_task_lists(
    pool: web::Data<PgPool>,
    query_params: web::Query<TaskListQuery>,
    user: CurrentUser,
) -> Result<impl Responder, AppError> {
    perms::check_verb(user.role, Resource::TaskList, Verb::List)?;

    let mut sql = String::from(TASK_LIST_SELECT);
    let mut conditions: Vec<String> = Vec::new();
    let mut param_count = 1;

    if !user.role.is_admin() {
        conditions.push(format!("tl.owner_id = ${}", param_count));
        param_count += 1;
    }
    if query_params.is_public.is_some() {
        conditions.push(format!("tl.is_public = ${}", param_count));
        param_count += 1;
    }
    if query_params.search.is_some() {
        conditions.push(format!(
            "(tl.name ILIKE ${} OR u.username ILIKE ${})",
            param_count,
            param_count + 1
        ));
    }

    if !conditions.is_empty() {
        sql.push_str(" WHERE ");
        sql.push_str(&conditions.join(" AND "));
    }
    sql.push_str(" ORDER BY ");
    sql.push_str(&ordering_clause(
        query_params.ordering.as_deref(),
        TASK_LIST_ORDERING,
        "tl.id",
    ));

    let mut query_builder = sqlx::query_as::<_, TaskListRecord>(&sql);
    if !user.role.is_admin() {
        query_builder = query_builder.bind(user.id);
    }
    if let Some(is_public) = query_params.is_public {
        query_builder = query_builder.bind(is_public);
    }
    if let Some(search) = &query_params.search {
        let pattern = format!("%{}%", search);
        query_builder = query_builder.bind(pattern.clone());
        query_builder = query_builder.bind(pattern);
    }

    let task_lists = query_builder.fetch_all(&**pool).await?;
    Ok(HttpResponse::Ok().json(task_lists))
}

/// Creates a task list owned by the authenticated user.
///
/// Any owner supplied in the payload is ignored; ownership always follows the
/// access token.
#[post("/")]
pub async fn create_task_list(
    pool: web::Data<PgPool>,
    list_data: web::Json<TaskListInput>,
    user: CurrentUser,
) -> Result<impl Responder, AppError> {
    perms::check_verb(user.role, Resource::TaskList, Verb::Create)?;
    list_data.validate()?;

    let record = sqlx::query_as::<_, TaskListRecord>(
        "WITH ins AS ( \
             INSERT INTO task_lists (name, is_public, owner_id) \
             VALUES ($1, $2, $3) \
             RETURNING id, name, is_public, owner_id \
         ) \
         SELECT ins.id, ins.name, ins.is_public, ins.owner_id, u.username AS owner \
         FROM ins JOIN users u ON u.id = ins.owner_id",
    )
    .bind(&list_data.name)
    .bind(list_data.is_public)
    .bind(user.id)
    .fetch_one(&**pool)
    .await?;

    Ok(HttpResponse::Created().json(json!({
        "message": TASK_LIST_CREATED,
        "data": record
    })))
}

/// Retrieves a single task list. Only the owner or an administrator may see it.
#[get("/{id}/")]
pub async fn get_task_list(
    pool: web::Data<PgPool>,
    list_id: web::Path<i32>,
    user: CurrentUser,
) -> Result<impl Responder, AppError> {
    perms::check_verb(user.role, Resource::TaskList, Verb::Retrieve)?;

    let record =
        sqlx::query_as::<_, TaskListRecord>(&format!("{} WHERE tl.id = $1", TASK_LIST_SELECT))
            .bind(list_id.into_inner())
            .fetch_optional(&**pool)
            .await?
            .ok_or_else(|| AppError::NotFound("Task list not found".into()))?;

    if !perms::can_access_task_list(user.role, user.id, record.owner_id) {
        return Err(perms::object_denied());
    }
    Ok(HttpResponse::Ok().json(record))
}

/// Full-record update of a task list (name and is_public).
/// Only the owner or an administrator may update it.
#[put("/{id}/")]
pub async fn update_task_list(
    pool: web::Data<PgPool>,
    list_id: web::Path<i32>,
    list_data: web::Json<TaskListInput>,
    user: CurrentUser,
) -> Result<impl Responder, AppError> {
    perms::check_verb(user.role, Resource::TaskList, Verb::Update)?;
    list_data.validate()?;
    let id = list_id.into_inner();

    let mut tx = pool.begin().await?;

    let owner_id: Option<(i32,)> =
        sqlx::query_as("SELECT owner_id FROM task_lists WHERE id = $1 FOR UPDATE")
            .bind(id)
            .fetch_optional(&mut *tx)
            .await?;
    let (owner_id,) = owner_id.ok_or_else(|| AppError::NotFound("Task list not found".into()))?;
    if !perms::can_access_task_list(user.role, user.id, owner_id) {
        return Err(perms::object_denied());
    }

    let record = sqlx::query_as::<_, TaskListRecord>(
        "WITH upd AS ( \
             UPDATE task_lists SET name = $1, is_public = $2 WHERE id = $3 \
             RETURNING id, name, is_public, owner_id \
         ) \
         SELECT upd.id, upd.name, upd.is_public, upd.owner_id, u.username AS owner \
         FROM upd JOIN users u ON u.id = upd.owner_id",
    )
    .bind(&list_data.name)
    .bind(list_data.is_public)
    .bind(id)
    .fetch_one(&mut *tx)
    .await?;

    tx.commit().await?;

    Ok(HttpResponse::Ok().json(json!({
        "message": TASK_LIST_UPDATED,
        "data": record
    })))
}

/// Hard-deletes a task list, cascading to its tasks.
/// Only the owner or an administrator may delete it.
#[delete("/{id}/")]
pub async fn delete_task_list(
    pool: web::Data<PgPool>,
    list_id: web::Path<i32>,
    user: CurrentUser,
) -> Result<impl Responder, AppError> {
    perms::check_verb(user.role, Resource::TaskList, Verb::Delete)?;
    let id = list_id.into_inner();

    let mut tx = pool.begin().await?;

    let owner_id: Option<(i32,)> =
        sqlx::query_as("SELECT owner_id FROM task_lists WHERE id = $1 FOR UPDATE")
            .bind(id)
            .fetch_optional(&mut *tx)
            .await?;
    let (owner_id,) = owner_id.ok_or_else(|| AppError::NotFound("Task list not found".into()))?;
    if !perms::can_access_task_list(user.role, user.id, owner_id) {
        return Err(perms::object_denied());
    }

    sqlx::query("DELETE FROM task_lists WHERE id = $1")
        .bind(id)
        .execute(&mut *tx)
        .await?;
    tx.commit().await?;

    Ok(HttpResponse::NoContent().finish())
}
