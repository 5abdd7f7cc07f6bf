use crate::{
    auth::CurrentUser,
    error::AppError,
    models::{TaskAssignInput, TaskInput, TaskQuery, TaskRecord},
    perms::{self, Resource, Verb},
    routes::ordering_clause,
};
use actix_web::{delete, get, post, put, web, HttpResponse, Responder};
use serde_json::json;
use sqlx::PgPool;
use validator::Validate;

pub const TASK_CREATED: &str = "Task created successfully";
pub const TASK_UPDATED: &str = "Task updated successfully";
pub const TASK_ASSIGNED: &str = "Task assigned successfully";

const TASK_SELECT: &str = "SELECT t.id, t.title, t.description, t.created_date, t.due_date, \
     t.priority, t.status, t.task_list_id, t.created_by_id, t.assigned_to_id, \
     l.name AS task_list, c.username AS created_by, a.username AS assigned_to \
     FROM tasks t \
     JOIN task_lists l ON l.id = t.task_list_id \
     JOIN users c ON c.id = t.created_by_id \
     LEFT JOIN users a ON a.id = t.assigned_to_id";

// The same joins applied to the row a mutation returns.
const TASK_RETURNING: &str = "SELECT ins.id, ins.title, ins.description, ins.created_date, \
     ins.due_date, ins.priority, ins.status, ins.task_list_id, ins.created_by_id, \
     ins.assigned_to_id, l.name AS task_list, c.username AS created_by, \
     a.username AS assigned_to \
     FROM ins \
     JOIN task_lists l ON l.id = ins.task_list_id \
     JOIN users c ON c.id = ins.created_by_id \
     LEFT JOIN users a ON a.id = ins.assigned_to_id";

const TASK_ORDERING: &[(&str, &str)] = &[
    ("id", "t.id"),
    ("title", "t.title"),
    ("due_date", "t.due_date"),
    ("priority", "t.priority"),
    ("status", "t.status"),
];

/// Lists tasks visible to the authenticated user.
///
/// Non-admins see exactly the tasks they created or are assigned to; admins
/// see all. Supports exact filters on `status`, `priority`, and `due_date`, a
/// case-insensitive `search` over title and creator/assignee usernames, and
/// whitelisted `ordering`.
#[get("/")]
pub async fn list_tasks(
    pool: web::Data<PgPool>,
    query_params: web::Query<TaskQuery>,
    user: CurrentUser,
) -> Result<impl Responder, AppError> {
    perms::check_verb(user.role, Resource::Task, Verb::List)?;

    let mut sql = String::from(TASK_SELECT);
    let mut conditions: Vec<String> = Vec::new();
    let mut param_count = 1;

    if !user.role.is_admin() {
        conditions.push(format!(
            "(t.created_by_id = ${0} OR t.assigned_to_id = ${0})",
            param_count
        ));
        param_count += 1;
    }
    if query_params.status.is_some() {
        conditions.push(format!("t.status = ${}", param_count));
        param_count += 1;
    }
    if query_params.priority.is_some() {
        conditions.push(format!("t.priority = ${}", param_count));
        param_count += 1;
    }
    if query_params.due_date.is_some() {
        conditions.push(format!("t.due_date = ${}", param_count));
        param_count += 1;
    }
    if query_params.search.is_some() {
        conditions.push(format!(
            "(t.title ILIKE ${} OR c.username ILIKE ${} OR a.username ILIKE ${})",
            param_count,
            param_count + 1,
            param_count + 2
        ));
    }

    if !conditions.is_empty() {
        sql.push_str(" WHERE ");
        sql.push_str(&conditions.join(" AND "));
    }
    sql.push_str(" ORDER BY ");
    sql.push_str(&ordering_clause(
        query_params.ordering.as_deref(),
        TASK_ORDERING,
        "t.id",
    ));

    let mut query_builder = sqlx::query_as::<_, TaskRecord>(&sql);
    if !user.role.is_admin() {
        query_builder = query_builder.bind(user.id);
    }
    if let Some(status) = query_params.status {
        query_builder = query_builder.bind(status);
    }
    if let Some(priority) = query_params.priority {
        query_builder = query_builder.bind(priority);
    }
    if let Some(due_date) = query_params.due_date {
        query_builder = query_builder.bind(due_date);
    }
    if let Some(search) = &query_params.search {
        let pattern = format!("%{}%", search);
        query_builder = query_builder.bind(pattern.clone());
        query_builder = query_builder.bind(pattern.clone());
        query_builder = query_builder.bind(pattern);
    }

    let tasks = query_builder.fetch_all(&**pool).await?;
    Ok(HttpResponse::Ok().json(tasks))
}

/// Creates a task. The creator is always the authenticated identity, never
/// client-supplied. The due date must lie strictly in the future.
#[post("/")]
pub async fn create_task(
    pool: web::Data<PgPool>,
    task_data: web::Json<TaskInput>,
    user: CurrentUser,
) -> Result<impl Responder, AppError> {
    perms::check_verb(user.role, Resource::Task, Verb::Create)?;
    task_data.validate()?;

    let sql = format!(
        "WITH ins AS ( \
             INSERT INTO tasks \
                 (title, description, due_date, priority, status, task_list_id, \
                  created_by_id, assigned_to_id) \
             VALUES ($1, $2, $3, $4, $5, $6, $7, $8) \
             RETURNING * \
         ) {}",
        TASK_RETURNING
    );
    let record = sqlx::query_as::<_, TaskRecord>(&sql)
        .bind(&task_data.title)
        .bind(&task_data.description)
        .bind(task_data.due_date)
        .bind(task_data.priority())
        .bind(task_data.status())
        .bind(task_data.task_list)
        .bind(user.id)
        .bind(task_data.assigned_to)
        .fetch_one(&**pool)
        .await?;

    Ok(HttpResponse::Created().json(json!({
        "message": TASK_CREATED,
        "data": record
    })))
}

/// Retrieves a single task. Readable by its creator, its assignee, or an
/// administrator.
#[get("/{id}/")]
pub async fn get_task(
    pool: web::Data<PgPool>,
    task_id: web::Path<i32>,
    user: CurrentUser,
) -> Result<impl Responder, AppError> {
    perms::check_verb(user.role, Resource::Task, Verb::Retrieve)?;

    let record = sqlx::query_as::<_, TaskRecord>(&format!("{} WHERE t.id = $1", TASK_SELECT))
        .bind(task_id.into_inner())
        .fetch_optional(&**pool)
        .await?
        .ok_or_else(|| AppError::NotFound("Task not found".into()))?;

    if !perms::can_read_task(
        user.role,
        user.id,
        record.created_by_id,
        record.assigned_to_id,
    ) {
        return Err(perms::object_denied());
    }
    Ok(HttpResponse::Ok().json(record))
}

/// Full-record update of a task.
///
/// Only the creator or an administrator may update; the assignee alone may
/// read but not mutate. `created_by` and `created_date` are immutable.
#[put("/{id}/")]
pub async fn update_task(
    pool: web::Data<PgPool>,
    task_id: web::Path<i32>,
    task_data: web::Json<TaskInput>,
    user: CurrentUser,
) -> Result<impl Responder, AppError> {
    perms::check_verb(user.role, Resource::Task, Verb::Update)?;
    task_data.validate()?;
    let id = task_id.into_inner();

    let mut tx = pool.begin().await?;

    let created_by: Option<(i32,)> =
        sqlx::query_as("SELECT created_by_id FROM tasks WHERE id = $1 FOR UPDATE")
            .bind(id)
            .fetch_optional(&mut *tx)
            .await?;
    let (created_by,) = created_by.ok_or_else(|| AppError::NotFound("Task not found".into()))?;
    if !perms::can_write_task(user.role, user.id, created_by) {
        return Err(perms::object_denied());
    }

    let sql = format!(
        "WITH ins AS ( \
             UPDATE tasks SET title = $1, description = $2, due_date = $3, priority = $4, \
                 status = $5, task_list_id = $6, assigned_to_id = $7 \
             WHERE id = $8 \
             RETURNING * \
         ) {}",
        TASK_RETURNING
    );
    let record = sqlx::query_as::<_, TaskRecord>(&sql)
        .bind(&task_data.title)
        .bind(&task_data.description)
        .bind(task_data.due_date)
        .bind(task_data.priority())
        .bind(task_data.status())
        .bind(task_data.task_list)
        .bind(task_data.assigned_to)
        .bind(id)
        .fetch_one(&mut *tx)
        .await?;

    tx.commit().await?;

    Ok(HttpResponse::Ok().json(json!({
        "message": TASK_UPDATED,
        "data": record
    })))
}

/// Hard-deletes a task. Only the creator or an administrator may delete it.
#[delete("/{id}/")]
pub async fn delete_task(
    pool: web::Data<PgPool>,
    task_id: web::Path<i32>,
    user: CurrentUser,
) -> Result<impl Responder, AppError> {
    perms::check_verb(user.role, Resource::Task, Verb::Delete)?;
    let id = task_id.into_inner();

    let mut tx = pool.begin().await?;

    let created_by: Option<(i32,)> =
        sqlx::query_as("SELECT created_by_id FROM tasks WHERE id = $1 FOR UPDATE")
            .bind(id)
            .fetch_optional(&mut *tx)
            .await?;
    let (created_by,) = created_by.ok_or_else(|| AppError::NotFound("Task not found".into()))?;
    if !perms::can_write_task(user.role, user.id, created_by) {
        return Err(perms::object_denied());
    }

    sqlx::query("DELETE FROM tasks WHERE id = $1")
        .bind(id)
        .execute(&mut *tx)
        .await?;
    tx.commit().await?;

    Ok(HttpResponse::NoContent().finish())
}

/// Reassigns a task. Administrator-only, regardless of who created the task
/// or holds it now; a partial update touching only the assignee.
#[put("/{id}/assign/")]
pub async fn assign_task(
    pool: web::Data<PgPool>,
    task_id: web::Path<i32>,
    assign_data: web::Json<TaskAssignInput>,
    user: CurrentUser,
) -> Result<impl Responder, AppError> {
    perms::check_verb(user.role, Resource::Task, Verb::Assign)?;

    let sql = format!(
        "WITH ins AS ( \
             UPDATE tasks SET assigned_to_id = $1 WHERE id = $2 \
             RETURNING * \
         ) {}",
        TASK_RETURNING
    );
    let record = sqlx::query_as::<_, TaskRecord>(&sql)
        .bind(assign_data.assigned_to)
        .bind(task_id.into_inner())
        .fetch_optional(&**pool)
        .await?
        .ok_or_else(|| AppError::NotFound("Task not found".into()))?;

    Ok(HttpResponse::Ok().json(json!({
        "message": TASK_ASSIGNED,
        "data": {
            "assigned_to": record.assigned_to,
            "title": record.title
        }
    })))
}
