use crate::{
    auth::{
        check_password_policy, generate_reset_token, hash_password, issue_tokens, refresh_access,
        verify_password, verify_reset_token, LoginRequest, PasswordResetConfirmRequest,
        PasswordResetRequest, RefreshRequest, RegisterRequest,
    },
    config::Config,
    error::AppError,
    mail::{Mail, MailBackend},
    models::user::{User, UserResponse},
    perms::Role,
};
use actix_web::{post, web, HttpResponse, Responder};
use serde_json::json;
use sqlx::PgPool;
use std::time::Duration;
use validator::Validate;

pub const USER_CREATED: &str = "User registered successfully";
pub const LOGIN_SUCCESS: &str = "Login successful";
pub const INVALID_CREDENTIALS: &str = "No active account found with the given credentials";
pub const NO_USER_FOUND: &str = "No user found with this email address.";
pub const PASSWORD_RESET_SENT: &str = "Password reset link sent successfully";
pub const PASSWORD_RESET_DONE: &str = "Password has been reset successfully";

const USER_COLUMNS: &str = "id, username, email, password_hash, first_name, last_name, \
                            is_admin, is_superuser, date_joined";

/// Register a new user.
///
/// Creates a new user account. The password is stored only as a bcrypt hash
/// and is never echoed back. Username and email uniqueness is enforced by the
/// database; a duplicate registers as a 409.
#[post("/register")]
pub async fn register(
    pool: web::Data<PgPool>,
    register_data: web::Json<RegisterRequest>,
) -> Result<impl Responder, AppError> {
    register_data.validate()?;

    let password_hash = hash_password(&register_data.password)?;

    let user = sqlx::query_as::<_, User>(&format!(
        "INSERT INTO users (username, email, password_hash, first_name, last_name, is_admin) \
         VALUES ($1, $2, $3, $4, $5, $6) \
         RETURNING {}",
        USER_COLUMNS
    ))
    .bind(&register_data.username)
    .bind(&register_data.email)
    .bind(&password_hash)
    .bind(&register_data.first_name)
    .bind(&register_data.last_name)
    .bind(register_data.is_admin)
    .fetch_one(&**pool)
    .await?;

    Ok(HttpResponse::Created().json(json!({
        "message": USER_CREATED,
        "data": UserResponse::from(user)
    })))
}

/// Login user.
///
/// Authenticates a user and returns an access/refresh token pair. The failure
/// message is deliberately generic so it does not reveal whether the username
/// exists.
#[post("/login")]
pub async fn login(
    pool: web::Data<PgPool>,
    login_data: web::Json<LoginRequest>,
) -> Result<impl Responder, AppError> {
    login_data.validate()?;

    let user = sqlx::query_as::<_, User>(&format!(
        "SELECT {} FROM users WHERE username = $1",
        USER_COLUMNS
    ))
    .bind(&login_data.username)
    .fetch_optional(&**pool)
    .await?;

    match user {
        Some(user) if verify_password(&login_data.password, &user.password_hash)? => {
            let tokens = issue_tokens(user.id, Role::of(&user))?;
            Ok(HttpResponse::Ok().json(json!({
                "message": LOGIN_SUCCESS,
                "tokens": tokens
            })))
        }
        _ => Err(AppError::BadRequest(INVALID_CREDENTIALS.into())),
    }
}

/// Mints a fresh access token from a valid refresh token.
#[post("/token/refresh")]
pub async fn refresh_token(
    refresh_data: web::Json<RefreshRequest>,
) -> Result<impl Responder, AppError> {
    let access = refresh_access(&refresh_data.refresh)?;
    Ok(HttpResponse::Ok().json(json!({ "access": access })))
}

/// Requests a password-reset mail.
///
/// An unknown email address is reported as a 400; this leaks account
/// existence and is kept deliberately as observed behavior. The reset link is
/// dispatched through the configured mail backend under a bounded timeout,
/// and a transport failure is surfaced before any success response.
#[post("/password-reset/")]
pub async fn password_reset_request(
    pool: web::Data<PgPool>,
    config: web::Data<Config>,
    mailer: web::Data<dyn MailBackend>,
    reset_data: web::Json<PasswordResetRequest>,
) -> Result<impl Responder, AppError> {
    reset_data.validate()?;

    let user = sqlx::query_as::<_, User>(&format!(
        "SELECT {} FROM users WHERE email = $1",
        USER_COLUMNS
    ))
    .bind(&reset_data.email)
    .fetch_optional(&**pool)
    .await?
    .ok_or_else(|| AppError::BadRequest(NO_USER_FOUND.into()))?;

    let token = generate_reset_token(&user)?;
    let reset_link = format!(
        "{}/reset-password/{}/{}/",
        config.frontend_url, user.id, token
    );

    let mail = Mail {
        to: user.email.clone(),
        subject: "Password Reset Request".to_string(),
        body: format!("Click the link to reset your password: {}", reset_link),
    };

    tokio::time::timeout(
        Duration::from_secs(config.mail_timeout_secs),
        mailer.send(&mail),
    )
    .await
    .map_err(|_| AppError::Upstream("mail dispatch timed out".into()))??;

    Ok(HttpResponse::Ok().json(json!({ "message": PASSWORD_RESET_SENT })))
}

/// Confirms a password reset with the mailed token.
///
/// Verification is keyed to the user's current password hash, so a token is
/// consumed by the change it performs and cannot be replayed.
#[post("/password-reset-confirm/{uid}/")]
pub async fn password_reset_confirm(
    pool: web::Data<PgPool>,
    uid: web::Path<i32>,
    confirm_data: web::Json<PasswordResetConfirmRequest>,
) -> Result<impl Responder, AppError> {
    confirm_data.validate()?;
    let user_id = uid.into_inner();

    // An unknown uid gets the same answer as a bad token.
    let user = sqlx::query_as::<_, User>(&format!(
        "SELECT {} FROM users WHERE id = $1",
        USER_COLUMNS
    ))
    .bind(user_id)
    .fetch_optional(&**pool)
    .await?
    .ok_or_else(|| AppError::BadRequest("Invalid or expired reset token".into()))?;

    verify_reset_token(&confirm_data.token, &user)?;
    check_password_policy(&confirm_data.new_password)?;

    let password_hash = hash_password(&confirm_data.new_password)?;
    sqlx::query("UPDATE users SET password_hash = $1 WHERE id = $2")
        .bind(&password_hash)
        .bind(user_id)
        .execute(&**pool)
        .await?;

    Ok(HttpResponse::Ok().json(json!({ "message": PASSWORD_RESET_DONE })))
}
