//! Password-reset tokens.
//!
//! A reset token is a short-lived JWT signed with a key derived from the
//! global secret *and the user's current password hash*. Changing the
//! password re-keys verification, which both consumes a used token (the
//! confirm flow changes the hash) and invalidates every other outstanding
//! token for that account. Nothing credential-derived appears in the token
//! payload itself.

use crate::error::AppError;
use crate::models::user::User;
use jsonwebtoken::{decode, encode, DecodingKey, EncodingKey, Header, Validation};
use serde::{Deserialize, Serialize};

/// Validity window for a reset token.
const RESET_TOKEN_LIFETIME_SECS: i64 = 60 * 60;

const RESET_PURPOSE: &str = "password_reset";

#[derive(Debug, Serialize, Deserialize)]
struct ResetClaims {
    sub: i32,
    /// Guards against an access/refresh token being replayed here.
    purpose: String,
    exp: usize,
}

fn reset_key(user: &User) -> Result<String, AppError> {
    let secret = std::env::var("JWT_SECRET")
        .map_err(|_| AppError::Internal("JWT_SECRET not set".into()))?;
    Ok(format!("{}{}", secret, user.password_hash))
}

/// Generates a single-use, time-bound reset token for the given user.
pub fn generate_reset_token(user: &User) -> Result<String, AppError> {
    let claims = ResetClaims {
        sub: user.id,
        purpose: RESET_PURPOSE.to_string(),
        exp: chrono::Utc::now()
            .checked_add_signed(chrono::Duration::seconds(RESET_TOKEN_LIFETIME_SECS))
            .expect("valid timestamp")
            .timestamp() as usize,
    };
    encode(
        &Header::default(),
        &claims,
        &EncodingKey::from_secret(reset_key(user)?.as_bytes()),
    )
    .map_err(|e| AppError::Internal(format!("Failed to generate reset token: {}", e)))
}

/// Verifies a reset token against the user's current credential state.
///
/// Fails with `BadRequest` on a forged, expired, or already-consumed token,
/// or one issued for a different account.
pub fn verify_reset_token(token: &str, user: &User) -> Result<(), AppError> {
    let invalid = || AppError::BadRequest("Invalid or expired reset token".into());

    let claims = decode::<ResetClaims>(
        token,
        &DecodingKey::from_secret(reset_key(user)?.as_bytes()),
        &Validation::default(),
    )
    .map(|data| data.claims)
    .map_err(|_| invalid())?;

    if claims.sub != user.id || claims.purpose != RESET_PURPOSE {
        return Err(invalid());
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Utc;
    use lazy_static::lazy_static;

    lazy_static! {
        static ref JWT_ENV_LOCK: std::sync::Mutex<()> = std::sync::Mutex::new(());
    }

    fn test_user(id: i32, password_hash: &str) -> User {
        User {
            id,
            username: "resetuser".into(),
            email: "reset@example.com".into(),
            password_hash: password_hash.into(),
            first_name: String::new(),
            last_name: String::new(),
            is_admin: false,
            is_superuser: false,
            date_joined: Utc::now(),
        }
    }

    fn with_secret<F: FnOnce()>(f: F) {
        let _guard = JWT_ENV_LOCK.lock().unwrap();
        let original = std::env::var("JWT_SECRET").ok();
        std::env::set_var("JWT_SECRET", "reset_test_secret");
        let result = std::panic::catch_unwind(std::panic::AssertUnwindSafe(f));
        if let Some(original) = original {
            std::env::set_var("JWT_SECRET", original);
        } else {
            std::env::remove_var("JWT_SECRET");
        }
        if let Err(payload) = result {
            std::panic::resume_unwind(payload);
        }
    }

    #[test]
    fn test_round_trip() {
        with_secret(|| {
            let user = test_user(1, "$2b$12$hash-a");
            let token = generate_reset_token(&user).unwrap();
            assert!(verify_reset_token(&token, &user).is_ok());
        });
    }

    #[test]
    fn test_password_change_invalidates_token() {
        with_secret(|| {
            let user = test_user(1, "$2b$12$hash-a");
            let token = generate_reset_token(&user).unwrap();

            let mut changed = test_user(1, "$2b$12$hash-b");
            changed.username = user.username.clone();
            assert!(verify_reset_token(&token, &changed).is_err());
        });
    }

    #[test]
    fn test_token_is_bound_to_the_user() {
        with_secret(|| {
            let alice = test_user(1, "$2b$12$same-hash");
            let mallory = test_user(2, "$2b$12$same-hash");
            let token = generate_reset_token(&alice).unwrap();
            assert!(verify_reset_token(&token, &mallory).is_err());
        });
    }

    #[test]
    fn test_garbage_token_is_rejected() {
        with_secret(|| {
            let user = test_user(1, "$2b$12$hash-a");
            match verify_reset_token("not-a-token", &user) {
                Err(AppError::BadRequest(msg)) => {
                    assert!(msg.contains("Invalid or expired"))
                }
                other => panic!("expected BadRequest, got {:?}", other),
            }
        });
    }
}
