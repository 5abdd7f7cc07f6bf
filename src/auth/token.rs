use crate::error::AppError;
use crate::perms::Role;
use jsonwebtoken::{decode, encode, DecodingKey, EncodingKey, Header, Validation};
use serde::{Deserialize, Serialize};

/// Access tokens are short-lived; callers refresh them with the longer-lived
/// refresh token rather than re-authenticating.
const ACCESS_TOKEN_LIFETIME_SECS: i64 = 15 * 60;
const REFRESH_TOKEN_LIFETIME_SECS: i64 = 7 * 24 * 60 * 60;

/// Discriminates the two token flavours so one can never stand in for the other.
#[derive(Debug, Serialize, Deserialize, Clone, Copy, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum TokenKind {
    Access,
    Refresh,
}

/// Represents the claims encoded within a JWT (JSON Web Token).
#[derive(Debug, Serialize, Deserialize, Clone)]
pub struct Claims {
    /// Subject of the token: the user's unique identifier.
    pub sub: i32,
    /// Effective role at issue time; the authorization engine consumes this.
    pub role: Role,
    pub kind: TokenKind,
    /// Issued-at timestamp (seconds since epoch).
    pub iat: usize,
    /// Expiration timestamp (seconds since epoch).
    pub exp: usize,
}

/// The signed access/refresh pair returned by login.
#[derive(Debug, Serialize, Deserialize)]
pub struct TokenPair {
    pub access: String,
    pub refresh: String,
}

fn secret() -> Result<String, AppError> {
    std::env::var("JWT_SECRET")
        .map_err(|_| AppError::Internal("JWT_SECRET not set".into()))
}

fn encode_token(user_id: i32, role: Role, kind: TokenKind, lifetime: i64) -> Result<String, AppError> {
    let now = chrono::Utc::now();
    let claims = Claims {
        sub: user_id,
        role,
        kind,
        iat: now.timestamp() as usize,
        exp: now
            .checked_add_signed(chrono::Duration::seconds(lifetime))
            .expect("valid timestamp")
            .timestamp() as usize,
    };
    encode(
        &Header::default(),
        &claims,
        &EncodingKey::from_secret(secret()?.as_bytes()),
    )
    .map_err(|e| AppError::Internal(format!("Failed to generate token: {}", e)))
}

/// Issues an access/refresh pair for an authenticated identity.
///
/// Requires the `JWT_SECRET` environment variable to be set for signing.
pub fn issue_tokens(user_id: i32, role: Role) -> Result<TokenPair, AppError> {
    Ok(TokenPair {
        access: encode_token(user_id, role, TokenKind::Access, ACCESS_TOKEN_LIFETIME_SECS)?,
        refresh: encode_token(user_id, role, TokenKind::Refresh, REFRESH_TOKEN_LIFETIME_SECS)?,
    })
}

fn verify(token: &str, expected_kind: TokenKind) -> Result<Claims, AppError> {
    let claims = decode::<Claims>(
        token,
        &DecodingKey::from_secret(secret()?.as_bytes()),
        &Validation::default(),
    )
    .map(|data| data.claims)
    .map_err(|e| AppError::Unauthorized(format!("Invalid token: {}", e)))?;

    if claims.kind != expected_kind {
        return Err(AppError::Unauthorized("Invalid token: wrong token type".into()));
    }
    Ok(claims)
}

/// Verifies an access token and decodes its claims.
///
/// Fails with `Unauthorized` on a malformed token, a bad signature, an
/// expired token, or a refresh token presented as an access token.
pub fn verify_access(token: &str) -> Result<Claims, AppError> {
    verify(token, TokenKind::Access)
}

/// Verifies a refresh token. Used when minting a fresh access token.
pub fn verify_refresh(token: &str) -> Result<Claims, AppError> {
    verify(token, TokenKind::Refresh)
}

/// Mints a new access token from a valid refresh token.
pub fn refresh_access(refresh_token: &str) -> Result<String, AppError> {
    let claims = verify_refresh(refresh_token)?;
    encode_token(claims.sub, claims.role, TokenKind::Access, ACCESS_TOKEN_LIFETIME_SECS)
}

#[cfg(test)]
mod tests {
    use super::*;
    use lazy_static::lazy_static;

    lazy_static! {
        static ref JWT_ENV_LOCK: std::sync::Mutex<()> = std::sync::Mutex::new(());
    }

    // Helper to run test logic with a temporarily set JWT_SECRET
    fn run_with_temp_jwt_secret<F>(secret_value: &str, test_logic: F)
    where
        F: FnOnce(),
    {
        let _guard = JWT_ENV_LOCK.lock().unwrap();

        let original_secret_val = std::env::var("JWT_SECRET").ok();
        std::env::set_var("JWT_SECRET", secret_value);

        let result = std::panic::catch_unwind(std::panic::AssertUnwindSafe(test_logic));

        if let Some(original) = original_secret_val {
            std::env::set_var("JWT_SECRET", original);
        } else {
            std::env::remove_var("JWT_SECRET");
        }

        if let Err(panic_payload) = result {
            std::panic::resume_unwind(panic_payload);
        }
    }

    #[test]
    fn test_issue_and_verify_pair() {
        run_with_temp_jwt_secret("test_secret_for_pair", || {
            let pair = issue_tokens(1, Role::Regular).unwrap();
            assert!(!pair.access.is_empty());
            assert!(!pair.refresh.is_empty());

            let access_claims = verify_access(&pair.access).unwrap();
            assert_eq!(access_claims.sub, 1);
            assert_eq!(access_claims.role, Role::Regular);
            assert_eq!(access_claims.kind, TokenKind::Access);

            let refresh_claims = verify_refresh(&pair.refresh).unwrap();
            assert_eq!(refresh_claims.kind, TokenKind::Refresh);
        });
    }

    #[test]
    fn test_kinds_are_not_interchangeable() {
        run_with_temp_jwt_secret("test_secret_for_kinds", || {
            let pair = issue_tokens(2, Role::Admin).unwrap();
            assert!(verify_access(&pair.refresh).is_err());
            assert!(verify_refresh(&pair.access).is_err());
        });
    }

    #[test]
    fn test_refresh_mints_a_usable_access_token() {
        run_with_temp_jwt_secret("test_secret_for_refresh", || {
            let pair = issue_tokens(3, Role::Admin).unwrap();
            let access = refresh_access(&pair.refresh).unwrap();
            let claims = verify_access(&access).unwrap();
            assert_eq!(claims.sub, 3);
            assert_eq!(claims.role, Role::Admin);
        });
    }

    #[test]
    fn test_expired_token_is_rejected() {
        run_with_temp_jwt_secret("test_secret_for_expiration", || {
            let now = chrono::Utc::now();
            let claims = Claims {
                sub: 4,
                role: Role::Regular,
                kind: TokenKind::Access,
                iat: (now.timestamp() - 7200) as usize,
                exp: (now.timestamp() - 3600) as usize,
            };
            let expired = encode(
                &Header::default(),
                &claims,
                &EncodingKey::from_secret("test_secret_for_expiration".as_bytes()),
            )
            .unwrap();

            match verify_access(&expired) {
                Err(AppError::Unauthorized(msg)) => {
                    assert!(msg.contains("ExpiredSignature"), "unexpected message: {}", msg)
                }
                Ok(_) => panic!("Token should have been invalid due to expiration"),
                Err(e) => panic!("Unexpected error type for expired token: {:?}", e),
            }
        });
    }

    #[test]
    fn test_forged_signature_is_rejected() {
        run_with_temp_jwt_secret("a_completely_different_secret", || {
            // Signed with a different secret than the one in the environment.
            let forged = {
                let now = chrono::Utc::now();
                let claims = Claims {
                    sub: 5,
                    role: Role::Super,
                    kind: TokenKind::Access,
                    iat: now.timestamp() as usize,
                    exp: (now.timestamp() + 3600) as usize,
                };
                encode(
                    &Header::default(),
                    &claims,
                    &EncodingKey::from_secret("someone_elses_secret".as_bytes()),
                )
                .unwrap()
            };

            match verify_access(&forged) {
                Err(AppError::Unauthorized(msg)) => {
                    assert!(
                        msg.contains("InvalidSignature") || msg.contains("InvalidToken"),
                        "unexpected message: {}",
                        msg
                    );
                }
                Ok(_) => panic!("Token should have been invalid due to signature mismatch"),
                Err(e) => panic!("Unexpected error type for forged token: {:?}", e),
            }
        });
    }
}
