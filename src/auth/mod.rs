pub mod extractors;
pub mod middleware;
pub mod password;
pub mod reset;
pub mod token;

use lazy_static::lazy_static;
use serde::{Deserialize, Serialize};
use validator::Validate;

// Re-export necessary items
pub use extractors::CurrentUser;
pub use middleware::AuthMiddleware;
pub use password::{check_password_policy, hash_password, validate_password, verify_password};
pub use reset::{generate_reset_token, verify_reset_token};
pub use token::{issue_tokens, refresh_access, verify_access, verify_refresh, Claims, TokenPair};

lazy_static! {
    // Regex for username validation: alphanumeric, underscores, hyphens
    static ref USERNAME_REGEX: regex::Regex = regex::Regex::new(r"^[a-zA-Z0-9_-]+$").unwrap();
}

/// Represents the payload for a new user registration request.
///
/// `is_admin` is client-suppliable, preserved as-is from the system this
/// reimplements. `first_name`/`last_name` default to empty strings.
#[derive(Debug, Deserialize, Validate)]
pub struct RegisterRequest {
    #[validate(
        length(min = 3, max = 32),
        regex(
            path = "USERNAME_REGEX",
            message = "Username must be alphanumeric, underscores, or hyphens"
        )
    )]
    pub username: String,
    #[validate(email)]
    pub email: String,
    #[validate(custom = "validate_password")]
    pub password: String,
    #[serde(default)]
    pub is_admin: bool,
    #[serde(default)]
    pub first_name: String,
    #[serde(default)]
    pub last_name: String,
}

/// Represents the payload for a user login request.
#[derive(Debug, Deserialize, Validate)]
pub struct LoginRequest {
    #[validate(length(min = 1))]
    pub username: String,
    #[validate(length(min = 1))]
    pub password: String,
}

/// Payload for minting a new access token from a refresh token.
#[derive(Debug, Serialize, Deserialize)]
pub struct RefreshRequest {
    pub refresh: String,
}

/// Payload for requesting a password-reset mail.
#[derive(Debug, Deserialize, Validate)]
pub struct PasswordResetRequest {
    #[validate(email)]
    pub email: String,
}

/// Payload for confirming a password reset with the mailed token.
#[derive(Debug, Deserialize, Validate)]
pub struct PasswordResetConfirmRequest {
    #[validate(length(min = 1))]
    pub token: String,
    #[validate(length(min = 1))]
    pub new_password: String,
}

#[cfg(test)]
mod tests {
    use super::*;
    use validator::Validate;

    #[test]
    fn test_register_request_validation() {
        let valid = RegisterRequest {
            username: "test_user-123".to_string(),
            email: "test@example.com".to_string(),
            password: "Test@1234".to_string(),
            is_admin: false,
            first_name: "Test".to_string(),
            last_name: "User".to_string(),
        };
        assert!(valid.validate().is_ok());

        let bad_username = RegisterRequest {
            username: "test user!".to_string(), // contains space and exclamation
            email: "test@example.com".to_string(),
            password: "Test@1234".to_string(),
            is_admin: false,
            first_name: String::new(),
            last_name: String::new(),
        };
        assert!(bad_username.validate().is_err());

        let weak_password = RegisterRequest {
            username: "testuser".to_string(),
            email: "test@example.com".to_string(),
            password: "short".to_string(),
            is_admin: false,
            first_name: String::new(),
            last_name: String::new(),
        };
        let errors = weak_password.validate().unwrap_err();
        assert!(errors.field_errors().contains_key("password"));

        let bad_email = RegisterRequest {
            username: "testuser".to_string(),
            email: "testexample.com".to_string(),
            password: "Test@1234".to_string(),
            is_admin: false,
            first_name: String::new(),
            last_name: String::new(),
        };
        assert!(bad_email.validate().is_err());
    }

    #[test]
    fn test_login_request_validation() {
        let valid = LoginRequest {
            username: "testuser".to_string(),
            password: "Test@1234".to_string(),
        };
        assert!(valid.validate().is_ok());

        let empty_username = LoginRequest {
            username: "".to_string(),
            password: "Test@1234".to_string(),
        };
        assert!(empty_username.validate().is_err());
    }

    #[test]
    fn test_password_reset_request_validation() {
        let valid = PasswordResetRequest {
            email: "test@example.com".to_string(),
        };
        assert!(valid.validate().is_ok());

        let invalid = PasswordResetRequest {
            email: "not-an-email".to_string(),
        };
        assert!(invalid.validate().is_err());
    }
}
