use crate::error::AppError;
use bcrypt::{hash, verify};
use validator::ValidationError;

pub fn hash_password(password: &str) -> Result<String, AppError> {
    hash(password, 12) // bcrypt default cost is 12
        .map_err(|e| AppError::Internal(format!("Failed to hash password: {}", e)))
}

pub fn verify_password(password: &str, hashed_password: &str) -> Result<bool, AppError> {
    verify(password, hashed_password)
        .map_err(|e| AppError::Internal(format!("Failed to verify password: {}", e)))
}

/// Password policy applied at registration and password reset: at least 8
/// characters with an uppercase letter, a lowercase letter, a digit, and a
/// punctuation character.
pub fn validate_password(password: &str) -> Result<(), ValidationError> {
    let long_enough = password.chars().count() >= 8;
    let has_upper = password.chars().any(|c| c.is_ascii_uppercase());
    let has_lower = password.chars().any(|c| c.is_ascii_lowercase());
    let has_digit = password.chars().any(|c| c.is_ascii_digit());
    let has_symbol = password.chars().any(|c| c.is_ascii_punctuation());

    if long_enough && has_upper && has_lower && has_digit && has_symbol {
        Ok(())
    } else {
        let mut err = ValidationError::new("password_policy");
        err.message = Some(
            "Password must be at least 8 characters and contain an uppercase letter, \
             a lowercase letter, a digit, and a special character."
                .into(),
        );
        Err(err)
    }
}

/// Same policy, reported as an `AppError` for handlers outside derive-based
/// validation (the reset-confirm flow).
pub fn check_password_policy(password: &str) -> Result<(), AppError> {
    validate_password(password).map_err(|e| {
        AppError::BadRequest(
            e.message
                .map(|m| m.to_string())
                .unwrap_or_else(|| "Password does not meet the policy".to_string()),
        )
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_password_hashing_and_verification() {
        let password = "Test@1234";
        let hashed = hash_password(password).unwrap();

        assert!(verify_password(password, &hashed).unwrap());
        assert!(!verify_password("wrong_password", &hashed).unwrap());
    }

    #[test]
    fn test_verify_with_invalid_hash() {
        match verify_password("Test@1234", "invalidhashformat") {
            Err(AppError::Internal(msg)) => {
                assert!(msg.contains("Failed to verify password"));
            }
            Ok(false) => {
                // bcrypt may report a malformed hash as a plain mismatch.
            }
            Ok(true) => panic!("Password verification should fail for invalid hash format"),
            Err(e) => panic!("Unexpected error: {:?}", e),
        }
    }

    #[test]
    fn test_password_policy() {
        assert!(validate_password("Test@1234").is_ok());
        assert!(validate_password("Aa1!aaaa").is_ok());

        // too short
        assert!(validate_password("Aa1!a").is_err());
        assert!(validate_password("short").is_err());
        // missing character classes
        assert!(validate_password("alllowercase1!").is_err());
        assert!(validate_password("ALLUPPERCASE1!").is_err());
        assert!(validate_password("NoDigits!!").is_err());
        assert!(validate_password("NoSymbols11").is_err());
    }

    #[test]
    fn test_policy_as_app_error_is_bad_request() {
        match check_password_policy("short") {
            Err(AppError::BadRequest(msg)) => assert!(msg.contains("at least 8")),
            other => panic!("expected BadRequest, got {:?}", other),
        }
    }
}
