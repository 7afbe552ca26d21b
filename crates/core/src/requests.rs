//! Request bodies accepted by the gateway, with field validation.
//!
//! Rules come from `validator` derives, with the username character set as a
//! custom rule on the field. When several fields fail, the first one in
//! declaration order is reported as the error `target`.

use serde::Deserialize;
use std::borrow::Cow;

use validator::{Validate, ValidationError, ValidationErrors};

use crate::error::CoreError;

/// Body of `POST /login`.
#[derive(Debug, Clone, Deserialize, Validate)]
pub struct LoginRequest {
    #[validate(length(min = 1, max = 64, message = "Username is required"))]
    pub username: String,
    #[validate(length(min = 1, max = 1024, message = "Password is required"))]
    pub password: String,
}

/// Body of `POST /users`.
#[derive(Debug, Clone, Deserialize, Validate)]
pub struct CreateUserRequest {
    #[validate(length(min = 1, max = 255, message = "Name is required"))]
    pub name: String,
    #[validate(
        length(min = 3, max = 64, message = "Username must be 3 to 64 characters"),
        custom(function = "validate_username_charset")
    )]
    pub username: String,
    #[validate(length(min = 1, max = 1024, message = "Password is required"))]
    pub password: String,
}

/// Body of `POST /refresh`.
#[derive(Debug, Clone, Deserialize)]
pub struct RefreshRequest {
    pub refresh_token: String,
}

/// Body of `POST /autologin`.
#[derive(Debug, Clone, Deserialize)]
pub struct AutologinRequest {
    pub username: String,
}

impl LoginRequest {
    pub fn check(&self) -> Result<(), CoreError> {
        self.validate()
            .map_err(|errors| first_failure(&errors, &["username", "password"]))
    }
}

impl CreateUserRequest {
    pub fn check(&self) -> Result<(), CoreError> {
        self.validate()
            .map_err(|errors| first_failure(&errors, &["name", "username", "password"]))
    }
}

/// Usernames are restricted to ASCII letters, digits, `_`, `-` and `.`.
pub fn is_valid_username(username: &str) -> bool {
    !username.is_empty()
        && username
            .chars()
            .all(|c| c.is_ascii_alphanumeric() || matches!(c, '_' | '-' | '.'))
}

fn validate_username_charset(username: &str) -> Result<(), ValidationError> {
    if is_valid_username(username) {
        return Ok(());
    }
    Err(ValidationError::new("username_charset").with_message(Cow::Borrowed(
        "Username may only contain letters, digits, '_', '-' and '.'",
    )))
}

fn first_failure(errors: &ValidationErrors, order: &[&'static str]) -> CoreError {
    let field_errors = errors.field_errors();
    for &field in order {
        if let Some(failures) = field_errors.get(field) {
            let message = failures
                .first()
                .and_then(|e| e.message.as_ref())
                .map(|m| m.to_string())
                .unwrap_or_else(|| format!("{field} is invalid"));
            return CoreError::invalid_field(field, message);
        }
    }
    CoreError::Validation {
        message: errors.to_string(),
        target: None,
    }
}

#[cfg(test)]
mod tests {
    use assert_matches::assert_matches;

    use super::*;

    fn create(name: &str, username: &str, password: &str) -> CreateUserRequest {
        CreateUserRequest {
            name: name.to_string(),
            username: username.to_string(),
            password: password.to_string(),
        }
    }

    #[test]
    fn accepts_a_well_formed_signup() {
        assert!(create("A", "alice", "p1").check().is_ok());
    }

    #[test]
    fn reports_first_failing_field_in_order() {
        let err = create("", "x", "").check().unwrap_err();
        assert_matches!(err, CoreError::Validation { target: Some("name"), .. });

        let err = create("A", "x", "").check().unwrap_err();
        assert_matches!(err, CoreError::Validation { target: Some("username"), .. });

        let err = create("A", "alice", "").check().unwrap_err();
        assert_matches!(err, CoreError::Validation { target: Some("password"), .. });

        let err = create("A", "al ice", "").check().unwrap_err();
        assert_matches!(err, CoreError::Validation { target: Some("username"), .. });
    }

    #[test]
    fn rejects_usernames_outside_the_charset() {
        let err = create("A", "al ice", "p1").check().unwrap_err();
        assert_matches!(
            err,
            CoreError::Validation { ref message, target: Some("username") }
                if message.contains("letters, digits")
        );
        assert!(is_valid_username("a.l-i_ce9"));
        assert!(!is_valid_username("alice@host"));
    }

    #[test]
    fn login_requires_both_fields() {
        let missing_password = LoginRequest {
            username: "alice".into(),
            password: String::new(),
        };
        let err = missing_password.check().unwrap_err();
        assert_matches!(err, CoreError::Validation { target: Some("password"), .. });
    }
}
