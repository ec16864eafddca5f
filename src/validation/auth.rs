use garde::Validate;
use serde::Deserialize;
use zeroize::{Zeroize, ZeroizeOnDrop};

use crate::error::{AppError, FieldErrors, Result};

/// The request payload for user registration.
#[derive(Default, Deserialize, Validate, Zeroize, ZeroizeOnDrop)]
pub struct RegisterRequest {
    #[serde(default)]
    #[garde(length(min = 2, max = 100))]
    pub first_name: String,
    #[serde(default)]
    #[garde(length(min = 2, max = 100))]
    pub last_name: String,
    #[serde(default)]
    #[garde(email)]
    pub email: String,
    #[serde(default)]
    #[garde(length(min = 8, max = 128), custom(password_strength))]
    pub password: String,
    #[serde(default)]
    #[garde(matches(password))]
    pub confirm_password: String,
}

impl RegisterRequest {
    /// The display name stored for the account.
    pub fn full_name(&self) -> String {
        format!("{} {}", self.first_name.trim(), self.last_name.trim())
    }
}

/// The request payload for user login.
#[derive(Default, Deserialize, Validate, Zeroize, ZeroizeOnDrop)]
pub struct LoginRequest {
    #[serde(default)]
    #[garde(email)]
    pub email: String,
    #[serde(default)]
    #[garde(length(min = 1))]
    pub password: String,
}

/// Validates a registration payload, reporting every failing field.
pub fn validate_register(request: &RegisterRequest) -> Result<()> {
    request
        .validate()
        .map_err(|report| AppError::Validation(FieldErrors::from(report)))
}

/// Validates a login payload.
pub fn validate_login(request: &LoginRequest) -> Result<()> {
    request
        .validate()
        .map_err(|report| AppError::Validation(FieldErrors::from(report)))
}

/// Lowercases and trims an email so lookups are case-insensitive.
pub fn normalize_email(email: &str) -> String {
    email.trim().to_lowercase()
}

/// Requires a lowercase letter, an uppercase letter, and a digit.
fn password_strength(password: &str, _: &()) -> garde::Result {
    let has_lower = password.chars().any(|c| c.is_ascii_lowercase());
    let has_upper = password.chars().any(|c| c.is_ascii_uppercase());
    let has_digit = password.chars().any(|c| c.is_ascii_digit());

    if has_lower && has_upper && has_digit {
        Ok(())
    } else {
        Err(garde::Error::new(
            "Password must contain a lowercase letter, an uppercase letter and a digit",
        ))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn register(password: &str, confirm: &str) -> RegisterRequest {
        RegisterRequest {
            first_name: "Ada".to_string(),
            last_name: "Lovelace".to_string(),
            email: "ada@example.com".to_string(),
            password: password.to_string(),
            confirm_password: confirm.to_string(),
        }
    }

    fn failing_fields(result: Result<()>) -> Vec<String> {
        match result {
            Err(AppError::Validation(errors)) => errors.fields().map(str::to_string).collect(),
            other => panic!("expected validation failure, got {:?}", other.err()),
        }
    }

    #[test]
    fn accepts_a_strong_matching_password() {
        assert!(validate_register(&register("Sup3rSecret", "Sup3rSecret")).is_ok());
    }

    #[test]
    fn weak_password_is_rejected() {
        let fields = failing_fields(validate_register(&register("alllowercase1", "alllowercase1")));
        assert_eq!(fields, vec!["password".to_string()]);
    }

    #[test]
    fn confirmation_must_match() {
        let fields = failing_fields(validate_register(&register("Sup3rSecret", "Sup3rSecreT")));
        assert_eq!(fields, vec!["confirm_password".to_string()]);
    }

    #[test]
    fn short_names_and_bad_email_are_all_reported() {
        let mut request = register("Sup3rSecret", "Sup3rSecret");
        request.first_name = "A".to_string();
        request.last_name = "B".to_string();
        request.email = "not-an-email".to_string();

        let fields = failing_fields(validate_register(&request));
        assert_eq!(fields, vec!["email", "first_name", "last_name"]);
    }

    #[test]
    fn full_name_joins_trimmed_parts() {
        let mut request = register("Sup3rSecret", "Sup3rSecret");
        request.first_name = " Ada ".to_string();
        assert_eq!(request.full_name(), "Ada Lovelace");
    }

    #[test]
    fn login_requires_email_and_password() {
        let request = LoginRequest {
            email: "ada".to_string(),
            password: String::new(),
        };
        let fields = failing_fields(validate_login(&request));
        assert_eq!(fields, vec!["email", "password"]);
    }

    #[test]
    fn missing_keys_fail_field_validation() {
        let request: RegisterRequest =
            serde_json::from_str(r#"{"email":"ada@example.com"}"#).unwrap();
        let fields = failing_fields(validate_register(&request));
        assert_eq!(fields, vec!["first_name", "last_name", "password"]);
    }

    #[test]
    fn emails_are_normalized() {
        assert_eq!(normalize_email("  Ada@Example.COM "), "ada@example.com");
    }
}
