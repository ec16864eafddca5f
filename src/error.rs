use std::collections::BTreeMap;
use std::fmt;

use axum::{
    extract::rejection::JsonRejection,
    http::{StatusCode, header},
    response::{IntoResponse, Response},
};
use serde::Serialize;
use thiserror::Error;

/// Field-keyed validation messages, ordered by field name.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
#[serde(transparent)]
pub struct FieldErrors(BTreeMap<String, Vec<String>>);

impl FieldErrors {
    pub fn new() -> Self {
        Self::default()
    }

    /// A collection holding one message for one field.
    pub fn single(field: impl Into<String>, message: impl Into<String>) -> Self {
        let mut errors = Self::new();
        errors.add(field, message);
        errors
    }

    pub fn add(&mut self, field: impl Into<String>, message: impl Into<String>) {
        self.0.entry(field.into()).or_default().push(message.into());
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn contains(&self, field: &str) -> bool {
        self.0.contains_key(field)
    }

    /// Messages recorded for `field`, empty when the field is valid.
    pub fn messages(&self, field: &str) -> &[String] {
        self.0.get(field).map(Vec::as_slice).unwrap_or(&[])
    }

    pub fn fields(&self) -> impl Iterator<Item = &str> {
        self.0.keys().map(String::as_str)
    }
}

impl From<garde::Report> for FieldErrors {
    fn from(report: garde::Report) -> Self {
        let mut errors = Self::new();
        for (path, error) in report.iter() {
            errors.add(path.to_string(), error.message().to_string());
        }
        errors
    }
}

impl fmt::Display for FieldErrors {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let mut first = true;
        for (field, messages) in &self.0 {
            for message in messages {
                if !first {
                    f.write_str("; ")?;
                }
                write!(f, "{}: {}", field, message)?;
                first = false;
            }
        }
        Ok(())
    }
}

/// The application's error type.
#[derive(Error, Debug)]
pub enum AppError {
    /// A database error.
    #[error("Database error: {0}")]
    Database(#[from] tokio_postgres::Error),

    /// A connection pool checkout error.
    #[error("Pool error: {0}")]
    Pool(#[from] deadpool_postgres::PoolError),

    /// A connection pool construction error.
    #[error("Pool creation error: {0}")]
    CreatePool(#[from] deadpool_postgres::CreatePoolError),

    /// A Redis error.
    #[error("Redis error: {0}")]
    Redis(#[from] redis::RedisError),

    /// No resolvable session.
    #[error("Authentication required")]
    Unauthenticated,

    /// Bad credentials on login.
    #[error("Authentication failed: {0}")]
    Authentication(String),

    /// A request that is authenticated but not allowed (CSRF failures).
    #[error("Forbidden: {0}")]
    Forbidden(String),

    /// The record does not exist or belongs to another user.
    #[error("Resource not found")]
    NotFound,

    /// One or more fields failed validation.
    #[error("Validation error: {0}")]
    Validation(FieldErrors),

    /// A request body that is not a JSON object of the expected shape.
    #[error("Bad request: {0}")]
    BadRequest(String),

    /// A uniqueness conflict.
    #[error("Conflict: {0}")]
    Conflict(String),

    /// An internal server error.
    #[error("Internal server error: {0}")]
    Internal(String),
}

/// A `Result` type that uses `AppError` as the error type.
pub type Result<T> = std::result::Result<T, AppError>;

impl AppError {
    /// Whether this error belongs to the storage failure class.
    pub fn is_storage_failure(&self) -> bool {
        matches!(
            self,
            AppError::Database(_)
                | AppError::Pool(_)
                | AppError::CreatePool(_)
                | AppError::Redis(_)
                | AppError::Internal(_)
        )
    }
}

impl From<JsonRejection> for AppError {
    fn from(rejection: JsonRejection) -> Self {
        match rejection {
            JsonRejection::JsonDataError(e) => {
                AppError::Validation(FieldErrors::single("body", e.body_text()))
            }
            other => AppError::BadRequest(other.body_text()),
        }
    }
}

/// JSON body of every error response.
#[derive(Serialize)]
struct ErrorBody {
    error: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    redirect: Option<&'static str>,
    #[serde(skip_serializing_if = "Option::is_none")]
    fields: Option<FieldErrors>,
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let mut redirect = None;
        let mut fields = None;

        let (status, message) = match self {
            AppError::Database(ref e) => {
                tracing::error!("Database error: {}", e);
                (StatusCode::INTERNAL_SERVER_ERROR, "Database error".to_string())
            }

            AppError::Pool(ref e) => {
                tracing::error!("Pool error: {}", e);
                (StatusCode::INTERNAL_SERVER_ERROR, "Database error".to_string())
            }

            AppError::CreatePool(ref e) => {
                tracing::error!("Pool creation error: {}", e);
                (StatusCode::INTERNAL_SERVER_ERROR, "Database error".to_string())
            }

            AppError::Redis(ref e) => {
                tracing::error!("Redis error: {}", e);
                (StatusCode::INTERNAL_SERVER_ERROR, "Session store error".to_string())
            }

            AppError::Unauthenticated => {
                tracing::warn!("Request without a valid session");
                redirect = Some("/login");
                (StatusCode::UNAUTHORIZED, "Authentication required".to_string())
            }

            AppError::Authentication(ref msg) => {
                tracing::warn!("Authentication failed: {}", msg);
                (StatusCode::UNAUTHORIZED, msg.clone())
            }

            AppError::Forbidden(ref msg) => {
                tracing::warn!("Forbidden: {}", msg);
                (StatusCode::FORBIDDEN, msg.clone())
            }

            AppError::NotFound => {
                tracing::debug!("Resource not found");
                redirect = Some("/dashboard");
                (StatusCode::NOT_FOUND, "Loan not found".to_string())
            }

            AppError::Validation(errors) => {
                tracing::debug!("Validation error: {}", errors);
                fields = Some(errors);
                (StatusCode::UNPROCESSABLE_ENTITY, "Validation failed".to_string())
            }

            AppError::BadRequest(ref msg) => {
                tracing::debug!("Bad request: {}", msg);
                (StatusCode::BAD_REQUEST, msg.clone())
            }

            AppError::Conflict(ref msg) => {
                tracing::debug!("Conflict: {}", msg);
                (StatusCode::CONFLICT, msg.clone())
            }

            AppError::Internal(ref msg) => {
                tracing::error!("Internal error: {}", msg);
                (StatusCode::INTERNAL_SERVER_ERROR, "Internal server error".to_string())
            }
        };

        let body = sonic_rs::to_string(&ErrorBody {
            error: message,
            redirect,
            fields,
        })
        .unwrap_or_else(|_| r#"{"error":"Internal server error"}"#.to_string());

        (status, [(header::CONTENT_TYPE, "application/json")], body).into_response()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn field_errors_group_messages_by_field() {
        let mut errors = FieldErrors::new();
        errors.add("amount", "Amount is required");
        errors.add("amount", "Amount must be a positive number");
        errors.add("interest_rate", "Interest rate is required");

        assert!(errors.contains("amount"));
        assert_eq!(errors.messages("amount").len(), 2);
        assert!(errors.messages("term_months").is_empty());
        assert_eq!(errors.fields().collect::<Vec<_>>(), vec!["amount", "interest_rate"]);
    }

    #[test]
    fn field_errors_display_joins_every_message() {
        let errors = FieldErrors::single("amount", "Amount is required");
        assert_eq!(errors.to_string(), "amount: Amount is required");
    }

    #[test]
    fn status_codes_follow_error_class() {
        assert_eq!(AppError::Unauthenticated.into_response().status(), StatusCode::UNAUTHORIZED);
        assert_eq!(AppError::NotFound.into_response().status(), StatusCode::NOT_FOUND);
        assert_eq!(
            AppError::Validation(FieldErrors::single("amount", "bad")).into_response().status(),
            StatusCode::UNPROCESSABLE_ENTITY
        );
        assert_eq!(
            AppError::Internal("boom".into()).into_response().status(),
            StatusCode::INTERNAL_SERVER_ERROR
        );
        assert!(AppError::Internal("boom".into()).is_storage_failure());
        assert!(!AppError::NotFound.is_storage_failure());
        assert_eq!(
            AppError::BadRequest("not json".into()).into_response().status(),
            StatusCode::BAD_REQUEST
        );
    }
}
