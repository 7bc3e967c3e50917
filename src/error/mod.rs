//! Application error types for robust error handling.

use std::fmt;

use axum::{
    extract::rejection::JsonRejection,
    http::{header::WWW_AUTHENTICATE, HeaderValue, StatusCode},
    response::{IntoResponse, Response},
    Json,
};
use serde::Serialize;
use serde_json::json;
use thiserror::Error;

/// One rejected input field and the reason it was rejected.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct FieldError {
    pub field: String,
    pub reason: String,
}

impl FieldError {
    pub fn new(field: impl Into<String>, reason: impl Into<String>) -> Self {
        Self {
            field: field.into(),
            reason: reason.into(),
        }
    }
}

/// Typed list of field-level validation failures.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
#[serde(transparent)]
pub struct ValidationErrors(pub Vec<FieldError>);

impl ValidationErrors {
    pub fn single(field: impl Into<String>, reason: impl Into<String>) -> Self {
        Self(vec![FieldError::new(field, reason)])
    }

    /// All reasons reported for `field`, one entry per reason.
    pub fn for_field(field: &str, reasons: impl IntoIterator<Item = String>) -> Self {
        Self(
            reasons
                .into_iter()
                .map(|reason| FieldError::new(field, reason))
                .collect(),
        )
    }

    pub fn fields(&self) -> impl Iterator<Item = &FieldError> {
        self.0.iter()
    }

    /// True if any reason for `field` contains `needle` (case-insensitive).
    pub fn mentions(&self, field: &str, needle: &str) -> bool {
        let needle = needle.to_lowercase();
        self.0
            .iter()
            .any(|e| e.field == field && e.reason.to_lowercase().contains(&needle))
    }
}

impl fmt::Display for ValidationErrors {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let parts: Vec<String> = self
            .0
            .iter()
            .map(|e| format!("{}: {}", e.field, e.reason))
            .collect();
        f.write_str(&parts.join("; "))
    }
}

impl From<validator::ValidationErrors> for ValidationErrors {
    fn from(errors: validator::ValidationErrors) -> Self {
        let mut out = Vec::new();
        for (field, errs) in errors.field_errors() {
            for err in errs {
                let reason = match &err.message {
                    Some(msg) => msg.to_string(),
                    None => format!("{} is invalid ({})", field, err.code),
                };
                out.push(FieldError::new(field.to_string(), reason));
            }
        }
        out.sort_by(|a, b| a.field.cmp(&b.field));
        Self(out)
    }
}

/// Application-level errors.
#[derive(Error, Debug)]
pub enum AppError {
    #[error("Configuration error: {0}")]
    Config(String),

    #[error("Database error: {0}")]
    Db(#[from] sqlx::Error),

    #[error("Validation error: {0}")]
    Validation(ValidationErrors),

    #[error("Conflict: {0}")]
    Conflict(String),

    #[error("Not found: {0}")]
    NotFound(String),

    #[error("Authentication failed: {0}")]
    Auth(String),

    #[error("Forbidden: {0}")]
    Forbidden(String),

    #[error("Internal error: {0}")]
    Internal(#[from] anyhow::Error),
}

impl AppError {
    pub fn validation(field: impl Into<String>, reason: impl Into<String>) -> Self {
        AppError::Validation(ValidationErrors::single(field, reason))
    }

    pub fn status(&self) -> StatusCode {
        match self {
            AppError::Config(_) | AppError::Db(_) | AppError::Internal(_) => {
                StatusCode::INTERNAL_SERVER_ERROR
            }
            AppError::Validation(_) => StatusCode::BAD_REQUEST,
            AppError::Conflict(_) => StatusCode::CONFLICT,
            AppError::NotFound(_) => StatusCode::NOT_FOUND,
            AppError::Auth(_) => StatusCode::UNAUTHORIZED,
            AppError::Forbidden(_) => StatusCode::FORBIDDEN,
        }
    }
}

impl From<ValidationErrors> for AppError {
    fn from(errors: ValidationErrors) -> Self {
        AppError::Validation(errors)
    }
}

/// Unreadable or mistyped request bodies are reported like any other bad input.
impl From<JsonRejection> for AppError {
    fn from(rejection: JsonRejection) -> Self {
        let reason = match rejection {
            JsonRejection::MissingJsonContentType(_) => {
                "Expected Content-Type: application/json".to_string()
            }
            other => other.body_text(),
        };
        AppError::validation("body", reason)
    }
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let status = self.status();
        let body = match &self {
            AppError::Config(msg) => {
                tracing::error!(error = %msg, "configuration error");
                json!({ "error": "Server misconfigured" })
            }
            AppError::Db(e) => {
                tracing::error!(error = %e, "database error");
                json!({ "error": "Database error" })
            }
            AppError::Internal(e) => {
                tracing::error!(error = %e, "internal error");
                json!({ "error": "Internal error" })
            }
            AppError::Validation(errors) => json!({
                "error": "Validation failed",
                "details": errors,
            }),
            AppError::Conflict(msg)
            | AppError::NotFound(msg)
            | AppError::Auth(msg)
            | AppError::Forbidden(msg) => json!({ "error": msg }),
        };

        let mut response = (status, Json(body)).into_response();
        if status == StatusCode::UNAUTHORIZED {
            response
                .headers_mut()
                .insert(WWW_AUTHENTICATE, HeaderValue::from_static("Bearer"));
        }
        response
    }
}

pub type AppResult<T> = Result<T, AppError>;
