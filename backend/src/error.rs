//! Error handling for the Hirafic marketplace
//!
//! Every failure a handler can produce ends up here and is rendered as
//! `{"error": {"code", "message", "field"}}` with a matching status code.

use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde::Serialize;
use thiserror::Error;

/// Application error types
#[derive(Error, Debug)]
pub enum AppError {
    // Authentication errors
    #[error("Invalid credentials")]
    InvalidCredentials,

    #[error("Unauthorized: {0}")]
    Unauthorized(String),

    #[error("Forbidden: {0}")]
    Forbidden(String),

    // Caller input errors
    #[error("Invalid input: {0}")]
    InvalidInput(String),

    #[error("Validation error: {message}")]
    Validation { field: String, message: String },

    #[error("Validation error: {0}")]
    ValidationError(String),

    #[error("Duplicate entry: {0}")]
    DuplicateEntry(String),

    #[error("Resource not found: {0}")]
    NotFound(String),

    // Business logic errors
    #[error("Conflict: {message}")]
    Conflict { resource: String, message: String },

    #[error("Invalid state transition: {0}")]
    InvalidStateTransition(String),

    // External service errors
    #[error("Upstream service unavailable: {0}")]
    UpstreamUnavailable(String),

    // Database errors
    #[error("Database error: {0}")]
    DatabaseError(#[from] sqlx::Error),

    // Internal errors
    #[error("Internal server error: {0}")]
    Internal(String),

    #[error("Internal server error")]
    InternalError(#[from] anyhow::Error),
}

impl AppError {
    /// Shorthand for a field-level validation failure
    pub fn field(field: &str, message: impl Into<String>) -> Self {
        AppError::Validation {
            field: field.to_string(),
            message: message.into(),
        }
    }

    pub fn status_code(&self) -> StatusCode {
        match self {
            AppError::InvalidCredentials | AppError::Unauthorized(_) => StatusCode::UNAUTHORIZED,
            AppError::Forbidden(_) => StatusCode::FORBIDDEN,
            AppError::InvalidInput(_)
            | AppError::Validation { .. }
            | AppError::ValidationError(_)
            | AppError::DuplicateEntry(_)
            | AppError::Conflict { .. }
            | AppError::InvalidStateTransition(_) => StatusCode::BAD_REQUEST,
            AppError::NotFound(_) => StatusCode::NOT_FOUND,
            AppError::UpstreamUnavailable(_)
            | AppError::DatabaseError(_)
            | AppError::Internal(_)
            | AppError::InternalError(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }
}

impl From<validator::ValidationErrors> for AppError {
    fn from(errors: validator::ValidationErrors) -> Self {
        // Report the first failing field; field order is not stable so pick the
        // alphabetically first one to keep responses deterministic.
        let mut fields: Vec<_> = errors.field_errors().into_iter().collect();
        fields.sort_by(|a, b| a.0.cmp(b.0));

        match fields.into_iter().next() {
            Some((field, errs)) => {
                let message = errs
                    .first()
                    .and_then(|e| e.message.as_ref().map(|m| m.to_string()))
                    .unwrap_or_else(|| format!("{} is invalid", field));
                AppError::field(field, message)
            }
            None => AppError::InvalidInput("Invalid form data".to_string()),
        }
    }
}

/// Error response structure
#[derive(Serialize)]
pub struct ErrorResponse {
    pub error: ErrorDetail,
}

#[derive(Serialize)]
pub struct ErrorDetail {
    pub code: String,
    pub message: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub field: Option<String>,
}

impl ErrorDetail {
    pub fn new(code: &str, message: impl Into<String>) -> Self {
        Self {
            code: code.to_string(),
            message: message.into(),
            field: None,
        }
    }
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let status = self.status_code();
        let error_detail = match &self {
            AppError::InvalidCredentials => {
                ErrorDetail::new("INVALID_CREDENTIALS", "Invalid email or password")
            }
            AppError::Unauthorized(msg) => ErrorDetail::new("UNAUTHORIZED", msg.clone()),
            AppError::Forbidden(msg) => ErrorDetail::new("FORBIDDEN", msg.clone()),
            AppError::InvalidInput(msg) => ErrorDetail::new("INVALID_INPUT", msg.clone()),
            AppError::Validation { field, message } => ErrorDetail {
                code: "VALIDATION_ERROR".to_string(),
                message: message.clone(),
                field: Some(field.clone()),
            },
            AppError::ValidationError(msg) => ErrorDetail::new("VALIDATION_ERROR", msg.clone()),
            AppError::DuplicateEntry(field) => ErrorDetail {
                code: "DUPLICATE_ENTRY".to_string(),
                message: format!("A record with this {} already exists", field),
                field: Some(field.clone()),
            },
            AppError::NotFound(resource) => {
                ErrorDetail::new("NOT_FOUND", format!("{} not found", resource))
            }
            AppError::Conflict { resource, message } => ErrorDetail {
                code: "CONFLICT".to_string(),
                message: message.clone(),
                field: Some(resource.clone()),
            },
            AppError::InvalidStateTransition(msg) => {
                ErrorDetail::new("INVALID_STATE_TRANSITION", msg.clone())
            }
            AppError::UpstreamUnavailable(msg) => ErrorDetail::new("UPSTREAM_UNAVAILABLE", msg.clone()),
            // Store and internal failures never leak detail to the caller
            AppError::DatabaseError(_) => {
                ErrorDetail::new("DATABASE_ERROR", "A database error occurred")
            }
            AppError::Internal(_) | AppError::InternalError(_) => {
                ErrorDetail::new("INTERNAL_ERROR", "An internal server error occurred")
            }
        };

        // Log the error for debugging
        if status.is_server_error() {
            tracing::error!("Error: {:?}", self);
        } else {
            tracing::debug!("Request rejected: {}", self);
        }

        (status, Json(ErrorResponse { error: error_detail })).into_response()
    }
}

/// Result type alias for handlers
pub type AppResult<T> = Result<T, AppError>;
