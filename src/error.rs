//! Application error type and its HTTP mapping.
//!
//! Every fallible operation that reaches an HTTP handler ends up as an
//! [`AppError`]. The variant selects the status code; the body always has the
//! shape `{"error": {"code", "message", "details"}}`.

use axum::{
    Json,
    extract::rejection::JsonRejection,
    http::StatusCode,
    response::{IntoResponse, Response},
};
use serde::Serialize;
use serde_json::{Value, json};

#[derive(Serialize)]
struct ErrorBody {
    error: ErrorInfo,
}

/// Serializable error payload returned to API clients.
#[derive(Debug, Serialize)]
pub struct ErrorInfo {
    pub code: &'static str,
    pub message: String,
    pub details: Value,
}

#[derive(Debug, thiserror::Error)]
pub enum AppError {
    #[error("{message}")]
    Validation { message: String, details: Value },
    #[error("{message}")]
    NotFound { message: String, details: Value },
    #[error("{message}")]
    Conflict { message: String, details: Value },
    #[error("{message}")]
    TooManyRequests { message: String, details: Value },
    #[error("{message}")]
    Internal { message: String, details: Value },
    #[error("{message}")]
    BadGateway { message: String, details: Value },
    #[error("{message}")]
    ServiceUnavailable { message: String, details: Value },
}

impl AppError {
    pub fn bad_request(message: impl Into<String>, details: Value) -> Self {
        Self::Validation {
            message: message.into(),
            details,
        }
    }
    pub fn not_found(message: impl Into<String>, details: Value) -> Self {
        Self::NotFound {
            message: message.into(),
            details,
        }
    }
    pub fn conflict(message: impl Into<String>, details: Value) -> Self {
        Self::Conflict {
            message: message.into(),
            details,
        }
    }
    pub fn too_many_requests(message: impl Into<String>, details: Value) -> Self {
        Self::TooManyRequests {
            message: message.into(),
            details,
        }
    }
    pub fn internal(message: impl Into<String>, details: Value) -> Self {
        Self::Internal {
            message: message.into(),
            details,
        }
    }
    pub fn bad_gateway(message: impl Into<String>, details: Value) -> Self {
        Self::BadGateway {
            message: message.into(),
            details,
        }
    }
    pub fn service_unavailable(message: impl Into<String>, details: Value) -> Self {
        Self::ServiceUnavailable {
            message: message.into(),
            details,
        }
    }

    /// Returns true for a store-level unique constraint violation.
    pub fn is_conflict(&self) -> bool {
        matches!(self, Self::Conflict { .. })
    }

    fn parts(&self) -> (StatusCode, &'static str) {
        match self {
            AppError::Validation { .. } => (StatusCode::BAD_REQUEST, "validation_error"),
            AppError::NotFound { .. } => (StatusCode::NOT_FOUND, "not_found"),
            AppError::Conflict { .. } => (StatusCode::CONFLICT, "conflict"),
            AppError::TooManyRequests { .. } => (StatusCode::TOO_MANY_REQUESTS, "rate_limited"),
            AppError::Internal { .. } => (StatusCode::INTERNAL_SERVER_ERROR, "internal_error"),
            AppError::BadGateway { .. } => (StatusCode::BAD_GATEWAY, "upstream_error"),
            AppError::ServiceUnavailable { .. } => {
                (StatusCode::SERVICE_UNAVAILABLE, "service_unavailable")
            }
        }
    }

    /// HTTP status this error maps to.
    pub fn status_code(&self) -> StatusCode {
        self.parts().0
    }

    /// Converts the error into its serializable form.
    pub fn to_error_info(&self) -> ErrorInfo {
        let details = match self {
            AppError::Validation { details, .. }
            | AppError::NotFound { details, .. }
            | AppError::Conflict { details, .. }
            | AppError::TooManyRequests { details, .. }
            | AppError::Internal { details, .. }
            | AppError::BadGateway { details, .. }
            | AppError::ServiceUnavailable { details, .. } => details.clone(),
        };

        ErrorInfo {
            code: self.parts().1,
            message: self.to_string(),
            details,
        }
    }
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let status = self.status_code();
        let body = ErrorBody {
            error: self.to_error_info(),
        };

        (status, Json(body)).into_response()
    }
}

impl From<sqlx::Error> for AppError {
    fn from(e: sqlx::Error) -> Self {
        map_sqlx_error(e)
    }
}

impl From<JsonRejection> for AppError {
    fn from(e: JsonRejection) -> Self {
        AppError::bad_request("Invalid request body", json!({ "reason": e.body_text() }))
    }
}

impl From<validator::ValidationErrors> for AppError {
    fn from(e: validator::ValidationErrors) -> Self {
        AppError::bad_request("Request validation failed", json!({ "fields": e }))
    }
}

pub fn map_sqlx_error(e: sqlx::Error) -> AppError {
    if let Some(db) = e.as_database_error()
        && db.is_unique_violation()
    {
        return AppError::conflict(
            "Unique constraint violation",
            json!({ "constraint": db.constraint() }),
        );
    }

    tracing::error!("Database error: {}", e);
    AppError::internal("Database error", json!({}))
}
