/// Unified error types for the Rahma server
use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Main error type for the server
#[derive(Error, Debug)]
pub enum AppError {
    /// Database errors
    #[error("Database error: {0}")]
    Database(#[from] sqlx::Error),

    /// Authentication errors (missing or invalid session, bad password)
    #[error("Authentication failed: {0}")]
    Authentication(String),

    /// Validation errors
    #[error("Validation error: {0}")]
    Validation(String),

    /// Not found errors (unknown email, missing profile row)
    #[error("Not found: {0}")]
    NotFound(String),

    /// Conflict errors (e.g., duplicate email)
    #[error("Conflict: {0}")]
    Conflict(String),

    /// Upload storage errors
    #[error("Upload error: {0}")]
    Upload(String),

    /// IO errors
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// Internal server errors
    #[error("Internal error: {0}")]
    Internal(String),
}

/// JSON error response format
#[derive(Debug, Serialize, Deserialize)]
pub struct ErrorResponse {
    pub error: String,
    pub message: String,
    /// Where unauthenticated clients should go next
    #[serde(skip_serializing_if = "Option::is_none")]
    pub redirect: Option<String>,
}

/// Convert AppError to HTTP response
impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let (status, error_code, message) = match self {
            AppError::Authentication(_) => (
                StatusCode::UNAUTHORIZED,
                "AuthenticationRequired",
                self.to_string(),
            ),
            AppError::Validation(_) => (
                StatusCode::BAD_REQUEST,
                "InvalidRequest",
                self.to_string(),
            ),
            AppError::NotFound(_) => (
                StatusCode::NOT_FOUND,
                "NotFound",
                self.to_string(),
            ),
            AppError::Conflict(_) => (
                StatusCode::CONFLICT,
                "Conflict",
                self.to_string(),
            ),
            AppError::Database(_) | AppError::Internal(_) | AppError::Io(_) | AppError::Upload(_) => {
                tracing::error!("request failed: {}", self);
                (
                    StatusCode::INTERNAL_SERVER_ERROR,
                    "InternalServerError",
                    "Internal server error".to_string(), // Don't leak details
                )
            }
        };

        // Anonymous and expired sessions are not distinguished; both get
        // pointed back at the login entry point.
        let redirect = if status == StatusCode::UNAUTHORIZED {
            Some("/api/login".to_string())
        } else {
            None
        };

        let body = Json(ErrorResponse {
            error: error_code.to_string(),
            message,
            redirect,
        });

        (status, body).into_response()
    }
}

/// Result type alias for server operations
pub type AppResult<T> = Result<T, AppError>;
