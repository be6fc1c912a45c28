//! API error handling
//!
//! Service errors are converted into HTTP responses here. Most errors use
//! the JSON envelope; the library category rejection is rendered as plain
//! text, which Studio clients already expect.

use axum::{
    http::{header::CONTENT_TYPE, StatusCode},
    response::{IntoResponse, Response},
    Json,
};
use serde::{Deserialize, Serialize};
use std::fmt;
use studio_bridge_service::ServiceError;

/// How an error body is rendered
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorFormat {
    /// `ErrorResponse` JSON envelope
    Json,
    /// The bare message as `text/plain`
    PlainText,
}

/// API error type that can be converted to HTTP responses
#[derive(Debug)]
pub struct ApiError {
    status_code: StatusCode,
    message: String,
    error_code: Option<String>,
    format: ErrorFormat,
}

impl ApiError {
    /// Create a new API error
    pub fn new(status_code: StatusCode, message: impl Into<String>) -> Self {
        Self {
            status_code,
            message: message.into(),
            error_code: None,
            format: ErrorFormat::Json,
        }
    }

    /// Create an API error with an error code
    pub fn with_code(
        status_code: StatusCode,
        message: impl Into<String>,
        error_code: impl Into<String>,
    ) -> Self {
        Self {
            error_code: Some(error_code.into()),
            ..Self::new(status_code, message)
        }
    }

    /// Create an error whose body is the plain message
    pub fn plain_text(status_code: StatusCode, message: impl Into<String>) -> Self {
        Self {
            format: ErrorFormat::PlainText,
            ..Self::new(status_code, message)
        }
    }

    /// Create a bad request error (400)
    pub fn bad_request(message: impl Into<String>) -> Self {
        Self::new(StatusCode::BAD_REQUEST, message)
    }

    /// Create a not found error (404)
    pub fn not_found(message: impl Into<String>) -> Self {
        Self::new(StatusCode::NOT_FOUND, message)
    }

    /// Create an internal server error (500)
    pub fn internal_server_error(message: impl Into<String>) -> Self {
        Self::new(StatusCode::INTERNAL_SERVER_ERROR, message)
    }

    /// Create an unauthorized error (401)
    pub fn unauthorized(message: impl Into<String>) -> Self {
        Self::new(StatusCode::UNAUTHORIZED, message)
    }

    pub fn status_code(&self) -> StatusCode {
        self.status_code
    }

    pub fn error_code(&self) -> Option<&str> {
        self.error_code.as_deref()
    }

    pub fn format(&self) -> ErrorFormat {
        self.format
    }
}

impl fmt::Display for ApiError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.message)
    }
}

impl std::error::Error for ApiError {}

/// Error response JSON structure
#[derive(Debug, Serialize, Deserialize)]
pub struct ErrorResponse {
    /// HTTP status code
    pub status: u16,

    /// Error message
    pub error: String,

    /// Optional error code for programmatic handling
    #[serde(skip_serializing_if = "Option::is_none")]
    pub code: Option<String>,

    /// Timestamp of the error
    pub timestamp: chrono::DateTime<chrono::Utc>,
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        match self.format {
            ErrorFormat::PlainText => (
                self.status_code,
                [(CONTENT_TYPE, "text/plain; charset=utf-8")],
                self.message,
            )
                .into_response(),
            ErrorFormat::Json => {
                let error_response = ErrorResponse {
                    status: self.status_code.as_u16(),
                    error: self.message,
                    code: self.error_code,
                    timestamp: chrono::Utc::now(),
                };

                (self.status_code, Json(error_response)).into_response()
            }
        }
    }
}

/// Convert ServiceError to ApiError
impl From<ServiceError> for ApiError {
    fn from(err: ServiceError) -> Self {
        match err {
            ServiceError::NotFound(msg) => ApiError::with_code(
                StatusCode::NOT_FOUND,
                format!("Item not found: {}", msg),
                "ITEM_NOT_FOUND",
            ),
            ServiceError::InvalidKey(msg) => ApiError::with_code(
                StatusCode::BAD_REQUEST,
                format!("Invalid key: {}", msg),
                "INVALID_KEY",
            ),
            ServiceError::InvalidInput(msg) => {
                ApiError::with_code(StatusCode::BAD_REQUEST, msg, "INVALID_INPUT")
            }
            err @ ServiceError::UnsupportedLibraryCategory { .. } => {
                ApiError::plain_text(StatusCode::BAD_REQUEST, err.to_string())
            }
            err @ ServiceError::DuplicateNotImplemented => ApiError::with_code(
                StatusCode::NOT_IMPLEMENTED,
                err.to_string(),
                "DUPLICATE_NOT_IMPLEMENTED",
            ),
            err @ ServiceError::NoSuchHandler { .. } => {
                ApiError::with_code(StatusCode::NOT_FOUND, err.to_string(), "NO_SUCH_HANDLER")
            }
            err @ ServiceError::AsideNotFound(_) => {
                ApiError::with_code(StatusCode::NOT_FOUND, err.to_string(), "ASIDE_NOT_FOUND")
            }
            ServiceError::AlreadyExists(msg) => ApiError::with_code(
                StatusCode::CONFLICT,
                format!("Item already exists: {}", msg),
                "ALREADY_EXISTS",
            ),
            ServiceError::Database(msg) => ApiError::with_code(
                StatusCode::INTERNAL_SERVER_ERROR,
                format!("Database error: {}", msg),
                "DATABASE_ERROR",
            ),
            ServiceError::Internal(msg) => ApiError::with_code(
                StatusCode::INTERNAL_SERVER_ERROR,
                format!("Internal error: {}", msg),
                "INTERNAL_ERROR",
            ),
        }
    }
}

impl From<serde_json::Error> for ApiError {
    fn from(err: serde_json::Error) -> Self {
        ApiError::bad_request(format!("Invalid JSON: {}", err))
    }
}

/// Result type for API handlers
pub type ApiResult<T> = Result<T, ApiError>;
