//! Application error types
//!
//! One taxonomy for every failure a request can surface. Each variant maps
//! to an HTTP status and a stable machine-readable code so clients can
//! distinguish a retryable quota error from a server configuration problem.

use axum::http::StatusCode;
use axum::response::IntoResponse;
use axum::Json;
use serde::Serialize;

pub type Result<T> = std::result::Result<T, AppError>;

/// All request-visible errors
#[derive(Debug, thiserror::Error)]
pub enum AppError {
    /// Client sent something invalid (empty key, wrong upload content type)
    #[error("{0}")]
    Validation(String),

    /// Requested record does not exist
    #[error("{0} not found")]
    NotFound(String),

    /// Gemini API quota exhausted; the client should retry in a minute
    #[error("Gemini API quota exceeded. Please try again in a minute.")]
    QuotaExceeded,

    /// The configured model does not exist or is not accessible with this key
    #[error("Model '{0}' not found or not available")]
    ModelUnavailable(String),

    /// No API key configured; no call was attempted
    #[error("Gemini API key is missing or invalid")]
    MissingApiKey,

    /// PDF could not be parsed or a page failed to rasterize
    #[error("Failed to render PDF: {0}")]
    Render(String),

    /// Reading or writing the .env file failed during key rotation
    #[error("Configuration file I/O failed: {0}")]
    StorageIo(#[from] std::io::Error),

    #[error("Database error: {0}")]
    Database(#[from] sqlx::Error),

    #[error("Internal error: {0}")]
    Internal(String),
}

impl AppError {
    pub fn status_code(&self) -> StatusCode {
        match self {
            Self::Validation(_) => StatusCode::BAD_REQUEST,
            Self::NotFound(_) => StatusCode::NOT_FOUND,
            Self::QuotaExceeded => StatusCode::TOO_MANY_REQUESTS,
            _ => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }

    fn code(&self) -> &'static str {
        match self {
            Self::Validation(_) => "VALIDATION",
            Self::NotFound(_) => "NOT_FOUND",
            Self::QuotaExceeded => "QUOTA_EXCEEDED",
            Self::ModelUnavailable(_) => "MODEL_UNAVAILABLE",
            Self::MissingApiKey => "MISSING_API_KEY",
            Self::Render(_) => "RENDER_FAILED",
            Self::StorageIo(_) => "STORAGE_IO",
            Self::Database(_) => "DATABASE",
            Self::Internal(_) => "INTERNAL",
        }
    }
}

#[derive(Serialize)]
struct ErrorResponse {
    error: String,
    code: String,
}

impl IntoResponse for AppError {
    fn into_response(self) -> axum::response::Response {
        let status = self.status_code();

        if status.is_server_error() {
            tracing::error!(code = self.code(), "{}", self);
        }

        let body = Json(ErrorResponse {
            error: self.to_string(),
            code: self.code().to_string(),
        });

        (status, body).into_response()
    }
}
