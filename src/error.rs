/// Unified error types for the results proxy
use axum::{
    extract::rejection::QueryRejection,
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Main error type for the proxy
#[derive(Error, Debug)]
pub enum ProxyError {
    /// Missing or malformed request input
    #[error("{0}")]
    BadInput(String),

    /// Upstream has no record for this scholar number
    #[error("No results found for scholar number {scholar_no}")]
    NotFound { scholar_no: String },

    /// Upstream answered with a failure status, an unexpected shape,
    /// or could not be reached after all retries
    #[error("Upstream error: {message}")]
    Upstream {
        status: Option<u16>,
        message: String,
    },

    /// Configuration errors
    #[error("Validation error: {0}")]
    Validation(String),

    /// Internal server errors
    #[error("Internal error: {0}")]
    Internal(String),

    /// IO errors
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

impl ProxyError {
    pub fn upstream(status: Option<u16>, message: impl Into<String>) -> Self {
        ProxyError::Upstream {
            status,
            message: message.into(),
        }
    }

    /// HTTP status this error is reported with
    pub fn status_code(&self) -> StatusCode {
        match self {
            ProxyError::BadInput(_) => StatusCode::BAD_REQUEST,
            ProxyError::NotFound { .. } => StatusCode::NOT_FOUND,
            ProxyError::Upstream { status, .. } => status
                .and_then(|s| StatusCode::from_u16(s).ok())
                .filter(|s| s.is_client_error() || s.is_server_error())
                .unwrap_or(StatusCode::BAD_GATEWAY),
            ProxyError::Validation(_) | ProxyError::Internal(_) | ProxyError::Io(_) => {
                StatusCode::INTERNAL_SERVER_ERROR
            }
        }
    }
}

/// Malformed query strings (e.g. a repeated `scholarNo`) are bad input.
/// The serde wording stays in the log.
impl From<QueryRejection> for ProxyError {
    fn from(rejection: QueryRejection) -> Self {
        tracing::debug!(error = %rejection.body_text(), "rejected query string");
        ProxyError::BadInput("Invalid query string".to_string())
    }
}

/// JSON error body: `{"error": "..."}`
#[derive(Debug, Serialize, Deserialize)]
pub struct ErrorResponse {
    pub error: String,
}

/// Convert ProxyError to HTTP response
impl IntoResponse for ProxyError {
    fn into_response(self) -> Response {
        let status = self.status_code();
        let message = match &self {
            ProxyError::BadInput(_) | ProxyError::NotFound { .. } => self.to_string(),
            ProxyError::Upstream { .. } => "Upstream error".to_string(),
            ProxyError::Validation(_) | ProxyError::Internal(_) | ProxyError::Io(_) => {
                tracing::error!(error = %self, "internal failure while serving request");
                "Internal server error".to_string() // Don't leak details
            }
        };

        (status, Json(ErrorResponse { error: message })).into_response()
    }
}

/// Result type alias for proxy operations
pub type ProxyResult<T> = Result<T, ProxyError>;
