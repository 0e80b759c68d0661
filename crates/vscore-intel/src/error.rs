//! Video intelligence client error types.

use thiserror::Error;

/// Result type for video intelligence operations.
pub type IntelResult<T> = Result<T, IntelError>;

/// Errors that can occur while talking to the video intelligence service.
#[derive(Debug, Error)]
pub enum IntelError {
    #[error("Configuration error: {0}")]
    Config(String),

    #[error("Rate limited{}", .0.map(|ms| format!(", retry after {}ms", ms)).unwrap_or_default())]
    RateLimited(Option<u64>),

    #[error("Server error {0}: {1}")]
    ServerError(u16, String),

    #[error("Bad request: {0}")]
    BadRequest(String),

    #[error("Unauthorized: {0}")]
    Unauthorized(String),

    #[error("Not found: {0}")]
    NotFound(String),

    #[error("Request failed with status {0}: {1}")]
    RequestFailed(u16, String),

    #[error("Invalid response: {0}")]
    InvalidResponse(String),

    #[error("Network error: {0}")]
    Network(#[from] reqwest::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

impl IntelError {
    pub fn config(msg: impl Into<String>) -> Self {
        Self::Config(msg.into())
    }

    pub fn invalid_response(msg: impl Into<String>) -> Self {
        Self::InvalidResponse(msg.into())
    }

    /// Map an HTTP error status to an error variant.
    pub fn from_http_status(status: u16, body: impl Into<String>, retry_after_ms: Option<u64>) -> Self {
        let body = body.into();
        match status {
            429 => Self::RateLimited(retry_after_ms),
            400 | 422 => Self::BadRequest(body),
            401 | 403 => Self::Unauthorized(body),
            404 => Self::NotFound(body),
            500..=599 => Self::ServerError(status, body),
            _ => Self::RequestFailed(status, body),
        }
    }

    /// HTTP status carried by the error, when there is one.
    pub fn http_status(&self) -> Option<u16> {
        match self {
            Self::RateLimited(_) => Some(429),
            Self::ServerError(status, _) | Self::RequestFailed(status, _) => Some(*status),
            Self::BadRequest(_) => Some(400),
            Self::Unauthorized(_) => Some(401),
            Self::NotFound(_) => Some(404),
            Self::Network(e) => e.status().map(|s| s.as_u16()),
            _ => None,
        }
    }

    pub fn retry_after_ms(&self) -> Option<u64> {
        match self {
            Self::RateLimited(after) => *after,
            _ => None,
        }
    }

    /// Check if error is retryable.
    ///
    /// Errors without a status code are retryable, except configuration errors.
    pub fn is_retryable(&self) -> bool {
        if matches!(self, Self::Config(_)) {
            return false;
        }
        match self.http_status() {
            Some(status) => status == 408 || status == 429 || status >= 500,
            None => true,
        }
    }
}
