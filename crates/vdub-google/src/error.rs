//! Google API error types.

use serde::Deserialize;
use thiserror::Error;

/// Result type for Google API operations.
pub type GoogleResult<T> = Result<T, GoogleError>;

/// Errors that can occur while calling Google APIs.
#[derive(Debug, Error)]
pub enum GoogleError {
    #[error("Authentication failed: {0}")]
    AuthError(String),

    #[error("Not found: {0}")]
    NotFound(String),

    #[error("Permission denied: {0}")]
    PermissionDenied(String),

    #[error("Request failed: {0}")]
    RequestFailed(String),

    #[error("Server error ({0}): {1}")]
    ServerError(u16, String),

    #[error("Rate limited, retry after {0}ms")]
    RateLimited(u64),

    #[error("Invalid response: {0}")]
    InvalidResponse(String),

    #[error("Configuration error: {0}")]
    ConfigError(String),

    #[error("Network error: {0}")]
    Network(#[from] reqwest::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
}

/// Error body returned by Google APIs.
#[derive(Debug, Deserialize)]
struct ErrorBody {
    error: ErrorDetail,
}

#[derive(Debug, Deserialize)]
struct ErrorDetail {
    #[serde(default)]
    message: String,
    #[serde(default)]
    status: String,
}

/// Default wait when a 429 carries no Retry-After header.
const DEFAULT_RETRY_AFTER_MS: u64 = 1000;

impl GoogleError {
    pub fn auth_error(msg: impl Into<String>) -> Self {
        Self::AuthError(msg.into())
    }

    pub fn request_failed(msg: impl Into<String>) -> Self {
        Self::RequestFailed(msg.into())
    }

    pub fn invalid_response(msg: impl Into<String>) -> Self {
        Self::InvalidResponse(msg.into())
    }

    pub fn config_error(msg: impl Into<String>) -> Self {
        Self::ConfigError(msg.into())
    }

    /// Map an HTTP status and response body to an error.
    pub fn from_http_status(status: u16, body: impl AsRef<str>) -> Self {
        let detail = describe_body(body.as_ref());
        match status {
            401 => Self::AuthError(detail),
            403 => Self::PermissionDenied(detail),
            404 => Self::NotFound(detail),
            429 => Self::RateLimited(DEFAULT_RETRY_AFTER_MS),
            500..=599 => Self::ServerError(status, detail),
            _ => Self::RequestFailed(format!("HTTP {}: {}", status, detail)),
        }
    }

    /// Build an error from a failed response, honoring `Retry-After` on 429.
    pub async fn from_response(response: reqwest::Response) -> Self {
        let status = response.status().as_u16();
        if status == 429 {
            let retry_after = response
                .headers()
                .get(reqwest::header::RETRY_AFTER)
                .and_then(|v| v.to_str().ok())
                .and_then(|v| v.trim().parse::<u64>().ok())
                .map(|secs| secs * 1000)
                .unwrap_or(DEFAULT_RETRY_AFTER_MS);
            return Self::RateLimited(retry_after);
        }
        let body = response.text().await.unwrap_or_default();
        Self::from_http_status(status, body)
    }

    /// HTTP status this error corresponds to, if any.
    pub fn http_status(&self) -> Option<u16> {
        match self {
            GoogleError::AuthError(_) => Some(401),
            GoogleError::PermissionDenied(_) => Some(403),
            GoogleError::NotFound(_) => Some(404),
            GoogleError::RateLimited(_) => Some(429),
            GoogleError::ServerError(status, _) => Some(*status),
            GoogleError::Network(e) => e.status().map(|s| s.as_u16()),
            _ => None,
        }
    }

    /// Check if error is retryable.
    pub fn is_retryable(&self) -> bool {
        matches!(
            self,
            GoogleError::Network(_) | GoogleError::RateLimited(_) | GoogleError::ServerError(_, _)
        )
    }

    /// Server-requested wait before retrying, in milliseconds.
    pub fn retry_after_ms(&self) -> Option<u64> {
        match self {
            GoogleError::RateLimited(ms) => Some(*ms),
            _ => None,
        }
    }
}

/// Prefer the structured `error.status: error.message` of a Google error body.
fn describe_body(body: &str) -> String {
    match serde_json::from_str::<ErrorBody>(body) {
        Ok(parsed) if !parsed.error.message.is_empty() => {
            if parsed.error.status.is_empty() {
                parsed.error.message
            } else {
                format!("{}: {}", parsed.error.status, parsed.error.message)
            }
        }
        _ => body.trim().to_string(),
    }
}
