//! Model error types.

use thiserror::Error;

/// Result type for model operations.
pub type ModelResult<T> = Result<T, ModelError>;

/// Errors raised while interpreting job rows and messages.
#[derive(Debug, Error)]
pub enum ModelError {
    #[error("Missing required field: {0}")]
    MissingField(String),

    #[error("Invalid value for {field}: {message}")]
    InvalidField { field: String, message: String },

    #[error("Invalid voice id: {0}")]
    InvalidVoice(String),

    #[error("Unknown audio encoding: {0}")]
    UnknownEncoding(String),

    #[error("Invalid speech duration: {0}")]
    InvalidDuration(f64),

    #[error("Invalid push envelope: {0}")]
    Envelope(String),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
}

impl ModelError {
    pub fn missing_field(field: impl Into<String>) -> Self {
        Self::MissingField(field.into())
    }

    pub fn invalid_field(field: impl Into<String>, message: impl Into<String>) -> Self {
        Self::InvalidField {
            field: field.into(),
            message: message.into(),
        }
    }

    pub fn envelope(msg: impl Into<String>) -> Self {
        Self::Envelope(msg.into())
    }
}
