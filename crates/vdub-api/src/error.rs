//! API error types.

use thiserror::Error;

pub type ApiResult<T> = Result<T, ApiError>;

/// Why a push request could not be turned into a job row.
#[derive(Debug, Error)]
pub enum ApiError {
    #[error("Bad request: {0}")]
    BadRequest(String),

    #[error("{0}")]
    Envelope(#[from] vdub_models::ModelError),
}

impl ApiError {
    pub fn bad_request(msg: impl Into<String>) -> Self {
        Self::BadRequest(msg.into())
    }
}
