//! Worker error types.

use thiserror::Error;

pub type WorkerResult<T> = Result<T, WorkerError>;

#[derive(Debug, Error)]
pub enum WorkerError {
    #[error("Configuration error: {0}")]
    ConfigError(String),

    #[error("Invalid job: {0}")]
    InvalidJob(String),

    #[error("{0}")]
    Model(#[from] vdub_models::ModelError),

    #[error("Google API error: {0}")]
    Google(#[from] vdub_google::GoogleError),

    #[error("Storage error: {0}")]
    Storage(#[from] vdub_storage::StorageError),

    #[error("Media error: {0}")]
    Media(#[from] vdub_media::MediaError),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

impl WorkerError {
    pub fn config_error(msg: impl Into<String>) -> Self {
        Self::ConfigError(msg.into())
    }

    pub fn invalid_job(msg: impl Into<String>) -> Self {
        Self::InvalidJob(msg.into())
    }

    /// Whether the row itself is at fault rather than a collaborator.
    pub fn is_row_error(&self) -> bool {
        matches!(self, WorkerError::Model(_) | WorkerError::InvalidJob(_))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use vdub_models::ModelError;

    #[test]
    fn test_model_errors_display_unprefixed() {
        let err = WorkerError::from(ModelError::missing_field("voice_id"));
        assert_eq!(err.to_string(), ModelError::missing_field("voice_id").to_string());
        assert!(err.is_row_error());
    }

    #[test]
    fn test_collaborator_errors_are_not_row_errors() {
        let err = WorkerError::from(vdub_storage::StorageError::not_found("bucket/video.mp4"));
        assert_eq!(err.to_string(), "Storage error: Object not found: bucket/video.mp4");
        assert!(!err.is_row_error());
    }
}
