//! Error types for media operations.

use std::path::PathBuf;
use thiserror::Error;

use vdub_models::ModelError;

/// Result type for media operations.
pub type MediaResult<T> = Result<T, MediaError>;

/// Errors that can occur during media processing.
#[derive(Debug, Error)]
pub enum MediaError {
    #[error("FFmpeg not found in PATH")]
    FfmpegNotFound,

    #[error("FFprobe not found in PATH")]
    FfprobeNotFound,

    #[error("FFmpeg command failed: {message}")]
    FfmpegFailed {
        message: String,
        stderr: Option<String>,
        exit_code: Option<i32>,
    },

    #[error("FFprobe command failed: {message}")]
    FfprobeFailed {
        message: String,
        stderr: Option<String>,
    },

    #[error("File not found: {0}")]
    FileNotFound(PathBuf),

    #[error("Operation timed out after {0} seconds")]
    Timeout(u64),

    #[error("Invalid media file: {0}")]
    InvalidMedia(String),

    #[error("Invalid dub window: {0}")]
    InvalidWindow(#[from] ModelError),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("JSON parse error: {0}")]
    JsonParse(#[from] serde_json::Error),
}

impl MediaError {
    /// Create an FFmpeg failure error.
    ///
    /// The display message carries the exit code and the last stderr line,
    /// since it ends up in the row's status cell.
    pub fn ffmpeg_failed(
        message: impl Into<String>,
        stderr: Option<String>,
        exit_code: Option<i32>,
    ) -> Self {
        let mut message = message.into();
        if let Some(code) = exit_code {
            message.push_str(&format!(" (exit code {})", code));
        }
        if let Some(last) = stderr
            .as_deref()
            .and_then(|s| s.lines().rev().find(|l| !l.trim().is_empty()))
        {
            message.push_str(": ");
            message.push_str(last.trim());
        }
        Self::FfmpegFailed {
            message,
            stderr,
            exit_code,
        }
    }

    pub fn invalid_media(message: impl Into<String>) -> Self {
        Self::InvalidMedia(message.into())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_ffmpeg_failed_message_includes_stderr_tail() {
        let err = MediaError::ffmpeg_failed(
            "FFmpeg exited with non-zero status",
            Some("first line\n/tmp/x/speech.mp3: Invalid data found when processing input\n\n".into()),
            Some(1),
        );
        assert_eq!(
            err.to_string(),
            "FFmpeg command failed: FFmpeg exited with non-zero status (exit code 1): \
             /tmp/x/speech.mp3: Invalid data found when processing input"
        );
    }

    #[test]
    fn test_ffmpeg_failed_without_stderr() {
        let err = MediaError::ffmpeg_failed("killed", None, None);
        assert_eq!(err.to_string(), "FFmpeg command failed: killed");
    }
}
