//! Pipeline configuration.

use std::path::PathBuf;

use vdub_media::DEFAULT_BACKGROUND_VOLUME;

use crate::error::{WorkerError, WorkerResult};

/// Pipeline configuration.
#[derive(Debug, Clone)]
pub struct PipelineConfig {
    /// Project that owns the video topic
    pub project_id: String,
    /// Job spreadsheet
    pub spreadsheet_id: String,
    /// Sheet written back to
    pub sheet_name: String,
    /// A1 range read by the TTS stage; its first row is the header
    pub range_name: String,
    /// Column receiving the speech object path
    pub tts_file_column: String,
    /// Column receiving the dubbed video URL
    pub final_video_file_column: String,
    /// Column receiving the status string
    pub status_column: String,
    /// Column receiving the last-update timestamp
    pub last_update_column: String,
    /// Topic that triggers the video stage
    pub video_topic: String,
    /// Parent of per-job scratch directories
    pub work_dir: PathBuf,
    /// FFmpeg timeout in seconds
    pub ffmpeg_timeout_secs: u64,
    /// Background gain during and after the dub
    pub background_volume: f64,
}

impl PipelineConfig {
    /// Config with defaults for everything but the two required identifiers.
    pub fn new(project_id: impl Into<String>, spreadsheet_id: impl Into<String>) -> Self {
        Self {
            project_id: project_id.into(),
            spreadsheet_id: spreadsheet_id.into(),
            sheet_name: "config".to_string(),
            range_name: "config!A1:M".to_string(),
            tts_file_column: "J".to_string(),
            final_video_file_column: "K".to_string(),
            status_column: "L".to_string(),
            last_update_column: "M".to_string(),
            video_topic: "generate_video_trigger".to_string(),
            work_dir: PathBuf::from("/tmp/vdub"),
            ffmpeg_timeout_secs: 600,
            background_volume: DEFAULT_BACKGROUND_VOLUME,
        }
    }

    /// Create config from environment variables.
    pub fn from_env() -> WorkerResult<Self> {
        let defaults = Self::new(required("GCP_PROJECT")?, required("CONFIG_SPREADSHEET_ID")?);

        Ok(Self {
            sheet_name: env_or("CONFIG_SHEET_NAME", defaults.sheet_name),
            range_name: env_or("CONFIG_RANGE_NAME", defaults.range_name),
            tts_file_column: env_or("TTS_FILE_COLUMN", defaults.tts_file_column),
            final_video_file_column: env_or(
                "FINAL_VIDEO_FILE_COLUMN",
                defaults.final_video_file_column,
            ),
            status_column: env_or("STATUS_COLUMN", defaults.status_column),
            last_update_column: env_or("LAST_UPDATE_COLUMN", defaults.last_update_column),
            video_topic: env_or("GENERATE_VIDEO_TOPIC", defaults.video_topic),
            work_dir: std::env::var("WORKER_WORK_DIR")
                .map(PathBuf::from)
                .unwrap_or(defaults.work_dir),
            ffmpeg_timeout_secs: std::env::var("FFMPEG_TIMEOUT_SECS")
                .ok()
                .and_then(|s| s.parse().ok())
                .unwrap_or(defaults.ffmpeg_timeout_secs),
            background_volume: std::env::var("DUB_BACKGROUND_VOLUME")
                .ok()
                .and_then(|s| s.parse().ok())
                .filter(|v: &f64| v.is_finite() && *v >= 0.0)
                .unwrap_or(defaults.background_volume),
            ..defaults
        })
    }
}

fn required(name: &str) -> WorkerResult<String> {
    match std::env::var(name) {
        Ok(value) if !value.trim().is_empty() => Ok(value.trim().to_string()),
        _ => Err(WorkerError::config_error(format!("{} not set", name))),
    }
}

fn env_or(name: &str, default: String) -> String {
    std::env::var(name)
        .ok()
        .filter(|v| !v.trim().is_empty())
        .unwrap_or(default)
}

#[cfg(test)]
mod tests {
    use super::*;
    use serial_test::serial;

    const VARS: &[&str] = &[
        "GCP_PROJECT",
        "CONFIG_SPREADSHEET_ID",
        "CONFIG_SHEET_NAME",
        "CONFIG_RANGE_NAME",
        "TTS_FILE_COLUMN",
        "FINAL_VIDEO_FILE_COLUMN",
        "STATUS_COLUMN",
        "LAST_UPDATE_COLUMN",
        "GENERATE_VIDEO_TOPIC",
        "WORKER_WORK_DIR",
        "FFMPEG_TIMEOUT_SECS",
        "DUB_BACKGROUND_VOLUME",
    ];

    fn clear_env() {
        for var in VARS {
            std::env::remove_var(var);
        }
    }

    #[test]
    #[serial]
    fn test_from_env_defaults() {
        clear_env();
        std::env::set_var("GCP_PROJECT", "demo-project");
        std::env::set_var("CONFIG_SPREADSHEET_ID", "sheet-123");

        let config = PipelineConfig::from_env().unwrap();
        assert_eq!(config.project_id, "demo-project");
        assert_eq!(config.spreadsheet_id, "sheet-123");
        assert_eq!(config.sheet_name, "config");
        assert_eq!(config.range_name, "config!A1:M");
        assert_eq!(config.tts_file_column, "J");
        assert_eq!(config.final_video_file_column, "K");
        assert_eq!(config.status_column, "L");
        assert_eq!(config.last_update_column, "M");
        assert_eq!(config.video_topic, "generate_video_trigger");
        assert_eq!(config.work_dir, PathBuf::from("/tmp/vdub"));
        assert_eq!(config.ffmpeg_timeout_secs, 600);
        assert!((config.background_volume - 0.9).abs() < f64::EPSILON);

        clear_env();
    }

    #[test]
    #[serial]
    fn test_from_env_overrides() {
        clear_env();
        std::env::set_var("GCP_PROJECT", "demo-project");
        std::env::set_var("CONFIG_SPREADSHEET_ID", "sheet-123");
        std::env::set_var("TTS_FILE_COLUMN", "K");
        std::env::set_var("FFMPEG_TIMEOUT_SECS", "30");
        std::env::set_var("DUB_BACKGROUND_VOLUME", "0.5");
        std::env::set_var("WORKER_WORK_DIR", "/var/tmp/dub");

        let config = PipelineConfig::from_env().unwrap();
        assert_eq!(config.tts_file_column, "K");
        assert_eq!(config.ffmpeg_timeout_secs, 30);
        assert!((config.background_volume - 0.5).abs() < f64::EPSILON);
        assert_eq!(config.work_dir, PathBuf::from("/var/tmp/dub"));

        clear_env();
    }

    #[test]
    #[serial]
    fn test_from_env_requires_identifiers() {
        clear_env();
        std::env::set_var("GCP_PROJECT", "demo-project");

        let err = PipelineConfig::from_env().unwrap_err();
        assert!(matches!(err, WorkerError::ConfigError(_)));
        assert!(err.to_string().contains("CONFIG_SPREADSHEET_ID"));

        clear_env();
    }
}
