//! Structured row logging utilities.
//!
//! Every line logged while processing a row carries the run id, the sheet
//! row number and the stage.

use tracing::{error, info, warn, Span};
use tracing_subscriber::{fmt, prelude::*, EnvFilter};

/// Filter used when `RUST_LOG` is unset.
pub const DEFAULT_LOG_FILTER: &str =
    "warn,vdub_models=info,vdub_google=info,vdub_storage=info,vdub_media=info,vdub_worker=info,vdub_api=info,tower_http=info";

/// Install the global subscriber: colored text by default, JSON when
/// `LOG_FORMAT=json`.
pub fn init_tracing() {
    let use_json = std::env::var("LOG_FORMAT")
        .map(|v| v.to_lowercase() == "json")
        .unwrap_or(false);

    let env_filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(DEFAULT_LOG_FILTER));

    if use_json {
        tracing_subscriber::registry()
            .with(fmt::layer().json())
            .with(env_filter)
            .init();
    } else {
        tracing_subscriber::registry()
            .with(
                fmt::layer()
                    .with_ansi(true)
                    .with_target(true)
                    .with_thread_ids(false)
                    .with_file(false)
                    .with_line_number(false),
            )
            .with(env_filter)
            .init();
    }
}

/// Row logger for structured logging with consistent formatting.
#[derive(Debug, Clone)]
pub struct RowLogger {
    run_id: String,
    row: u32,
    stage: &'static str,
}

impl RowLogger {
    /// Create a logger for one row of one stage run.
    pub fn new(run_id: &str, row: u32, stage: &'static str) -> Self {
        Self {
            run_id: run_id.to_string(),
            row,
            stage,
        }
    }

    pub fn log_start(&self, message: &str) {
        info!(
            run_id = %self.run_id,
            row = self.row,
            stage = self.stage,
            "Row started: {}", message
        );
    }

    pub fn log_progress(&self, message: &str) {
        info!(
            run_id = %self.run_id,
            row = self.row,
            stage = self.stage,
            "Row progress: {}", message
        );
    }

    pub fn log_warning(&self, message: &str) {
        warn!(
            run_id = %self.run_id,
            row = self.row,
            stage = self.stage,
            "Row warning: {}", message
        );
    }

    pub fn log_error(&self, message: &str) {
        error!(
            run_id = %self.run_id,
            row = self.row,
            stage = self.stage,
            "Row error: {}", message
        );
    }

    pub fn log_completion(&self, message: &str) {
        info!(
            run_id = %self.run_id,
            row = self.row,
            stage = self.stage,
            "Row completed: {}", message
        );
    }

    /// Create a tracing span for this row.
    pub fn create_span(&self) -> Span {
        tracing::info_span!(
            "row",
            run_id = %self.run_id,
            row = self.row,
            stage = self.stage
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_filter_parses() {
        assert!(EnvFilter::try_new(DEFAULT_LOG_FILTER).is_ok());
    }
}
