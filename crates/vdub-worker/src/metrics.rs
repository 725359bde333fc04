//! Pipeline metrics.

/// Metric names.
pub mod names {
    pub const ROWS_PROCESSED_TOTAL: &str = "vdub_rows_processed_total";
    pub const SHEET_WRITE_FAILURES_TOTAL: &str = "vdub_sheet_write_failures_total";
}

pub const STAGE_TTS: &str = "tts";
pub const STAGE_VIDEO: &str = "video";

/// Record one processed row.
pub fn record_row(stage: &'static str, success: bool) {
    let outcome = if success { "success" } else { "failure" };
    metrics::counter!(names::ROWS_PROCESSED_TOTAL, "stage" => stage, "outcome" => outcome)
        .increment(1);
}

/// Record a status writeback that could not be applied.
pub fn record_sheet_write_failure(stage: &'static str) {
    metrics::counter!(names::SHEET_WRITE_FAILURES_TOTAL, "stage" => stage).increment(1);
}
