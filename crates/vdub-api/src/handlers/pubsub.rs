//! Pub/Sub push endpoints, one per pipeline stage.

use axum::body::Bytes;
use axum::extract::State;
use axum::Json;
use serde::{Deserialize, Serialize};
use tracing::{info, warn};

use vdub_models::{JobRow, PushEnvelope, NOT_AVAILABLE};
use vdub_worker::StageReport;

use crate::error::{ApiError, ApiResult};
use crate::metrics::record_rejected_push;
use crate::state::AppState;

/// Result of dubbing one row.
#[derive(Debug, Serialize, Deserialize)]
pub struct VideoOutcome {
    pub status: String,
    pub final_video_file_url: String,
}

/// Decode a push request body into the job row it carries.
pub fn decode_row(body: &[u8]) -> ApiResult<JobRow> {
    let envelope: PushEnvelope = serde_json::from_slice(body)
        .map_err(|e| ApiError::bad_request(format!("body is not a push envelope: {}", e)))?;
    Ok(envelope.decode_json()?)
}

/// Scheduler trigger for the speech stage. The payload is ignored.
pub async fn pubsub_tts(State(state): State<AppState>) -> Json<StageReport> {
    let report = state.pipeline.tts.run().await;
    info!(
        run_id = %report.run_id,
        seen = report.seen,
        failed = report.failed,
        "TTS push handled"
    );
    Json(report)
}

/// Video trigger published by the speech stage.
///
/// A push that does not decode to a job row is acknowledged anyway: any
/// non-2xx answer makes Pub/Sub redeliver it until retention expires.
pub async fn pubsub_video(State(state): State<AppState>, body: Bytes) -> Json<VideoOutcome> {
    let row = match decode_row(&body) {
        Ok(row) => row,
        Err(e) => {
            warn!("Dropping undecodable video push: {}", e);
            record_rejected_push("video");
            return Json(VideoOutcome {
                status: format!("Rejected push: {}", e),
                final_video_file_url: NOT_AVAILABLE.to_string(),
            });
        }
    };

    let row = state.pipeline.video.run(row).await;
    Json(VideoOutcome {
        status: row.status,
        final_video_file_url: row.final_video_file_url,
    })
}
