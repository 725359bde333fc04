//! Video dubbing stage.
//!
//! Receives one job row (the payload published by the speech stage),
//! mixes the synthesized speech into the row's video and writes the
//! outcome back to the sheet.

use std::path::Path;
use std::sync::Arc;

use chrono::Utc;
use tracing::Instrument;
use uuid::Uuid;

use vdub_media::{mix_speech_into_video, FfmpegRunner};
use vdub_models::{date_stamp, extension_of, gs_url, JobRow};
use vdub_storage::{content_type_for, GcsClient};

use crate::config::PipelineConfig;
use crate::error::WorkerResult;
use crate::logging::RowLogger;
use crate::metrics::{record_row, record_sheet_write_failure, STAGE_VIDEO};
use crate::sheet::{CellUpdate, JobSheet};

/// Extension used for scratch copies of objects whose path has none.
const FALLBACK_EXTENSION: &str = "bin";

/// The video dubbing stage.
#[derive(Clone)]
pub struct VideoStage {
    config: Arc<PipelineConfig>,
    sheet: JobSheet,
    storage: GcsClient,
    runner: FfmpegRunner,
}

impl VideoStage {
    pub fn new(config: Arc<PipelineConfig>, sheet: JobSheet, storage: GcsClient) -> Self {
        let runner = FfmpegRunner::new().with_timeout(config.ffmpeg_timeout_secs);
        Self {
            config,
            sheet,
            storage,
            runner,
        }
    }

    /// Dub one row and write the outcome back; returns the updated row.
    pub async fn run(&self, mut row: JobRow) -> JobRow {
        let run_id = Uuid::new_v4().to_string();
        let logger = RowLogger::new(&run_id, row.index, STAGE_VIDEO);

        async {
            logger.log_start(&format!("{}-{}", row.campaign, row.topic));

            let ok = match self.process_row(&mut row, &logger).await {
                Ok(()) => {
                    logger.log_completion(&row.final_video_file_url);
                    true
                }
                Err(e) => {
                    if e.is_row_error() {
                        logger.log_warning(&e.to_string());
                    } else {
                        logger.log_error(&e.to_string());
                    }
                    row.mark_video_failed(&e);
                    false
                }
            };
            record_row(STAGE_VIDEO, ok);

            row.touch(&Utc::now());
            self.write_back(&row, &logger).await;
        }
        .instrument(logger.create_span())
        .await;

        row
    }

    /// Run the dub inside a scratch directory that is removed afterwards.
    async fn process_row(&self, row: &mut JobRow, logger: &RowLogger) -> WorkerResult<()> {
        tokio::fs::create_dir_all(&self.config.work_dir).await?;
        let scratch = tempfile::Builder::new()
            .prefix("dub-")
            .tempdir_in(&self.config.work_dir)?;

        let result = self.dub_in(row, scratch.path(), logger).await;

        if let Err(e) = scratch.close() {
            logger.log_warning(&format!("failed to remove scratch directory: {}", e));
        }
        result
    }

    async fn dub_in(&self, row: &mut JobRow, scratch: &Path, logger: &RowLogger) -> WorkerResult<()> {
        let bucket = row.require("gcs_bucket")?.to_string();
        let video_key = row.require("video_file")?;
        let base_audio_key = row.require("base_audio_file")?;
        let speech_key = row.require("tts_file_url")?;
        let offset_ms = row.offset_ms()?;
        let target = row.video_file_name(&date_stamp(&Utc::now()))?;

        let video = scratch.join("video.mp4");
        let base_audio = scratch.join(format!(
            "base_audio.{}",
            extension_of(base_audio_key).unwrap_or(FALLBACK_EXTENSION)
        ));
        let speech = scratch.join(format!(
            "speech.{}",
            extension_of(speech_key).unwrap_or(FALLBACK_EXTENSION)
        ));
        let output = scratch.join("output.mp4");

        self.storage.download_file(&bucket, video_key, &video).await?;
        self.storage
            .download_file(&bucket, base_audio_key, &base_audio)
            .await?;
        self.storage.download_file(&bucket, speech_key, &speech).await?;
        logger.log_progress("downloaded sources");

        let window = mix_speech_into_video(
            &video,
            &base_audio,
            &speech,
            offset_ms,
            self.config.background_volume,
            &output,
            &self.runner,
        )
        .await?;
        logger.log_progress(&format!(
            "mixed speech over {:.3}s..{:.3}s",
            window.start_secs, window.end_secs
        ));

        self.storage
            .replace_file(&bucket, &output, &target, content_type_for(&target))
            .await?;
        row.mark_video_ok(gs_url(&bucket, &target));
        Ok(())
    }

    async fn write_back(&self, row: &JobRow, logger: &RowLogger) {
        let cells = [
            CellUpdate {
                column: &self.config.status_column,
                value: &row.status,
            },
            CellUpdate {
                column: &self.config.final_video_file_column,
                value: &row.final_video_file_url,
            },
            CellUpdate {
                column: &self.config.last_update_column,
                value: &row.last_update,
            },
        ];

        if let Err(e) = self.sheet.write_cells(row.index, &cells).await {
            logger.log_warning(&format!("failed to write status back: {}", e));
            record_sheet_write_failure(STAGE_VIDEO);
        }
    }
}
