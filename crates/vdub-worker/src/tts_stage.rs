//! Speech synthesis stage.
//!
//! Reads every job row, synthesizes its SSML, stores the audio and triggers
//! the video stage with the updated row. Rows are processed one at a time;
//! a failing row records its error and the run moves on.

use std::sync::Arc;

use chrono::Utc;
use serde::Serialize;
use tracing::{error, info, Instrument};
use uuid::Uuid;

use vdub_google::{PubSubPublisher, SynthesisRequest, TtsClient};
use vdub_models::{date_stamp, AudioEncoding, JobRow, VoiceSelection};
use vdub_storage::GcsClient;

use crate::config::PipelineConfig;
use crate::error::WorkerResult;
use crate::logging::RowLogger;
use crate::metrics::{record_row, record_sheet_write_failure, STAGE_TTS};
use crate::sheet::{CellUpdate, JobSheet};

/// Outcome counts of one stage run.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct StageReport {
    pub run_id: String,
    pub seen: usize,
    pub succeeded: usize,
    pub failed: usize,
}

/// The speech synthesis stage.
#[derive(Clone)]
pub struct TtsStage {
    config: Arc<PipelineConfig>,
    sheet: JobSheet,
    tts: TtsClient,
    storage: GcsClient,
    publisher: PubSubPublisher,
}

impl TtsStage {
    pub fn new(
        config: Arc<PipelineConfig>,
        sheet: JobSheet,
        tts: TtsClient,
        storage: GcsClient,
        publisher: PubSubPublisher,
    ) -> Self {
        Self {
            config,
            sheet,
            tts,
            storage,
            publisher,
        }
    }

    /// Process every row of the job sheet.
    pub async fn run(&self) -> StageReport {
        let mut report = StageReport {
            run_id: Uuid::new_v4().to_string(),
            ..Default::default()
        };

        let rows = match self.sheet.read_rows().await {
            Ok(rows) => rows,
            Err(e) => {
                error!(run_id = %report.run_id, "Failed to read job sheet: {}", e);
                return report;
            }
        };
        info!(run_id = %report.run_id, rows = rows.len(), "Starting speech synthesis");

        for mut row in rows {
            let logger = RowLogger::new(&report.run_id, row.index, STAGE_TTS);
            let ok = self
                .process_and_write_back(&mut row, &logger)
                .instrument(logger.create_span())
                .await;

            report.seen += 1;
            if ok {
                report.succeeded += 1;
            } else {
                report.failed += 1;
            }
        }

        info!(
            run_id = %report.run_id,
            seen = report.seen,
            succeeded = report.succeeded,
            failed = report.failed,
            "Speech synthesis finished"
        );
        report
    }

    async fn process_and_write_back(&self, row: &mut JobRow, logger: &RowLogger) -> bool {
        logger.log_start(&format!("{}-{}", row.campaign, row.topic));

        let ok = match self.process_row(row, logger).await {
            Ok(()) => {
                logger.log_completion(&row.tts_file_url);
                true
            }
            Err(e) => {
                if e.is_row_error() {
                    logger.log_warning(&e.to_string());
                } else {
                    logger.log_error(&e.to_string());
                }
                row.mark_tts_failed(&e);
                false
            }
        };
        record_row(STAGE_TTS, ok);

        row.touch(&Utc::now());
        self.write_back(row, logger).await;
        ok
    }

    /// Synthesize, store and publish one row.
    async fn process_row(&self, row: &mut JobRow, logger: &RowLogger) -> WorkerResult<()> {
        let file_name = row.tts_file_name(&date_stamp(&Utc::now()))?;
        let bucket = row.require("gcs_bucket")?.to_string();
        let voice = VoiceSelection::parse(row.require("voice_id")?)?;
        let encoding: AudioEncoding = row.require("audio_encoding")?.parse()?;
        let text = row.require("text")?;

        let request = SynthesisRequest::ssml(text, &voice, encoding);
        let audio = self.tts.synthesize(&request).await?;
        logger.log_progress(&format!("synthesized {} bytes with {}", audio.len(), voice.name));

        self.storage
            .upload_bytes(&bucket, audio, &file_name, encoding.content_type())
            .await?;
        row.mark_tts_ok(file_name);

        let message_id = self
            .publisher
            .publish_json(&self.config.video_topic, &*row)
            .await?;
        logger.log_progress(&format!("published video trigger {}", message_id));
        Ok(())
    }

    async fn write_back(&self, row: &JobRow, logger: &RowLogger) {
        let cells = [
            CellUpdate {
                column: &self.config.status_column,
                value: &row.status,
            },
            CellUpdate {
                column: &self.config.tts_file_column,
                value: &row.tts_file_url,
            },
            CellUpdate {
                column: &self.config.last_update_column,
                value: &row.last_update,
            },
        ];

        if let Err(e) = self.sheet.write_cells(row.index, &cells).await {
            logger.log_warning(&format!("failed to write status back: {}", e));
            record_sheet_write_failure(STAGE_TTS);
        }
    }
}
