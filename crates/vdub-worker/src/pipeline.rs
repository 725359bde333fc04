//! Wiring of clients into the two stages.

use std::sync::Arc;

use tracing::info;

use vdub_google::{ApiClient, GoogleConfig, PubSubPublisher, SheetsClient, TokenCache, TtsClient};
use vdub_storage::GcsClient;

use crate::config::PipelineConfig;
use crate::error::WorkerResult;
use crate::sheet::JobSheet;
use crate::tts_stage::TtsStage;
use crate::video_stage::VideoStage;

/// Both stages, sharing one configuration and one set of clients.
#[derive(Clone)]
pub struct Pipeline {
    pub config: Arc<PipelineConfig>,
    pub tts: TtsStage,
    pub video: VideoStage,
}

impl Pipeline {
    /// Build the stages from already constructed clients.
    pub fn new(
        config: PipelineConfig,
        sheets: SheetsClient,
        tts: TtsClient,
        publisher: PubSubPublisher,
        storage: GcsClient,
    ) -> Self {
        let config = Arc::new(config);
        let sheet = JobSheet::new(
            sheets,
            config.spreadsheet_id.clone(),
            config.sheet_name.clone(),
            config.range_name.clone(),
        );

        Self {
            tts: TtsStage::new(
                config.clone(),
                sheet.clone(),
                tts,
                storage.clone(),
                publisher,
            ),
            video: VideoStage::new(config.clone(), sheet, storage),
            config,
        }
    }

    /// Create from environment variables and ambient Google credentials.
    pub async fn from_env() -> WorkerResult<Self> {
        let config = PipelineConfig::from_env()?;
        let auth = Arc::new(TokenCache::from_env().await?);
        let api = ApiClient::new(&GoogleConfig::from_env(), auth)?;
        let storage = GcsClient::from_env().await?;

        info!(
            project = %config.project_id,
            spreadsheet = %config.spreadsheet_id,
            "Pipeline configured"
        );

        let publisher = PubSubPublisher::from_env(api.clone(), config.project_id.clone());
        Ok(Self::new(
            config,
            SheetsClient::new(api.clone()),
            TtsClient::new(api),
            publisher,
            storage,
        ))
    }
}
