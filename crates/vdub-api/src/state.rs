//! Application state.

use std::sync::Arc;

use vdub_worker::{Pipeline, WorkerResult};

use crate::config::ApiConfig;

/// Shared application state.
#[derive(Clone)]
pub struct AppState {
    pub config: ApiConfig,
    pub pipeline: Arc<Pipeline>,
}

impl AppState {
    pub fn new(config: ApiConfig, pipeline: Pipeline) -> Self {
        Self {
            config,
            pipeline: Arc::new(pipeline),
        }
    }

    /// Build the pipeline from the environment.
    pub async fn from_env(config: ApiConfig) -> WorkerResult<Self> {
        let pipeline = Pipeline::from_env().await?;
        Ok(Self::new(config, pipeline))
    }
}
