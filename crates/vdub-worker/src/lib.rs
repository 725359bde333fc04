//! Speech dubbing pipeline.
//!
//! This crate provides:
//! - The speech synthesis stage (sheet rows to audio objects and video triggers)
//! - The video stage (speech mixed into video, status written back)
//! - Job sheet access, configuration and row-scoped logging

pub mod config;
pub mod error;
pub mod logging;
pub mod metrics;
pub mod pipeline;
pub mod sheet;
pub mod tts_stage;
pub mod video_stage;

pub use config::PipelineConfig;
pub use error::{WorkerError, WorkerResult};
pub use logging::RowLogger;
pub use pipeline::Pipeline;
pub use sheet::JobSheet;
pub use tts_stage::{StageReport, TtsStage};
pub use video_stage::VideoStage;
