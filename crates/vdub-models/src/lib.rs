//! Shared data models for the vdub pipeline.
//!
//! This crate provides Serde-serializable types for:
//! - Job rows read from and written back to the config spreadsheet
//! - Voice selection and audio encodings for speech synthesis
//! - Dub window timing for the mix step
//! - Pub/Sub push envelopes

pub mod dub;
pub mod envelope;
pub mod error;
pub mod job_row;
pub mod timestamp;
pub mod voice;

// Re-export common types
pub use dub::DubWindow;
pub use envelope::{PushEnvelope, PushMessage};
pub use error::{ModelError, ModelResult};
pub use job_row::{extension_of, gs_url, JobRow, NOT_AVAILABLE, STATUS_TTS_OK, STATUS_VIDEO_OK};
pub use timestamp::{date_stamp, sheet_timestamp};
pub use voice::{AudioEncoding, VoiceSelection};
