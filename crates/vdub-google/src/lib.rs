//! Google REST API clients.
//!
//! This crate provides:
//! - Sheets values read/update for the job spreadsheet
//! - Text-to-Speech synthesis
//! - Pub/Sub publishing (with emulator support)
//! - Shared OAuth token caching via gcp_auth
//! - Retry with exponential backoff and request metrics

pub mod auth;
pub mod client;
pub mod error;
pub mod metrics;
pub mod pubsub;
pub mod retry;
pub mod sheets;
pub mod tts;

pub use auth::{TokenCache, TokenSource, GOOGLE_SCOPES};
pub use client::{ApiClient, GoogleConfig};
pub use error::{GoogleError, GoogleResult};
pub use pubsub::PubSubPublisher;
pub use retry::RetryConfig;
pub use sheets::{cell_range, SheetsClient, ValueRange};
pub use tts::{SynthesisRequest, TtsClient};

#[cfg(test)]
mod client_tests;
