//! Axum HTTP server for the dubbing pipeline.
//!
//! This crate provides:
//! - Pub/Sub push endpoints for the speech and video stages
//! - Liveness and readiness probes
//! - Request ids, request logging and Prometheus metrics

pub mod config;
pub mod error;
pub mod handlers;
pub mod metrics;
pub mod middleware;
pub mod routes;
pub mod state;

pub use config::ApiConfig;
pub use error::{ApiError, ApiResult};
pub use routes::create_router;
pub use state::AppState;
