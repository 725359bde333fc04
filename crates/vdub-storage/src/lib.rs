//! Google Cloud Storage client.
//!
//! This crate provides:
//! - File and byte uploads, replacing an existing object when asked
//! - Downloads to local files
//! - Existence checks and deletion
//!
//! Every operation takes the bucket explicitly since each job row names its own.

pub mod client;
pub mod error;

pub use client::{content_type_for, GcsClient, GcsConfig};
pub use error::{StorageError, StorageResult};
