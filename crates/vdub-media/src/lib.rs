//! FFmpeg CLI wrapper for speech dubbing.
//!
//! This crate provides:
//! - Type-safe FFmpeg command building with several inputs
//! - Progress parsing from `-progress pipe:2`
//! - Duration probing via FFprobe
//! - The dub mix filter graph and its runner

pub mod command;
pub mod error;
pub mod mix;
pub mod probe;
pub mod progress;

pub use command::{check_ffmpeg, check_ffprobe, FfmpegCommand, FfmpegRunner};
pub use error::{MediaError, MediaResult};
pub use mix::{mix_speech_into_video, DubMix, DEFAULT_BACKGROUND_VOLUME};
pub use probe::{probe_duration, probe_media, MediaInfo};
pub use progress::FfmpegProgress;
