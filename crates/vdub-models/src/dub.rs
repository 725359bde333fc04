//! Dub window timing.
//!
//! The dub window is the interval during which the background track is
//! attenuated while the synthesized speech plays.

use serde::{Deserialize, Serialize};

use crate::error::{ModelError, ModelResult};

/// Interval (in seconds) covered by the inserted speech.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct DubWindow {
    /// Offset of the speech from the start of the video, in milliseconds
    pub offset_ms: u64,
    /// Window start in seconds (`offset_ms / 1000`)
    pub start_secs: f64,
    /// Window end in seconds (`start_secs + speech duration`)
    pub end_secs: f64,
}

impl DubWindow {
    /// Build the window for a speech clip of `speech_secs` starting at `offset_ms`.
    pub fn new(offset_ms: u64, speech_secs: f64) -> ModelResult<Self> {
        if !speech_secs.is_finite() || speech_secs < 0.0 {
            return Err(ModelError::InvalidDuration(speech_secs));
        }

        let start_secs = offset_ms as f64 / 1000.0;
        Ok(Self {
            offset_ms,
            start_secs,
            end_secs: start_secs + speech_secs,
        })
    }

    /// Length of the window in seconds.
    pub fn duration_secs(&self) -> f64 {
        self.end_secs - self.start_secs
    }
}
