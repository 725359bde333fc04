//! Speech dub mixing.
//!
//! The speech track is delayed to the dub offset and mixed over the
//! background track, which is attenuated while the speech plays and after it.
//! Input order is fixed: `0` video, `1` background audio, `2` speech.

use std::path::Path;

use tracing::{debug, info};

use vdub_models::DubWindow;

use crate::command::{FfmpegCommand, FfmpegRunner};
use crate::error::{MediaError, MediaResult};
use crate::probe::probe_duration;

/// Background gain applied during and after the dub window.
pub const DEFAULT_BACKGROUND_VOLUME: f64 = 0.9;

/// Final mixed audio label mapped into the output.
const AUDIO_OUT: &str = "[audio_out]";

/// Filter graph parameters for one dub.
#[derive(Debug, Clone, PartialEq)]
pub struct DubMix {
    pub window: DubWindow,
    pub background_volume: f64,
}

impl DubMix {
    pub fn new(window: DubWindow) -> Self {
        Self {
            window,
            background_volume: DEFAULT_BACKGROUND_VOLUME,
        }
    }

    pub fn with_background_volume(mut self, volume: f64) -> Self {
        self.background_volume = volume;
        self
    }

    /// The `-filter_complex` graph.
    pub fn filter_graph(&self) -> String {
        let delay = self.window.offset_ms;
        let volume = format_number(self.background_volume);
        let start = format_number(self.window.start_secs);
        let end = format_number(self.window.end_secs);

        [
            format!("[2:a] adelay={delay}|{delay} [voice_dub]"),
            format!("[1:a] volume={volume}:enable='between(t,{start},{end})' [ducked]"),
            format!("[ducked] volume={volume}:enable='gt(t,{end})' [original_audio]"),
            format!("[voice_dub][original_audio] amix=duration=longest {AUDIO_OUT}"),
        ]
        .join(";")
    }

    /// The full ffmpeg command for the three inputs.
    pub fn command(
        &self,
        video: impl AsRef<Path>,
        base_audio: impl AsRef<Path>,
        speech: impl AsRef<Path>,
        output: impl AsRef<Path>,
    ) -> FfmpegCommand {
        FfmpegCommand::new(output)
            .input(video)
            .input(base_audio)
            .input(speech)
            .filter_complex(self.filter_graph())
            .map("0:v")
            .map(AUDIO_OUT)
    }
}

/// Seconds or gains without float noise (`4.956`, not `4.956000000000001`).
fn format_number(value: f64) -> String {
    let text = format!("{:.6}", value);
    let text = text.trim_end_matches('0').trim_end_matches('.');
    if text.is_empty() || text == "-" {
        "0".to_string()
    } else {
        text.to_string()
    }
}

/// Mix `speech` into `video` starting at `offset_ms`, writing `output`.
///
/// Returns the dub window that was applied.
pub async fn mix_speech_into_video(
    video: impl AsRef<Path>,
    base_audio: impl AsRef<Path>,
    speech: impl AsRef<Path>,
    offset_ms: u64,
    background_volume: f64,
    output: impl AsRef<Path>,
    runner: &FfmpegRunner,
) -> MediaResult<DubWindow> {
    let speech = speech.as_ref();
    let speech_secs = probe_duration(speech).await?;
    let window = DubWindow::new(offset_ms, speech_secs)?;
    info!(
        offset_ms = offset_ms,
        start = window.start_secs,
        end = window.end_secs,
        "Computed dub window"
    );

    let mix = DubMix::new(window).with_background_volume(background_volume);
    let cmd = mix.command(video, base_audio, speech, output);

    runner
        .run_with_progress(&cmd, |progress| {
            debug!(out_time_ms = progress.out_time_ms, speed = progress.speed, "Mixing");
        })
        .await?;

    if !cmd.output_path().exists() {
        return Err(MediaError::invalid_media(format!(
            "ffmpeg exited cleanly but wrote no {}",
            cmd.output_path().display()
        )));
    }

    Ok(window)
}
