//! Job rows of the config spreadsheet.
//!
//! Each data row of the sheet describes one dubbing task. The TTS stage
//! reads rows from the sheet, the video stage receives a row as the JSON
//! payload of a Pub/Sub message, and both write status back to the same
//! sheet row using [`JobRow::index`].

use std::collections::BTreeMap;
use std::fmt;
use std::path::Path;

use chrono::{DateTime, Utc};
use serde::de::{self, Deserializer};
use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::error::{ModelError, ModelResult};
use crate::timestamp::sheet_timestamp;

/// Status written after speech synthesis succeeded.
pub const STATUS_TTS_OK: &str = "TTS OK";

/// Status written after the dubbed video was uploaded.
pub const STATUS_VIDEO_OK: &str = "Video OK";

/// Result-path sentinel written when a stage fails.
pub const NOT_AVAILABLE: &str = "N/A";

/// Prefix of every generated object path.
const OUTPUT_PREFIX: &str = "output";

/// One dubbing task.
///
/// Field names match the header row of the sheet. Columns the pipeline does
/// not know about are kept in `extra` so they survive the trip through the
/// message bus.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct JobRow {
    #[serde(default, deserialize_with = "string_or_number")]
    pub campaign: String,
    #[serde(default, deserialize_with = "string_or_number")]
    pub topic: String,
    #[serde(default, deserialize_with = "string_or_number")]
    pub gcs_bucket: String,
    #[serde(default, deserialize_with = "string_or_number")]
    pub video_file: String,
    #[serde(default, deserialize_with = "string_or_number")]
    pub base_audio_file: String,
    /// SSML to synthesize
    #[serde(default, deserialize_with = "string_or_number")]
    pub text: String,
    #[serde(default, deserialize_with = "string_or_number")]
    pub voice_id: String,
    /// Dub offset in milliseconds, as written in the sheet
    #[serde(default, deserialize_with = "string_or_number")]
    pub millisecond_start_audio: String,
    #[serde(default, deserialize_with = "string_or_number")]
    pub audio_encoding: String,
    #[serde(default, deserialize_with = "string_or_number")]
    pub tts_file_url: String,
    #[serde(default, deserialize_with = "string_or_number")]
    pub final_video_file_url: String,
    #[serde(default, deserialize_with = "string_or_number")]
    pub status: String,
    #[serde(default, deserialize_with = "string_or_number")]
    pub last_update: String,
    /// Sheet row number (the header is row 1)
    #[serde(default, deserialize_with = "row_index")]
    pub index: u32,
    /// Columns not modelled above
    #[serde(flatten)]
    pub extra: BTreeMap<String, Value>,
}

impl JobRow {
    /// Map one sheet row onto a job row using the header row.
    ///
    /// Cells are matched to headers by position; missing trailing cells are
    /// left empty and blank headers are ignored.
    pub fn from_sheet_values(headers: &[String], cells: &[String], index: u32) -> ModelResult<Self> {
        let mut map = serde_json::Map::new();
        for (header, cell) in headers.iter().zip(cells.iter()) {
            let header = header.trim();
            if header.is_empty() || header == "index" {
                continue;
            }
            map.insert(header.to_string(), Value::String(cell.clone()));
        }

        let mut row: JobRow = serde_json::from_value(Value::Object(map))?;
        row.index = index;
        Ok(row)
    }

    /// Look up a field by its header name.
    pub fn field(&self, name: &str) -> Option<&str> {
        let value = match name {
            "campaign" => &self.campaign,
            "topic" => &self.topic,
            "gcs_bucket" => &self.gcs_bucket,
            "video_file" => &self.video_file,
            "base_audio_file" => &self.base_audio_file,
            "text" => &self.text,
            "voice_id" => &self.voice_id,
            "millisecond_start_audio" => &self.millisecond_start_audio,
            "audio_encoding" => &self.audio_encoding,
            "tts_file_url" => &self.tts_file_url,
            "final_video_file_url" => &self.final_video_file_url,
            "status" => &self.status,
            "last_update" => &self.last_update,
            other => return self.extra.get(other).and_then(Value::as_str),
        };
        Some(value.as_str())
    }

    /// Return a field's value, failing if it is absent or blank.
    pub fn require(&self, name: &str) -> ModelResult<&str> {
        match self.field(name).map(str::trim) {
            Some(value) if !value.is_empty() => Ok(value),
            _ => Err(ModelError::missing_field(name)),
        }
    }

    /// Parse the dub offset.
    pub fn offset_ms(&self) -> ModelResult<u64> {
        let raw = self.require("millisecond_start_audio")?;
        raw.parse::<u64>().map_err(|_| {
            ModelError::invalid_field(
                "millisecond_start_audio",
                format!("expected a non-negative whole number of milliseconds, got {:?}", raw),
            )
        })
    }

    fn base_name(&self) -> ModelResult<String> {
        Ok(format!(
            "{}-{}-{}",
            self.require("campaign")?,
            self.require("topic")?,
            self.require("voice_id")?
        ))
    }

    /// Object path of the synthesized speech:
    /// `output/{date}/{campaign}-{topic}-{voice_id}.{audio_encoding}`, lowercased.
    pub fn tts_file_name(&self, date: &str) -> ModelResult<String> {
        let name = format!("{}.{}", self.base_name()?, self.require("audio_encoding")?);
        Ok(format!("{}/{}/{}", OUTPUT_PREFIX, date, name.to_lowercase()))
    }

    /// Object path of the dubbed video:
    /// `output/{date}/{campaign}-{topic}-{voice_id}.mp4`, lowercased.
    pub fn video_file_name(&self, date: &str) -> ModelResult<String> {
        let name = format!("{}.mp4", self.base_name()?);
        Ok(format!("{}/{}/{}", OUTPUT_PREFIX, date, name.to_lowercase()))
    }

    pub fn mark_tts_ok(&mut self, tts_file: impl Into<String>) {
        self.status = STATUS_TTS_OK.to_string();
        self.tts_file_url = tts_file.into();
    }

    pub fn mark_tts_failed(&mut self, error: impl fmt::Display) {
        self.status = error.to_string();
        self.tts_file_url = NOT_AVAILABLE.to_string();
    }

    pub fn mark_video_ok(&mut self, video_url: impl Into<String>) {
        self.status = STATUS_VIDEO_OK.to_string();
        self.final_video_file_url = video_url.into();
    }

    pub fn mark_video_failed(&mut self, error: impl fmt::Display) {
        self.status = error.to_string();
        self.final_video_file_url = NOT_AVAILABLE.to_string();
    }

    /// Stamp the last-update field.
    pub fn touch(&mut self, now: &DateTime<Utc>) {
        self.last_update = sheet_timestamp(now);
    }
}

/// `gs://` URL of an object.
pub fn gs_url(bucket: &str, path: &str) -> String {
    format!("gs://{}/{}", bucket, path.trim_start_matches('/'))
}

/// Extension of an object path, if any (`input/track.wav` -> `wav`).
pub fn extension_of(path: &str) -> Option<&str> {
    Path::new(path)
        .extension()
        .and_then(|ext| ext.to_str())
        .filter(|ext| !ext.is_empty())
}

fn string_or_number<'de, D>(deserializer: D) -> Result<String, D::Error>
where
    D: Deserializer<'de>,
{
    match Option::<Value>::deserialize(deserializer)? {
        None | Some(Value::Null) => Ok(String::new()),
        Some(Value::String(s)) => Ok(s),
        Some(Value::Number(n)) => Ok(n.to_string()),
        Some(Value::Bool(b)) => Ok(b.to_string()),
        Some(other) => Err(de::Error::custom(format!(
            "expected a string or number, got {}",
            other
        ))),
    }
}

fn row_index<'de, D>(deserializer: D) -> Result<u32, D::Error>
where
    D: Deserializer<'de>,
{
    match Option::<Value>::deserialize(deserializer)? {
        None | Some(Value::Null) => Ok(0),
        Some(Value::Number(n)) => n
            .as_u64()
            .and_then(|n| u32::try_from(n).ok())
            .ok_or_else(|| de::Error::custom(format!("invalid row index {}", n))),
        Some(Value::String(s)) => s
            .trim()
            .parse()
            .map_err(|_| de::Error::custom(format!("invalid row index {:?}", s))),
        Some(other) => Err(de::Error::custom(format!("invalid row index {}", other))),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn sample_row() -> JobRow {
        JobRow {
            campaign: "Summer".to_string(),
            topic: "Outdoor".to_string(),
            gcs_bucket: "videodub_test_input".to_string(),
            video_file: "input/bumper_master.mp4".to_string(),
            base_audio_file: "input/soundtrack_bumper.wav".to_string(),
            text: "<speak>Here are <say-as interpret-as=\"characters\">SSML</say-as></speak>"
                .to_string(),
            voice_id: "en-US-Standard-I##male".to_string(),
            millisecond_start_audio: "1500".to_string(),
            audio_encoding: "MP3".to_string(),
            index: 2,
            ..Default::default()
        }
    }

    #[test]
    fn test_tts_file_name_is_lowercase() {
        let row = sample_row();
        assert_eq!(
            row.tts_file_name("20230419").unwrap(),
            "output/20230419/summer-outdoor-en-us-standard-i##male.mp3"
        );
    }

    #[test]
    fn test_video_file_name_is_lowercase() {
        let row = sample_row();
        assert_eq!(
            row.video_file_name("20230419").unwrap(),
            "output/20230419/summer-outdoor-en-us-standard-i##male.mp4"
        );
    }

    #[test]
    fn test_file_name_requires_fields() {
        let mut row = sample_row();
        row.topic = "  ".to_string();
        let err = row.tts_file_name("20230419").unwrap_err();
        assert!(matches!(err, ModelError::MissingField(ref f) if f == "topic"));
    }

    #[test]
    fn test_from_sheet_values_maps_headers() {
        let headers: Vec<String> = ["campaign", "topic", "gcs_bucket", "notes", "", "voice_id"]
            .iter()
            .map(|s| s.to_string())
            .collect();
        let cells: Vec<String> = ["summer", "outdoor", "bucket", "first cut", "ignored"]
            .iter()
            .map(|s| s.to_string())
            .collect();

        let row = JobRow::from_sheet_values(&headers, &cells, 7).unwrap();
        assert_eq!(row.campaign, "summer");
        assert_eq!(row.gcs_bucket, "bucket");
        assert_eq!(row.voice_id, "");
        assert_eq!(row.index, 7);
        assert_eq!(row.field("notes"), Some("first cut"));
    }

    #[test]
    fn test_deserialize_message_payload() {
        let payload = json!({
            "campaign": "summer",
            "topic": "outdoor",
            "millisecond_start_audio": 250,
            "index": "3",
            "status": "TTS OK",
            "tts_file_url": "output/20230419/summer-outdoor-en-us-standard-i.mp3",
            "owner": "marketing"
        });

        let row: JobRow = serde_json::from_value(payload).unwrap();
        assert_eq!(row.millisecond_start_audio, "250");
        assert_eq!(row.offset_ms().unwrap(), 250);
        assert_eq!(row.index, 3);
        assert_eq!(row.extra["owner"], "marketing");

        let back = serde_json::to_value(&row).unwrap();
        assert_eq!(back["index"], 3);
        assert_eq!(back["owner"], "marketing");
    }

    #[test]
    fn test_offset_rejects_garbage() {
        let mut row = sample_row();
        row.millisecond_start_audio = "-20".to_string();
        assert!(matches!(
            row.offset_ms(),
            Err(ModelError::InvalidField { .. })
        ));
        row.millisecond_start_audio = String::new();
        assert!(matches!(row.offset_ms(), Err(ModelError::MissingField(_))));
    }

    #[test]
    fn test_failure_sets_error_text_and_sentinel() {
        let mut row = sample_row();
        row.mark_tts_ok("output/20230419/a.mp3");
        assert_eq!(row.status, STATUS_TTS_OK);

        row.mark_tts_failed("Permission denied on bucket");
        assert_eq!(row.status, "Permission denied on bucket");
        assert_eq!(row.tts_file_url, NOT_AVAILABLE);

        row.mark_video_failed(ModelError::missing_field("video_file"));
        assert_eq!(row.status, "Missing required field: video_file");
        assert_eq!(row.final_video_file_url, NOT_AVAILABLE);
    }

    #[test]
    fn test_gs_url_and_extension() {
        assert_eq!(gs_url("bucket", "output/a.mp4"), "gs://bucket/output/a.mp4");
        assert_eq!(extension_of("input/soundtrack_bumper.wav"), Some("wav"));
        assert_eq!(extension_of("input/noext"), None);
    }
}
