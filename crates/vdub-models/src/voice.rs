//! Voice selection and audio encodings for speech synthesis.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

use crate::error::{ModelError, ModelResult};

/// Separator between the voice name and a free-form label in the sheet
/// (`en-US-Standard-I##male`).
pub const VOICE_LABEL_SEPARATOR: &str = "##";

/// Number of leading characters of the voice id that form the language code.
const LANGUAGE_CODE_LEN: usize = 5;

/// Voice parameters derived from a row's `voice_id`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct VoiceSelection {
    /// BCP-47 language code (`en-US`)
    pub language_code: String,
    /// Voice name (`en-US-Standard-I`)
    pub name: String,
}

impl VoiceSelection {
    /// Parse a sheet voice id.
    ///
    /// The voice name is everything before the first `##`; the language
    /// code is the first five characters of the full id.
    pub fn parse(voice_id: &str) -> ModelResult<Self> {
        let voice_id = voice_id.trim();
        if voice_id.is_empty() {
            return Err(ModelError::missing_field("voice_id"));
        }

        let name = voice_id
            .split(VOICE_LABEL_SEPARATOR)
            .next()
            .unwrap_or_default()
            .to_string();
        if name.is_empty() {
            return Err(ModelError::InvalidVoice(voice_id.to_string()));
        }

        if voice_id.chars().count() < LANGUAGE_CODE_LEN {
            return Err(ModelError::InvalidVoice(voice_id.to_string()));
        }
        let language_code: String = voice_id.chars().take(LANGUAGE_CODE_LEN).collect();

        Ok(Self {
            language_code,
            name,
        })
    }
}

/// Audio encodings accepted by the Text-to-Speech API.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum AudioEncoding {
    /// Uncompressed 16-bit PCM with a WAV header
    Linear16,
    /// MP3 audio
    Mp3,
    /// Opus in an Ogg container
    OggOpus,
    /// 8-bit G.711 mu-law
    Mulaw,
    /// 8-bit G.711 A-law
    Alaw,
}

impl AudioEncoding {
    /// API name of the encoding.
    pub fn as_str(&self) -> &'static str {
        match self {
            AudioEncoding::Linear16 => "LINEAR16",
            AudioEncoding::Mp3 => "MP3",
            AudioEncoding::OggOpus => "OGG_OPUS",
            AudioEncoding::Mulaw => "MULAW",
            AudioEncoding::Alaw => "ALAW",
        }
    }

    /// MIME type used when uploading synthesized audio.
    pub fn content_type(&self) -> &'static str {
        match self {
            AudioEncoding::Mp3 => "audio/mpeg",
            AudioEncoding::OggOpus => "audio/ogg",
            AudioEncoding::Linear16 | AudioEncoding::Mulaw | AudioEncoding::Alaw => "audio/wav",
        }
    }
}

impl fmt::Display for AudioEncoding {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

impl FromStr for AudioEncoding {
    type Err = ModelError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_uppercase().as_str() {
            "LINEAR16" => Ok(AudioEncoding::Linear16),
            "MP3" => Ok(AudioEncoding::Mp3),
            "OGG_OPUS" => Ok(AudioEncoding::OggOpus),
            "MULAW" => Ok(AudioEncoding::Mulaw),
            "ALAW" => Ok(AudioEncoding::Alaw),
            "" => Err(ModelError::missing_field("audio_encoding")),
            other => Err(ModelError::UnknownEncoding(other.to_string())),
        }
    }
}
