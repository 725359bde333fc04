//! Cloud Text-to-Speech client.

use base64::engine::general_purpose::STANDARD;
use base64::Engine;
use reqwest::Method;
use serde::{Deserialize, Serialize};
use tracing::debug;

use vdub_models::{AudioEncoding, VoiceSelection};

use crate::client::ApiClient;
use crate::error::{GoogleError, GoogleResult};

const DEFAULT_BASE_URL: &str = "https://texttospeech.googleapis.com";

/// Body of `text:synthesize`.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SynthesisRequest {
    pub input: SynthesisInput,
    pub voice: VoiceParams,
    pub audio_config: AudioConfig,
}

#[derive(Debug, Clone, Serialize)]
pub struct SynthesisInput {
    pub ssml: String,
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct VoiceParams {
    pub language_code: String,
    pub name: String,
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct AudioConfig {
    pub audio_encoding: AudioEncoding,
}

impl SynthesisRequest {
    /// Synthesize SSML with the given voice and encoding.
    pub fn ssml(ssml: impl Into<String>, voice: &VoiceSelection, encoding: AudioEncoding) -> Self {
        Self {
            input: SynthesisInput { ssml: ssml.into() },
            voice: VoiceParams {
                language_code: voice.language_code.clone(),
                name: voice.name.clone(),
            },
            audio_config: AudioConfig {
                audio_encoding: encoding,
            },
        }
    }
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct SynthesisResponse {
    #[serde(default)]
    audio_content: String,
}

/// Text-to-Speech client.
#[derive(Clone)]
pub struct TtsClient {
    api: ApiClient,
    base_url: String,
}

impl TtsClient {
    pub fn new(api: ApiClient) -> Self {
        Self::with_base_url(api, DEFAULT_BASE_URL)
    }

    pub fn with_base_url(api: ApiClient, base_url: impl Into<String>) -> Self {
        Self {
            api,
            base_url: base_url.into().trim_end_matches('/').to_string(),
        }
    }

    /// Synthesize speech and return the encoded audio bytes.
    pub async fn synthesize(&self, request: &SynthesisRequest) -> GoogleResult<Vec<u8>> {
        let url = format!("{}/v1/text:synthesize", self.base_url);
        let response: SynthesisResponse = self
            .api
            .send_json("tts.synthesize", Method::POST, &url, Some(request))
            .await?;

        if response.audio_content.is_empty() {
            return Err(GoogleError::invalid_response("synthesis returned no audio"));
        }

        let audio = STANDARD
            .decode(response.audio_content.as_bytes())
            .map_err(|e| GoogleError::invalid_response(format!("audioContent is not base64: {}", e)))?;

        debug!(
            voice = %request.voice.name,
            encoding = %request.audio_config.audio_encoding,
            bytes = audio.len(),
            "Synthesized speech"
        );
        Ok(audio)
    }
}
