//! Pub/Sub push envelopes.
//!
//! A push subscription POSTs `{"message": {"data": "<base64>", ...}, "subscription": "..."}`
//! to the receiving endpoint.

use std::collections::HashMap;

use base64::engine::general_purpose::STANDARD;
use base64::Engine;
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};

use crate::error::{ModelError, ModelResult};

/// Body of a Pub/Sub push request.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct PushEnvelope {
    pub message: PushMessage,
    #[serde(default)]
    pub subscription: String,
}

/// The message carried by a push request.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PushMessage {
    /// Base64-encoded payload
    #[serde(default)]
    pub data: String,
    #[serde(default)]
    pub attributes: HashMap<String, String>,
    #[serde(default, alias = "message_id")]
    pub message_id: String,
    #[serde(default, alias = "publish_time")]
    pub publish_time: Option<String>,
}

impl PushEnvelope {
    /// Wrap a JSON payload the way the publisher encodes it.
    pub fn from_json<T: Serialize>(payload: &T) -> ModelResult<Self> {
        let bytes = serde_json::to_vec(payload)?;
        Ok(Self {
            message: PushMessage {
                data: STANDARD.encode(bytes),
                ..Default::default()
            },
            subscription: String::new(),
        })
    }

    /// Decode the base64 payload.
    pub fn decode_data(&self) -> ModelResult<Vec<u8>> {
        if self.message.data.is_empty() {
            return Err(ModelError::envelope("message has no data"));
        }
        STANDARD
            .decode(self.message.data.trim())
            .map_err(|e| ModelError::envelope(format!("data is not valid base64: {}", e)))
    }

    /// Decode the payload as JSON.
    pub fn decode_json<T: DeserializeOwned>(&self) -> ModelResult<T> {
        let bytes = self.decode_data()?;
        Ok(serde_json::from_slice(&bytes)?)
    }
}
