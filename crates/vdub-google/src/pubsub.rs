//! Pub/Sub publisher.

use std::collections::HashMap;
use std::sync::Arc;

use base64::engine::general_purpose::STANDARD;
use base64::Engine;
use reqwest::Method;
use serde::{Deserialize, Serialize};
use tracing::{debug, info};

use crate::auth::TokenCache;
use crate::client::ApiClient;
use crate::error::{GoogleError, GoogleResult};

const DEFAULT_BASE_URL: &str = "https://pubsub.googleapis.com";

#[derive(Debug, Serialize)]
struct PublishRequest<'a> {
    messages: [OutgoingMessage<'a>; 1],
}

#[derive(Debug, Serialize)]
struct OutgoingMessage<'a> {
    data: String,
    #[serde(skip_serializing_if = "no_attributes")]
    attributes: &'a HashMap<String, String>,
}

fn no_attributes(attributes: &&HashMap<String, String>) -> bool {
    attributes.is_empty()
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct PublishResponse {
    #[serde(default)]
    message_ids: Vec<String>,
}

/// Publishes JSON messages to topics of one project. Publishes are sent once.
#[derive(Clone)]
pub struct PubSubPublisher {
    api: ApiClient,
    base_url: String,
    project_id: String,
}

impl PubSubPublisher {
    pub fn new(api: ApiClient, project_id: impl Into<String>) -> Self {
        Self::with_base_url(api, DEFAULT_BASE_URL, project_id)
    }

    pub fn with_base_url(
        api: ApiClient,
        base_url: impl Into<String>,
        project_id: impl Into<String>,
    ) -> Self {
        Self {
            api: api.without_retry(),
            base_url: base_url.into().trim_end_matches('/').to_string(),
            project_id: project_id.into(),
        }
    }

    /// Use the emulator when `PUBSUB_EMULATOR_HOST` is set.
    ///
    /// The emulator speaks plain HTTP and ignores credentials.
    pub fn from_env(api: ApiClient, project_id: impl Into<String>) -> Self {
        match std::env::var("PUBSUB_EMULATOR_HOST") {
            Ok(host) if !host.trim().is_empty() => {
                info!(host = %host, "Publishing to Pub/Sub emulator");
                let api = api.with_auth(Arc::new(TokenCache::anonymous()));
                Self::with_base_url(api, format!("http://{}", host.trim()), project_id)
            }
            _ => Self::new(api, project_id),
        }
    }

    /// Full topic resource name.
    pub fn topic_path(&self, topic: &str) -> String {
        format!("projects/{}/topics/{}", self.project_id, topic)
    }

    /// Publish `payload` serialized as JSON; returns the message id.
    pub async fn publish_json<T: Serialize + ?Sized>(&self, topic: &str, payload: &T) -> GoogleResult<String> {
        self.publish_json_with_attributes(topic, payload, &HashMap::new())
            .await
    }

    pub async fn publish_json_with_attributes<T: Serialize + ?Sized>(
        &self,
        topic: &str,
        payload: &T,
        attributes: &HashMap<String, String>,
    ) -> GoogleResult<String> {
        let data = STANDARD.encode(serde_json::to_vec(payload)?);
        let url = format!("{}/v1/{}:publish", self.base_url, self.topic_path(topic));
        let body = PublishRequest {
            messages: [OutgoingMessage { data, attributes }],
        };

        let response: PublishResponse = self
            .api
            .send_json("pubsub.publish", Method::POST, &url, Some(&body))
            .await?;

        let message_id = response
            .message_ids
            .into_iter()
            .next()
            .ok_or_else(|| GoogleError::invalid_response("publish returned no message id"))?;

        debug!(topic = %topic, message_id = %message_id, "Published message");
        Ok(message_id)
    }
}
