//! Shared HTTP plumbing for the Google REST clients.
//!
//! - Token caching with refresh on 401
//! - HTTP client tuning (pooling, timeouts)
//! - Exponential backoff with jitter
//! - Observability (tracing spans, metrics)

use std::sync::Arc;
use std::time::{Duration, Instant};

use reqwest::{Client, Method, Response, StatusCode};
use serde::de::DeserializeOwned;
use serde::Serialize;
use tracing::{debug, info_span, Instrument};

use crate::auth::TokenCache;
use crate::error::{GoogleError, GoogleResult};
use crate::metrics::record_request;
use crate::retry::{with_retry, RetryConfig};

/// HTTP settings shared by every Google client.
#[derive(Debug, Clone)]
pub struct GoogleConfig {
    /// Request timeout
    pub timeout: Duration,
    /// Connect timeout
    pub connect_timeout: Duration,
    /// Retry configuration
    pub retry: RetryConfig,
}

impl Default for GoogleConfig {
    fn default() -> Self {
        Self {
            timeout: Duration::from_secs(60),
            connect_timeout: Duration::from_secs(5),
            retry: RetryConfig::default(),
        }
    }
}

impl GoogleConfig {
    /// Create config from environment variables.
    pub fn from_env() -> Self {
        Self {
            timeout: Duration::from_secs(
                std::env::var("GOOGLE_TIMEOUT_SECS")
                    .ok()
                    .and_then(|s| s.parse().ok())
                    .unwrap_or(60),
            ),
            connect_timeout: Duration::from_secs(
                std::env::var("GOOGLE_CONNECT_TIMEOUT_SECS")
                    .ok()
                    .and_then(|s| s.parse().ok())
                    .unwrap_or(5),
            ),
            retry: RetryConfig::from_env(),
        }
    }
}

/// Authenticated JSON client used by the service-specific wrappers.
#[derive(Clone)]
pub struct ApiClient {
    http: Client,
    auth: Arc<TokenCache>,
    retry: RetryConfig,
}

impl ApiClient {
    /// Create a new client.
    pub fn new(config: &GoogleConfig, auth: Arc<TokenCache>) -> GoogleResult<Self> {
        let http = Client::builder()
            .timeout(config.timeout)
            .connect_timeout(config.connect_timeout)
            .pool_idle_timeout(Duration::from_secs(90))
            .pool_max_idle_per_host(10)
            .user_agent(concat!("vdub-google/", env!("CARGO_PKG_VERSION")))
            .build()
            .map_err(GoogleError::Network)?;

        Ok(Self {
            http,
            auth,
            retry: config.retry.clone(),
        })
    }

    /// Same connection pool and retry policy, different credentials.
    pub fn with_auth(&self, auth: Arc<TokenCache>) -> Self {
        Self {
            http: self.http.clone(),
            auth,
            retry: self.retry.clone(),
        }
    }

    /// Same client with retries turned off.
    ///
    /// Spreadsheet calls surface their first failure to the caller, and a
    /// publish must not be resent after an ambiguous 5xx or timeout.
    pub fn without_retry(&self) -> Self {
        Self {
            http: self.http.clone(),
            auth: self.auth.clone(),
            retry: RetryConfig::none(),
        }
    }

    /// Send a JSON request and decode the JSON response.
    pub async fn send_json<B, T>(
        &self,
        operation: &str,
        method: Method,
        url: &str,
        body: Option<&B>,
    ) -> GoogleResult<T>
    where
        B: Serialize + ?Sized,
        T: DeserializeOwned,
    {
        let span = info_span!("google_request", operation = %operation);

        let start = Instant::now();
        let result = with_retry(&self.retry, operation, || {
            self.send_once(method.clone(), url, body)
        })
        .instrument(span)
        .await;
        let latency_ms = start.elapsed().as_millis() as f64;

        let status = match &result {
            Ok(_) => 200,
            Err(e) => e.http_status().unwrap_or(500),
        };
        record_request(operation, status, latency_ms);

        result
    }

    async fn send_once<B, T>(&self, method: Method, url: &str, body: Option<&B>) -> GoogleResult<T>
    where
        B: Serialize + ?Sized,
        T: DeserializeOwned,
    {
        let mut response = self.dispatch(method.clone(), url, body).await?;

        if response.status() == StatusCode::UNAUTHORIZED && self.auth.is_refreshable() {
            debug!("Access token rejected, refreshing and retrying once");
            self.auth.invalidate().await;
            response = self.dispatch(method, url, body).await?;
        }

        let status = response.status();
        if !status.is_success() {
            return Err(GoogleError::from_response(response).await);
        }

        let bytes = response.bytes().await?;
        if bytes.is_empty() {
            return Ok(serde_json::from_slice(b"{}")?);
        }
        Ok(serde_json::from_slice(&bytes)?)
    }

    async fn dispatch<B>(&self, method: Method, url: &str, body: Option<&B>) -> GoogleResult<Response>
    where
        B: Serialize + ?Sized,
    {
        let mut request = self.http.request(method, url);
        if let Some(token) = self.auth.token().await? {
            request = request.bearer_auth(token);
        }
        if let Some(body) = body {
            request = request.json(body);
        }
        Ok(request.send().await?)
    }
}
