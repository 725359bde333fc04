//! OAuth token caching shared by all Google clients.
//!
//! Provides a thread-safe, async-aware token cache with:
//! - Refresh margin to avoid token expiry during requests
//! - Single-flight pattern to prevent thundering herd on refresh
//! - Graceful fallback to existing valid token on refresh failure

use std::sync::Arc;
use std::time::{Duration, Instant};

use chrono::Utc;
use gcp_auth::{CustomServiceAccount, TokenProvider};
use tokio::sync::RwLock;
use tracing::{debug, info, warn};

use crate::error::{GoogleError, GoogleResult};

/// Refresh margin: refresh token 60 seconds before expiry.
const TOKEN_REFRESH_MARGIN: Duration = Duration::from_secs(60);

/// Conservative token TTL when expiry is unknown (50 minutes).
const TOKEN_DEFAULT_TTL: Duration = Duration::from_secs(50 * 60);

/// Scopes requested for every token: Cloud APIs plus Sheets, which is not
/// covered by `cloud-platform`.
pub const GOOGLE_SCOPES: &[&str] = &[
    "https://www.googleapis.com/auth/cloud-platform",
    "https://www.googleapis.com/auth/spreadsheets",
];

/// Where access tokens come from.
#[derive(Clone)]
pub enum TokenSource {
    /// Service account or metadata server via gcp_auth
    Provider(Arc<dyn TokenProvider>),
    /// Pre-issued bearer token
    Fixed(String),
    /// No Authorization header (emulators)
    Anonymous,
}

impl std::fmt::Debug for TokenSource {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            TokenSource::Provider(_) => write!(f, "TokenSource::Provider"),
            TokenSource::Fixed(_) => write!(f, "TokenSource::Fixed(..)"),
            TokenSource::Anonymous => write!(f, "TokenSource::Anonymous"),
        }
    }
}

/// Cached token with expiration tracking.
struct CachedToken {
    access_token: String,
    expires_at: Instant,
}

impl CachedToken {
    /// Check if token is still valid with refresh margin.
    fn is_valid(&self) -> bool {
        Instant::now() + TOKEN_REFRESH_MARGIN < self.expires_at
    }

    /// Check if token is technically still usable (even if refresh is needed).
    fn is_usable(&self) -> bool {
        Instant::now() < self.expires_at
    }
}

/// Thread-safe token cache with single-flight refresh.
pub struct TokenCache {
    source: TokenSource,
    cache: RwLock<Option<CachedToken>>,
}

impl TokenCache {
    /// Create a new token cache.
    pub fn new(source: TokenSource) -> Self {
        Self {
            source,
            cache: RwLock::new(None),
        }
    }

    /// Resolve credentials from the environment.
    ///
    /// `GOOGLE_APPLICATION_CREDENTIALS` pointing at a service account key wins;
    /// otherwise gcp_auth discovers ambient credentials (metadata server,
    /// gcloud user credentials).
    pub async fn from_env() -> GoogleResult<Self> {
        let service_account = CustomServiceAccount::from_env().map_err(|e| {
            GoogleError::auth_error(format!("Failed to load service account: {}", e))
        })?;

        let provider: Arc<dyn TokenProvider> = match service_account {
            Some(sa) => {
                info!("Using service account credentials from GOOGLE_APPLICATION_CREDENTIALS");
                Arc::new(sa)
            }
            None => gcp_auth::provider().await.map_err(|e| {
                GoogleError::auth_error(format!("No Google credentials available: {}", e))
            })?,
        };

        Ok(Self::new(TokenSource::Provider(provider)))
    }

    /// Cache that always hands out the same bearer token.
    pub fn fixed(token: impl Into<String>) -> Self {
        Self::new(TokenSource::Fixed(token.into()))
    }

    /// Cache that never authenticates.
    pub fn anonymous() -> Self {
        Self::new(TokenSource::Anonymous)
    }

    /// Whether invalidating the cache can yield a different token.
    pub fn is_refreshable(&self) -> bool {
        matches!(self.source, TokenSource::Provider(_))
    }

    /// Invalidate the cached token.
    pub async fn invalidate(&self) {
        let mut cache = self.cache.write().await;
        *cache = None;
    }

    /// Get a bearer token for the next request, or `None` when anonymous.
    pub async fn token(&self) -> GoogleResult<Option<String>> {
        match &self.source {
            TokenSource::Anonymous => Ok(None),
            TokenSource::Fixed(token) => Ok(Some(token.clone())),
            TokenSource::Provider(provider) => self.cached_token(provider).await.map(Some),
        }
    }

    async fn cached_token(&self, provider: &Arc<dyn TokenProvider>) -> GoogleResult<String> {
        // Fast path: check read lock first
        {
            let cache = self.cache.read().await;
            if let Some(cached) = cache.as_ref() {
                if cached.is_valid() {
                    return Ok(cached.access_token.clone());
                }
            }
        }

        let mut cache = self.cache.write().await;

        // Another task may have refreshed while we waited
        if let Some(cached) = cache.as_ref() {
            if cached.is_valid() {
                return Ok(cached.access_token.clone());
            }
        }

        self.refresh_token(provider, &mut cache).await
    }

    async fn refresh_token(
        &self,
        provider: &Arc<dyn TokenProvider>,
        cache: &mut Option<CachedToken>,
    ) -> GoogleResult<String> {
        match provider.token(GOOGLE_SCOPES).await {
            Ok(token) => {
                let access_token = token.as_str().to_string();

                let expires_at = {
                    let now = Utc::now();
                    let exp = token.expires_at();

                    if exp > now {
                        match (exp - now).to_std() {
                            Ok(ttl) => Instant::now() + ttl,
                            Err(_) => Instant::now() + TOKEN_DEFAULT_TTL,
                        }
                    } else {
                        // Force a refresh on the next request.
                        Instant::now()
                    }
                };

                *cache = Some(CachedToken {
                    access_token: access_token.clone(),
                    expires_at,
                });

                debug!("Refreshed Google access token");
                Ok(access_token)
            }
            Err(e) => {
                if let Some(cached) = cache.as_ref() {
                    if cached.is_usable() {
                        warn!("Token refresh failed, using existing token: {}", e);
                        return Ok(cached.access_token.clone());
                    }
                }

                Err(GoogleError::auth_error(format!(
                    "Failed to obtain auth token: {}",
                    e
                )))
            }
        }
    }
}
