//! GCS client implementation.

use std::path::Path;

use aws_config::BehaviorVersion;
use aws_credential_types::Credentials;
use aws_sdk_s3::config::{
    Builder, Region, RequestChecksumCalculation, ResponseChecksumValidation,
};
use aws_sdk_s3::error::DisplayErrorContext;
use aws_sdk_s3::primitives::ByteStream;
use aws_sdk_s3::Client;
use tracing::{debug, info};

use crate::error::{StorageError, StorageResult};

const DEFAULT_ENDPOINT: &str = "https://storage.googleapis.com";

/// Configuration for the GCS client.
#[derive(Debug, Clone)]
pub struct GcsConfig {
    /// XML API endpoint URL
    pub endpoint_url: String,
    /// HMAC access key ID
    pub access_key_id: String,
    /// HMAC secret
    pub secret_access_key: String,
    /// Signing region ("auto" works for GCS)
    pub region: String,
}

impl GcsConfig {
    /// Create config from environment variables.
    pub fn from_env() -> StorageResult<Self> {
        Ok(Self {
            endpoint_url: std::env::var("GCS_ENDPOINT_URL")
                .unwrap_or_else(|_| DEFAULT_ENDPOINT.to_string()),
            access_key_id: std::env::var("GCS_HMAC_ACCESS_KEY_ID")
                .map_err(|_| StorageError::config_error("GCS_HMAC_ACCESS_KEY_ID not set"))?,
            secret_access_key: std::env::var("GCS_HMAC_SECRET")
                .map_err(|_| StorageError::config_error("GCS_HMAC_SECRET not set"))?,
            region: std::env::var("GCS_REGION").unwrap_or_else(|_| "auto".to_string()),
        })
    }
}

/// Content type for an object, by file extension.
pub fn content_type_for(path: impl AsRef<Path>) -> &'static str {
    let ext = path
        .as_ref()
        .extension()
        .and_then(|e| e.to_str())
        .map(|e| e.to_ascii_lowercase());

    match ext.as_deref() {
        Some("mp4") => "video/mp4",
        Some("mov") => "video/quicktime",
        Some("webm") => "video/webm",
        Some("mp3") => "audio/mpeg",
        Some("ogg" | "opus" | "ogg_opus") => "audio/ogg",
        Some("wav" | "linear16" | "mulaw" | "alaw") => "audio/wav",
        Some("m4a" | "aac") => "audio/aac",
        Some("json") => "application/json",
        _ => "application/octet-stream",
    }
}

fn validate_key(key: &str) -> StorageResult<&str> {
    let key = key.trim_start_matches('/');
    if key.trim().is_empty() {
        return Err(StorageError::InvalidKey("object key is empty".to_string()));
    }
    Ok(key)
}

fn location(bucket: &str, key: &str) -> String {
    format!("{}/{}", bucket, key)
}

/// Google Cloud Storage client.
#[derive(Clone)]
pub struct GcsClient {
    client: Client,
}

impl GcsClient {
    /// Create a new client from configuration.
    pub async fn new(config: GcsConfig) -> StorageResult<Self> {
        let credentials = Credentials::new(
            &config.access_key_id,
            &config.secret_access_key,
            None,
            None,
            "gcs-hmac",
        );

        let sdk_config = Builder::new()
            .behavior_version(BehaviorVersion::latest())
            .endpoint_url(&config.endpoint_url)
            .region(Region::new(config.region))
            .credentials_provider(credentials)
            .force_path_style(true)
            // The XML interop endpoint rejects the SDK's default CRC32 headers.
            .request_checksum_calculation(RequestChecksumCalculation::WhenRequired)
            .response_checksum_validation(ResponseChecksumValidation::WhenRequired)
            .build();

        Ok(Self {
            client: Client::from_conf(sdk_config),
        })
    }

    /// Create from environment variables.
    pub async fn from_env() -> StorageResult<Self> {
        let config = GcsConfig::from_env()?;
        Self::new(config).await
    }

    /// Upload a local file.
    pub async fn upload_file(
        &self,
        bucket: &str,
        path: impl AsRef<Path>,
        key: &str,
        content_type: &str,
    ) -> StorageResult<()> {
        let path = path.as_ref();
        let key = validate_key(key)?;
        debug!("Uploading {} to {}", path.display(), location(bucket, key));

        let body = ByteStream::from_path(path)
            .await
            .map_err(|e| StorageError::upload_failed(e.to_string()))?;

        self.client
            .put_object()
            .bucket(bucket)
            .key(key)
            .body(body)
            .content_type(content_type)
            .send()
            .await
            .map_err(|e| StorageError::upload_failed(DisplayErrorContext(&e).to_string()))?;

        info!("Uploaded {} to {}", path.display(), location(bucket, key));
        Ok(())
    }

    /// Upload bytes.
    pub async fn upload_bytes(
        &self,
        bucket: &str,
        data: Vec<u8>,
        key: &str,
        content_type: &str,
    ) -> StorageResult<()> {
        let key = validate_key(key)?;
        debug!("Uploading {} bytes to {}", data.len(), location(bucket, key));

        self.client
            .put_object()
            .bucket(bucket)
            .key(key)
            .body(ByteStream::from(data))
            .content_type(content_type)
            .send()
            .await
            .map_err(|e| StorageError::upload_failed(DisplayErrorContext(&e).to_string()))?;

        Ok(())
    }

    /// Download an object as bytes.
    pub async fn download_bytes(&self, bucket: &str, key: &str) -> StorageResult<Vec<u8>> {
        let key = validate_key(key)?;
        debug!("Downloading {}", location(bucket, key));

        let response = self
            .client
            .get_object()
            .bucket(bucket)
            .key(key)
            .send()
            .await
            .map_err(|e| {
                if matches!(e.as_service_error(), Some(err) if err.is_no_such_key()) {
                    StorageError::not_found(location(bucket, key))
                } else {
                    StorageError::download_failed(DisplayErrorContext(&e).to_string())
                }
            })?;

        let bytes = response
            .body
            .collect()
            .await
            .map_err(|e| StorageError::download_failed(e.to_string()))?
            .into_bytes()
            .to_vec();

        Ok(bytes)
    }

    /// Download an object to a file, creating parent directories.
    pub async fn download_file(
        &self,
        bucket: &str,
        key: &str,
        path: impl AsRef<Path>,
    ) -> StorageResult<()> {
        let path = path.as_ref();
        let bytes = self.download_bytes(bucket, key).await?;

        if let Some(parent) = path.parent() {
            tokio::fs::create_dir_all(parent).await?;
        }
        tokio::fs::write(path, bytes).await?;

        info!("Downloaded {} to {}", location(bucket, key), path.display());
        Ok(())
    }

    /// Check if an object exists.
    pub async fn exists(&self, bucket: &str, key: &str) -> StorageResult<bool> {
        let key = validate_key(key)?;
        match self.client.head_object().bucket(bucket).key(key).send().await {
            Ok(_) => Ok(true),
            Err(e) => {
                if matches!(e.as_service_error(), Some(err) if err.is_not_found()) {
                    Ok(false)
                } else {
                    Err(StorageError::AwsSdk(DisplayErrorContext(&e).to_string()))
                }
            }
        }
    }

    /// Delete an object.
    pub async fn delete_object(&self, bucket: &str, key: &str) -> StorageResult<()> {
        let key = validate_key(key)?;
        debug!("Deleting {}", location(bucket, key));

        self.client
            .delete_object()
            .bucket(bucket)
            .key(key)
            .send()
            .await
            .map_err(|e| StorageError::delete_failed(DisplayErrorContext(&e).to_string()))?;

        Ok(())
    }

    /// Upload a file, deleting any object already stored under the key first.
    pub async fn replace_file(
        &self,
        bucket: &str,
        path: impl AsRef<Path>,
        key: &str,
        content_type: &str,
    ) -> StorageResult<()> {
        if self.exists(bucket, key).await? {
            info!("Replacing existing object {}", location(bucket, key));
            self.delete_object(bucket, key).await?;
        }
        self.upload_file(bucket, path, key, content_type).await
    }

    /// Check connectivity to a bucket with a head bucket operation.
    pub async fn check_connectivity(&self, bucket: &str) -> StorageResult<()> {
        self.client
            .head_bucket()
            .bucket(bucket)
            .send()
            .await
            .map_err(|e| {
                StorageError::AwsSdk(format!(
                    "GCS connectivity check failed: {}",
                    DisplayErrorContext(&e)
                ))
            })?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serial_test::serial;

    #[test]
    fn test_content_type_for() {
        assert_eq!(content_type_for("output/20230419/a-b-c.mp4"), "video/mp4");
        assert_eq!(content_type_for("speech.MP3"), "audio/mpeg");
        assert_eq!(content_type_for("speech.linear16"), "audio/wav");
        assert_eq!(content_type_for("speech.ogg_opus"), "audio/ogg");
        assert_eq!(content_type_for("noext"), "application/octet-stream");
    }

    #[test]
    fn test_validate_key() {
        assert_eq!(validate_key("/videos/a.mp4").unwrap(), "videos/a.mp4");
        assert!(matches!(validate_key(""), Err(StorageError::InvalidKey(_))));
        assert!(matches!(validate_key("/"), Err(StorageError::InvalidKey(_))));
    }

    #[test]
    #[serial]
    fn test_config_from_env_defaults() {
        std::env::remove_var("GCS_ENDPOINT_URL");
        std::env::remove_var("GCS_REGION");
        std::env::set_var("GCS_HMAC_ACCESS_KEY_ID", "GOOG1EXAMPLE");
        std::env::set_var("GCS_HMAC_SECRET", "secret");

        let config = GcsConfig::from_env().unwrap();
        assert_eq!(config.endpoint_url, "https://storage.googleapis.com");
        assert_eq!(config.region, "auto");
        assert_eq!(config.access_key_id, "GOOG1EXAMPLE");

        std::env::remove_var("GCS_HMAC_ACCESS_KEY_ID");
        std::env::remove_var("GCS_HMAC_SECRET");
    }

    #[test]
    #[serial]
    fn test_config_requires_hmac_keys() {
        std::env::remove_var("GCS_HMAC_ACCESS_KEY_ID");
        std::env::remove_var("GCS_HMAC_SECRET");

        assert!(matches!(
            GcsConfig::from_env(),
            Err(StorageError::ConfigError(_))
        ));
    }

    async fn test_client(endpoint_url: String) -> GcsClient {
        GcsClient::new(GcsConfig {
            endpoint_url,
            access_key_id: "id".to_string(),
            secret_access_key: "secret".to_string(),
            region: "auto".to_string(),
        })
        .await
        .unwrap()
    }

    #[tokio::test]
    async fn test_invalid_key_rejected_before_request() {
        let client = test_client("http://127.0.0.1:1".to_string()).await;

        let err = client
            .upload_bytes("bucket", vec![1, 2, 3], "", "audio/mpeg")
            .await
            .unwrap_err();
        assert!(matches!(err, StorageError::InvalidKey(_)));
    }

    #[tokio::test]
    async fn test_upload_sends_no_checksum_headers() {
        use wiremock::matchers::{method, path};
        use wiremock::{Mock, MockServer, ResponseTemplate};

        let server = MockServer::start().await;
        Mock::given(method("PUT"))
            .and(path("/bucket/output/20230419/speech.mp3"))
            .respond_with(ResponseTemplate::new(200))
            .expect(1)
            .mount(&server)
            .await;

        let client = test_client(server.uri()).await;
        client
            .upload_bytes("bucket", b"ID3".to_vec(), "output/20230419/speech.mp3", "audio/mpeg")
            .await
            .unwrap();

        let requests = server.received_requests().await.unwrap();
        let checksum_headers: Vec<String> = requests[0]
            .headers
            .iter()
            .map(|(name, _)| name.as_str().to_ascii_lowercase())
            .filter(|name| {
                name.starts_with("x-amz-checksum-") || name == "x-amz-sdk-checksum-algorithm"
            })
            .collect();
        assert!(checksum_headers.is_empty(), "sent {:?}", checksum_headers);
    }
}
