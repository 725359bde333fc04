//! Tests for the Google clients against a mock HTTP server.

use std::sync::Arc;
use std::time::Duration;

use base64::engine::general_purpose::STANDARD;
use base64::Engine;
use serde_json::{json, Value};
use wiremock::matchers::{header, method, path, path_regex, query_param};
use wiremock::{Mock, MockServer, ResponseTemplate};

use vdub_models::{AudioEncoding, VoiceSelection};

use crate::auth::TokenCache;
use crate::client::{ApiClient, GoogleConfig};
use crate::error::GoogleError;
use crate::pubsub::PubSubPublisher;
use crate::retry::RetryConfig;
use crate::sheets::{SheetsClient, ValueRange};
use crate::tts::{SynthesisRequest, TtsClient};

// =============================================================================
// Test Helpers
// =============================================================================

fn test_api() -> ApiClient {
    let config = GoogleConfig {
        timeout: Duration::from_secs(5),
        connect_timeout: Duration::from_secs(2),
        retry: RetryConfig {
            max_retries: 2,
            base_delay_ms: 1,
            max_delay_ms: 10,
        },
    };
    ApiClient::new(&config, Arc::new(TokenCache::fixed("test-token"))).unwrap()
}

async fn request_bodies(server: &MockServer) -> Vec<Value> {
    server
        .received_requests()
        .await
        .unwrap_or_default()
        .iter()
        .map(|r| serde_json::from_slice(&r.body).unwrap_or(Value::Null))
        .collect()
}

// =============================================================================
// Error Type Tests
// =============================================================================

#[test]
fn test_error_from_http_status() {
    assert!(matches!(
        GoogleError::from_http_status(429, ""),
        GoogleError::RateLimited(_)
    ));
    assert!(matches!(
        GoogleError::from_http_status(503, "unavailable"),
        GoogleError::ServerError(503, _)
    ));
    assert!(matches!(
        GoogleError::from_http_status(404, "missing"),
        GoogleError::NotFound(_)
    ));
    assert!(matches!(
        GoogleError::from_http_status(400, "bad"),
        GoogleError::RequestFailed(_)
    ));
}

#[test]
fn test_error_retryability() {
    assert!(GoogleError::RateLimited(10).is_retryable());
    assert!(GoogleError::ServerError(500, "x".into()).is_retryable());
    assert!(!GoogleError::PermissionDenied("x".into()).is_retryable());
    assert!(!GoogleError::NotFound("x".into()).is_retryable());
    assert_eq!(GoogleError::RateLimited(10).retry_after_ms(), Some(10));
}

#[test]
fn test_error_uses_google_error_message() {
    let body = json!({
        "error": {
            "code": 403,
            "message": "The caller does not have permission",
            "status": "PERMISSION_DENIED"
        }
    })
    .to_string();

    let err = GoogleError::from_http_status(403, body);
    assert_eq!(
        err.to_string(),
        "Permission denied: PERMISSION_DENIED: The caller does not have permission"
    );
}

// =============================================================================
// Sheets
// =============================================================================

#[tokio::test]
async fn test_get_values_reads_rows() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path_regex(r"^/v4/spreadsheets/sheet-123/values/.+$"))
        .and(header("authorization", "Bearer test-token"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "range": "config!A1:M3",
            "majorDimension": "ROWS",
            "values": [["campaign", "topic"], ["summer", "outdoor"]]
        })))
        .expect(1)
        .mount(&server)
        .await;

    let sheets = SheetsClient::with_base_url(test_api(), server.uri());
    let rows = sheets.get_values("sheet-123", "config!A1:M").await.unwrap();

    assert_eq!(rows.len(), 2);
    assert_eq!(rows[1], vec!["summer".to_string(), "outdoor".to_string()]);
}

#[tokio::test]
async fn test_update_values_writes_raw_column() {
    let server = MockServer::start().await;
    Mock::given(method("PUT"))
        .and(path_regex(r"^/v4/spreadsheets/sheet-123/values/.+$"))
        .and(query_param("valueInputOption", "RAW"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "updatedRange": "config!L2",
            "updatedCells": 1
        })))
        .expect(1)
        .mount(&server)
        .await;

    let sheets = SheetsClient::with_base_url(test_api(), server.uri());
    let response = sheets
        .update_values("sheet-123", &ValueRange::single_cell("config!L2:L2", "TTS OK"))
        .await
        .unwrap();
    assert_eq!(response.updated_cells, 1);

    let bodies = request_bodies(&server).await;
    assert_eq!(bodies[0]["majorDimension"], "COLUMNS");
    assert_eq!(bodies[0]["values"], json!([["TTS OK"]]));
}

#[tokio::test]
async fn test_batch_update_values_sends_all_ranges() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/v4/spreadsheets/sheet-123/values:batchUpdate"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "spreadsheetId": "sheet-123",
            "totalUpdatedCells": 2
        })))
        .expect(1)
        .mount(&server)
        .await;

    let sheets = SheetsClient::with_base_url(test_api(), server.uri());
    let data = vec![
        ValueRange::single_cell("config!L4:L4", "Video OK"),
        ValueRange::single_cell("config!M4:M4", "2023/04/19, 13:05:09"),
    ];
    let response = sheets.batch_update_values("sheet-123", &data).await.unwrap();
    assert_eq!(response.total_updated_cells, 2);

    let bodies = request_bodies(&server).await;
    assert_eq!(bodies[0]["valueInputOption"], "RAW");
    assert_eq!(bodies[0]["data"].as_array().map(Vec::len), Some(2));
    assert_eq!(bodies[0]["data"][1]["range"], "config!M4:M4");
}

#[tokio::test]
async fn test_permission_denied_is_not_retried() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .respond_with(ResponseTemplate::new(403).set_body_json(json!({
            "error": {"code": 403, "message": "denied", "status": "PERMISSION_DENIED"}
        })))
        .expect(1)
        .mount(&server)
        .await;

    let sheets = SheetsClient::with_base_url(test_api(), server.uri());
    let err = sheets.get_values("sheet-123", "config!A1:M").await.unwrap_err();
    assert!(matches!(err, GoogleError::PermissionDenied(_)));
}

#[tokio::test]
async fn test_sheets_server_error_is_not_retried() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .respond_with(ResponseTemplate::new(503))
        .expect(1)
        .mount(&server)
        .await;

    let sheets = SheetsClient::with_base_url(test_api(), server.uri());
    let err = sheets.get_values("sheet-123", "config!A1:M").await.unwrap_err();
    assert!(matches!(err, GoogleError::ServerError(503, _)));
    assert_eq!(server.received_requests().await.unwrap().len(), 1);
}

#[tokio::test]
async fn test_synthesize_server_error_is_retried() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/v1/text:synthesize"))
        .respond_with(ResponseTemplate::new(503))
        .up_to_n_times(1)
        .mount(&server)
        .await;
    Mock::given(method("POST"))
        .and(path("/v1/text:synthesize"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "audioContent": STANDARD.encode(b"RIFF")
        })))
        .mount(&server)
        .await;

    let tts = TtsClient::with_base_url(test_api(), server.uri());
    let voice = VoiceSelection::parse("en-US-Standard-I").unwrap();
    let request = SynthesisRequest::ssml("<speak/>", &voice, AudioEncoding::Linear16);
    let audio = tts.synthesize(&request).await.unwrap();

    assert_eq!(audio, b"RIFF");
    assert_eq!(server.received_requests().await.unwrap().len(), 2);
}

// =============================================================================
// Text-to-Speech
// =============================================================================

#[tokio::test]
async fn test_synthesize_decodes_audio() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/v1/text:synthesize"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "audioContent": STANDARD.encode(b"ID3-fake-mp3")
        })))
        .expect(1)
        .mount(&server)
        .await;

    let tts = TtsClient::with_base_url(test_api(), server.uri());
    let voice = VoiceSelection::parse("en-US-Standard-I").unwrap();
    let request = SynthesisRequest::ssml("<speak>Hello</speak>", &voice, AudioEncoding::Mp3);
    let audio = tts.synthesize(&request).await.unwrap();

    assert_eq!(audio, b"ID3-fake-mp3");
    let bodies = request_bodies(&server).await;
    assert_eq!(bodies[0]["voice"]["languageCode"], "en-US");
    assert_eq!(bodies[0]["audioConfig"]["audioEncoding"], "MP3");
}

#[tokio::test]
async fn test_synthesize_without_audio_is_an_error() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/v1/text:synthesize"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({})))
        .mount(&server)
        .await;

    let tts = TtsClient::with_base_url(test_api(), server.uri());
    let voice = VoiceSelection::parse("en-US-Standard-I").unwrap();
    let request = SynthesisRequest::ssml("<speak/>", &voice, AudioEncoding::Linear16);
    let err = tts.synthesize(&request).await.unwrap_err();
    assert!(matches!(err, GoogleError::InvalidResponse(_)));
}

// =============================================================================
// Pub/Sub
// =============================================================================

#[tokio::test]
async fn test_publish_json_encodes_payload() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/v1/projects/test-project/topics/generate_video_trigger:publish"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "messageIds": ["42"]
        })))
        .expect(1)
        .mount(&server)
        .await;

    let publisher = PubSubPublisher::with_base_url(test_api(), server.uri(), "test-project");
    let id = publisher
        .publish_json("generate_video_trigger", &json!({"campaign": "summer", "index": 2}))
        .await
        .unwrap();
    assert_eq!(id, "42");

    let bodies = request_bodies(&server).await;
    let data = bodies[0]["messages"][0]["data"].as_str().unwrap();
    let payload: Value = serde_json::from_slice(&STANDARD.decode(data).unwrap()).unwrap();
    assert_eq!(payload, json!({"campaign": "summer", "index": 2}));
    assert!(bodies[0]["messages"][0].get("attributes").is_none());
}

#[tokio::test]
async fn test_publish_server_error_is_sent_once() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .respond_with(ResponseTemplate::new(503))
        .expect(1)
        .mount(&server)
        .await;

    let publisher = PubSubPublisher::with_base_url(test_api(), server.uri(), "test-project");
    let err = publisher
        .publish_json("generate_video_trigger", &json!({"index": 2}))
        .await
        .unwrap_err();
    assert!(matches!(err, GoogleError::ServerError(503, _)));
    assert_eq!(server.received_requests().await.unwrap().len(), 1);
}

#[test]
fn test_topic_path() {
    let publisher = PubSubPublisher::new(test_api(), "test-project");
    assert_eq!(
        publisher.topic_path("generate_video_trigger"),
        "projects/test-project/topics/generate_video_trigger"
    );
}
