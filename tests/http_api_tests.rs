// Tests for the HTTP surface
//
// Drives the router directly with tower's oneshot, using the stub decoder
// and in-memory storage: status codes, response shapes and the API key
// check, without binding a socket.

use std::io::Cursor;
use std::sync::Arc;
use std::time::Duration;

use anyhow::Result;
use asr_api::config::{
    AuthConfig, Config, LimitsConfig, PipelineConfig, ServiceConfig, StorageConfig,
};
use asr_api::{create_router, AppState, MemoryStore, SessionController, StubPipeline};
use axum::body::Body;
use axum::http::{Request, StatusCode};
use axum::Router;
use tower::ServiceExt;

fn test_config(api_key: Option<String>) -> Config {
    Config {
        service: ServiceConfig {
            name: "asr-api-test".to_string(),
            host: "127.0.0.1".to_string(),
            port: 0,
        },
        limits: LimitsConfig {
            max_file_size_mb: 1,
            session_timeout_seconds: 60,
        },
        storage: StorageConfig::default(),
        pipeline: PipelineConfig::default(),
        auth: AuthConfig { api_key },
    }
}

fn test_app(api_key: Option<String>) -> Router {
    let controller = Arc::new(SessionController::new(
        Arc::new(StubPipeline::new()),
        Arc::new(MemoryStore::new(Duration::from_secs(60))),
    ));
    let state = AppState::new(controller, Arc::new(test_config(api_key)));
    create_router(state)
}

/// Mono 8kHz 16-bit WAV with `n` samples.
fn wav_bytes(n: usize) -> Vec<u8> {
    let spec = hound::WavSpec {
        channels: 1,
        sample_rate: 8000,
        bits_per_sample: 16,
        sample_format: hound::SampleFormat::Int,
    };
    let mut cursor = Cursor::new(Vec::new());
    {
        let mut writer = hound::WavWriter::new(&mut cursor, spec).unwrap();
        for _ in 0..n {
            writer.write_sample(0i16).unwrap();
        }
        writer.finalize().unwrap();
    }
    cursor.into_inner()
}

const BOUNDARY: &str = "test-boundary";

fn multipart_chunk_body(session_id: &str, file: &[u8]) -> Vec<u8> {
    let mut body = Vec::new();
    body.extend_from_slice(
        format!(
            "--{b}\r\nContent-Disposition: form-data; name=\"session_id\"\r\n\r\n{id}\r\n",
            b = BOUNDARY,
            id = session_id
        )
        .as_bytes(),
    );
    body.extend_from_slice(
        format!(
            "--{b}\r\nContent-Disposition: form-data; name=\"file\"; filename=\"chunk.wav\"\r\n\
             Content-Type: audio/wav\r\n\r\n",
            b = BOUNDARY
        )
        .as_bytes(),
    );
    body.extend_from_slice(file);
    body.extend_from_slice(format!("\r\n--{b}--\r\n", b = BOUNDARY).as_bytes());
    body
}

async fn json_body(response: axum::response::Response) -> Result<serde_json::Value> {
    let bytes = axum::body::to_bytes(response.into_body(), usize::MAX).await?;
    Ok(serde_json::from_slice(&bytes)?)
}

async fn start_session(app: &Router) -> Result<String> {
    let response = app
        .clone()
        .oneshot(
            Request::builder()
                .method("POST")
                .uri("/transcribe/streaming")
                .body(Body::empty())?,
        )
        .await?;
    assert_eq!(response.status(), StatusCode::OK);

    let body = json_body(response).await?;
    assert_eq!(body["is_final"], false);
    Ok(body["session_id"].as_str().unwrap().to_string())
}

async fn post_chunk(app: &Router, session_id: &str, file: &[u8]) -> Result<axum::response::Response> {
    let response = app
        .clone()
        .oneshot(
            Request::builder()
                .method("POST")
                .uri("/transcribe/streaming/chunk")
                .header(
                    "content-type",
                    format!("multipart/form-data; boundary={}", BOUNDARY),
                )
                .body(Body::from(multipart_chunk_body(session_id, file)))?,
        )
        .await?;
    Ok(response)
}

#[tokio::test]
async fn test_health_endpoint() -> Result<()> {
    let app = test_app(None);

    let response = app
        .oneshot(Request::builder().uri("/health").body(Body::empty())?)
        .await?;
    assert_eq!(response.status(), StatusCode::OK);

    let body = json_body(response).await?;
    assert_eq!(body["status"], "healthy");
    assert_eq!(body["pipeline"], "stub");

    Ok(())
}

#[tokio::test]
async fn test_root_reports_endpoints() -> Result<()> {
    let app = test_app(None);

    let response = app
        .oneshot(Request::builder().uri("/").body(Body::empty())?)
        .await?;
    assert_eq!(response.status(), StatusCode::OK);

    let body = json_body(response).await?;
    assert_eq!(body["name"], "asr-api-test");
    assert!(body["endpoints"].is_object());

    Ok(())
}

#[tokio::test]
async fn test_chunk_with_unknown_session_returns_404() -> Result<()> {
    let app = test_app(None);

    let response = post_chunk(&app, "no-such-session", &wav_bytes(100)).await?;
    assert_eq!(response.status(), StatusCode::NOT_FOUND);

    Ok(())
}

#[tokio::test]
async fn test_empty_upload_returns_400() -> Result<()> {
    let app = test_app(None);
    let session_id = start_session(&app).await?;

    let response = post_chunk(&app, &session_id, &[]).await?;
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);

    Ok(())
}

#[tokio::test]
async fn test_streaming_flow_over_http() -> Result<()> {
    let app = test_app(None);
    let session_id = start_session(&app).await?;

    let response = post_chunk(&app, &session_id, &wav_bytes(1000)).await?;
    assert_eq!(response.status(), StatusCode::OK);
    let body = json_body(response).await?;
    assert_eq!(body["session_id"], session_id.as_str());
    assert_eq!(body["is_final"], false);

    let response = app
        .clone()
        .oneshot(
            Request::builder()
                .method("POST")
                .uri("/transcribe/streaming/finalize")
                .header("content-type", "application/x-www-form-urlencoded")
                .body(Body::from(format!("session_id={}", session_id)))?,
        )
        .await?;
    assert_eq!(response.status(), StatusCode::OK);
    let body = json_body(response).await?;
    assert_eq!(body["is_final"], true);

    // The session is gone after finalize
    let response = post_chunk(&app, &session_id, &wav_bytes(100)).await?;
    assert_eq!(response.status(), StatusCode::NOT_FOUND);

    Ok(())
}

#[tokio::test]
async fn test_api_key_is_enforced_on_protected_routes() -> Result<()> {
    let app = test_app(Some("secret".to_string()));

    // Health stays public
    let response = app
        .clone()
        .oneshot(Request::builder().uri("/health").body(Body::empty())?)
        .await?;
    assert_eq!(response.status(), StatusCode::OK);

    // Missing key
    let response = app
        .clone()
        .oneshot(
            Request::builder()
                .method("POST")
                .uri("/transcribe/streaming")
                .body(Body::empty())?,
        )
        .await?;
    assert_eq!(response.status(), StatusCode::UNAUTHORIZED);

    // Correct key
    let response = app
        .clone()
        .oneshot(
            Request::builder()
                .method("POST")
                .uri("/transcribe/streaming")
                .header("x-api-key", "secret")
                .body(Body::empty())?,
        )
        .await?;
    assert_eq!(response.status(), StatusCode::OK);

    Ok(())
}
