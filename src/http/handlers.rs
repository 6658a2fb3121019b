use std::time::Instant;

use axum::extract::{Multipart, State};
use axum::response::{IntoResponse, Json};
use axum::Form;
use serde::{Deserialize, Serialize};
use tracing::info;

use super::state::AppState;
use crate::config::LimitsConfig;
use crate::error::{AsrError, Result};
use crate::pipeline::Phrase;

// ============================================================================
// Request/Response Types
// ============================================================================

/// Response for streaming endpoints
#[derive(Debug, Serialize)]
pub struct StreamingResponse {
    pub phrases: Vec<Phrase>,
    pub session_id: String,
    pub is_final: bool,
}

/// Response for offline recognition
#[derive(Debug, Serialize)]
pub struct TranscriptionResponse {
    pub phrases: Vec<Phrase>,
    pub full_text: String,
    /// End timestamp of the last phrase, in seconds
    pub duration: f64,
    /// Wall-clock processing time in seconds
    pub processing_time: f64,
}

#[derive(Debug, Deserialize)]
pub struct FinalizeRequest {
    pub session_id: String,
}

/// An uploaded audio file extracted from a multipart body.
struct AudioUpload {
    filename: String,
    data: Vec<u8>,
}

// ============================================================================
// Handlers
// ============================================================================

/// POST /transcribe/streaming
/// Start a streaming session; the returned session_id keys all later calls.
pub async fn start_streaming(
    State(state): State<AppState>,
) -> Result<Json<StreamingResponse>> {
    let session_id = state.controller.start_session().await?;

    Ok(Json(StreamingResponse {
        phrases: Vec::new(),
        session_id,
        is_final: false,
    }))
}

/// POST /transcribe/streaming/chunk
/// Process one audio chunk; returns only the phrases new in this call.
pub async fn process_streaming_chunk(
    State(state): State<AppState>,
    multipart: Multipart,
) -> Result<Json<StreamingResponse>> {
    let (session_id, upload) = parse_chunk_fields(multipart).await?;
    validate_upload(&upload, &state.config.limits)?;

    let phrases = state
        .controller
        .process_chunk(&session_id, &upload.data, &upload.filename)
        .await?;

    Ok(Json(StreamingResponse {
        phrases,
        session_id,
        is_final: false,
    }))
}

/// POST /transcribe/streaming/finalize
/// Flush the decoder and return the full transcript. The session is gone
/// afterwards regardless of outcome.
pub async fn finalize_streaming(
    State(state): State<AppState>,
    Form(req): Form<FinalizeRequest>,
) -> Result<Json<StreamingResponse>> {
    let phrases = state.controller.finalize_session(&req.session_id).await?;

    Ok(Json(StreamingResponse {
        phrases,
        session_id: req.session_id,
        is_final: true,
    }))
}

/// POST /transcribe
/// Offline recognition of a complete audio file.
pub async fn transcribe_audio(
    State(state): State<AppState>,
    multipart: Multipart,
) -> Result<Json<TranscriptionResponse>> {
    let started = Instant::now();

    let (upload, return_timestamps) = parse_transcribe_fields(multipart).await?;
    validate_upload(&upload, &state.config.limits)?;

    info!("Received file for offline recognition: {}", upload.filename);

    let phrases = state
        .controller
        .transcribe_offline(&upload.data, &upload.filename)
        .await?;

    let full_text = phrases
        .iter()
        .map(|p| p.text.as_str())
        .collect::<Vec<_>>()
        .join(" ");
    let duration = phrases.last().map(|p| p.end_time).unwrap_or(0.0);

    Ok(Json(TranscriptionResponse {
        phrases: if return_timestamps { phrases } else { Vec::new() },
        full_text,
        duration,
        processing_time: started.elapsed().as_secs_f64(),
    }))
}

/// GET /health
pub async fn health_check(State(state): State<AppState>) -> impl IntoResponse {
    Json(serde_json::json!({
        "status": "healthy",
        "pipeline": state.controller.pipeline_name(),
    }))
}

/// GET /
pub async fn root(State(state): State<AppState>) -> impl IntoResponse {
    Json(serde_json::json!({
        "name": state.config.service.name,
        "version": env!("CARGO_PKG_VERSION"),
        "endpoints": {
            "POST /transcribe": "Transcribe speech from audio file (offline)",
            "POST /transcribe/streaming": "Start streaming recognition",
            "POST /transcribe/streaming/chunk": "Send audio chunk for streaming",
            "POST /transcribe/streaming/finalize": "Finalize streaming",
        },
    }))
}

// ============================================================================
// Multipart parsing and validation
// ============================================================================

async fn parse_chunk_fields(mut multipart: Multipart) -> Result<(String, AudioUpload)> {
    let mut session_id = None;
    let mut upload = None;

    while let Some(field) = next_field(&mut multipart).await? {
        let name = field.name().map(|n| n.to_string());
        match name.as_deref() {
            Some("session_id") => {
                let value = field
                    .text()
                    .await
                    .map_err(|e| AsrError::InvalidRequest(format!("bad session_id field: {}", e)))?;
                session_id = Some(value);
            }
            Some("file") => upload = Some(read_file_field(field).await?),
            _ => {}
        }
    }

    let session_id = session_id
        .ok_or_else(|| AsrError::InvalidRequest("missing 'session_id' field".to_string()))?;
    let upload =
        upload.ok_or_else(|| AsrError::InvalidRequest("missing 'file' field".to_string()))?;
    Ok((session_id, upload))
}

async fn parse_transcribe_fields(mut multipart: Multipart) -> Result<(AudioUpload, bool)> {
    let mut upload = None;
    let mut return_timestamps = true;

    while let Some(field) = next_field(&mut multipart).await? {
        let name = field.name().map(|n| n.to_string());
        match name.as_deref() {
            Some("file") => upload = Some(read_file_field(field).await?),
            Some("return_timestamps") => {
                let value = field.text().await.map_err(|e| {
                    AsrError::InvalidRequest(format!("bad return_timestamps field: {}", e))
                })?;
                return_timestamps = value.trim() != "false";
            }
            _ => {}
        }
    }

    let upload =
        upload.ok_or_else(|| AsrError::InvalidRequest("missing 'file' field".to_string()))?;
    Ok((upload, return_timestamps))
}

async fn next_field(
    multipart: &mut Multipart,
) -> Result<Option<axum::extract::multipart::Field<'_>>> {
    multipart
        .next_field()
        .await
        .map_err(|e| AsrError::InvalidRequest(format!("malformed multipart body: {}", e)))
}

async fn read_file_field(field: axum::extract::multipart::Field<'_>) -> Result<AudioUpload> {
    let filename = field.file_name().unwrap_or("chunk.wav").to_string();
    let data = field
        .bytes()
        .await
        .map_err(|e| AsrError::InvalidRequest(format!("failed to read upload: {}", e)))?;

    Ok(AudioUpload {
        filename,
        data: data.to_vec(),
    })
}

/// Rejects empty and oversized uploads before any session state is touched.
fn validate_upload(upload: &AudioUpload, limits: &LimitsConfig) -> Result<()> {
    if upload.data.is_empty() {
        return Err(AsrError::EmptyAudio(upload.filename.clone()));
    }

    let limit = limits.max_file_size_bytes();
    if upload.data.len() > limit {
        return Err(AsrError::FileTooLarge {
            size: upload.data.len(),
            limit,
        });
    }

    Ok(())
}
