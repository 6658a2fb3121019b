use std::collections::HashSet;
use std::sync::Arc;

use tokio::task;
use tracing::{debug, info, warn};

use super::store::SessionStore;
use crate::audio;
use crate::error::{AsrError, Result};
use crate::pipeline::{Phrase, Pipeline};

/// Orchestrates streaming recognition sessions.
///
/// Per session the lifecycle is Created (no decoder state) → Active (one or
/// more chunks processed) → Finalized/Deleted (terminal). The controller
/// holds only transient per-request copies of session state; the store owns
/// the persisted record.
pub struct SessionController {
    pipeline: Arc<dyn Pipeline>,
    store: Arc<dyn SessionStore>,
}

impl SessionController {
    pub fn new(pipeline: Arc<dyn Pipeline>, store: Arc<dyn SessionStore>) -> Self {
        Self { pipeline, store }
    }

    pub fn pipeline_name(&self) -> &str {
        self.pipeline.name()
    }

    /// Create a new streaming session and return its ID.
    pub async fn start_session(&self) -> Result<String> {
        let session_id = self.store.create().await?;
        info!("Created streaming session: {}", session_id);
        Ok(session_id)
    }

    /// Decode `audio_bytes`, run every resulting frame through the decoder
    /// carrying the opaque state forward, append the new phrases to the
    /// session and persist the result.
    ///
    /// Returns only the phrases produced by this call. On decoder failure
    /// the stored record is left untouched, so the chunk can be retried.
    pub async fn process_chunk(
        &self,
        session_id: &str,
        audio_bytes: &[u8],
        filename: &str,
    ) -> Result<Vec<Phrase>> {
        let samples = audio::decode_audio(audio_bytes, filename)?;
        let record = self.store.get(session_id).await?;

        let pipeline = Arc::clone(&self.pipeline);
        let initial_state = record.decoder_state.clone();

        // Decoder inference is synchronous and CPU-bound; keep it off the
        // async worker threads.
        let (new_phrases, new_state) = task::spawn_blocking(move || {
            let frames = audio::segment(&samples, pipeline.frame_size());
            debug!("Segmented chunk into {} frame(s)", frames.len());

            let mut state = initial_state;
            let mut phrases = Vec::new();
            for frame in &frames {
                let (mut frame_phrases, next_state) =
                    pipeline.step(&frame.samples, state.as_deref(), frame.is_last)?;
                phrases.append(&mut frame_phrases);
                state = Some(next_state);
            }
            Ok::<_, AsrError>((phrases, state))
        })
        .await
        .map_err(|e| AsrError::Pipeline(format!("decoder task failed: {}", e)))??;

        let mut accumulated = record.phrases;
        accumulated.extend(new_phrases.iter().cloned());

        self.store
            .update(session_id, new_state, accumulated.clone())
            .await?;

        debug!(
            "Processed chunk for session {}, got {} phrase(s) (total accumulated: {})",
            session_id,
            new_phrases.len(),
            accumulated.len()
        );

        Ok(new_phrases)
    }

    /// Flush the decoder, merge trailing phrases into the accumulated list
    /// and return the full transcript.
    ///
    /// Trailing phrases whose (start_time, end_time) pair exactly matches an
    /// already-accumulated phrase are dropped. The session is deleted
    /// unconditionally, even when the decoder call fails: retrying finalize
    /// on the same ID is not meaningful once it has been attempted.
    pub async fn finalize_session(&self, session_id: &str) -> Result<Vec<Phrase>> {
        let record = self.store.get(session_id).await?;

        let pipeline = Arc::clone(&self.pipeline);
        let state = record.decoder_state.clone();
        let outcome = task::spawn_blocking(move || pipeline.finalize(state.as_deref())).await;

        // Cleanup happens before any decoder error propagates.
        if let Err(e) = self.store.delete(session_id).await {
            warn!("Failed to delete session {}: {}", session_id, e);
        }

        let (trailing, _ignored_state) = outcome
            .map_err(|e| AsrError::Pipeline(format!("decoder task failed: {}", e)))??;

        let accumulated = record.phrases;
        let all_phrases = merge_trailing(accumulated, trailing, session_id);
        Ok(all_phrases)
    }

    /// One-shot recognition without a stored session: thread the decoder
    /// state from scratch through the whole buffer, then finalize.
    pub async fn transcribe_offline(
        &self,
        audio_bytes: &[u8],
        filename: &str,
    ) -> Result<Vec<Phrase>> {
        let samples = audio::decode_audio(audio_bytes, filename)?;
        let pipeline = Arc::clone(&self.pipeline);

        task::spawn_blocking(move || {
            let frames = audio::segment(&samples, pipeline.frame_size());

            let mut state: Option<Vec<u8>> = None;
            let mut phrases = Vec::new();
            for frame in &frames {
                let (mut frame_phrases, next_state) =
                    pipeline.step(&frame.samples, state.as_deref(), frame.is_last)?;
                phrases.append(&mut frame_phrases);
                state = Some(next_state);
            }

            let (trailing, _) = pipeline.finalize(state.as_deref())?;
            Ok(merge_trailing(phrases, trailing, "offline"))
        })
        .await
        .map_err(|e| AsrError::Pipeline(format!("decoder task failed: {}", e)))?
    }

    /// Delete every live session; called on graceful shutdown.
    pub async fn shutdown_cleanup(&self) -> usize {
        let ids = match self.store.list_ids().await {
            Ok(ids) => ids,
            Err(e) => {
                warn!("Failed to list sessions during shutdown: {}", e);
                return 0;
            }
        };

        let mut removed = 0;
        for id in ids {
            match self.store.delete(&id).await {
                Ok(()) => removed += 1,
                Err(e) => warn!("Failed to delete session {} during shutdown: {}", id, e),
            }
        }
        removed
    }
}

/// Append trailing phrases to the accumulated list, dropping trailing
/// entries that duplicate an accumulated phrase's exact timestamp pair.
fn merge_trailing(
    accumulated: Vec<Phrase>,
    trailing: Vec<Phrase>,
    session_id: &str,
) -> Vec<Phrase> {
    let seen: HashSet<(u64, u64)> = accumulated.iter().map(Phrase::timing_key).collect();

    let trailing_count = trailing.len();
    let unique_trailing: Vec<Phrase> = trailing
        .into_iter()
        .filter(|p| !seen.contains(&p.timing_key()))
        .collect();

    info!(
        "Finalized {}: {} accumulated + {} trailing ({} unique after deduplication)",
        session_id,
        accumulated.len(),
        trailing_count,
        unique_trailing.len()
    );

    let mut all_phrases = accumulated;
    all_phrases.extend(unique_trailing);
    all_phrases
}
