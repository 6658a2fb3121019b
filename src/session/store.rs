use async_trait::async_trait;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::error::Result;
use crate::pipeline::Phrase;

/// Persisted per-session payload. The store exclusively owns the stored
/// record; callers work on transient copies and write them back via
/// [`SessionStore::update`].
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SessionRecord {
    /// Opaque decoder state; `None` until the first chunk is processed.
    pub decoder_state: Option<Vec<u8>>,

    /// Phrases accumulated so far, append-only until finalize.
    pub phrases: Vec<Phrase>,

    /// Last create/update time; drives TTL expiry.
    pub last_touched_at: DateTime<Utc>,
}

impl SessionRecord {
    pub fn new() -> Self {
        Self {
            decoder_state: None,
            phrases: Vec::new(),
            last_touched_at: Utc::now(),
        }
    }
}

impl Default for SessionRecord {
    fn default() -> Self {
        Self::new()
    }
}

/// Key-value storage for session records with mandatory TTL expiry.
///
/// A session whose last touch is older than the configured timeout is
/// logically expired and behaves as not found for every operation, even
/// before it has been physically swept.
#[async_trait]
pub trait SessionStore: Send + Sync {
    /// Allocate a fresh session ID and store an empty record.
    async fn create(&self) -> Result<String>;

    /// Fetch the live record, or `AsrError::SessionNotFound` if the ID is
    /// unknown or expired.
    async fn get(&self, session_id: &str) -> Result<SessionRecord>;

    /// Replace the stored payload and refresh the expiry clock. Sessions
    /// under active use never expire mid-stream. Fails with
    /// `AsrError::SessionNotFound` if the ID is unknown or expired.
    async fn update(
        &self,
        session_id: &str,
        decoder_state: Option<Vec<u8>>,
        phrases: Vec<Phrase>,
    ) -> Result<()>;

    /// Idempotent removal; never errors when the ID is already absent.
    async fn delete(&self, session_id: &str) -> Result<()>;

    async fn exists(&self, session_id: &str) -> Result<bool>;

    /// Snapshot of live session IDs, used for bulk shutdown cleanup only.
    /// Best-effort: may be weakly consistent for remote backends.
    async fn list_ids(&self) -> Result<Vec<String>>;

    /// Remove expired records and return how many were removed. Backends
    /// with native TTL expiry are free to report 0.
    async fn sweep_expired(&self) -> Result<usize>;
}
