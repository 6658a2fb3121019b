use async_trait::async_trait;
use base64::Engine;
use chrono::{DateTime, Utc};
use redis::aio::ConnectionManager;
use redis::AsyncCommands;
use serde::{Deserialize, Serialize};
use tracing::{info, warn};

use super::store::{SessionRecord, SessionStore};
use crate::error::{AsrError, Result};
use crate::pipeline::Phrase;

/// Wire form of a session record: JSON with the opaque decoder state
/// base64-encoded.
#[derive(Debug, Serialize, Deserialize)]
struct StoredSession {
    decoder_state: Option<String>,
    phrases: Vec<Phrase>,
    last_touched_at: DateTime<Utc>,
}

impl StoredSession {
    fn from_record(record: &SessionRecord) -> Self {
        Self {
            decoder_state: record
                .decoder_state
                .as_deref()
                .map(|s| base64::engine::general_purpose::STANDARD.encode(s)),
            phrases: record.phrases.clone(),
            last_touched_at: record.last_touched_at,
        }
    }

    fn into_record(self) -> Result<SessionRecord> {
        let decoder_state = self
            .decoder_state
            .map(|s| base64::engine::general_purpose::STANDARD.decode(s))
            .transpose()
            .map_err(|e| AsrError::Storage(format!("corrupt decoder state: {}", e)))?;

        Ok(SessionRecord {
            decoder_state,
            phrases: self.phrases,
            last_touched_at: self.last_touched_at,
        })
    }
}

/// Redis-backed session store for multi-process deployments.
///
/// Each record lives under a prefixed key with TTL equal to the session
/// timeout; expiry is delegated entirely to Redis. Updates preserve the
/// remaining TTL so an actively used session keeps its renewal semantics
/// from `update` alone.
pub struct RedisStore {
    manager: ConnectionManager,
    key_prefix: String,
    timeout_seconds: u64,
}

impl RedisStore {
    /// Connect and verify the backend with a PING.
    pub async fn connect(url: &str, key_prefix: &str, timeout_seconds: u64) -> Result<Self> {
        let client = redis::Client::open(url)
            .map_err(|e| AsrError::Storage(format!("invalid Redis URL: {}", e)))?;

        let mut manager = client
            .get_connection_manager()
            .await
            .map_err(|e| AsrError::Storage(format!("failed to connect to Redis: {}", e)))?;

        let _: String = redis::cmd("PING")
            .query_async(&mut manager)
            .await
            .map_err(|e| AsrError::Storage(format!("Redis ping failed: {}", e)))?;

        info!("Connected to Redis at {}", url);

        Ok(Self {
            manager,
            key_prefix: key_prefix.to_string(),
            timeout_seconds,
        })
    }

    fn make_key(&self, session_id: &str) -> String {
        format!("{}{}", self.key_prefix, session_id)
    }

    fn encode(record: &SessionRecord) -> Result<Vec<u8>> {
        serde_json::to_vec(&StoredSession::from_record(record))
            .map_err(|e| AsrError::Storage(format!("failed to serialize session: {}", e)))
    }

    async fn write(&self, key: &str, record: &SessionRecord, ttl_seconds: u64) -> Result<()> {
        let payload = Self::encode(record)?;
        let mut conn = self.manager.clone();
        let _: () = conn
            .set_ex(key, payload, ttl_seconds)
            .await
            .map_err(|e| AsrError::Storage(format!("Redis write failed: {}", e)))?;
        Ok(())
    }
}

#[async_trait]
impl SessionStore for RedisStore {
    async fn create(&self) -> Result<String> {
        let session_id = uuid::Uuid::new_v4().to_string();
        let key = self.make_key(&session_id);
        self.write(&key, &SessionRecord::new(), self.timeout_seconds)
            .await?;
        Ok(session_id)
    }

    async fn get(&self, session_id: &str) -> Result<SessionRecord> {
        let key = self.make_key(session_id);
        let mut conn = self.manager.clone();

        let data: Option<Vec<u8>> = conn
            .get(&key)
            .await
            .map_err(|e| AsrError::Storage(format!("Redis read failed: {}", e)))?;

        let data = data.ok_or_else(|| AsrError::SessionNotFound(session_id.to_string()))?;

        match serde_json::from_slice::<StoredSession>(&data) {
            Ok(stored) => stored.into_record(),
            Err(e) => {
                // An unreadable record is indistinguishable from a missing one
                // for the caller; log and surface not-found.
                warn!("Discarding corrupt session record {}: {}", session_id, e);
                Err(AsrError::SessionNotFound(session_id.to_string()))
            }
        }
    }

    async fn update(
        &self,
        session_id: &str,
        decoder_state: Option<Vec<u8>>,
        phrases: Vec<Phrase>,
    ) -> Result<()> {
        let key = self.make_key(session_id);
        let mut conn = self.manager.clone();

        let exists: bool = conn
            .exists(&key)
            .await
            .map_err(|e| AsrError::Storage(format!("Redis read failed: {}", e)))?;
        if !exists {
            return Err(AsrError::SessionNotFound(session_id.to_string()));
        }

        let record = SessionRecord {
            decoder_state,
            phrases,
            last_touched_at: Utc::now(),
        };

        // Preserve the remaining TTL if the key still carries one; a key seen
        // by the exists check but already past its TTL gets the full timeout
        // again rather than living forever.
        let ttl: i64 = conn
            .ttl(&key)
            .await
            .map_err(|e| AsrError::Storage(format!("Redis read failed: {}", e)))?;

        let ttl_seconds = if ttl > 0 {
            ttl as u64
        } else {
            self.timeout_seconds
        };
        self.write(&key, &record, ttl_seconds).await
    }

    async fn delete(&self, session_id: &str) -> Result<()> {
        let key = self.make_key(session_id);
        let mut conn = self.manager.clone();

        // Deletion is best effort: the key may already be gone via TTL.
        if let Err(e) = conn.del::<_, ()>(&key).await {
            warn!("Redis delete failed for session {}: {}", session_id, e);
        }
        Ok(())
    }

    async fn exists(&self, session_id: &str) -> Result<bool> {
        let key = self.make_key(session_id);
        let mut conn = self.manager.clone();
        conn.exists(&key)
            .await
            .map_err(|e| AsrError::Storage(format!("Redis read failed: {}", e)))
    }

    async fn list_ids(&self) -> Result<Vec<String>> {
        let mut conn = self.manager.clone();
        let pattern = format!("{}*", self.key_prefix);

        let keys: Vec<String> = conn
            .keys(&pattern)
            .await
            .map_err(|e| AsrError::Storage(format!("Redis scan failed: {}", e)))?;

        Ok(keys
            .into_iter()
            .filter_map(|key| {
                key.strip_prefix(&self.key_prefix)
                    .map(|id| id.to_string())
            })
            .collect())
    }

    async fn sweep_expired(&self) -> Result<usize> {
        // Redis expires keys natively via TTL; nothing to do here.
        Ok(0)
    }
}
