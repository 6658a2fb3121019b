use std::collections::HashMap;
use std::time::Duration;

use async_trait::async_trait;
use chrono::Utc;
use tokio::sync::Mutex;
use tracing::debug;

use super::store::{SessionRecord, SessionStore};
use crate::error::{AsrError, Result};
use crate::pipeline::Phrase;

/// In-process session store.
///
/// One coarse lock guards the whole map: sessions are not expected to be
/// contended, so correctness wins over throughput. Expiry is lazy: stale
/// records are swept on `create` and `get` rather than by a background
/// timer, and `get` always re-validates the record's age before returning.
pub struct MemoryStore {
    sessions: Mutex<HashMap<String, SessionRecord>>,
    timeout: chrono::Duration,
}

impl MemoryStore {
    pub fn new(timeout: Duration) -> Self {
        let timeout = chrono::Duration::from_std(timeout).unwrap_or(chrono::Duration::MAX);
        Self {
            sessions: Mutex::new(HashMap::new()),
            timeout,
        }
    }

    fn is_expired(&self, record: &SessionRecord) -> bool {
        Utc::now().signed_duration_since(record.last_touched_at) > self.timeout
    }

    fn sweep_locked(&self, sessions: &mut HashMap<String, SessionRecord>) -> usize {
        let before = sessions.len();
        sessions.retain(|_, record| {
            Utc::now().signed_duration_since(record.last_touched_at) <= self.timeout
        });
        before - sessions.len()
    }
}

#[async_trait]
impl SessionStore for MemoryStore {
    async fn create(&self) -> Result<String> {
        let session_id = uuid::Uuid::new_v4().to_string();
        let mut sessions = self.sessions.lock().await;
        self.sweep_locked(&mut sessions);
        sessions.insert(session_id.clone(), SessionRecord::new());
        Ok(session_id)
    }

    async fn get(&self, session_id: &str) -> Result<SessionRecord> {
        let mut sessions = self.sessions.lock().await;
        let swept = self.sweep_locked(&mut sessions);
        if swept > 0 {
            debug!("Swept {} expired session(s)", swept);
        }

        match sessions.get(session_id) {
            Some(record) if !self.is_expired(record) => Ok(record.clone()),
            _ => Err(AsrError::SessionNotFound(session_id.to_string())),
        }
    }

    async fn update(
        &self,
        session_id: &str,
        decoder_state: Option<Vec<u8>>,
        phrases: Vec<Phrase>,
    ) -> Result<()> {
        let mut sessions = self.sessions.lock().await;

        let expired = sessions
            .get(session_id)
            .map(|record| self.is_expired(record));
        match expired {
            Some(false) => {}
            Some(true) => {
                sessions.remove(session_id);
                return Err(AsrError::SessionNotFound(session_id.to_string()));
            }
            None => return Err(AsrError::SessionNotFound(session_id.to_string())),
        }

        sessions.insert(
            session_id.to_string(),
            SessionRecord {
                decoder_state,
                phrases,
                last_touched_at: Utc::now(),
            },
        );
        Ok(())
    }

    async fn delete(&self, session_id: &str) -> Result<()> {
        let mut sessions = self.sessions.lock().await;
        sessions.remove(session_id);
        Ok(())
    }

    async fn exists(&self, session_id: &str) -> Result<bool> {
        let sessions = self.sessions.lock().await;
        Ok(sessions
            .get(session_id)
            .is_some_and(|record| !self.is_expired(record)))
    }

    async fn list_ids(&self) -> Result<Vec<String>> {
        let sessions = self.sessions.lock().await;
        Ok(sessions
            .iter()
            .filter(|(_, record)| !self.is_expired(record))
            .map(|(id, _)| id.clone())
            .collect())
    }

    async fn sweep_expired(&self) -> Result<usize> {
        let mut sessions = self.sessions.lock().await;
        Ok(self.sweep_locked(&mut sessions))
    }
}
