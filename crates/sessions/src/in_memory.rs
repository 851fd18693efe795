//! In-memory session store: transcripts held as serialized JSON blobs.
//!
//! Each session keeps the JSON form of its transcript, the way a web
//! session keeps a named value. When the store is full, the session that
//! was touched least recently is dropped.

use std::collections::HashMap;
use std::sync::Arc;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use parley_core::error::SessionError;
use parley_core::session::{SessionId, SessionStore};
use parley_core::transcript::Transcript;
use tokio::sync::RwLock;
use tracing::debug;

/// Default maximum number of sessions held at once.
const DEFAULT_MAX_SESSIONS: usize = 1_000;

struct StoredSession {
    blob: String,
    touched_at: DateTime<Utc>,
}

/// A process-lifetime session store keyed by session id.
pub struct InMemorySessionStore {
    sessions: Arc<RwLock<HashMap<String, StoredSession>>>,
    max_sessions: usize,
}

impl InMemorySessionStore {
    pub fn new() -> Self {
        Self::with_capacity(DEFAULT_MAX_SESSIONS)
    }

    /// Create a store holding at most `max_sessions` sessions (minimum 1).
    pub fn with_capacity(max_sessions: usize) -> Self {
        Self {
            sessions: Arc::new(RwLock::new(HashMap::new())),
            max_sessions: max_sessions.max(1),
        }
    }
}

impl Default for InMemorySessionStore {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl SessionStore for InMemorySessionStore {
    fn name(&self) -> &str {
        "in_memory"
    }

    async fn load(&self, id: &SessionId) -> Result<Option<Transcript>, SessionError> {
        let mut sessions = self.sessions.write().await;
        let Some(stored) = sessions.get_mut(id.as_str()) else {
            return Ok(None);
        };
        stored.touched_at = Utc::now();

        serde_json::from_str(&stored.blob)
            .map(Some)
            .map_err(|e| SessionError::Corrupted {
                session_id: id.to_string(),
                reason: e.to_string(),
            })
    }

    async fn save(&self, id: &SessionId, transcript: &Transcript) -> Result<(), SessionError> {
        let blob = serde_json::to_string(transcript)
            .map_err(|e| SessionError::Storage(format!("Failed to serialize transcript: {e}")))?;

        let mut sessions = self.sessions.write().await;

        // Evict the least recently touched session if at capacity
        if sessions.len() >= self.max_sessions && !sessions.contains_key(id.as_str()) {
            if let Some(oldest_key) = sessions
                .iter()
                .min_by_key(|(_, s)| s.touched_at)
                .map(|(k, _)| k.clone())
            {
                debug!(session = %oldest_key, "Evicting least recently used session");
                sessions.remove(&oldest_key);
            }
        }

        sessions.insert(
            id.to_string(),
            StoredSession {
                blob,
                touched_at: Utc::now(),
            },
        );
        Ok(())
    }

    async fn remove(&self, id: &SessionId) -> Result<bool, SessionError> {
        Ok(self.sessions.write().await.remove(id.as_str()).is_some())
    }

    async fn count(&self) -> Result<usize, SessionError> {
        Ok(self.sessions.read().await.len())
    }
}
