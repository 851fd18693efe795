//! Session storage trait: where a transcript lives between requests.
//!
//! The surrounding request layer owns session identity. A store keeps one
//! serialized transcript per session id for the lifetime of that session;
//! nothing here outlives the process.

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::error::SessionError;
use crate::transcript::Transcript;

/// Unique identifier for a user session.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct SessionId(pub String);

impl SessionId {
    pub fn new() -> Self {
        Self(Uuid::new_v4().to_string())
    }

    pub fn from(s: &str) -> Self {
        Self(s.to_string())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl Default for SessionId {
    fn default() -> Self {
        Self::new()
    }
}

impl std::fmt::Display for SessionId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Get/set of a per-session transcript blob.
#[async_trait]
pub trait SessionStore: Send + Sync {
    /// Backend name, for logs.
    fn name(&self) -> &str;

    /// Load the transcript for a session, `None` if the session has none yet.
    async fn load(&self, id: &SessionId) -> Result<Option<Transcript>, SessionError>;

    /// Replace the stored transcript for a session.
    async fn save(&self, id: &SessionId, transcript: &Transcript) -> Result<(), SessionError>;

    /// Drop a session's transcript. Returns whether anything was stored.
    async fn remove(&self, id: &SessionId) -> Result<bool, SessionError>;

    /// Number of sessions currently held.
    async fn count(&self) -> Result<usize, SessionError>;
}
