//! Turn domain type: one entry of a conversation transcript.
//!
//! User submits a message → a `user` turn is recorded → the provider's
//! reply lands as an `assistant` turn, or a classified failure lands as an
//! `error` turn.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Who produced a turn.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    /// The end user
    User,
    /// The AI assistant
    #[serde(alias = "ai")]
    Assistant,
    /// A classified failure, rendered for the user
    Error,
}

impl Role {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::User => "user",
            Self::Assistant => "assistant",
            Self::Error => "error",
        }
    }
}

impl std::fmt::Display for Role {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A single transcript entry. Fields are read-only once constructed.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Turn {
    role: Role,
    content: String,
    #[serde(alias = "timestamp")]
    created_at: DateTime<Utc>,
}

impl Turn {
    /// Create a turn stamped with the current time.
    pub fn new(role: Role, content: impl Into<String>) -> Self {
        Self::at(role, content, Utc::now())
    }

    /// Create a turn with an explicit creation time.
    pub fn at(role: Role, content: impl Into<String>, created_at: DateTime<Utc>) -> Self {
        Self {
            role,
            content: content.into(),
            created_at,
        }
    }

    /// Create a new user turn.
    pub fn user(content: impl Into<String>) -> Self {
        Self::new(Role::User, content)
    }

    /// Create a new assistant turn.
    pub fn assistant(content: impl Into<String>) -> Self {
        Self::new(Role::Assistant, content)
    }

    /// Create a new error turn.
    pub fn error(content: impl Into<String>) -> Self {
        Self::new(Role::Error, content)
    }

    pub fn role(&self) -> Role {
        self.role
    }

    pub fn content(&self) -> &str {
        &self.content
    }

    pub fn created_at(&self) -> DateTime<Utc> {
        self.created_at
    }

    /// The first `max_chars` characters of the content, for log lines.
    pub fn preview(&self, max_chars: usize) -> String {
        self.content.chars().take(max_chars).collect()
    }

    /// Keep timestamps non-decreasing when a clock reading lags the
    /// previous turn.
    pub(crate) fn not_before(mut self, floor: DateTime<Utc>) -> Self {
        if self.created_at < floor {
            self.created_at = floor;
        }
        self
    }
}
