//! Error types for the Parley domain.
//!
//! Uses `thiserror` for ergonomic error definitions.
//! Each bounded context has its own error variant.

use thiserror::Error;

/// The top-level error type for all Parley operations.
#[derive(Debug, Error)]
pub enum Error {
    // --- Provider errors ---
    #[error("Provider error: {0}")]
    Provider(#[from] ProviderError),

    // --- Transcript errors ---
    #[error("Transcript error: {0}")]
    Transcript(#[from] TranscriptError),

    // --- Session storage errors ---
    #[error("Session error: {0}")]
    Session(#[from] SessionError),

    // --- Configuration errors ---
    #[error("Configuration error: {message}")]
    Config { message: String },

    // --- Serialization ---
    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    // --- Generic ---
    #[error("Internal error: {0}")]
    Internal(String),
}

/// Result type alias using our Error.
pub type Result<T> = std::result::Result<T, Error>;

// --- Bounded context errors ---

/// Failures reported by a generation provider.
///
/// These never reach the caller of the session engine: the adapter folds
/// every variant into a classified failure outcome.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum ProviderError {
    #[error("Generation stopped by safety policy: {0}")]
    SafetyStopped(String),

    #[error("Prompt blocked before generation: {0}")]
    PromptBlocked(String),

    #[error("Provider not configured: {0}")]
    NotConfigured(String),

    #[error("Invalid request: {message} (status: {status_code})")]
    InvalidRequest { status_code: u16, message: String },

    #[error("Authentication failed: {0}")]
    AuthenticationFailed(String),

    #[error("Model not found: {0}")]
    ModelNotFound(String),

    #[error("Network error: {0}")]
    Network(String),

    #[error("Request timed out: {0}")]
    Timeout(String),

    #[error("Rate limited by provider: {0}")]
    RateLimited(String),

    #[error("API request failed: {message} (status: {status_code})")]
    ApiError { status_code: u16, message: String },

    #[error("Malformed provider response: {0}")]
    MalformedResponse(String),

    #[error("{0}")]
    Other(String),
}

impl ProviderError {
    /// Short, stable name of the failure category, used when a failure is
    /// surfaced generically to the user.
    pub fn category(&self) -> &'static str {
        match self {
            Self::SafetyStopped(_) => "SafetyStopped",
            Self::PromptBlocked(_) => "PromptBlocked",
            Self::NotConfigured(_) => "NotConfigured",
            Self::InvalidRequest { .. } => "InvalidRequest",
            Self::AuthenticationFailed(_) => "AuthenticationFailed",
            Self::ModelNotFound(_) => "ModelNotFound",
            Self::Network(_) => "NetworkError",
            Self::Timeout(_) => "Timeout",
            Self::RateLimited(_) => "RateLimited",
            Self::ApiError { .. } => "ApiError",
            Self::MalformedResponse(_) => "MalformedResponse",
            Self::Other(_) => "ProviderError",
        }
    }

    /// The human-readable detail carried by the error, without the
    /// variant's prefix.
    pub fn detail(&self) -> String {
        match self {
            Self::SafetyStopped(d)
            | Self::PromptBlocked(d)
            | Self::NotConfigured(d)
            | Self::AuthenticationFailed(d)
            | Self::ModelNotFound(d)
            | Self::Network(d)
            | Self::Timeout(d)
            | Self::RateLimited(d)
            | Self::MalformedResponse(d)
            | Self::Other(d) => d.clone(),
            Self::InvalidRequest { message, .. } | Self::ApiError { message, .. } => {
                message.clone()
            }
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum TranscriptError {
    #[error("Turn index {index} out of range for transcript of length {len}")]
    OutOfRange { index: usize, len: usize },
}

#[derive(Debug, Error)]
pub enum SessionError {
    #[error("Session storage error: {0}")]
    Storage(String),

    #[error("Corrupted session blob for {session_id}: {reason}")]
    Corrupted { session_id: String, reason: String },
}
