//! Generation adapter: one provider call with fixed settings.
//!
//! The adapter is the boundary where provider errors stop. Whatever the
//! provider reports comes back as a [`GenerationOutcome`], already sorted
//! into the failure taxonomy, so the session engine only ever decides
//! which turn to append.

use std::sync::Arc;

use parley_core::error::ProviderError;
use parley_core::provider::{GenerationConfig, GenerationRequest, Provider};
use serde::{Deserialize, Serialize};
use tracing::{debug, warn};

/// Assistant text recorded when the provider answered with nothing.
pub const EMPTY_REPLY_TEXT: &str = "No response generated.";

/// The five failure kinds surfaced to the user.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum FailureKind {
    SafetyStopped,
    PromptBlocked,
    ConfigError,
    ConnectionError,
    UnexpectedError,
}

impl FailureKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::SafetyStopped => "SafetyStopped",
            Self::PromptBlocked => "PromptBlocked",
            Self::ConfigError => "ConfigError",
            Self::ConnectionError => "ConnectionError",
            Self::UnexpectedError => "UnexpectedError",
        }
    }
}

impl std::fmt::Display for FailureKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A classified provider failure with its detail text.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum GenerationFailure {
    SafetyStopped { detail: String },
    PromptBlocked { detail: String },
    Config { detail: String },
    Connection { detail: String },
    Unexpected { category: String, detail: String },
}

impl GenerationFailure {
    pub fn kind(&self) -> FailureKind {
        match self {
            Self::SafetyStopped { .. } => FailureKind::SafetyStopped,
            Self::PromptBlocked { .. } => FailureKind::PromptBlocked,
            Self::Config { .. } => FailureKind::ConfigError,
            Self::Connection { .. } => FailureKind::ConnectionError,
            Self::Unexpected { .. } => FailureKind::UnexpectedError,
        }
    }

    pub fn detail(&self) -> &str {
        match self {
            Self::SafetyStopped { detail }
            | Self::PromptBlocked { detail }
            | Self::Config { detail }
            | Self::Connection { detail }
            | Self::Unexpected { detail, .. } => detail.as_str(),
        }
    }
}

impl From<ProviderError> for GenerationFailure {
    fn from(err: ProviderError) -> Self {
        let detail = err.detail();
        match err {
            ProviderError::SafetyStopped(_) => Self::SafetyStopped { detail },
            ProviderError::PromptBlocked(_) => Self::PromptBlocked { detail },
            ProviderError::NotConfigured(_)
            | ProviderError::InvalidRequest { .. }
            | ProviderError::AuthenticationFailed(_)
            | ProviderError::ModelNotFound(_) => Self::Config { detail },
            ProviderError::Network(_) | ProviderError::Timeout(_) => Self::Connection { detail },
            ProviderError::RateLimited(_)
            | ProviderError::ApiError { .. }
            | ProviderError::MalformedResponse(_)
            | ProviderError::Other(_) => Self::Unexpected {
                category: err.category().to_string(),
                detail,
            },
        }
    }
}

/// Result of one generation call, before it becomes a turn.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum GenerationOutcome {
    Success { text: String },
    Failure(GenerationFailure),
}

impl GenerationOutcome {
    /// Outcome name for logs: `"Success"` or the failure kind.
    pub fn label(&self) -> &'static str {
        match self {
            Self::Success { .. } => "Success",
            Self::Failure(failure) => failure.kind().as_str(),
        }
    }
}

/// Calls a provider with the generation settings fixed at construction.
pub struct GenerationAdapter {
    provider: Arc<dyn Provider>,
    config: GenerationConfig,
}

impl GenerationAdapter {
    pub fn new(provider: Arc<dyn Provider>, config: GenerationConfig) -> Self {
        Self { provider, config }
    }

    pub fn config(&self) -> &GenerationConfig {
        &self.config
    }

    pub fn provider_name(&self) -> &str {
        self.provider.name()
    }

    /// Send `prompt` once and fold the result into an outcome.
    pub async fn generate(&self, prompt: String) -> GenerationOutcome {
        let request = GenerationRequest {
            prompt,
            config: self.config.clone(),
        };

        debug!(
            provider = self.provider.name(),
            model = %self.config.model,
            prompt_chars = request.prompt.chars().count(),
            "Calling generation provider"
        );

        match self.provider.complete(request).await {
            Ok(reply) => {
                let text = reply
                    .text
                    .as_deref()
                    .map(str::trim)
                    .filter(|t| !t.is_empty())
                    .unwrap_or(EMPTY_REPLY_TEXT)
                    .to_string();
                GenerationOutcome::Success { text }
            }
            Err(err) => {
                warn!(
                    provider = self.provider.name(),
                    category = err.category(),
                    error = %err,
                    "Generation failed"
                );
                GenerationOutcome::Failure(err.into())
            }
        }
    }
}
