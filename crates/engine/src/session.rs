//! Session engine: runs one caller action against one transcript.
//!
//! ```text
//! send_message(content)
//!   → trim, reject empty / placeholder
//!   → append user turn
//!   → build prompt (prior turns + content)
//!   → adapter.generate(prompt)
//!   → append assistant turn | classified error turn
//! ```
//!
//! No action returns an error. Provider failures end up in the transcript
//! as `error` turns and a bad delete index is logged and ignored.

use std::sync::Arc;

use parley_config::AppConfig;
use parley_core::provider::{GenerationConfig, Provider};
use parley_core::transcript::Transcript;
use parley_core::turn::Turn;
use serde::{Deserialize, Serialize};
use tracing::{debug, info, warn};

use crate::adapter::{GenerationAdapter, GenerationOutcome};
use crate::classifier;
use crate::context::ContextBuilder;

/// Input shown in an empty chat box; submitting it is a no-op.
pub const DEFAULT_PLACEHOLDER: &str = "Enter Your Query...";

/// One caller action, as received over the wire.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "action", rename_all = "snake_case")]
pub enum SessionAction {
    ClearAll,
    DeleteMessage { message_index: i64 },
    SendMessage { content: String },
    ListHistory,
}

/// Orchestrates context building, generation and classification.
pub struct SessionEngine {
    adapter: GenerationAdapter,
    context: ContextBuilder,
    placeholder: String,
    retention_bound: usize,
}

impl SessionEngine {
    pub fn new(adapter: GenerationAdapter, context: ContextBuilder) -> Self {
        Self {
            adapter,
            context,
            placeholder: DEFAULT_PLACEHOLDER.to_string(),
            retention_bound: parley_core::DEFAULT_RETENTION_BOUND,
        }
    }

    /// Build an engine with every setting taken from the loaded config.
    pub fn from_config(config: &AppConfig, provider: Arc<dyn Provider>) -> Self {
        let adapter = GenerationAdapter::new(provider, config.provider.generation_config());
        Self::new(adapter, ContextBuilder::new(config.session.context_truncation))
            .with_placeholder(config.session.placeholder.clone())
            .with_retention_bound(config.session.retention_bound)
    }

    pub fn with_placeholder(mut self, placeholder: impl Into<String>) -> Self {
        self.placeholder = placeholder.into();
        self
    }

    /// Bound used for transcripts created by [`SessionEngine::new_transcript`],
    /// never below [`parley_core::MIN_RETENTION_BOUND`].
    pub fn with_retention_bound(mut self, bound: usize) -> Self {
        self.retention_bound = bound.max(parley_core::MIN_RETENTION_BOUND);
        self
    }

    /// An empty transcript for a session seen for the first time.
    pub fn new_transcript(&self) -> Transcript {
        Transcript::with_retention_bound(self.retention_bound)
    }

    pub fn generation_config(&self) -> &GenerationConfig {
        self.adapter.config()
    }

    pub fn provider_name(&self) -> &str {
        self.adapter.provider_name()
    }

    /// Dispatch a wire action.
    pub async fn handle<'a>(
        &self,
        action: SessionAction,
        transcript: &'a mut Transcript,
    ) -> &'a Transcript {
        match action {
            SessionAction::ClearAll => self.clear_all(transcript),
            SessionAction::DeleteMessage { message_index } => match usize::try_from(message_index) {
                Ok(index) => self.delete_message(transcript, index),
                Err(_) => {
                    warn!(
                        index = message_index,
                        len = transcript.len(),
                        "Invalid message index for deletion"
                    );
                    &*transcript
                }
            },
            SessionAction::SendMessage { content } => self.send_message(transcript, &content).await,
            SessionAction::ListHistory => self.list_history(transcript),
        }
    }

    /// Remove every turn. Idempotent.
    pub fn clear_all<'a>(&self, transcript: &'a mut Transcript) -> &'a Transcript {
        let removed = transcript.len();
        transcript.clear();
        info!(removed, "Chat history cleared");
        transcript
    }

    /// Remove the turn at `index`; out-of-range indices change nothing.
    pub fn delete_message<'a>(&self, transcript: &'a mut Transcript, index: usize) -> &'a Transcript {
        match transcript.delete_at(index) {
            Ok(turn) => {
                info!(
                    index,
                    role = %turn.role(),
                    preview = %turn.preview(60),
                    "Message deleted"
                );
            }
            Err(err) => {
                warn!(index, len = transcript.len(), error = %err, "Invalid message index for deletion");
            }
        }
        transcript
    }

    /// Record `content` as a user turn, then the provider's answer or a
    /// classified error turn.
    ///
    /// Empty input and the placeholder text are ignored.
    pub async fn send_message<'a>(
        &self,
        transcript: &'a mut Transcript,
        content: &str,
    ) -> &'a Transcript {
        let content = content.trim();
        if content.is_empty() || content == self.placeholder {
            debug!("Ignoring empty or placeholder message");
            return transcript;
        }

        info!(preview = %content.chars().take(50).collect::<String>(), "Message sent");

        let evicted = transcript.append(Turn::user(content));
        let prompt = self.context.build_prompt(transcript, content);

        let outcome = self.adapter.generate(prompt).await;
        info!(outcome = outcome.label(), "Generation finished");

        let reply = match outcome {
            GenerationOutcome::Success { text } => Turn::assistant(text),
            GenerationOutcome::Failure(failure) => classifier::classify(&failure),
        };
        let evicted = evicted + transcript.append(reply);
        if evicted > 0 {
            debug!(evicted, bound = transcript.retention_bound(), "Evicted oldest turns");
        }

        transcript
    }

    /// The transcript, unchanged.
    pub fn list_history<'a>(&self, transcript: &'a Transcript) -> &'a Transcript {
        transcript
    }
}
