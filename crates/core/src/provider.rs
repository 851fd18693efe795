//! Provider trait: the abstraction over text-generation backends.
//!
//! A Provider knows how to send one prompt to a remote model and return
//! its reply. The generation settings travel with every request but are
//! fixed when the engine is constructed; callers never override them.
//!
//! Implementations: Gemini (`parley-providers`), test stubs.

use async_trait::async_trait;
use serde::{Deserialize, Serialize};

use crate::error::ProviderError;

/// Harm categories the provider filters on.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum HarmCategory {
    #[serde(rename = "HARM_CATEGORY_HARASSMENT")]
    Harassment,
    #[serde(rename = "HARM_CATEGORY_HATE_SPEECH")]
    HateSpeech,
    #[serde(rename = "HARM_CATEGORY_SEXUALLY_EXPLICIT")]
    SexuallyExplicit,
    #[serde(rename = "HARM_CATEGORY_DANGEROUS_CONTENT")]
    DangerousContent,
}

impl HarmCategory {
    pub const ALL: [HarmCategory; 4] = [
        Self::Harassment,
        Self::HateSpeech,
        Self::SexuallyExplicit,
        Self::DangerousContent,
    ];
}

/// Blocking threshold applied to a harm category.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum BlockThreshold {
    BlockNone,
    BlockOnlyHigh,
    #[default]
    BlockMediumAndAbove,
    BlockLowAndAbove,
}

/// One per-category safety threshold sent with each request.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct SafetySetting {
    pub category: HarmCategory,
    pub threshold: BlockThreshold,
}

/// Fixed generation settings for every provider call of an engine.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GenerationConfig {
    /// The model to use (e.g., "gemini-2.5-pro")
    pub model: String,

    /// Temperature (0.0 = deterministic, 2.0 = most creative)
    #[serde(default = "default_temperature")]
    pub temperature: f32,

    /// Output length cap, in provider tokens
    #[serde(default = "default_max_output_tokens")]
    pub max_output_tokens: u32,

    /// Per-category safety thresholds
    #[serde(default = "default_safety_settings")]
    pub safety_settings: Vec<SafetySetting>,
}

pub const DEFAULT_MODEL: &str = "gemini-2.5-pro";

fn default_temperature() -> f32 {
    0.7
}

fn default_max_output_tokens() -> u32 {
    3024
}

fn default_safety_settings() -> Vec<SafetySetting> {
    GenerationConfig::uniform_safety(BlockThreshold::BlockMediumAndAbove)
}

impl GenerationConfig {
    /// Default settings for the given model.
    pub fn for_model(model: impl Into<String>) -> Self {
        Self {
            model: model.into(),
            temperature: default_temperature(),
            max_output_tokens: default_max_output_tokens(),
            safety_settings: default_safety_settings(),
        }
    }

    /// Apply one threshold to all four harm categories.
    pub fn uniform_safety(threshold: BlockThreshold) -> Vec<SafetySetting> {
        HarmCategory::ALL
            .iter()
            .map(|&category| SafetySetting {
                category,
                threshold,
            })
            .collect()
    }
}

impl Default for GenerationConfig {
    fn default() -> Self {
        Self::for_model(DEFAULT_MODEL)
    }
}

/// A single generation call: the rendered prompt plus fixed settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GenerationRequest {
    pub prompt: String,
    pub config: GenerationConfig,
}

/// What a provider returned for a request that was not rejected.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ProviderReply {
    /// Reply text; `None` when the provider produced no text part.
    pub text: Option<String>,

    /// Which model actually responded (may differ from requested)
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub model: Option<String>,

    /// Provider-specific finish reason, if reported
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub finish_reason: Option<String>,
}

impl ProviderReply {
    pub fn text(text: impl Into<String>) -> Self {
        Self {
            text: Some(text.into()),
            ..Self::default()
        }
    }
}

/// The core Provider trait.
///
/// Every generation backend implements this trait. The engine calls
/// `complete()` once per submitted message without knowing which backend
/// answers. Implementations report failures through [`ProviderError`] and
/// perform no retries.
#[async_trait]
pub trait Provider: Send + Sync {
    /// A human-readable name for this provider (e.g., "gemini").
    fn name(&self) -> &str;

    /// Send a request and wait for the complete reply.
    async fn complete(
        &self,
        request: GenerationRequest,
    ) -> std::result::Result<ProviderReply, ProviderError>;
}
