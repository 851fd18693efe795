//! Google Gemini provider implementation.
//!
//! Uses the Generative Language REST API directly:
//!
//! - `POST {base}/v1beta/models/{model}:generateContent`
//! - `x-goog-api-key` header authentication
//! - camelCase JSON bodies with `generationConfig` and `safetySettings`
//!
//! Safety outcomes are reported inside a 200 response: a prompt rejected
//! up front carries `promptFeedback.blockReason`, and a reply cut off by a
//! filter carries a safety `finishReason` on its candidate. Both are
//! surfaced as typed [`ProviderError`] variants.

use std::time::Duration;

use async_trait::async_trait;
use parley_core::error::ProviderError;
use parley_core::provider::*;
use serde::{Deserialize, Serialize};
use tracing::{debug, warn};

const DEFAULT_BASE_URL: &str = "https://generativelanguage.googleapis.com";
const API_VERSION: &str = "v1beta";

/// Finish reasons that mean a safety filter halted generation.
const SAFETY_FINISH_REASONS: &[&str] = &[
    "SAFETY",
    "RECITATION",
    "BLOCKLIST",
    "PROHIBITED_CONTENT",
    "SPII",
];

/// Gemini `generateContent` provider.
pub struct GeminiProvider {
    name: String,
    base_url: String,
    api_key: Option<String>,
    client: reqwest::Client,
}

impl GeminiProvider {
    /// Create a new Gemini provider with the given request timeout.
    pub fn new(api_key: Option<String>, timeout: Duration) -> Result<Self, ProviderError> {
        let client = reqwest::Client::builder()
            .timeout(timeout)
            .build()
            .map_err(|e| ProviderError::NotConfigured(format!("Failed to create HTTP client: {e}")))?;

        Ok(Self {
            name: "gemini".into(),
            base_url: DEFAULT_BASE_URL.into(),
            api_key,
            client,
        })
    }

    /// Create with a custom base URL (e.g., for testing or proxies).
    pub fn with_base_url(mut self, base_url: impl Into<String>) -> Self {
        self.base_url = base_url.into().trim_end_matches('/').to_string();
        self
    }

    fn endpoint(&self, model: &str) -> String {
        format!(
            "{}/{}/models/{}:generateContent",
            self.base_url, API_VERSION, model
        )
    }

    /// Client-side checks that would otherwise be rejected by the API.
    fn check_request(&self, request: &GenerationRequest) -> Result<&str, ProviderError> {
        let api_key = self
            .api_key
            .as_deref()
            .map(str::trim)
            .filter(|k| !k.is_empty())
            .ok_or_else(|| {
                ProviderError::NotConfigured(
                    "no API key set (configure api_key or GOOGLE_API_KEY)".into(),
                )
            })?;

        if request.config.model.trim().is_empty() {
            return Err(ProviderError::NotConfigured("model name is empty".into()));
        }

        if !(0.0..=2.0).contains(&request.config.temperature) {
            return Err(ProviderError::NotConfigured(format!(
                "temperature {} is outside 0.0..=2.0",
                request.config.temperature
            )));
        }

        Ok(api_key)
    }

    fn to_api_request(request: &GenerationRequest) -> GeminiRequest<'_> {
        GeminiRequest {
            contents: vec![GeminiContent {
                role: "user",
                parts: vec![GeminiPart {
                    text: &request.prompt,
                }],
            }],
            generation_config: GeminiGenerationConfig {
                temperature: request.config.temperature,
                max_output_tokens: request.config.max_output_tokens,
            },
            safety_settings: &request.config.safety_settings,
        }
    }

    /// Map a failed send to the matching error kind.
    ///
    /// Anything that went wrong on the wire after the request was built is a
    /// network failure: refused, reset or closed connections all land here.
    fn transport_error(e: reqwest::Error) -> ProviderError {
        if e.is_timeout() {
            ProviderError::Timeout(e.to_string())
        } else if e.is_builder() {
            ProviderError::NotConfigured(e.to_string())
        } else if e.is_connect() || e.is_request() || e.is_body() || has_io_source(&e) {
            ProviderError::Network(e.to_string())
        } else {
            ProviderError::Other(e.to_string())
        }
    }

    /// Map a failure while reading the success body.
    ///
    /// A body that arrived whole but is not a Gemini response is malformed;
    /// a body cut off in transit is a network failure.
    fn body_error(e: reqwest::Error) -> ProviderError {
        if e.is_timeout() {
            return ProviderError::Timeout(e.to_string());
        }
        if e.is_decode() && has_source::<serde_json::Error>(&e) {
            return ProviderError::MalformedResponse(format!(
                "Failed to parse Gemini response: {e}"
            ));
        }
        if e.is_body() || e.is_decode() {
            return ProviderError::Network(e.to_string());
        }
        Self::transport_error(e)
    }

    /// Map a non-success HTTP status to the matching error kind.
    fn status_error(status: u16, body: &str) -> ProviderError {
        let message = serde_json::from_str::<GeminiErrorResponse>(body)
            .map(|r| r.error.message)
            .unwrap_or_else(|_| body.trim().to_string());
        let message = if message.trim().is_empty() {
            format!("HTTP {status}")
        } else {
            message
        };

        match status {
            400 => ProviderError::InvalidRequest {
                status_code: status,
                message,
            },
            401 | 403 => ProviderError::AuthenticationFailed(message),
            404 => ProviderError::ModelNotFound(message),
            429 => ProviderError::RateLimited(message),
            _ => ProviderError::ApiError {
                status_code: status,
                message,
            },
        }
    }

    /// Convert a parsed Gemini response into a reply or a safety failure.
    fn response_to_reply(resp: GeminiResponse) -> Result<ProviderReply, ProviderError> {
        if let Some(reason) = resp
            .prompt_feedback
            .as_ref()
            .and_then(|f| f.block_reason.as_deref())
        {
            return Err(ProviderError::PromptBlocked(reason.to_string()));
        }

        let Some(candidate) = resp.candidates.into_iter().next() else {
            return Ok(ProviderReply {
                text: None,
                model: resp.model_version,
                finish_reason: None,
            });
        };

        if let Some(reason) = candidate.finish_reason.as_deref() {
            if SAFETY_FINISH_REASONS.contains(&reason) {
                return Err(ProviderError::SafetyStopped(reason.to_string()));
            }
            if reason != "STOP" {
                warn!(finish_reason = reason, "Gemini generation finished early");
            }
        }

        let text: String = candidate
            .content
            .map(|c| {
                c.parts
                    .into_iter()
                    .filter_map(|p| p.text)
                    .collect::<Vec<_>>()
                    .join("")
            })
            .unwrap_or_default();

        Ok(ProviderReply {
            text: (!text.is_empty()).then_some(text),
            model: resp.model_version,
            finish_reason: candidate.finish_reason,
        })
    }
}

#[async_trait]
impl parley_core::Provider for GeminiProvider {
    fn name(&self) -> &str {
        &self.name
    }

    async fn complete(
        &self,
        request: GenerationRequest,
    ) -> std::result::Result<ProviderReply, ProviderError> {
        let api_key = self.check_request(&request)?;
        let url = self.endpoint(&request.config.model);
        let body = Self::to_api_request(&request);

        debug!(provider = "gemini", model = %request.config.model, prompt_len = request.prompt.len(), "Sending generation request");

        let response = self
            .client
            .post(&url)
            .header("x-goog-api-key", api_key)
            .header("Content-Type", "application/json")
            .json(&body)
            .send()
            .await
            .map_err(Self::transport_error)?;

        let status = response.status().as_u16();
        if !response.status().is_success() {
            let error_body = response.text().await.unwrap_or_default();
            warn!(status, body = %error_body, "Gemini API error");
            return Err(Self::status_error(status, &error_body));
        }

        let api_resp: GeminiResponse = response.json().await.map_err(Self::body_error)?;

        if let Some(usage) = &api_resp.usage_metadata {
            debug!(
                prompt_tokens = usage.prompt_token_count,
                reply_tokens = usage.candidates_token_count,
                "Gemini token usage"
            );
        }

        Self::response_to_reply(api_resp)
    }
}

fn has_source<E: std::error::Error + 'static>(e: &reqwest::Error) -> bool {
    let mut source = std::error::Error::source(e);
    while let Some(err) = source {
        if err.is::<E>() {
            return true;
        }
        source = err.source();
    }
    false
}

fn has_io_source(e: &reqwest::Error) -> bool {
    has_source::<std::io::Error>(e)
}

// --- Gemini API types ---

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct GeminiRequest<'a> {
    contents: Vec<GeminiContent<'a>>,
    generation_config: GeminiGenerationConfig,
    safety_settings: &'a [SafetySetting],
}

#[derive(Debug, Serialize)]
struct GeminiContent<'a> {
    role: &'static str,
    parts: Vec<GeminiPart<'a>>,
}

#[derive(Debug, Serialize)]
struct GeminiPart<'a> {
    text: &'a str,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct GeminiGenerationConfig {
    temperature: f32,
    max_output_tokens: u32,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct GeminiResponse {
    #[serde(default)]
    candidates: Vec<GeminiCandidate>,
    #[serde(default)]
    prompt_feedback: Option<GeminiPromptFeedback>,
    #[serde(default)]
    usage_metadata: Option<GeminiUsage>,
    #[serde(default)]
    model_version: Option<String>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct GeminiCandidate {
    #[serde(default)]
    content: Option<GeminiResponseContent>,
    #[serde(default)]
    finish_reason: Option<String>,
}

#[derive(Debug, Deserialize)]
struct GeminiResponseContent {
    #[serde(default)]
    parts: Vec<GeminiResponsePart>,
}

#[derive(Debug, Deserialize)]
struct GeminiResponsePart {
    #[serde(default)]
    text: Option<String>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct GeminiPromptFeedback {
    #[serde(default)]
    block_reason: Option<String>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct GeminiUsage {
    #[serde(default)]
    prompt_token_count: u32,
    #[serde(default)]
    candidates_token_count: u32,
}

#[derive(Debug, Deserialize)]
struct GeminiErrorResponse {
    error: GeminiErrorBody,
}

#[derive(Debug, Deserialize)]
struct GeminiErrorBody {
    message: String,
}
