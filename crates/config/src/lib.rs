//! Configuration loading, validation, and management for Parley.
//!
//! Loads configuration from `~/.parley/config.toml` with environment
//! variable overrides. Validates all settings at startup.

use parley_core::provider::{BlockThreshold, DEFAULT_MODEL, GenerationConfig};
use parley_core::transcript::DEFAULT_RETENTION_BOUND;
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

/// The root configuration structure.
///
/// Maps directly to `~/.parley/config.toml`.
#[derive(Clone, Serialize, Deserialize)]
pub struct AppConfig {
    /// Generation provider API key
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub api_key: Option<String>,

    /// Generation provider settings
    #[serde(default)]
    pub provider: ProviderSettings,

    /// Transcript and context settings
    #[serde(default)]
    pub session: SessionConfig,

    /// Gateway configuration
    #[serde(default)]
    pub gateway: GatewayConfig,
}

/// Redact a secret string for Debug output.
fn redact(s: &Option<String>) -> &'static str {
    match s {
        Some(_) => "[REDACTED]",
        None => "None",
    }
}

impl std::fmt::Debug for AppConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("AppConfig")
            .field("api_key", &redact(&self.api_key))
            .field("provider", &self.provider)
            .field("session", &self.session)
            .field("gateway", &self.gateway)
            .finish()
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ProviderSettings {
    #[serde(default = "default_model")]
    pub model: String,

    /// Override the provider endpoint (proxies, tests)
    #[serde(default = "default_base_url")]
    pub base_url: String,

    #[serde(default = "default_temperature")]
    pub temperature: f32,

    #[serde(default = "default_max_output_tokens")]
    pub max_output_tokens: u32,

    /// Threshold applied to every harm category
    #[serde(default)]
    pub safety_threshold: BlockThreshold,

    #[serde(default = "default_request_timeout_secs")]
    pub request_timeout_secs: u64,
}

fn default_model() -> String {
    DEFAULT_MODEL.into()
}
fn default_base_url() -> String {
    "https://generativelanguage.googleapis.com".into()
}
fn default_temperature() -> f32 {
    0.7
}
fn default_max_output_tokens() -> u32 {
    3024
}
fn default_request_timeout_secs() -> u64 {
    120
}

impl Default for ProviderSettings {
    fn default() -> Self {
        Self {
            model: default_model(),
            base_url: default_base_url(),
            temperature: default_temperature(),
            max_output_tokens: default_max_output_tokens(),
            safety_threshold: BlockThreshold::default(),
            request_timeout_secs: default_request_timeout_secs(),
        }
    }
}

impl ProviderSettings {
    /// The fixed per-call generation settings derived from this section.
    pub fn generation_config(&self) -> GenerationConfig {
        GenerationConfig {
            model: self.model.clone(),
            temperature: self.temperature,
            max_output_tokens: self.max_output_tokens,
            safety_settings: GenerationConfig::uniform_safety(self.safety_threshold),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SessionConfig {
    /// Maximum turns kept per transcript
    #[serde(default = "default_retention_bound")]
    pub retention_bound: usize,

    /// Characters of each prior turn rendered into the prompt context
    #[serde(default = "default_context_truncation")]
    pub context_truncation: usize,

    /// Input text treated as "nothing entered"
    #[serde(default = "default_placeholder")]
    pub placeholder: String,

    /// Sessions kept in memory before the least recently used is dropped
    #[serde(default = "default_max_sessions")]
    pub max_sessions: usize,
}

fn default_retention_bound() -> usize {
    DEFAULT_RETENTION_BOUND
}
fn default_context_truncation() -> usize {
    150
}
fn default_placeholder() -> String {
    "Enter Your Query...".into()
}
fn default_max_sessions() -> usize {
    1_000
}

impl Default for SessionConfig {
    fn default() -> Self {
        Self {
            retention_bound: default_retention_bound(),
            context_truncation: default_context_truncation(),
            placeholder: default_placeholder(),
            max_sessions: default_max_sessions(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GatewayConfig {
    #[serde(default = "default_port")]
    pub port: u16,

    #[serde(default = "default_host")]
    pub host: String,
}

fn default_port() -> u16 {
    8000
}
fn default_host() -> String {
    "127.0.0.1".into()
}

impl Default for GatewayConfig {
    fn default() -> Self {
        Self {
            port: default_port(),
            host: default_host(),
        }
    }
}

impl AppConfig {
    /// Load configuration from the default path (~/.parley/config.toml).
    ///
    /// Also checks environment variables for the API key:
    /// - `PARLEY_API_KEY` (highest priority)
    /// - `GOOGLE_API_KEY`
    /// - `GEMINI_API_KEY`
    pub fn load() -> Result<Self, ConfigError> {
        let config_path = Self::config_path();
        let mut config = Self::load_from(&config_path)?;
        config.apply_env(|name| std::env::var(name).ok());
        config.validate()?;
        Ok(config)
    }

    /// Load configuration from a specific file path.
    pub fn load_from(path: &Path) -> Result<Self, ConfigError> {
        if !path.exists() {
            tracing::info!("No config file found at {}, using defaults", path.display());
            return Ok(Self::default());
        }

        let content = std::fs::read_to_string(path).map_err(|e| ConfigError::ReadError {
            path: path.to_path_buf(),
            reason: e.to_string(),
        })?;

        let config: Self = toml::from_str(&content).map_err(|e| ConfigError::ParseError {
            path: path.to_path_buf(),
            reason: e.to_string(),
        })?;

        config.validate()?;
        Ok(config)
    }

    /// Apply environment overrides through `lookup`.
    fn apply_env(&mut self, lookup: impl Fn(&str) -> Option<String>) {
        if self.api_key.is_none() {
            self.api_key = ["PARLEY_API_KEY", "GOOGLE_API_KEY", "GEMINI_API_KEY"]
                .iter()
                .find_map(|name| lookup(name).filter(|v| !v.trim().is_empty()));
        }

        if let Some(model) = lookup("PARLEY_MODEL") {
            self.provider.model = model;
        }
    }

    /// Get the configuration directory path.
    pub fn config_dir() -> PathBuf {
        dirs_home().join(".parley")
    }

    /// Get the configuration file path.
    pub fn config_path() -> PathBuf {
        Self::config_dir().join("config.toml")
    }

    /// Validate the configuration.
    fn validate(&self) -> Result<(), ConfigError> {
        if !(0.0..=2.0).contains(&self.provider.temperature) {
            return Err(ConfigError::ValidationError(
                "provider.temperature must be between 0.0 and 2.0".into(),
            ));
        }

        if self.provider.max_output_tokens == 0 {
            return Err(ConfigError::ValidationError(
                "provider.max_output_tokens must be > 0".into(),
            ));
        }

        // A bound of 1 would evict the user turn as soon as its reply lands.
        if self.session.retention_bound < 2 {
            return Err(ConfigError::ValidationError(
                "session.retention_bound must be at least 2".into(),
            ));
        }

        if self.session.context_truncation == 0 {
            return Err(ConfigError::ValidationError(
                "session.context_truncation must be > 0".into(),
            ));
        }

        Ok(())
    }

    /// Check if an API key is available (from config or environment).
    pub fn has_api_key(&self) -> bool {
        self.api_key.as_deref().is_some_and(|k| !k.trim().is_empty())
    }

    /// Generate a default config TOML string (for `init` command).
    pub fn default_toml() -> String {
        let config = Self::default();
        toml::to_string_pretty(&config).unwrap_or_default()
    }
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            api_key: None,
            provider: ProviderSettings::default(),
            session: SessionConfig::default(),
            gateway: GatewayConfig::default(),
        }
    }
}

/// Get the user's home directory.
fn dirs_home() -> PathBuf {
    #[cfg(target_os = "windows")]
    {
        std::env::var("USERPROFILE")
            .map(PathBuf::from)
            .unwrap_or_else(|_| PathBuf::from("C:\\Users\\Default"))
    }
    #[cfg(not(target_os = "windows"))]
    {
        std::env::var("HOME")
            .map(PathBuf::from)
            .unwrap_or_else(|_| PathBuf::from("/tmp"))
    }
}

/// Configuration errors.
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("Failed to read config file at {path}: {reason}")]
    ReadError { path: PathBuf, reason: String },

    #[error("Failed to parse config file at {path}: {reason}")]
    ParseError { path: PathBuf, reason: String },

    #[error("Configuration validation failed: {0}")]
    ValidationError(String),
}
