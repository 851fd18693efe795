//! Generation provider implementations for Parley.
//!
//! All providers implement the `parley_core::Provider` trait.
//! `build_from_config` constructs the configured provider.

pub mod gemini;

pub use gemini::GeminiProvider;

use std::sync::Arc;
use std::time::Duration;

use parley_core::error::ProviderError;
use parley_core::provider::Provider;

/// Build the generation provider described by the configuration.
///
/// A missing API key does not fail here: the provider reports it as a
/// configuration failure on each call, so it shows up in the transcript.
pub fn build_from_config(
    config: &parley_config::AppConfig,
) -> Result<Arc<dyn Provider>, ProviderError> {
    let provider = GeminiProvider::new(
        config.api_key.clone(),
        Duration::from_secs(config.provider.request_timeout_secs),
    )?
    .with_base_url(&config.provider.base_url);

    if !config.has_api_key() {
        tracing::warn!("No API key configured; generation requests will fail until one is set");
    }

    Ok(Arc::new(provider))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn builds_without_api_key() {
        let config = parley_config::AppConfig::default();
        let provider = build_from_config(&config).unwrap();
        assert_eq!(provider.name(), "gemini");
    }
}
