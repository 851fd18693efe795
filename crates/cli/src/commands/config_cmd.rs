//! `parley config`: Show the effective configuration.

use parley_config::AppConfig;

pub async fn show() -> Result<(), Box<dyn std::error::Error>> {
    let config = AppConfig::load().map_err(|e| format!("Failed to load config: {e}"))?;

    println!("# {}", AppConfig::config_path().display());
    println!("{}", render_redacted(&config)?);
    Ok(())
}

/// The config as TOML with the API key masked.
fn render_redacted(config: &AppConfig) -> Result<String, toml::ser::Error> {
    let mut shown = config.clone();
    if shown.api_key.is_some() {
        shown.api_key = Some("[REDACTED]".into());
    }
    toml::to_string_pretty(&shown)
}
