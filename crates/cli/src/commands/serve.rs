//! `parley serve`: Start the HTTP API server.

use parley_config::AppConfig;

pub async fn run(port_override: Option<u16>) -> Result<(), Box<dyn std::error::Error>> {
    let mut config = AppConfig::load().map_err(|e| format!("Failed to load config: {e}"))?;

    if let Some(port) = port_override {
        config.gateway.port = port;
    }

    println!("Parley Gateway");
    println!("   Listening: {}:{}", config.gateway.host, config.gateway.port);
    println!("   Model:     {}", config.provider.model);
    if !config.has_api_key() {
        println!("   Warning:   no API key set; replies will be configuration errors");
    }

    parley_gateway::start(config).await?;

    Ok(())
}
