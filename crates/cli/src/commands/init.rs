//! `parley init`: First-time setup.

use std::path::Path;

use parley_config::AppConfig;

pub async fn run() -> Result<(), Box<dyn std::error::Error>> {
    let config_path = AppConfig::config_path();

    println!("Parley First-Time Setup");
    println!("======================\n");

    if write_default_config(&config_path)? {
        println!("Created config.toml at: {}", config_path.display());
        println!("\nNext steps:");
        println!("   1. Set PARLEY_API_KEY (or GOOGLE_API_KEY), or add api_key to the file");
        println!("   2. Run: parley chat\n");
    } else {
        println!("Config already exists at: {}", config_path.display());
        println!("   Edit it manually or delete it and re-run init.\n");
    }

    Ok(())
}

/// Write the default config to `path` unless a file is already there.
///
/// Returns whether a file was written.
fn write_default_config(path: &Path) -> std::io::Result<bool> {
    if path.exists() {
        return Ok(false);
    }
    if let Some(dir) = path.parent() {
        std::fs::create_dir_all(dir)?;
    }
    std::fs::write(path, AppConfig::default_toml())?;
    Ok(true)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn writes_once_and_loads_back() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("nested").join("config.toml");

        assert!(write_default_config(&path).unwrap());
        assert!(!write_default_config(&path).unwrap());

        let config = AppConfig::load_from(&path).unwrap();
        assert_eq!(config.session.retention_bound, 40);
    }
}
