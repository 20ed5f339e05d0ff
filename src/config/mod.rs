mod types;

pub use types::*;

use anyhow::{Context, Result};
use std::path::{Path, PathBuf};

/// Load configuration from a TOML file
pub fn load_config(path: &Path) -> Result<Config> {
    let content = std::fs::read_to_string(path)
        .with_context(|| format!("Failed to read config file: {:?}", path))?;

    let config: Config = toml::from_str(&content)
        .with_context(|| format!("Failed to parse config file: {:?}", path))?;

    validate_config(&config)?;

    Ok(config)
}

/// Load config from default locations or return default config
pub fn load_config_or_default(custom_path: Option<&Path>) -> Result<Config> {
    if let Some(path) = custom_path {
        return load_config(path);
    }

    let default_paths = [
        "./config.toml",
        "./ocbridge.toml",
        "~/.config/ocbridge/config.toml",
        "/etc/ocbridge/config.toml",
    ];

    for path_str in default_paths {
        let path = shellexpand::tilde(path_str);
        let path = Path::new(path.as_ref());
        if path.exists() {
            return load_config(path);
        }
    }

    Ok(Config::default())
}

/// Resolve the SQLite file: explicit setting, else next to the config file,
/// else the working directory.
pub fn database_path(config: &Config, config_path: Option<&Path>) -> PathBuf {
    if let Some(ref path) = config.database.path {
        return PathBuf::from(shellexpand::tilde(&path.to_string_lossy()).as_ref());
    }

    config_path
        .and_then(|p| p.parent())
        .map(|p| p.to_path_buf())
        .unwrap_or_else(|| std::env::current_dir().unwrap_or_default())
        .join("ocbridge.db")
}

fn validate_config(config: &Config) -> Result<()> {
    if config.server.port == 0 {
        anyhow::bail!("Server port cannot be 0");
    }

    if config.server.auth.enabled
        && config
            .server
            .auth
            .api_key
            .as_deref()
            .map_or(true, |key| key.trim().is_empty())
    {
        anyhow::bail!("server.auth is enabled but no api_key is set");
    }

    if config.http.timeout_secs == 0 {
        anyhow::bail!("HTTP timeout cannot be 0");
    }

    if config.cache.series_ttl_secs == 0 {
        tracing::warn!("Series cache TTL is 0; cached series data expires immediately");
    }

    Ok(())
}
