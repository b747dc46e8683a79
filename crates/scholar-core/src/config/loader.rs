//! Config loader — reads `~/.scholar/config.json` and merges env vars.
//!
//! # Loading precedence
//! 1. Defaults (from `Config::default()`)
//! 2. JSON file at `~/.scholar/config.json`
//! 3. Environment variables `SCHOLAR_<SECTION>__<FIELD>` (override JSON)
//! 4. Conventional `ANTHROPIC_API_KEY` / `OPENAI_API_KEY`, only where no key is set yet

use std::path::{Path, PathBuf};
use tracing::{debug, info, warn};

use super::schema::{Config, ProviderConfig};

/// Default config file path.
pub fn get_config_path() -> PathBuf {
    crate::utils::get_data_path().join("config.json")
}

/// Load configuration from `path` (or the default path) + env vars.
///
/// Falls back to `Config::default()` if the file doesn't exist or can't be parsed.
pub fn load_config(path: Option<&Path>) -> Config {
    let config_path = path.map(PathBuf::from).unwrap_or_else(get_config_path);

    load_config_from_path(&config_path)
}

fn load_config_from_path(path: &Path) -> Config {
    if !path.exists() {
        info!("No config file found at {}, using defaults", path.display());
        return apply_env_overrides(Config::default());
    }

    debug!("Loading config from {}", path.display());

    let content = match std::fs::read_to_string(path) {
        Ok(c) => c,
        Err(e) => {
            warn!("Failed to read config file {}: {}", path.display(), e);
            return apply_env_overrides(Config::default());
        }
    };

    let config: Config = match serde_json::from_str(&content) {
        Ok(c) => c,
        Err(e) => {
            warn!("Failed to parse config {}: {}", path.display(), e);
            return apply_env_overrides(Config::default());
        }
    };

    apply_env_overrides(config)
}

/// Save configuration to disk (pretty-printed JSON with camelCase keys).
pub fn save_config(config: &Config, path: Option<&Path>) -> std::io::Result<()> {
    let config_path = path.map(PathBuf::from).unwrap_or_else(get_config_path);

    if let Some(parent) = config_path.parent() {
        std::fs::create_dir_all(parent)?;
    }

    let json = serde_json::to_string_pretty(config)
        .map_err(|e| std::io::Error::new(std::io::ErrorKind::Other, e))?;

    std::fs::write(&config_path, json)?;
    debug!("Config saved to {}", config_path.display());
    Ok(())
}

/// Apply environment variable overrides on top of a loaded config.
///
/// Supported overrides:
/// - `SCHOLAR_AGENT__PROVIDER` → `agent.provider`
/// - `SCHOLAR_AGENT__MODEL` → `agent.model`
/// - `SCHOLAR_AGENT__TIMEOUT` → `agent.timeout`
/// - `SCHOLAR_AGENT__MAX_ITERATIONS` → `agent.max_iterations`
/// - `SCHOLAR_PROVIDERS__<NAME>__API_KEY` / `__API_BASE` / `__DEFAULT_MODEL`
/// - `SCHOLAR_TOOLS__SAVE__DEFAULT_FILENAME` → `tools.save.default_filename`
fn apply_env_overrides(mut config: Config) -> Config {
    if let Ok(val) = std::env::var("SCHOLAR_AGENT__PROVIDER") {
        config.agent.provider = val;
    }
    if let Ok(val) = std::env::var("SCHOLAR_AGENT__MODEL") {
        if !val.trim().is_empty() {
            config.agent.model = Some(val);
        }
    }
    if let Ok(val) = std::env::var("SCHOLAR_AGENT__TIMEOUT") {
        match val.parse::<u64>() {
            Ok(0) => warn!("ignoring zero SCHOLAR_AGENT__TIMEOUT"),
            Ok(secs) => config.agent.timeout = secs,
            Err(_) => warn!(value = %val, "ignoring non-numeric SCHOLAR_AGENT__TIMEOUT"),
        }
    }
    if let Ok(val) = std::env::var("SCHOLAR_AGENT__MAX_ITERATIONS") {
        if let Ok(n) = val.parse::<u32>() {
            config.agent.max_iterations = n;
        }
    }

    apply_provider_env(&mut config.providers.anthropic, "ANTHROPIC");
    apply_provider_env(&mut config.providers.openai, "OPENAI");

    if let Ok(val) = std::env::var("SCHOLAR_TOOLS__SAVE__DEFAULT_FILENAME") {
        config.tools.save.default_filename = val;
    }

    config
}

/// Apply env var overrides for a single provider.
fn apply_provider_env(provider: &mut ProviderConfig, name: &str) {
    if let Ok(val) = std::env::var(format!("SCHOLAR_PROVIDERS__{name}__API_KEY")) {
        provider.api_key = val;
    }
    if let Ok(val) = std::env::var(format!("SCHOLAR_PROVIDERS__{name}__API_BASE")) {
        provider.api_base = Some(val);
    }
    if let Ok(val) = std::env::var(format!("SCHOLAR_PROVIDERS__{name}__DEFAULT_MODEL")) {
        provider.default_model = Some(val);
    }
    if !provider.is_configured() {
        if let Ok(val) = std::env::var(format!("{name}_API_KEY")) {
            provider.api_key = val;
        }
    }
}

// ─────────────────────────────────────────────
// Tests
// ─────────────────────────────────────────────
