//! Configuration schema.
//!
//! Hierarchy: `Config` → `AgentSettings`, `ProvidersConfig`, `ToolsConfig`.
//!
//! JSON on disk uses **camelCase** keys; Rust uses snake_case.

use serde::{Deserialize, Serialize};
use std::collections::HashMap;

// ─────────────────────────────────────────────
// Root Config
// ─────────────────────────────────────────────

/// Root configuration, loaded from `~/.scholar/config.json` plus env vars.
#[derive(Clone, Debug, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct Config {
    pub agent: AgentSettings,
    pub providers: ProvidersConfig,
    pub tools: ToolsConfig,
}

// ─────────────────────────────────────────────
// Agent
// ─────────────────────────────────────────────

/// Settings shared by every research run.
#[derive(Clone, Debug, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct AgentSettings {
    /// Provider family identifier (`"anthropic"` or `"openai"`, case-insensitive).
    pub provider: String,
    /// Model override; `None` means the provider's default model.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub model: Option<String>,
    /// Per-request timeout in seconds, for model calls and tool HTTP calls.
    pub timeout: u64,
    /// Maximum model round-trips per run.
    pub max_iterations: u32,
    /// Maximum tokens to generate per response.
    pub max_tokens: u32,
    /// Sampling temperature (0.0 – 2.0).
    pub temperature: f64,
}

impl Default for AgentSettings {
    fn default() -> Self {
        Self {
            provider: "anthropic".to_string(),
            model: None,
            timeout: 600,
            max_iterations: 10,
            max_tokens: 4096,
            temperature: 0.7,
        }
    }
}

// ─────────────────────────────────────────────
// Providers
// ─────────────────────────────────────────────

/// Configuration for a single LLM provider (API key, base URL, headers).
#[derive(Clone, Debug, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct ProviderConfig {
    /// API key for authentication.
    pub api_key: String,
    /// Custom API base URL (overrides provider default).
    #[serde(skip_serializing_if = "Option::is_none")]
    pub api_base: Option<String>,
    /// Default model for this provider (overrides the built-in default).
    #[serde(skip_serializing_if = "Option::is_none")]
    pub default_model: Option<String>,
    /// Extra HTTP headers to send with each request.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub extra_headers: Option<HashMap<String, String>>,
}

impl ProviderConfig {
    /// Whether this provider has a configured API key.
    pub fn is_configured(&self) -> bool {
        !self.api_key.trim().is_empty()
    }
}

/// All provider configurations, one per supported client family.
#[derive(Clone, Debug, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct ProvidersConfig {
    pub anthropic: ProviderConfig,
    pub openai: ProviderConfig,
}

// ─────────────────────────────────────────────
// Tools
// ─────────────────────────────────────────────

/// Tool configuration.
#[derive(Clone, Debug, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct ToolsConfig {
    pub search: SearchConfig,
    pub wikipedia: WikipediaConfig,
    pub save: SaveConfig,
}

/// Web search tool settings.
#[derive(Clone, Debug, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct SearchConfig {
    /// Number of results returned to the model.
    pub max_results: u32,
}

impl Default for SearchConfig {
    fn default() -> Self {
        Self { max_results: 5 }
    }
}

/// Wikipedia lookup settings.
#[derive(Clone, Debug, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct WikipediaConfig {
    /// Wikipedia language edition (subdomain), e.g. `"en"`.
    pub language: String,
    /// How many top search hits to summarize.
    pub top_k_results: u32,
    /// Character cap on the combined result.
    pub doc_content_chars_max: u32,
}

impl Default for WikipediaConfig {
    fn default() -> Self {
        Self {
            language: "en".to_string(),
            top_k_results: 1,
            doc_content_chars_max: 1000,
        }
    }
}

/// File persistence tool settings.
#[derive(Clone, Debug, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct SaveConfig {
    /// File used when the model does not name one.
    pub default_filename: String,
}

impl Default for SaveConfig {
    fn default() -> Self {
        Self {
            default_filename: "research_output.txt".to_string(),
        }
    }
}
