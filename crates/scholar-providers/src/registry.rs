//! Provider registry — the closed set of supported client families and the
//! selector that turns a provider identifier into a ready-to-use client.
//!
//! Each `ProviderSpec` describes how to reach one family: the env var holding
//! its key, its default model, and its default API base.

use std::fmt;
use std::str::FromStr;
use std::sync::Arc;
use std::time::Duration;

use tracing::debug;

use scholar_core::config::Config;

use crate::anthropic::AnthropicProvider;
use crate::error::ConfigurationError;
use crate::http_provider::HttpProvider;
use crate::traits::LlmProvider;

/// Per-provider settings live in core config.
pub use scholar_core::config::schema::ProviderConfig;

// ─────────────────────────────────────────────
// ProviderKind — one variant per client family
// ─────────────────────────────────────────────

/// A supported LLM client family.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum ProviderKind {
    Anthropic,
    OpenAi,
}

impl ProviderKind {
    /// Every supported family.
    pub const ALL: [ProviderKind; 2] = [ProviderKind::Anthropic, ProviderKind::OpenAi];

    /// Static spec for this family.
    pub fn spec(self) -> &'static ProviderSpec {
        match self {
            ProviderKind::Anthropic => &PROVIDERS[0],
            ProviderKind::OpenAi => &PROVIDERS[1],
        }
    }

    /// Lowercase identifier, as accepted by `from_str`.
    pub fn name(self) -> &'static str {
        self.spec().name
    }

    /// Supported identifiers, sorted.
    pub fn supported_names() -> Vec<&'static str> {
        let mut names: Vec<&'static str> = Self::ALL.iter().map(|k| k.name()).collect();
        names.sort_unstable();
        names
    }
}

impl fmt::Display for ProviderKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

impl FromStr for ProviderKind {
    type Err = ConfigurationError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let normalized = s.trim().to_lowercase();
        Self::ALL
            .iter()
            .copied()
            .find(|kind| kind.name() == normalized)
            .ok_or_else(|| ConfigurationError::UnknownProvider {
                given: s.to_string(),
                supported: Self::supported_names()
                    .iter()
                    .map(|name| format!("'{name}'"))
                    .collect::<Vec<_>>()
                    .join(", "),
            })
    }
}

// ─────────────────────────────────────────────
// ProviderSpec — static metadata for one family
// ─────────────────────────────────────────────

/// Static specification describing one LLM client family.
#[derive(Clone, Debug)]
pub struct ProviderSpec {
    /// Internal name (e.g. `"anthropic"`).
    pub name: &'static str,
    /// Human-readable name for logs. E.g. `"Anthropic"`.
    pub display_name: &'static str,
    /// Conventional environment variable for the API key.
    pub env_key: &'static str,
    /// Model used when neither the config nor the caller names one.
    pub default_model: &'static str,
    /// Default API base URL.
    pub default_api_base: &'static str,
}

/// Complete list of supported provider specifications, indexed by `ProviderKind`.
pub static PROVIDERS: &[ProviderSpec] = &[
    ProviderSpec {
        name: "anthropic",
        display_name: "Anthropic",
        env_key: "ANTHROPIC_API_KEY",
        default_model: "claude-3-5-sonnet-20240620",
        default_api_base: "https://api.anthropic.com",
    },
    ProviderSpec {
        name: "openai",
        display_name: "OpenAI",
        env_key: "OPENAI_API_KEY",
        default_model: "gpt-4o",
        default_api_base: "https://api.openai.com/v1",
    },
];

// ─────────────────────────────────────────────
// Selection
// ─────────────────────────────────────────────

/// A constructed, ready-to-invoke model client plus the settings it was built with.
///
/// Cheap to clone; the client itself is shared and stateless between calls.
#[derive(Clone)]
pub struct ClientHandle {
    kind: ProviderKind,
    model: String,
    timeout: Duration,
    client: Arc<dyn LlmProvider>,
}

impl ClientHandle {
    pub fn kind(&self) -> ProviderKind {
        self.kind
    }

    /// Effective model name for every call made through this handle.
    pub fn model(&self) -> &str {
        &self.model
    }

    pub fn timeout(&self) -> Duration {
        self.timeout
    }

    pub fn client(&self) -> Arc<dyn LlmProvider> {
        Arc::clone(&self.client)
    }
}

impl fmt::Debug for ClientHandle {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ClientHandle")
            .field("kind", &self.kind)
            .field("model", &self.model)
            .field("timeout", &self.timeout)
            .finish()
    }
}

/// Resolve the effective model: caller override, then configured default, then built-in.
pub fn resolve_model(kind: ProviderKind, model_override: Option<&str>, config: &ProviderConfig) -> String {
    model_override
        .map(str::trim)
        .filter(|m| !m.is_empty())
        .or_else(|| config.default_model.as_deref().filter(|m| !m.trim().is_empty()))
        .unwrap_or(kind.spec().default_model)
        .to_string()
}

/// Map a provider identifier + optional model override to a concrete client.
///
/// No network I/O happens here. Unknown identifiers, missing credentials and
/// unbuildable HTTP clients all fail immediately.
pub fn select(
    provider_id: &str,
    model_override: Option<&str>,
    config: &Config,
) -> Result<ClientHandle, ConfigurationError> {
    let kind: ProviderKind = provider_id.parse()?;
    let spec = kind.spec();
    let provider_config = match kind {
        ProviderKind::Anthropic => &config.providers.anthropic,
        ProviderKind::OpenAi => &config.providers.openai,
    };

    if !provider_config.is_configured() {
        return Err(ConfigurationError::MissingCredential {
            provider: spec.display_name,
            name: spec.name,
            env_key: spec.env_key,
        });
    }

    let model = resolve_model(kind, model_override, provider_config);
    let timeout = Duration::from_secs(config.agent.timeout);

    debug!(
        provider = spec.display_name,
        model = %model,
        timeout_secs = config.agent.timeout,
        "selecting LLM provider"
    );

    let client: Arc<dyn LlmProvider> = match kind {
        ProviderKind::Anthropic => Arc::new(AnthropicProvider::new(provider_config, spec, &model, timeout)?),
        ProviderKind::OpenAi => Arc::new(HttpProvider::new(provider_config, spec, &model, timeout)?),
    };

    Ok(ClientHandle {
        kind,
        model,
        timeout,
        client,
    })
}

// ─────────────────────────────────────────────
// Tests
// ─────────────────────────────────────────────
