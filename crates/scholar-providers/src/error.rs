//! Configuration errors raised while selecting a provider.
//!
//! Every variant is raised before any network I/O happens.

use thiserror::Error;

#[derive(Debug, Error)]
pub enum ConfigurationError {
    /// The provider identifier is not one of the known client families.
    #[error("Unsupported provider: '{given}'. Supported providers: {supported}.")]
    UnknownProvider { given: String, supported: String },

    /// The selected provider has no API key.
    #[error(
        "Missing credential for {provider}: set {env_key} or providers.{name}.apiKey in the config file"
    )]
    MissingCredential {
        provider: &'static str,
        name: &'static str,
        env_key: &'static str,
    },

    /// The underlying HTTP client could not be constructed.
    #[error("Failed to build HTTP client for {provider}: {source}")]
    Client {
        provider: &'static str,
        #[source]
        source: reqwest::Error,
    },
}
