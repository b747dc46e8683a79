//! LLM provider layer for Scholar.
//!
//! # Architecture
//!
//! - [`traits::LlmProvider`] — trait that all clients implement
//! - [`registry`] — the supported client families and [`registry::select`]
//! - [`http_provider::HttpProvider`] — OpenAI-compatible HTTP client
//! - [`anthropic::AnthropicProvider`] — Anthropic Messages API client
//! - [`error::ConfigurationError`] — everything that can go wrong before the first request

pub mod anthropic;
pub mod error;
pub mod http_provider;
pub mod registry;
pub mod traits;

// Re-export main types for convenience
pub use anthropic::AnthropicProvider;
pub use error::ConfigurationError;
pub use http_provider::HttpProvider;
pub use registry::{select, ClientHandle, ProviderConfig, ProviderKind, ProviderSpec, PROVIDERS};
pub use traits::{LlmProvider, LlmRequestConfig};
