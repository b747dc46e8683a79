//! HTTP client for OpenAI-compatible `/chat/completions` APIs.

use std::time::Duration;

use async_trait::async_trait;
use reqwest::header::{HeaderMap, HeaderName, HeaderValue};
use tracing::{debug, error, warn};

use scholar_core::types::{
    ChatCompletionRequest, ChatCompletionResponse, LlmResponse, Message, ToolDefinition,
};

use crate::error::ConfigurationError;
use crate::registry::{ProviderConfig, ProviderSpec};
use crate::traits::{LlmProvider, LlmRequestConfig};

// ─────────────────────────────────────────────
// HttpProvider
// ─────────────────────────────────────────────

/// An LLM provider that talks to any OpenAI-compatible HTTP API.
pub struct HttpProvider {
    /// HTTP client (shared, connection-pooled).
    client: reqwest::Client,
    /// API base URL (e.g. `"https://api.openai.com/v1"`).
    api_base: String,
    /// API key for Bearer authentication.
    api_key: String,
    /// Default model for this provider instance.
    default_model: String,
    /// Extra headers to send with each request.
    extra_headers: HeaderMap,
    spec: &'static ProviderSpec,
}

impl std::fmt::Debug for HttpProvider {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("HttpProvider")
            .field("api_base", &self.api_base)
            .field("default_model", &self.default_model)
            .field("provider", &self.spec.display_name)
            .finish()
    }
}

/// Convert configured header pairs into a `HeaderMap`, skipping invalid entries.
pub(crate) fn build_extra_headers(config: &ProviderConfig) -> HeaderMap {
    let mut extra_headers = HeaderMap::new();
    if let Some(ref headers) = config.extra_headers {
        for (key, value) in headers {
            if let (Ok(name), Ok(val)) = (
                HeaderName::from_bytes(key.as_bytes()),
                HeaderValue::from_str(value),
            ) {
                extra_headers.insert(name, val);
            } else {
                warn!("Invalid header: {}={}", key, value);
            }
        }
    }
    extra_headers
}

impl HttpProvider {
    /// Create a new HttpProvider.
    ///
    /// # Arguments
    /// * `config`  — User's config (api_key, api_base, extra_headers)
    /// * `spec`    — Static provider spec from the registry
    /// * `model`   — The default model to use
    /// * `timeout` — Per-request timeout
    pub fn new(
        config: &ProviderConfig,
        spec: &'static ProviderSpec,
        model: &str,
        timeout: Duration,
    ) -> Result<Self, ConfigurationError> {
        let api_base = config
            .api_base
            .clone()
            .unwrap_or_else(|| spec.default_api_base.to_string());

        let client = reqwest::Client::builder()
            .timeout(timeout)
            .build()
            .map_err(|source| ConfigurationError::Client {
                provider: spec.display_name,
                source,
            })?;

        Ok(HttpProvider {
            client,
            api_base,
            api_key: config.api_key.clone(),
            default_model: model.to_string(),
            extra_headers: build_extra_headers(config),
            spec,
        })
    }

    /// Build the full chat completions URL.
    fn completions_url(&self) -> String {
        let base = self.api_base.trim_end_matches('/');
        format!("{}/chat/completions", base)
    }
}

#[async_trait]
impl LlmProvider for HttpProvider {
    async fn chat(
        &self,
        messages: &[Message],
        tools: Option<&[ToolDefinition]>,
        model: &str,
        config: &LlmRequestConfig,
    ) -> LlmResponse {
        debug!(
            provider = self.spec.display_name,
            model = %model,
            messages = messages.len(),
            tools = tools.map_or(0, |t| t.len()),
            "Calling LLM"
        );

        let request_body = ChatCompletionRequest {
            model: model.to_string(),
            messages: messages.to_vec(),
            tools: tools.map(|t| t.to_vec()),
            tool_choice: tools.map(|_| "auto".to_string()),
            max_tokens: Some(config.max_tokens),
            temperature: Some(config.temperature),
        };

        let result = self
            .client
            .post(self.completions_url())
            .bearer_auth(&self.api_key)
            .headers(self.extra_headers.clone())
            .json(&request_body)
            .send()
            .await;

        let response = match result {
            Ok(resp) => resp,
            Err(e) => {
                error!(provider = self.spec.display_name, error = %e, "HTTP request failed");
                return LlmResponse::error(format!("Error calling LLM: {}", e));
            }
        };

        let status = response.status();
        if !status.is_success() {
            let error_text = response
                .text()
                .await
                .unwrap_or_else(|_| "Failed to read error body".to_string());
            error!(
                provider = self.spec.display_name,
                status = %status,
                body = %error_text,
                "API error"
            );
            return LlmResponse::error(format!("Error calling LLM: {}: {}", status, error_text));
        }

        match response.json::<ChatCompletionResponse>().await {
            Ok(chat_resp) => {
                let llm_resp: LlmResponse = chat_resp.into();
                debug!(
                    provider = self.spec.display_name,
                    has_content = llm_resp.content.is_some(),
                    tool_calls = llm_resp.tool_calls.len(),
                    finish_reason = llm_resp.finish_reason.as_deref().unwrap_or("?"),
                    "LLM response received"
                );
                llm_resp
            }
            Err(e) => {
                error!(provider = self.spec.display_name, error = %e, "Failed to parse LLM response");
                LlmResponse::error(format!("Error parsing LLM response: {}", e))
            }
        }
    }

    fn default_model(&self) -> &str {
        &self.default_model
    }

    fn display_name(&self) -> &str {
        self.spec.display_name
    }
}

// ─────────────────────────────────────────────
// Tests
// ─────────────────────────────────────────────

#[cfg(test)]
mod tests {
    use super::*;
    use crate::registry::ProviderKind;
    use std::collections::HashMap;
    use wiremock::matchers::{body_partial_json, header, method, path};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    fn make_config(api_key: &str, api_base: Option<&str>) -> ProviderConfig {
        ProviderConfig {
            api_key: api_key.to_string(),
            api_base: api_base.map(String::from),
            ..Default::default()
        }
    }

    fn make_provider(config: &ProviderConfig) -> HttpProvider {
        HttpProvider::new(config, ProviderKind::OpenAi.spec(), "gpt-4o", Duration::from_secs(5)).unwrap()
    }

    #[test]
    fn test_completions_url_trailing_slash() {
        let provider = make_provider(&make_config("key", Some("https://api.openai.com/v1/")));
        assert_eq!(provider.completions_url(), "https://api.openai.com/v1/chat/completions");
    }

    #[test]
    fn test_default_api_base() {
        let provider = make_provider(&make_config("key", None));
        assert_eq!(provider.api_base, "https://api.openai.com/v1");
    }

    #[test]
    fn test_display_name() {
        let provider = make_provider(&make_config("key", None));
        assert_eq!(provider.display_name(), "OpenAI");
        assert_eq!(provider.default_model(), "gpt-4o");
    }

    #[test]
    fn test_extra_headers() {
        let mut headers = HashMap::new();
        headers.insert("OpenAI-Organization".to_string(), "org-123".to_string());
        let config = ProviderConfig {
            api_key: "key".to_string(),
            extra_headers: Some(headers),
            ..Default::default()
        };
        let provider = make_provider(&config);
        assert!(provider.extra_headers.contains_key("openai-organization"));
    }

    #[tokio::test]
    async fn test_chat_success() {
        let mock_server = MockServer::start().await;

        Mock::given(method("POST"))
            .and(path("/chat/completions"))
            .and(header("Authorization", "Bearer test-key-123"))
            .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({
                "id": "chatcmpl-test",
                "choices": [{
                    "message": { "content": "<result>{}</result>", "tool_calls": null },
                    "finish_reason": "stop"
                }],
                "usage": { "prompt_tokens": 10, "completion_tokens": 5, "total_tokens": 15 }
            })))
            .mount(&mock_server)
            .await;

        let provider = make_provider(&make_config("test-key-123", Some(&mock_server.uri())));
        let messages = vec![Message::system("You are a research assistant."), Message::user("Hello")];

        let resp = provider
            .chat(&messages, None, "gpt-4o", &LlmRequestConfig::default())
            .await;

        assert_eq!(resp.content.as_deref(), Some("<result>{}</result>"));
        assert!(!resp.has_tool_calls());
        assert!(!resp.is_error());
        assert_eq!(resp.usage.as_ref().unwrap().total_tokens, 15);
    }

    #[tokio::test]
    async fn test_chat_with_tool_calls() {
        let mock_server = MockServer::start().await;

        Mock::given(method("POST"))
            .and(path("/chat/completions"))
            .and(body_partial_json(serde_json::json!({ "tool_choice": "auto" })))
            .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({
                "id": "chatcmpl-tools",
                "choices": [{
                    "message": {
                        "content": null,
                        "tool_calls": [{
                            "id": "call_abc123",
                            "type": "function",
                            "function": {
                                "name": "search_tool",
                                "arguments": "{\"query\": \"Eiffel Tower\"}"
                            }
                        }]
                    },
                    "finish_reason": "tool_calls"
                }],
                "usage": null
            })))
            .mount(&mock_server)
            .await;

        let provider = make_provider(&make_config("key", Some(&mock_server.uri())));
        let tool_def = ToolDefinition::new(
            "search_tool",
            "Search the web",
            serde_json::json!({"type": "object", "properties": {"query": {"type": "string"}}}),
        );

        let resp = provider
            .chat(&[Message::user("Search")], Some(&[tool_def]), "gpt-4o", &LlmRequestConfig::default())
            .await;

        assert!(resp.content.is_none());
        assert_eq!(resp.tool_calls.len(), 1);
        assert_eq!(resp.tool_calls[0].function.name, "search_tool");
        assert_eq!(resp.tool_calls[0].id, "call_abc123");
    }

    #[tokio::test]
    async fn test_chat_api_error() {
        let mock_server = MockServer::start().await;

        Mock::given(method("POST"))
            .and(path("/chat/completions"))
            .respond_with(ResponseTemplate::new(429).set_body_json(serde_json::json!({
                "error": { "message": "Rate limit exceeded", "type": "rate_limit_error" }
            })))
            .mount(&mock_server)
            .await;

        let provider = make_provider(&make_config("key", Some(&mock_server.uri())));
        let resp = provider
            .chat(&[Message::user("Hello")], None, "gpt-4o", &LlmRequestConfig::default())
            .await;

        assert!(resp.is_error());
        let content = resp.content.unwrap();
        assert!(content.contains("Error calling LLM"));
        assert!(content.contains("429"));
    }

    #[tokio::test]
    async fn test_chat_network_error() {
        let provider = make_provider(&make_config("key", Some("http://127.0.0.1:1")));
        let resp = provider
            .chat(&[Message::user("Hello")], None, "gpt-4o", &LlmRequestConfig::default())
            .await;

        assert!(resp.is_error());
        assert!(resp.content.unwrap().contains("Error calling LLM"));
    }

    #[tokio::test]
    async fn test_chat_sends_model_and_limits() {
        let mock_server = MockServer::start().await;

        Mock::given(method("POST"))
            .and(path("/chat/completions"))
            .and(body_partial_json(serde_json::json!({
                "model": "gpt-4o-mini",
                "max_tokens": 4096
            })))
            .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({
                "id": "chatcmpl-body",
                "choices": [{ "message": { "content": "ok" }, "finish_reason": "stop" }],
                "usage": null
            })))
            .mount(&mock_server)
            .await;

        let provider = make_provider(&make_config("key", Some(&mock_server.uri())));
        let resp = provider
            .chat(&[Message::user("test")], None, "gpt-4o-mini", &LlmRequestConfig::default())
            .await;

        // A body mismatch makes wiremock answer 404, which would surface as an error
        assert_eq!(resp.content.as_deref(), Some("ok"));
    }
}
