//! Anthropic Messages API client.
//!
//! Translates the OpenAI-layout conversation into Messages API requests and
//! maps the block-structured reply back into an `LlmResponse`. The raw content
//! blocks are kept on the response so callers can see exactly what came back.

use std::time::Duration;

use async_trait::async_trait;
use reqwest::header::HeaderMap;
use serde::{Deserialize, Serialize};
use serde_json::{json, Value};
use tracing::{debug, error};

use scholar_core::types::{LlmResponse, Message, ToolCall, ToolDefinition, UsageInfo};

use crate::error::ConfigurationError;
use crate::http_provider::build_extra_headers;
use crate::registry::{ProviderConfig, ProviderSpec};
use crate::traits::{LlmProvider, LlmRequestConfig};

/// Value sent in the `anthropic-version` header.
const ANTHROPIC_VERSION: &str = "2023-06-01";

// ─────────────────────────────────────────────
// Wire types
// ─────────────────────────────────────────────

#[derive(Debug, Serialize)]
struct MessagesRequest {
    model: String,
    max_tokens: u32,
    #[serde(skip_serializing_if = "Option::is_none")]
    system: Option<String>,
    messages: Vec<AnthropicMessage>,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    tools: Vec<AnthropicTool>,
    temperature: f64,
}

#[derive(Debug, Serialize, PartialEq)]
struct AnthropicMessage {
    role: &'static str,
    content: Vec<Value>,
}

#[derive(Debug, Serialize)]
struct AnthropicTool {
    name: String,
    description: String,
    input_schema: Value,
}

#[derive(Debug, Deserialize)]
struct MessagesResponse {
    #[serde(default)]
    content: Vec<Value>,
    stop_reason: Option<String>,
    usage: Option<AnthropicUsage>,
}

#[derive(Debug, Deserialize)]
struct AnthropicUsage {
    input_tokens: u32,
    output_tokens: u32,
}

// ─────────────────────────────────────────────
// Conversion
// ─────────────────────────────────────────────

/// Split off system prompts and convert the rest to Messages API turns.
///
/// Consecutive tool results are folded into a single `user` turn, as the API
/// expects all results for one assistant turn together.
fn convert_messages(messages: &[Message]) -> (Option<String>, Vec<AnthropicMessage>) {
    let mut system_parts: Vec<&str> = Vec::new();
    let mut out: Vec<AnthropicMessage> = Vec::new();

    for msg in messages {
        match msg {
            Message::System { content } => system_parts.push(content),
            Message::User { content } => out.push(AnthropicMessage {
                role: "user",
                content: vec![json!({ "type": "text", "text": content })],
            }),
            Message::Assistant { content, tool_calls } => {
                let mut blocks = Vec::new();
                if let Some(text) = content.as_deref().filter(|t| !t.is_empty()) {
                    blocks.push(json!({ "type": "text", "text": text }));
                }
                for tc in tool_calls.iter().flatten() {
                    let input: Value = serde_json::from_str(&tc.function.arguments)
                        .unwrap_or_else(|_| json!({}));
                    blocks.push(json!({
                        "type": "tool_use",
                        "id": tc.id,
                        "name": tc.function.name,
                        "input": input,
                    }));
                }
                out.push(AnthropicMessage {
                    role: "assistant",
                    content: blocks,
                });
            }
            Message::Tool {
                content,
                tool_call_id,
            } => {
                let block = json!({
                    "type": "tool_result",
                    "tool_use_id": tool_call_id,
                    "content": content,
                });
                match out.last_mut() {
                    Some(last) if is_tool_result_turn(last) => last.content.push(block),
                    _ => out.push(AnthropicMessage {
                        role: "user",
                        content: vec![block],
                    }),
                }
            }
        }
    }

    let system = if system_parts.is_empty() {
        None
    } else {
        Some(system_parts.join("\n\n"))
    };
    (system, out)
}

fn is_tool_result_turn(msg: &AnthropicMessage) -> bool {
    msg.role == "user"
        && !msg.content.is_empty()
        && msg
            .content
            .iter()
            .all(|b| b.get("type").and_then(Value::as_str) == Some("tool_result"))
}

impl From<MessagesResponse> for LlmResponse {
    fn from(resp: MessagesResponse) -> Self {
        let mut texts: Vec<&str> = Vec::new();
        let mut tool_calls = Vec::new();

        for block in &resp.content {
            match block.get("type").and_then(Value::as_str) {
                Some("text") => {
                    if let Some(text) = block.get("text").and_then(Value::as_str) {
                        texts.push(text);
                    }
                }
                Some("tool_use") => {
                    let id = block.get("id").and_then(Value::as_str).unwrap_or_default();
                    let name = block.get("name").and_then(Value::as_str).unwrap_or_default();
                    let input = block.get("input").cloned().unwrap_or_else(|| json!({}));
                    tool_calls.push(ToolCall::new(id, name, input.to_string()));
                }
                _ => {}
            }
        }

        LlmResponse {
            content: if texts.is_empty() {
                None
            } else {
                Some(texts.join(""))
            },
            tool_calls,
            finish_reason: resp.stop_reason,
            usage: resp.usage.map(|u| UsageInfo {
                prompt_tokens: u.input_tokens,
                completion_tokens: u.output_tokens,
                total_tokens: u.input_tokens + u.output_tokens,
            }),
            blocks: Some(resp.content),
        }
    }
}

// ─────────────────────────────────────────────
// AnthropicProvider
// ─────────────────────────────────────────────

/// An LLM provider for the Anthropic Messages API.
pub struct AnthropicProvider {
    client: reqwest::Client,
    api_base: String,
    api_key: String,
    default_model: String,
    extra_headers: HeaderMap,
    spec: &'static ProviderSpec,
}

impl std::fmt::Debug for AnthropicProvider {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("AnthropicProvider")
            .field("api_base", &self.api_base)
            .field("default_model", &self.default_model)
            .finish()
    }
}

impl AnthropicProvider {
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

        Ok(Self {
            client,
            api_base,
            api_key: config.api_key.clone(),
            default_model: model.to_string(),
            extra_headers: build_extra_headers(config),
            spec,
        })
    }

    fn messages_url(&self) -> String {
        format!("{}/v1/messages", self.api_base.trim_end_matches('/'))
    }
}

#[async_trait]
impl LlmProvider for AnthropicProvider {
    async fn chat(
        &self,
        messages: &[Message],
        tools: Option<&[ToolDefinition]>,
        model: &str,
        config: &LlmRequestConfig,
    ) -> LlmResponse {
        let (system, converted) = convert_messages(messages);

        debug!(
            provider = self.spec.display_name,
            model = %model,
            messages = converted.len(),
            tools = tools.map_or(0, |t| t.len()),
            "Calling LLM"
        );

        let request_body = MessagesRequest {
            model: model.to_string(),
            max_tokens: config.max_tokens,
            system,
            messages: converted,
            tools: tools
                .unwrap_or_default()
                .iter()
                .map(|t| AnthropicTool {
                    name: t.function.name.clone(),
                    description: t.function.description.clone(),
                    input_schema: t.function.parameters.clone(),
                })
                .collect(),
            temperature: config.temperature.min(1.0),
        };

        let result = self
            .client
            .post(self.messages_url())
            .header("x-api-key", &self.api_key)
            .header("anthropic-version", ANTHROPIC_VERSION)
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

        match response.json::<MessagesResponse>().await {
            Ok(resp) => {
                let llm_resp: LlmResponse = resp.into();
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
