//! Tool trait — the interface every research tool implements.

use async_trait::async_trait;
use serde_json::Value;
use std::collections::HashMap;

use scholar_core::types::ToolDefinition;

// ─────────────────────────────────────────────
// Tool trait
// ─────────────────────────────────────────────

/// A named, stateless capability the model can call during a run.
///
/// The agent loop sends `to_definition()` to the model and dispatches calls
/// through the [`ToolRegistry`](super::ToolRegistry) by `name()`.
#[async_trait]
pub trait Tool: Send + Sync {
    /// Unique name used by the model to call this tool (e.g. `"search_tool"`).
    fn name(&self) -> &str;

    /// Human-readable description shown to the model.
    fn description(&self) -> &str;

    /// JSON Schema describing the parameters.
    ///
    /// Must be `{"type": "object", "properties": {...}, "required": [...]}`.
    fn parameters(&self) -> Value;

    /// Execute the tool with the given arguments.
    ///
    /// On failure, return an `Err`; the registry turns it into text for the model.
    async fn execute(&self, params: HashMap<String, Value>) -> anyhow::Result<String>;

    /// Whether this tool can report failure as an `Err`.
    ///
    /// Tools that fold their own failures into the returned text override this
    /// to `false`.
    fn may_fail(&self) -> bool {
        true
    }

    /// Build the `ToolDefinition` sent to the model.
    fn to_definition(&self) -> ToolDefinition {
        ToolDefinition::new(self.name(), self.description(), self.parameters())
    }
}

// ─────────────────────────────────────────────
// Param helpers
// ─────────────────────────────────────────────

/// Extract a required `String` param, returning a user-friendly error.
pub fn require_string(params: &HashMap<String, Value>, key: &str) -> anyhow::Result<String> {
    params
        .get(key)
        .and_then(|v| v.as_str())
        .map(|s| s.to_string())
        .ok_or_else(|| anyhow::anyhow!("Missing required parameter: {key}"))
}

/// Extract an optional `String` param. Blank strings count as absent.
pub fn optional_string(params: &HashMap<String, Value>, key: &str) -> Option<String> {
    params
        .get(key)
        .and_then(|v| v.as_str())
        .filter(|s| !s.trim().is_empty())
        .map(|s| s.to_string())
}

/// Extract an optional integer param.
pub fn optional_i64(params: &HashMap<String, Value>, key: &str) -> Option<i64> {
    params.get(key).and_then(|v| v.as_i64())
}
