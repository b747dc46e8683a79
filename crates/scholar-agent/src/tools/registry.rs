//! Tool Registry — ordered store of the tools available to one agent.
//!
//! The agent loop registers tools here and dispatches model tool-call requests
//! by name. Registration order is preserved: it is the order definitions are
//! sent to the model and the order names appear in error messages.

use std::collections::HashMap;
use std::sync::Arc;

use scholar_core::types::ToolDefinition;
use thiserror::Error;
use tracing::{info, warn};

use super::base::Tool;

/// Errors raised while building a registry.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum RegistryError {
    #[error("Tool '{0}' is already registered")]
    DuplicateTool(String),
}

// ─────────────────────────────────────────────
// Registry
// ─────────────────────────────────────────────

/// Stores tools in registration order and dispatches calls.
///
/// Owns `Arc<dyn Tool>` so a registry can be shared between runs.
#[derive(Default)]
pub struct ToolRegistry {
    tools: Vec<Arc<dyn Tool>>,
}

impl ToolRegistry {
    /// Create an empty registry.
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a tool. Names must be unique.
    pub fn register(&mut self, tool: Arc<dyn Tool>) -> Result<(), RegistryError> {
        if self.has(tool.name()) {
            return Err(RegistryError::DuplicateTool(tool.name().to_string()));
        }
        info!(tool = tool.name(), may_fail = tool.may_fail(), "registered tool");
        self.tools.push(tool);
        Ok(())
    }

    /// Look up a tool by name.
    pub fn get(&self, name: &str) -> Option<&Arc<dyn Tool>> {
        self.tools.iter().find(|t| t.name() == name)
    }

    /// Check if a tool is registered.
    pub fn has(&self, name: &str) -> bool {
        self.get(name).is_some()
    }

    /// Names of all registered tools, in registration order.
    pub fn tool_names(&self) -> Vec<&str> {
        self.tools.iter().map(|t| t.name()).collect()
    }

    /// Get the model-facing definitions for all registered tools.
    pub fn get_definitions(&self) -> Vec<ToolDefinition> {
        self.tools.iter().map(|t| t.to_definition()).collect()
    }

    /// Execute a tool by name with the given parameters.
    ///
    /// The model always gets a `String` back, even on failure.
    pub async fn execute(&self, name: &str, params: HashMap<String, serde_json::Value>) -> String {
        let tool = match self.get(name) {
            Some(t) => t,
            None => {
                warn!(tool = name, "tool not found");
                return format!(
                    "Error: Tool '{name}' not found. Available tools: {}",
                    self.tool_names().join(", ")
                );
            }
        };

        match tool.execute(params).await {
            Ok(result) => result,
            Err(e) => {
                warn!(tool = name, error = %e, "tool execution failed");
                format!("Error executing {name}: {e}")
            }
        }
    }

    /// Number of registered tools.
    pub fn len(&self) -> usize {
        self.tools.len()
    }

    /// Whether the registry is empty.
    pub fn is_empty(&self) -> bool {
        self.tools.is_empty()
    }
}
