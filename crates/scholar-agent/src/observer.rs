//! Run observer — synchronous callbacks fired as the agent acts.

use serde_json::Value;

/// A tool invocation requested by the model.
#[derive(Clone, Debug, PartialEq)]
pub struct AgentAction {
    /// Registered tool name, as the model spelled it.
    pub tool_name: String,
    /// Parsed arguments object.
    pub tool_input: Value,
    /// Provider-assigned call id.
    pub call_id: String,
}

/// Receives agent events while a run is in progress.
///
/// Callbacks run on the loop's task; keep them quick.
pub trait AgentObserver: Send + Sync {
    /// The model asked for a tool; fired before it executes.
    fn on_agent_action(&self, action: &AgentAction);

    /// A tool finished; `output` is what the model will see.
    fn on_tool_end(&self, output: &str);
}

/// Ignores every event.
#[derive(Clone, Copy, Debug, Default)]
pub struct NoopObserver;

impl AgentObserver for NoopObserver {
    fn on_agent_action(&self, _action: &AgentAction) {}

    fn on_tool_end(&self, _output: &str) {}
}
