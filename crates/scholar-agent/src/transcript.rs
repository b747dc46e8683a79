//! Transcript — the ordered conversation state of one run.
//!
//! Starts with the system prompt and the user query, then only ever grows.

use std::fmt;

use scholar_core::types::{Message, ToolCall};
use scholar_core::utils::truncate_string;

/// Longest tool output shown per entry when rendering.
const RENDER_TOOL_OUTPUT_CHARS: usize = 300;

/// Append-only message list for a single agent run.
#[derive(Clone, Debug, PartialEq)]
pub struct Transcript {
    messages: Vec<Message>,
}

impl Transcript {
    /// A fresh transcript: system prompt, then the query as the only human turn.
    pub fn new(system_prompt: impl Into<String>, query: impl Into<String>) -> Self {
        Self {
            messages: vec![Message::system(system_prompt), Message::user(query)],
        }
    }

    /// Record a model turn that requested tools.
    pub fn push_tool_calls(&mut self, content: Option<String>, tool_calls: Vec<ToolCall>) {
        self.messages
            .push(Message::assistant_tool_calls(content.filter(|c| !c.is_empty()), tool_calls));
    }

    /// Record the output of one tool call.
    pub fn push_tool_result(&mut self, tool_call_id: &str, output: &str) {
        self.messages.push(Message::tool_result(tool_call_id, output));
    }

    /// Record feedback about a malformed model turn.
    pub fn push_observation(&mut self, text: &str) {
        self.messages.push(Message::user(text));
    }

    /// Record the final answer.
    pub fn push_answer(&mut self, text: &str) {
        self.messages.push(Message::assistant(text));
    }

    pub fn messages(&self) -> &[Message] {
        &self.messages
    }

    pub fn len(&self) -> usize {
        self.messages.len()
    }

    pub fn is_empty(&self) -> bool {
        self.messages.is_empty()
    }

    /// Text of the most recent assistant turn that carried any.
    pub fn last_assistant_text(&self) -> Option<&str> {
        self.messages
            .iter()
            .rev()
            .filter(|m| matches!(m, Message::Assistant { .. }))
            .find_map(|m| m.text().filter(|t| !t.trim().is_empty()))
    }
}

impl fmt::Display for Transcript {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for (i, msg) in self.messages.iter().enumerate() {
            if i > 0 {
                writeln!(f)?;
            }
            match msg {
                Message::System { content } => write!(f, "[system] {}", truncate_string(content, 120))?,
                Message::User { content } => write!(f, "[human] {content}")?,
                Message::Assistant {
                    content,
                    tool_calls,
                } => {
                    let calls = tool_calls.as_deref().unwrap_or_default();
                    if let Some(text) = content {
                        let role = if calls.is_empty() { "agent-answer" } else { "agent" };
                        write!(f, "[{role}] {text}")?;
                        if !calls.is_empty() {
                            writeln!(f)?;
                        }
                    }
                    for (j, tc) in calls.iter().enumerate() {
                        if j > 0 {
                            writeln!(f)?;
                        }
                        write!(f, "[agent-action] {}({})", tc.function.name, tc.function.arguments)?;
                    }
                }
                Message::Tool { content, .. } => write!(
                    f,
                    "[tool-result] {}",
                    truncate_string(content, RENDER_TOOL_OUTPUT_CHARS)
                )?,
            }
        }
        Ok(())
    }
}
