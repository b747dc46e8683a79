//! Agent loop — the model ↔ tool-calling main loop.
//!
//! One call to [`ResearchAgent::run`] drives a single query to completion:
//! call the model, execute whatever tools it asks for, feed the results back,
//! and stop on a final answer, a provider error, or the iteration cap.

use std::collections::HashMap;
use std::fmt;
use std::sync::Arc;

use serde_json::Value;
use tracing::{debug, info, warn};

use scholar_core::config::AgentSettings;
use scholar_core::types::ToolCall;
use scholar_providers::{ClientHandle, LlmProvider, LlmRequestConfig};

use crate::observer::{AgentAction, AgentObserver};
use crate::prompt::{render_system_prompt, DEFAULT_SYSTEM_PROMPT};
use crate::response::AgentOutput;
use crate::tools::ToolRegistry;
use crate::transcript::Transcript;

/// Default maximum model ↔ tool round-trips per query.
pub const DEFAULT_MAX_ITERATIONS: u32 = 10;

/// Output when the cap is hit before the model said anything.
pub const ITERATION_LIMIT_OUTPUT: &str = "Agent stopped due to max iterations.";

/// Observation recorded when the model returns neither text nor tool calls.
pub const INCOMPLETE_RESPONSE_OBSERVATION: &str = "Invalid or incomplete response";

// ─────────────────────────────────────────────
// Run result
// ─────────────────────────────────────────────

/// Why a run ended.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum StopReason {
    /// The model gave a final answer.
    Finished,
    /// The round-trip cap was reached.
    IterationLimit,
    /// The provider reported a transport or API failure.
    ProviderError,
}

impl fmt::Display for StopReason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            StopReason::Finished => "finished",
            StopReason::IterationLimit => "iteration limit reached",
            StopReason::ProviderError => "provider error",
        })
    }
}

/// Everything one run produced.
#[derive(Clone, Debug)]
pub struct AgentRun {
    /// The query as given.
    pub input: String,
    /// Final output (the raw answer, an error text, or the cap message).
    pub output: AgentOutput,
    pub stop_reason: StopReason,
    /// Model round-trips performed.
    pub iterations: u32,
    /// Every tool call made, with the text the model saw back.
    pub intermediate_steps: Vec<(AgentAction, String)>,
    /// Full conversation state at the end of the run.
    pub transcript: Transcript,
}

impl fmt::Display for AgentRun {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "input: {}", self.input)?;
        writeln!(f, "stop_reason: {}", self.stop_reason)?;
        writeln!(f, "iterations: {}", self.iterations)?;
        if !self.intermediate_steps.is_empty() {
            writeln!(f, "steps:")?;
            for (i, (action, _)) in self.intermediate_steps.iter().enumerate() {
                writeln!(f, "  {}. {} {}", i + 1, action.tool_name, action.tool_input)?;
            }
        }
        write!(f, "output: {}", self.output)
    }
}

// ─────────────────────────────────────────────
// ResearchAgent
// ─────────────────────────────────────────────

/// A model client, a toolset and the loop settings that bind them.
///
/// Holds no per-run state; one agent can serve many runs.
pub struct ResearchAgent {
    provider: Arc<dyn LlmProvider>,
    model: String,
    tools: Arc<ToolRegistry>,
    system_prompt: String,
    max_iterations: u32,
    request_config: LlmRequestConfig,
}

impl ResearchAgent {
    /// Create an agent with the default prompt and limits.
    pub fn new(provider: Arc<dyn LlmProvider>, model: impl Into<String>, tools: Arc<ToolRegistry>) -> Self {
        Self {
            provider,
            model: model.into(),
            tools,
            system_prompt: render_system_prompt(DEFAULT_SYSTEM_PROMPT),
            max_iterations: DEFAULT_MAX_ITERATIONS,
            request_config: LlmRequestConfig::default(),
        }
    }

    /// Create an agent from a selected client and the agent settings.
    pub fn from_handle(handle: &ClientHandle, tools: Arc<ToolRegistry>, settings: &AgentSettings) -> Self {
        Self::new(handle.client(), handle.model(), tools)
            .with_max_iterations(settings.max_iterations)
            .with_request_config(LlmRequestConfig {
                max_tokens: settings.max_tokens,
                temperature: settings.temperature,
            })
    }

    pub fn with_max_iterations(mut self, max_iterations: u32) -> Self {
        self.max_iterations = max_iterations.max(1);
        self
    }

    pub fn with_request_config(mut self, config: LlmRequestConfig) -> Self {
        self.request_config = config;
        self
    }

    /// Replace the system prompt template. `{format_instructions}` is filled in.
    pub fn with_system_prompt(mut self, template: &str) -> Self {
        self.system_prompt = render_system_prompt(template);
        self
    }

    pub fn model(&self) -> &str {
        &self.model
    }

    pub fn max_iterations(&self) -> u32 {
        self.max_iterations
    }

    pub fn tools(&self) -> &ToolRegistry {
        &self.tools
    }

    pub fn system_prompt(&self) -> &str {
        &self.system_prompt
    }

    /// Drive one query to completion.
    pub async fn run(&self, query: &str, observer: &dyn AgentObserver) -> AgentRun {
        let mut transcript = Transcript::new(self.system_prompt.clone(), query);
        let tool_defs = self.tools.get_definitions();
        let mut steps: Vec<(AgentAction, String)> = Vec::new();

        info!(
            model = %self.model,
            provider = self.provider.display_name(),
            tools = tool_defs.len(),
            max_iterations = self.max_iterations,
            "agent run started"
        );

        for iteration in 1..=self.max_iterations {
            debug!(iteration, messages = transcript.len(), "LLM call");

            let response = self
                .provider
                .chat(transcript.messages(), Some(&tool_defs), &self.model, &self.request_config)
                .await;

            if response.is_error() {
                let message = response.content.unwrap_or_default();
                warn!(iteration, error = %message, "provider call failed");
                return AgentRun {
                    input: query.to_string(),
                    output: AgentOutput::Text(message),
                    stop_reason: StopReason::ProviderError,
                    iterations: iteration,
                    intermediate_steps: steps,
                    transcript,
                };
            }

            if response.has_tool_calls() {
                let tool_calls = response.tool_calls.clone();
                transcript.push_tool_calls(response.content.clone(), tool_calls.clone());

                for tc in &tool_calls {
                    let output = self.execute_call(tc, iteration, observer, &mut steps).await;
                    transcript.push_tool_result(&tc.id, &output);
                }
                continue;
            }

            if response.is_empty() {
                warn!(iteration, "model returned an empty turn");
                transcript.push_observation(INCOMPLETE_RESPONSE_OBSERVATION);
                continue;
            }

            let text = response.content.unwrap_or_default();
            transcript.push_answer(&text);
            let output = match response.blocks {
                Some(blocks) if !blocks.is_empty() => AgentOutput::Blocks(blocks),
                _ => AgentOutput::Text(text),
            };

            info!(iterations = iteration, steps = steps.len(), "agent run finished");
            return AgentRun {
                input: query.to_string(),
                output,
                stop_reason: StopReason::Finished,
                iterations: iteration,
                intermediate_steps: steps,
                transcript,
            };
        }

        warn!(max_iterations = self.max_iterations, "iteration limit reached");
        let output = transcript
            .last_assistant_text()
            .unwrap_or(ITERATION_LIMIT_OUTPUT)
            .to_string();
        AgentRun {
            input: query.to_string(),
            output: AgentOutput::Text(output),
            stop_reason: StopReason::IterationLimit,
            iterations: self.max_iterations,
            intermediate_steps: steps,
            transcript,
        }
    }

    /// Run one requested tool call and return the text fed back to the model.
    async fn execute_call(
        &self,
        tc: &ToolCall,
        iteration: u32,
        observer: &dyn AgentObserver,
        steps: &mut Vec<(AgentAction, String)>,
    ) -> String {
        let params = match parse_arguments(&tc.function.arguments) {
            Ok(params) => params,
            Err(observation) => {
                warn!(tool = %tc.function.name, iteration, "malformed tool arguments");
                let action = AgentAction {
                    tool_name: tc.function.name.clone(),
                    tool_input: Value::String(tc.function.arguments.clone()),
                    call_id: tc.id.clone(),
                };
                observer.on_agent_action(&action);
                observer.on_tool_end(&observation);
                steps.push((action, observation.clone()));
                return observation;
            }
        };

        let action = AgentAction {
            tool_name: tc.function.name.clone(),
            tool_input: Value::Object(params.clone().into_iter().collect()),
            call_id: tc.id.clone(),
        };
        observer.on_agent_action(&action);

        info!(tool = %tc.function.name, iteration, "executing tool call");
        let output = self.tools.execute(&tc.function.name, params).await;
        debug!(tool = %tc.function.name, result_len = output.len(), "tool result");

        observer.on_tool_end(&output);
        steps.push((action, output.clone()));
        output
    }
}

/// Parse a tool call's argument string into a parameter map.
///
/// An empty string means no arguments. Anything that is not a JSON object is
/// reported back as an observation.
fn parse_arguments(raw: &str) -> Result<HashMap<String, Value>, String> {
    if raw.trim().is_empty() {
        return Ok(HashMap::new());
    }
    match serde_json::from_str::<Value>(raw) {
        Ok(Value::Object(map)) => Ok(map.into_iter().collect()),
        Ok(other) => Err(format!(
            "Invalid Format: tool arguments must be a JSON object, got: {other}"
        )),
        Err(e) => Err(format!("Invalid Format: could not parse tool arguments: {e}")),
    }
}

// ─────────────────────────────────────────────
// Tests
// ─────────────────────────────────────────────

#[cfg(test)]
pub(crate) mod tests {
    use super::*;
    use std::sync::Mutex;

    use async_trait::async_trait;
    use scholar_core::types::{LlmResponse, Message, ToolDefinition};
    use serde_json::json;

    use crate::observer::NoopObserver;
    use crate::tools::Tool;

    /// A mock LLM provider that replays canned responses.
    pub(crate) struct MockProvider {
        responses: Mutex<Vec<LlmResponse>>,
        /// Fallback once the script runs out; `None` repeats nothing and answers text.
        repeat: Option<LlmResponse>,
        pub(crate) calls: Mutex<Vec<Vec<Message>>>,
    }

    impl MockProvider {
        pub(crate) fn new(responses: Vec<LlmResponse>) -> Self {
            Self {
                responses: Mutex::new(responses),
                repeat: None,
                calls: Mutex::new(Vec::new()),
            }
        }

        pub(crate) fn simple(text: &str) -> Self {
            Self::new(vec![text_response(text)])
        }

        /// Answer every call with the same response.
        pub(crate) fn always(response: LlmResponse) -> Self {
            Self {
                responses: Mutex::new(Vec::new()),
                repeat: Some(response),
                calls: Mutex::new(Vec::new()),
            }
        }

        pub(crate) fn call_count(&self) -> usize {
            self.calls.lock().unwrap().len()
        }
    }

    #[async_trait]
    impl LlmProvider for MockProvider {
        async fn chat(
            &self,
            messages: &[Message],
            _tools: Option<&[ToolDefinition]>,
            _model: &str,
            _config: &LlmRequestConfig,
        ) -> LlmResponse {
            self.calls.lock().unwrap().push(messages.to_vec());
            let mut responses = self.responses.lock().unwrap();
            if !responses.is_empty() {
                return responses.remove(0);
            }
            self.repeat
                .clone()
                .unwrap_or_else(|| text_response("(no more responses)"))
        }

        fn default_model(&self) -> &str {
            "mock-model"
        }

        fn display_name(&self) -> &str {
            "MockProvider"
        }
    }

    pub(crate) fn text_response(text: &str) -> LlmResponse {
        LlmResponse {
            content: Some(text.into()),
            ..Default::default()
        }
    }

    pub(crate) fn tool_response(calls: Vec<ToolCall>) -> LlmResponse {
        LlmResponse {
            tool_calls: calls,
            ..Default::default()
        }
    }

    /// Echoes its `text` argument.
    pub(crate) struct EchoTool;

    #[async_trait]
    impl Tool for EchoTool {
        fn name(&self) -> &str {
            "echo"
        }
        fn description(&self) -> &str {
            "Echoes back the input"
        }
        fn parameters(&self) -> Value {
            json!({"type": "object", "properties": {"text": {"type": "string"}}, "required": ["text"]})
        }
        async fn execute(&self, params: HashMap<String, Value>) -> anyhow::Result<String> {
            Ok(format!("Echo: {}", crate::tools::require_string(&params, "text")?))
        }
    }

    pub(crate) fn echo_registry() -> Arc<ToolRegistry> {
        let mut reg = ToolRegistry::new();
        reg.register(Arc::new(EchoTool)).unwrap();
        Arc::new(reg)
    }

    /// Records every observer callback.
    #[derive(Default)]
    struct RecordingObserver {
        events: Mutex<Vec<String>>,
    }

    impl AgentObserver for RecordingObserver {
        fn on_agent_action(&self, action: &AgentAction) {
            self.events
                .lock()
                .unwrap()
                .push(format!("action:{}:{}", action.tool_name, action.tool_input));
        }

        fn on_tool_end(&self, output: &str) {
            self.events.lock().unwrap().push(format!("end:{output}"));
        }
    }

    fn agent(provider: Arc<MockProvider>) -> ResearchAgent {
        ResearchAgent::new(provider, "mock-model", echo_registry())
    }

    #[tokio::test]
    async fn test_simple_answer() {
        let provider = Arc::new(MockProvider::simple("<result>{}</result>"));
        let run = agent(provider.clone()).run("Topic", &NoopObserver).await;

        assert_eq!(run.stop_reason, StopReason::Finished);
        assert_eq!(run.output, AgentOutput::Text("<result>{}</result>".into()));
        assert_eq!(run.iterations, 1);
        assert_eq!(run.transcript.len(), 3);
        assert_eq!(provider.call_count(), 1);

        let first_call = &provider.calls.lock().unwrap()[0];
        assert!(matches!(&first_call[0], Message::System { content } if content.contains("<result>")));
        assert_eq!(first_call[1], Message::user("Topic"));
    }

    #[tokio::test]
    async fn test_tool_round_trip_with_observer() {
        let provider = Arc::new(MockProvider::new(vec![
            tool_response(vec![
                ToolCall::new("c1", "echo", r#"{"text":"one"}"#),
                ToolCall::new("c2", "echo", r#"{"text":"two"}"#),
            ]),
            text_response("done"),
        ]));
        let observer = RecordingObserver::default();
        let run = agent(provider.clone()).run("q", &observer).await;

        assert_eq!(run.stop_reason, StopReason::Finished);
        assert_eq!(run.iterations, 2);
        assert_eq!(
            *observer.events.lock().unwrap(),
            vec![
                r#"action:echo:{"text":"one"}"#.to_string(),
                "end:Echo: one".to_string(),
                r#"action:echo:{"text":"two"}"#.to_string(),
                "end:Echo: two".to_string(),
            ]
        );
        assert_eq!(run.intermediate_steps.len(), 2);
        assert_eq!(run.intermediate_steps[1].1, "Echo: two");

        // Second call sees assistant tool calls then both results in order.
        let second = &provider.calls.lock().unwrap()[1];
        assert_eq!(second.len(), 5);
        assert_eq!(second[3], Message::tool_result("c1", "Echo: one"));
        assert_eq!(second[4], Message::tool_result("c2", "Echo: two"));
    }

    #[tokio::test]
    async fn test_unknown_tool_is_recoverable() {
        let provider = Arc::new(MockProvider::new(vec![
            tool_response(vec![ToolCall::new("c1", "nope", "{}")]),
            text_response("final"),
        ]));
        let run = agent(provider.clone()).run("q", &NoopObserver).await;

        assert_eq!(run.stop_reason, StopReason::Finished);
        assert_eq!(
            run.intermediate_steps[0].1,
            "Error: Tool 'nope' not found. Available tools: echo"
        );
    }

    #[tokio::test]
    async fn test_malformed_arguments_recorded_as_observation() {
        let provider = Arc::new(MockProvider::new(vec![
            tool_response(vec![ToolCall::new("c1", "echo", "not json")]),
            tool_response(vec![ToolCall::new("c2", "echo", "[1, 2]")]),
            text_response("final"),
        ]));
        let observer = RecordingObserver::default();
        let run = agent(provider.clone()).run("q", &observer).await;

        assert_eq!(run.stop_reason, StopReason::Finished);
        let events = observer.events.lock().unwrap().clone();
        assert_eq!(events.len(), 4);
        assert_eq!(events[0], "action:echo:\"not json\"");
        assert!(events[1].starts_with("end:Invalid Format: could not parse tool arguments"));
        assert_eq!(events[2], "action:echo:\"[1, 2]\"");
        assert!(events[3].starts_with("end:Invalid Format: tool arguments must be a JSON object"));

        assert_eq!(run.intermediate_steps.len(), 2);
        assert_eq!(run.intermediate_steps[0].0.call_id, "c1");
        assert_eq!(run.intermediate_steps[0].0.tool_input, Value::String("not json".into()));
        assert!(run.intermediate_steps[1].1.starts_with("Invalid Format"));

        let third = &provider.calls.lock().unwrap()[2];
        match (&third[3], &third[5]) {
            (Message::Tool { content: a, .. }, Message::Tool { content: b, .. }) => {
                assert!(a.starts_with("Invalid Format: could not parse tool arguments"));
                assert!(b.starts_with("Invalid Format: tool arguments must be a JSON object"));
            }
            other => panic!("unexpected messages: {other:?}"),
        }
    }

    #[tokio::test]
    async fn test_empty_turn_recorded_and_loop_continues() {
        let provider = Arc::new(MockProvider::new(vec![
            LlmResponse::default(),
            text_response("final"),
        ]));
        let run = agent(provider.clone()).run("q", &NoopObserver).await;

        assert_eq!(run.stop_reason, StopReason::Finished);
        assert_eq!(run.iterations, 2);
        let second = &provider.calls.lock().unwrap()[1];
        assert_eq!(second[2], Message::user(INCOMPLETE_RESPONSE_OBSERVATION));
    }

    #[tokio::test]
    async fn test_provider_error_fails_run() {
        let provider = Arc::new(MockProvider::new(vec![LlmResponse::error(
            "Error calling LLM: 401 Unauthorized",
        )]));
        let run = agent(provider).run("q", &NoopObserver).await;

        assert_eq!(run.stop_reason, StopReason::ProviderError);
        assert_eq!(run.output, AgentOutput::Text("Error calling LLM: 401 Unauthorized".into()));
    }

    #[tokio::test]
    async fn test_never_stopping_model_hits_exactly_ten_round_trips() {
        let provider = Arc::new(MockProvider::always(tool_response(vec![ToolCall::new(
            "loop",
            "echo",
            r#"{"text":"again"}"#,
        )])));
        let run = agent(provider.clone()).run("loop forever", &NoopObserver).await;

        assert_eq!(provider.call_count(), 10);
        assert_eq!(run.iterations, 10);
        assert_eq!(run.stop_reason, StopReason::IterationLimit);
        assert_eq!(run.output, AgentOutput::Text(ITERATION_LIMIT_OUTPUT.into()));
        assert_eq!(run.intermediate_steps.len(), 10);
    }

    #[tokio::test]
    async fn test_iteration_limit_returns_last_assistant_text() {
        let mut response = tool_response(vec![ToolCall::new("c", "echo", r#"{"text":"x"}"#)]);
        response.content = Some("Still digging.".into());
        let provider = Arc::new(MockProvider::always(response));
        let run = agent(provider.clone())
            .with_max_iterations(3)
            .run("q", &NoopObserver)
            .await;

        assert_eq!(provider.call_count(), 3);
        assert_eq!(run.output, AgentOutput::Text("Still digging.".into()));
    }

    #[tokio::test]
    async fn test_blocks_kept_for_block_providers() {
        let blocks = vec![json!({ "type": "text", "text": "<result>{}</result>" })];
        let provider = Arc::new(MockProvider::new(vec![LlmResponse {
            content: Some("<result>{}</result>".into()),
            blocks: Some(blocks.clone()),
            ..Default::default()
        }]));
        let run = agent(provider).run("q", &NoopObserver).await;
        assert_eq!(run.output, AgentOutput::Blocks(blocks));
    }

    #[test]
    fn test_parse_arguments() {
        assert!(parse_arguments("").unwrap().is_empty());
        assert_eq!(parse_arguments(r#"{"a":1}"#).unwrap()["a"], json!(1));
        assert!(parse_arguments("42").is_err());
    }

    #[test]
    fn test_from_handle_uses_settings() {
        let mut config = scholar_core::config::Config::default();
        config.providers.openai.api_key = "sk-test".into();
        config.agent.max_iterations = 4;
        let handle = scholar_providers::select("openai", None, &config).unwrap();
        let agent = ResearchAgent::from_handle(&handle, echo_registry(), &config.agent);
        assert_eq!(agent.model(), "gpt-4o");
        assert_eq!(agent.max_iterations(), 4);
        assert!(agent.system_prompt().contains("\"tools_used\""));
    }

    #[tokio::test]
    async fn test_custom_system_prompt_starts_transcript() {
        let agent = ResearchAgent::new(Arc::new(MockProvider::simple("ok")), "m", echo_registry())
            .with_system_prompt("Be brief.\n{format_instructions}");
        assert!(agent.system_prompt().starts_with("Be brief.\n"));
        assert!(!agent.system_prompt().contains("{format_instructions}"));

        let run = agent.run("q", &NoopObserver).await;
        assert_eq!(
            run.transcript.messages()[0].text(),
            Some(agent.system_prompt())
        );
    }

    #[test]
    fn test_run_display() {
        let run = AgentRun {
            input: "q".into(),
            output: AgentOutput::Text("out".into()),
            stop_reason: StopReason::Finished,
            iterations: 1,
            intermediate_steps: vec![],
            transcript: Transcript::new("s", "q"),
        };
        assert_eq!(run.to_string(), "input: q\nstop_reason: finished\niterations: 1\noutput: out");
    }
}
