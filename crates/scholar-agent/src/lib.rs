//! Scholar Agent — the research loop, its tools, and the response contract.
//!
//! This crate contains:
//! - **tools**: Tool trait, ordered registry, and the research tools (search, Wikipedia, save)
//! - **agent_loop**: The model ↔ tool-calling loop
//! - **response**: Extraction and validation of the structured answer
//! - **research**: The end-to-end pipeline used by the CLI

pub mod agent_loop;
pub mod observer;
pub mod prompt;
pub mod research;
pub mod response;
pub mod tools;
pub mod transcript;

pub use agent_loop::{AgentRun, ResearchAgent, StopReason};
pub use observer::{AgentAction, AgentObserver, NoopObserver};
pub use research::{run_research, ResearchError, ResearchOutcome};
pub use response::{extract, parse_response, AgentOutput, ResearchResponse, SchemaParseError};
pub use tools::{default_registry, RegistryError, Tool, ToolRegistry};
pub use transcript::Transcript;
