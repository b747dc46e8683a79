//! Research pipeline: select a client, run the agent, extract and validate.

use std::sync::Arc;

use thiserror::Error;
use tracing::{info, warn};

use scholar_core::config::Config;
use scholar_providers::{select, ConfigurationError};

use crate::agent_loop::{AgentRun, ResearchAgent};
use crate::observer::AgentObserver;
use crate::response::{extract, parse_response, ResearchResponse, SchemaParseError};
use crate::tools::{default_registry, RegistryError};

/// Errors that end a research request.
#[derive(Debug, Error)]
pub enum ResearchError {
    /// Provider selection failed before any run started.
    #[error(transparent)]
    Configuration(#[from] ConfigurationError),

    /// The toolset could not be assembled.
    #[error(transparent)]
    Tools(#[from] RegistryError),

    /// The run completed but its output did not validate.
    #[error("{source}")]
    Parse {
        source: SchemaParseError,
        /// The run that produced the unparseable output.
        run: Box<AgentRun>,
    },
}

impl ResearchError {
    /// The agent run behind this error, when one happened.
    pub fn run(&self) -> Option<&AgentRun> {
        match self {
            ResearchError::Parse { run, .. } => Some(run),
            _ => None,
        }
    }
}

/// A validated response together with the run that produced it.
#[derive(Clone, Debug)]
pub struct ResearchOutcome {
    pub response: ResearchResponse,
    pub run: AgentRun,
}

impl ResearchAgent {
    /// Run a query and validate the structured answer.
    pub async fn research(
        &self,
        query: &str,
        observer: &dyn AgentObserver,
    ) -> Result<ResearchOutcome, ResearchError> {
        let run = self.run(query, observer).await;
        let candidate = extract(&run.output);

        match parse_response(&candidate) {
            Ok(response) => {
                info!(topic = response.topic(), sources = response.sources().len(), "research complete");
                Ok(ResearchOutcome { response, run })
            }
            Err(source) => {
                warn!(stop_reason = %run.stop_reason, "structured response failed validation");
                Err(ResearchError::Parse {
                    source,
                    run: Box::new(run),
                })
            }
        }
    }
}

/// Answer `query` with the provider and tools described by `config`.
pub async fn run_research(
    config: &Config,
    query: &str,
    observer: &dyn AgentObserver,
) -> Result<ResearchOutcome, ResearchError> {
    let handle = select(&config.agent.provider, config.agent.model.as_deref(), config)?;
    let tools = Arc::new(default_registry(config)?);
    let agent = ResearchAgent::from_handle(&handle, tools, &config.agent);

    info!(provider = %handle.kind(), model = handle.model(), "starting research");
    agent.research(query, observer).await
}
