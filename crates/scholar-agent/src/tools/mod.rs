//! Tool modules for the research agent.

pub mod base;
pub mod registry;
pub mod save;
pub mod search;
pub mod wikipedia;

use std::sync::Arc;
use std::time::Duration;

use scholar_core::config::Config;

pub use base::{optional_i64, optional_string, require_string, Tool};
pub use registry::{RegistryError, ToolRegistry};
pub use save::{Clock, FixedClock, SaveTool, SystemClock};
pub use search::SearchTool;
pub use wikipedia::WikipediaTool;

/// Build the standard research toolset: web search, Wikipedia, file save.
pub fn default_registry(config: &Config) -> Result<ToolRegistry, RegistryError> {
    let timeout = Duration::from_secs(config.agent.timeout);
    let mut registry = ToolRegistry::new();
    registry.register(Arc::new(SearchTool::new(&config.tools.search, timeout)))?;
    registry.register(Arc::new(WikipediaTool::new(&config.tools.wikipedia, timeout)))?;
    registry.register(Arc::new(SaveTool::new(&config.tools.save)))?;
    Ok(registry)
}
