//! Scholar CLI — entry point.
//!
//! `scholar [TOPIC]...` researches a topic with a tool-augmented language model
//! and prints a structured summary. Without a topic it prompts for one.

mod helpers;
mod prompt;

use std::path::PathBuf;
use std::process::ExitCode;

use anyhow::{Context, Result};
use clap::Parser;
use tracing::{debug, info};

use scholar_agent::{run_research, ResearchError};
use scholar_core::config::{get_config_path, load_config, save_config, Config};

use crate::helpers::ConsoleObserver;

/// Topic used when the prompt is left blank.
const DEFAULT_TOPIC: &str = "Interesting facts about the Eiffel Tower";

// ─────────────────────────────────────────────
// CLI definition
// ─────────────────────────────────────────────

/// Scholar: research a topic with a tool-using language model
#[derive(Parser)]
#[command(name = "scholar", version, about, long_about = None)]
struct Cli {
    /// Research topic. Prompted for when omitted.
    topic: Vec<String>,

    /// Config file (default: ~/.scholar/config.json)
    #[arg(short, long)]
    config: Option<PathBuf>,

    /// Model provider, overriding agent.provider ("anthropic" or "openai")
    #[arg(short, long)]
    provider: Option<String>,

    /// Model name, overriding agent.model
    #[arg(short, long)]
    model: Option<String>,

    /// Enable debug logging
    #[arg(long, default_value_t = false)]
    logs: bool,

    /// Write the effective configuration to the config file and exit
    #[arg(long, default_value_t = false)]
    init_config: bool,
}

impl Cli {
    fn apply_overrides(&self, config: &mut Config) {
        if let Some(ref provider) = self.provider {
            config.agent.provider = provider.clone();
        }
        if let Some(ref model) = self.model {
            config.agent.model = Some(model.clone());
        }
    }
}

// ─────────────────────────────────────────────
// Entrypoint
// ─────────────────────────────────────────────

#[tokio::main(flavor = "current_thread")]
async fn main() -> Result<ExitCode> {
    let cli = Cli::parse();
    init_logging(cli.logs);

    match dotenvy::dotenv() {
        Ok(path) => debug!(path = %path.display(), "loaded .env"),
        Err(e) if e.not_found() => {}
        Err(e) => return Err(anyhow::Error::new(e).context("failed to load .env")),
    }

    let mut config = load_config(cli.config.as_deref());
    cli.apply_overrides(&mut config);

    if cli.init_config {
        let path = cli.config.clone().unwrap_or_else(get_config_path);
        save_config(&config, Some(&path))
            .with_context(|| format!("failed to write config to {}", path.display()))?;
        println!("Config written to {}", path.display());
        return Ok(ExitCode::SUCCESS);
    }

    let topic = if cli.topic.is_empty() {
        prompt::prompt_topic(DEFAULT_TOPIC)?
    } else {
        cli.topic.join(" ")
    };

    Ok(research(&config, &topic, cli.logs).await)
}

/// Run one research request and print its outcome.
async fn research(config: &Config, topic: &str, show_logs: bool) -> ExitCode {
    info!(topic = %topic, provider = %config.agent.provider, "research requested");

    // Log lines and the indicator would interleave on the same terminal.
    let show_thinking = !show_logs;
    let observer = ConsoleObserver::new(show_thinking);
    if show_thinking {
        helpers::print_thinking();
    }

    let result = run_research(config, topic, &observer).await;

    if show_thinking {
        helpers::clear_thinking();
    }

    match result {
        Ok(outcome) => {
            helpers::display_agent_output(&outcome.run);
            helpers::display_structured_response(&outcome.response);
            ExitCode::SUCCESS
        }
        Err(e) => {
            report_error(&e);
            ExitCode::FAILURE
        }
    }
}

fn report_error(error: &ResearchError) {
    helpers::display_error(&error.to_string(), error.run());
}

/// Initialize tracing/logging.
fn init_logging(verbose: bool) {
    use tracing_subscriber::EnvFilter;

    let filter = if verbose {
        EnvFilter::new("scholar=debug,info")
    } else {
        EnvFilter::new("warn")
    };

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false)
        .compact()
        .init();
}
