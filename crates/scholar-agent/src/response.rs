//! The structured research answer, and how it is pulled out of a model transcript.
//!
//! Extraction is pure string work on the final agent output. Validation parses
//! the extracted candidate into a [`ResearchResponse`], tolerating the usual
//! wrappers models put around JSON.

use std::fmt;
use std::sync::LazyLock;

use regex::Regex;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use thiserror::Error;

static RESULT_TAG: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(?s)<result>(.*?)(?:</result>|$)").expect("valid result tag regex")
});
static CODE_FENCE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(?s)^```[A-Za-z]*\s*\n?(.*?)\n?\s*```$").expect("valid code fence regex")
});

// ─────────────────────────────────────────────
// ResearchResponse
// ─────────────────────────────────────────────

/// The validated answer to one research query.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct ResearchResponse {
    topic: String,
    summary: String,
    sources: Vec<String>,
    tools_used: Vec<String>,
}

impl ResearchResponse {
    pub fn new(
        topic: impl Into<String>,
        summary: impl Into<String>,
        sources: Vec<String>,
        tools_used: Vec<String>,
    ) -> Self {
        Self {
            topic: topic.into(),
            summary: summary.into(),
            sources,
            tools_used,
        }
    }

    /// The main topic of the research.
    pub fn topic(&self) -> &str {
        &self.topic
    }

    /// A comprehensive summary of the findings.
    pub fn summary(&self) -> &str {
        &self.summary
    }

    /// Sources used, in the order the model listed them.
    pub fn sources(&self) -> &[String] {
        &self.sources
    }

    /// Tools the agent reports having used.
    pub fn tools_used(&self) -> &[String] {
        &self.tools_used
    }
}

// ─────────────────────────────────────────────
// AgentOutput
// ─────────────────────────────────────────────

/// Final output of an agent run, in whichever shape the provider produced.
#[derive(Clone, Debug, PartialEq)]
pub enum AgentOutput {
    /// A plain string answer.
    Text(String),
    /// A list of content blocks (Anthropic Messages API).
    Blocks(Vec<Value>),
}

impl AgentOutput {
    /// Collapse the output to the string that should hold the payload.
    pub fn normalize(&self) -> String {
        match self {
            AgentOutput::Text(text) => text.clone(),
            AgentOutput::Blocks(blocks) => match blocks.first() {
                Some(first) => match first.get("text").and_then(Value::as_str) {
                    Some(text) => text.to_string(),
                    None => match first {
                        Value::String(s) => s.clone(),
                        other => other.to_string(),
                    },
                },
                None => Value::Array(Vec::new()).to_string(),
            },
        }
    }
}

impl fmt::Display for AgentOutput {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            AgentOutput::Text(text) => f.write_str(text),
            AgentOutput::Blocks(blocks) => {
                let rendered = serde_json::to_string_pretty(blocks).map_err(|_| fmt::Error)?;
                f.write_str(&rendered)
            }
        }
    }
}

impl From<&str> for AgentOutput {
    fn from(text: &str) -> Self {
        AgentOutput::Text(text.to_string())
    }
}

// ─────────────────────────────────────────────
// Extraction
// ─────────────────────────────────────────────

/// Isolate the candidate payload from the agent's final output.
///
/// Takes the content of the first `<result>` region (an unterminated region
/// runs to the end). Without a tag the whole normalized output is used.
pub fn extract(output: &AgentOutput) -> String {
    let text = output.normalize();
    match RESULT_TAG.captures(&text) {
        Some(caps) => caps[1].trim().to_string(),
        None => text.trim().to_string(),
    }
}

// ─────────────────────────────────────────────
// Validation
// ─────────────────────────────────────────────

/// The candidate text could not be parsed into a [`ResearchResponse`].
#[derive(Debug, Error)]
#[error("Failed to parse structured response: {cause}. Raw text: {text}")]
pub struct SchemaParseError {
    /// What the JSON parser reported.
    pub cause: String,
    /// The candidate exactly as it was given.
    pub text: String,
}

/// Parse a candidate into a response.
///
/// Tried in order: the trimmed text, the inside of a Markdown code fence, and
/// then each `{` in turn as the start of an object, taking the first that
/// deserializes. Braces in surrounding prose are skipped over.
pub fn parse_response(candidate: &str) -> Result<ResearchResponse, SchemaParseError> {
    let trimmed = candidate.trim();

    let mut best_err = match serde_json::from_str::<ResearchResponse>(trimmed) {
        Ok(resp) => return Ok(resp),
        Err(e) => e,
    };

    let fenced = CODE_FENCE
        .captures(trimmed)
        .and_then(|c| c.get(1))
        .map(|m| m.as_str().trim())
        .filter(|inner| *inner != trimmed);
    if let Some(inner) = fenced {
        match serde_json::from_str::<ResearchResponse>(inner) {
            Ok(resp) => return Ok(resp),
            Err(e) if is_syntax_error(&best_err) => best_err = e,
            Err(_) => {}
        }
    }

    for (start, _) in trimmed.match_indices('{') {
        let mut stream =
            serde_json::Deserializer::from_str(&trimmed[start..]).into_iter::<ResearchResponse>();
        match stream.next() {
            Some(Ok(resp)) => return Ok(resp),
            // A schema error on real JSON says more than a syntax error on prose.
            Some(Err(e)) if e.is_data() && is_syntax_error(&best_err) => best_err = e,
            _ => {}
        }
    }

    Err(SchemaParseError {
        cause: best_err.to_string(),
        text: candidate.to_string(),
    })
}

fn is_syntax_error(err: &serde_json::Error) -> bool {
    err.is_syntax() || err.is_eof()
}
