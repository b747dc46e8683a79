//! Wikipedia lookup through the MediaWiki action API.
//!
//! Searches for the top pages matching a query and returns their plain-text
//! intro extracts. Failures never escape as errors: they come back as a
//! normal result string so the model can read them.

use std::collections::HashMap;
use std::time::Duration;

use async_trait::async_trait;
use reqwest::Client;
use serde::Deserialize;
use serde_json::{json, Value};
use tracing::{debug, warn};

use scholar_core::config::schema::WikipediaConfig;
use scholar_core::utils::take_chars;

use super::base::{require_string, Tool};

const NO_RESULTS: &str = "No good Wikipedia Search Result was found";

// ─────────────────────────────────────────────
// API response shapes
// ─────────────────────────────────────────────

#[derive(Debug, Deserialize)]
struct SearchResponse {
    query: SearchQuery,
}

#[derive(Debug, Deserialize)]
struct SearchQuery {
    #[serde(default)]
    search: Vec<SearchEntry>,
}

#[derive(Debug, Deserialize)]
struct SearchEntry {
    title: String,
}

#[derive(Debug, Deserialize)]
struct ExtractResponse {
    query: ExtractQuery,
}

#[derive(Debug, Deserialize)]
struct ExtractQuery {
    #[serde(default)]
    pages: HashMap<String, PageExtract>,
}

#[derive(Debug, Deserialize)]
struct PageExtract {
    title: String,
    #[serde(default)]
    extract: Option<String>,
}

// ─────────────────────────────────────────────
// WikipediaTool
// ─────────────────────────────────────────────

/// Looks topics up on Wikipedia.
pub struct WikipediaTool {
    client: Client,
    api_url: String,
    top_k_results: usize,
    doc_content_chars_max: usize,
}

impl WikipediaTool {
    pub fn new(config: &WikipediaConfig, timeout: Duration) -> Self {
        Self {
            client: Client::builder().timeout(timeout).build().unwrap_or_default(),
            api_url: format!("https://{}.wikipedia.org/w/api.php", config.language),
            top_k_results: config.top_k_results.max(1) as usize,
            doc_content_chars_max: config.doc_content_chars_max as usize,
        }
    }

    /// Point the tool at another API endpoint (used by tests).
    pub fn with_api_url(mut self, api_url: impl Into<String>) -> Self {
        self.api_url = api_url.into();
        self
    }

    async fn lookup(&self, query: &str) -> anyhow::Result<String> {
        let limit = self.top_k_results.to_string();
        let search: SearchResponse = self
            .client
            .get(&self.api_url)
            .query(&[
                ("action", "query"),
                ("list", "search"),
                ("srsearch", query),
                ("srlimit", limit.as_str()),
                ("format", "json"),
            ])
            .send()
            .await?
            .error_for_status()?
            .json()
            .await?;

        let mut summaries = Vec::new();
        for entry in search.query.search.iter().take(self.top_k_results) {
            if let Some(summary) = self.page_summary(&entry.title).await? {
                summaries.push(summary);
            }
        }

        if summaries.is_empty() {
            return Ok(NO_RESULTS.into());
        }
        Ok(take_chars(&summaries.join("\n\n"), self.doc_content_chars_max))
    }

    async fn page_summary(&self, title: &str) -> anyhow::Result<Option<String>> {
        let resp: ExtractResponse = self
            .client
            .get(&self.api_url)
            .query(&[
                ("action", "query"),
                ("prop", "extracts"),
                ("exintro", "1"),
                ("explaintext", "1"),
                ("redirects", "1"),
                ("titles", title),
                ("format", "json"),
            ])
            .send()
            .await?
            .error_for_status()?
            .json()
            .await?;

        Ok(resp.query.pages.into_values().next().and_then(|page| {
            page.extract
                .filter(|e| !e.trim().is_empty())
                .map(|extract| format!("Page: {}\nSummary: {}", page.title, extract.trim()))
        }))
    }
}

/// Strip surrounding whitespace and any quote characters.
fn clean_query(query: &str) -> String {
    query.trim().replace(['"', '\''], "")
}

#[async_trait]
impl Tool for WikipediaTool {
    fn name(&self) -> &str {
        "wikipedia_tool"
    }

    fn description(&self) -> &str {
        "Search Wikipedia for a specific topic. Provides a concise summary of the top result."
    }

    fn parameters(&self) -> Value {
        json!({
            "type": "object",
            "properties": {
                "query": {
                    "type": "string",
                    "description": "The topic to search for."
                }
            },
            "required": ["query"]
        })
    }

    async fn execute(&self, params: HashMap<String, Value>) -> anyhow::Result<String> {
        let query = match require_string(&params, "query") {
            Ok(q) => clean_query(&q),
            Err(e) => return Ok(format!("Error searching Wikipedia: {e}")),
        };

        debug!(query = %query, "searching Wikipedia");

        match self.lookup(&query).await {
            Ok(out) => Ok(out),
            Err(e) => {
                warn!(error = %e, "Wikipedia lookup failed");
                Ok(format!("Error searching Wikipedia: {e}"))
            }
        }
    }

    fn may_fail(&self) -> bool {
        false
    }
}

// ─────────────────────────────────────────────
// Tests
// ─────────────────────────────────────────────
