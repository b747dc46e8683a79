//! Web search through the DuckDuckGo HTML endpoint.
//!
//! No API key is needed. Results are scraped from the lite HTML page: each hit
//! is a `result__a` anchor (title + redirect link) followed by a
//! `result__snippet` anchor.

use std::collections::HashMap;
use std::sync::LazyLock;
use std::time::Duration;

use async_trait::async_trait;
use regex::Regex;
use reqwest::{Client, Url};
use serde_json::{json, Value};
use tracing::debug;

use scholar_core::config::schema::SearchConfig;

use super::base::{optional_i64, require_string, Tool};

/// User-Agent header. The HTML endpoint rejects clients without one.
const USER_AGENT: &str =
    "Mozilla/5.0 (Macintosh; Intel Mac OS X 14_7_2) AppleWebKit/537.36 (KHTML, like Gecko)";

const DEFAULT_BASE_URL: &str = "https://html.duckduckgo.com";

/// Upper bound on results per call, whatever the model asks for.
const MAX_RESULTS_CAP: usize = 10;

const NO_RESULTS: &str = "No good DuckDuckGo Search Result was found";

static RESULT_LINK: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r#"(?s)<a([^>]*class="result__a"[^>]*)>(.*?)</a>"#).expect("valid result link regex")
});
static RESULT_SNIPPET: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r#"(?s)<a[^>]*class="result__snippet"[^>]*>(.*?)</a>"#).expect("valid snippet regex")
});
static HREF: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r#"href="([^"]*)""#).expect("valid href regex"));
static TAG: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"<[^>]+>").expect("valid tag regex"));

// ─────────────────────────────────────────────
// SearchTool
// ─────────────────────────────────────────────

/// Searches the web with DuckDuckGo.
pub struct SearchTool {
    client: Client,
    base_url: String,
    max_results: usize,
}

impl SearchTool {
    pub fn new(config: &SearchConfig, timeout: Duration) -> Self {
        Self {
            client: Client::builder()
                .user_agent(USER_AGENT)
                .timeout(timeout)
                .build()
                .unwrap_or_default(),
            base_url: DEFAULT_BASE_URL.to_string(),
            max_results: (config.max_results as usize).clamp(1, MAX_RESULTS_CAP),
        }
    }

    /// Point the tool at another host (used by tests).
    pub fn with_base_url(mut self, base_url: impl Into<String>) -> Self {
        self.base_url = base_url.into();
        self
    }

    fn search_url(&self) -> String {
        format!("{}/html/", self.base_url.trim_end_matches('/'))
    }
}

/// One parsed search hit.
#[derive(Debug, PartialEq)]
struct SearchHit {
    title: String,
    url: String,
    snippet: String,
}

/// Extract hits from a DuckDuckGo HTML result page.
///
/// A snippet belongs to the link before it; results without one get an
/// empty snippet.
fn parse_results(html: &str, limit: usize) -> Vec<SearchHit> {
    let links: Vec<_> = RESULT_LINK.captures_iter(html).collect();

    links
        .iter()
        .enumerate()
        .filter_map(|(i, c)| {
            let href = HREF.captures(&c[1])?.get(1)?.as_str();
            let section_start = c.get(0)?.end();
            let section_end = links
                .get(i + 1)
                .and_then(|next| next.get(0))
                .map_or(html.len(), |m| m.start());
            let snippet = RESULT_SNIPPET
                .captures(&html[section_start..section_end])
                .map(|s| clean_text(&s[1]))
                .unwrap_or_default();
            Some(SearchHit {
                title: clean_text(&c[2]),
                url: resolve_link(&decode_entities(href)),
                snippet,
            })
        })
        .take(limit)
        .collect()
}

/// Unwrap DuckDuckGo's `/l/?uddg=<target>` redirect links.
fn resolve_link(href: &str) -> String {
    let absolute = if href.starts_with("//") {
        format!("https:{href}")
    } else {
        href.to_string()
    };
    Url::parse(&absolute)
        .ok()
        .and_then(|url| {
            url.query_pairs()
                .find(|(k, _)| k == "uddg")
                .map(|(_, v)| v.into_owned())
        })
        .unwrap_or(absolute)
}

/// Strip tags, decode common entities and collapse whitespace.
fn clean_text(fragment: &str) -> String {
    let text = decode_entities(&TAG.replace_all(fragment, ""));
    text.split_whitespace().collect::<Vec<_>>().join(" ")
}

fn decode_entities(s: &str) -> String {
    s.replace("&amp;", "&")
        .replace("&lt;", "<")
        .replace("&gt;", ">")
        .replace("&quot;", "\"")
        .replace("&#x27;", "'")
        .replace("&#39;", "'")
        .replace("&nbsp;", " ")
}

fn format_results(hits: &[SearchHit]) -> String {
    hits.iter()
        .enumerate()
        .map(|(i, h)| format!("{}. {}\n   {}\n   {}", i + 1, h.title, h.url, h.snippet))
        .collect::<Vec<_>>()
        .join("\n\n")
}

#[async_trait]
impl Tool for SearchTool {
    fn name(&self) -> &str {
        "search_tool"
    }

    fn description(&self) -> &str {
        "Search the web for information using DuckDuckGo. Returns a numbered list of results with titles, URLs, and snippets."
    }

    fn parameters(&self) -> Value {
        json!({
            "type": "object",
            "properties": {
                "query": {
                    "type": "string",
                    "description": "The search query string."
                },
                "max_results": {
                    "type": "integer",
                    "description": "Number of results (1-10)",
                    "minimum": 1,
                    "maximum": 10
                }
            },
            "required": ["query"]
        })
    }

    async fn execute(&self, params: HashMap<String, Value>) -> anyhow::Result<String> {
        let query = require_string(&params, "query")?;
        let limit = optional_i64(&params, "max_results")
            .map(|n| (n.max(1) as usize).min(MAX_RESULTS_CAP))
            .unwrap_or(self.max_results);

        debug!(query = %query, limit, "searching DuckDuckGo");

        let resp = self
            .client
            .get(self.search_url())
            .query(&[("q", query.as_str())])
            .send()
            .await
            .map_err(|e| anyhow::anyhow!("DuckDuckGo request failed: {e}"))?;

        if !resp.status().is_success() {
            let status = resp.status();
            anyhow::bail!("DuckDuckGo returned {status}");
        }

        let html = resp
            .text()
            .await
            .map_err(|e| anyhow::anyhow!("Failed to read DuckDuckGo response: {e}"))?;

        let hits = parse_results(&html, limit);
        if hits.is_empty() {
            return Ok(NO_RESULTS.into());
        }
        Ok(format_results(&hits))
    }
}

// ─────────────────────────────────────────────
// Tests
// ─────────────────────────────────────────────
