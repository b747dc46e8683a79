//! `save_to_txt` — append research output to a text file.

use std::collections::HashMap;
use std::io::Write;
use std::path::PathBuf;
use std::sync::Arc;

use async_trait::async_trait;
use chrono::NaiveDateTime;
use serde_json::{json, Value};
use tracing::debug;

use scholar_core::config::schema::SaveConfig;
use scholar_core::utils::expand_home;

use super::base::{optional_string, require_string, Tool};

/// Timestamp layout written into each saved block.
pub const TIMESTAMP_FORMAT: &str = "%Y-%m-%d_%H:%M:%S";

// ─────────────────────────────────────────────
// Clock
// ─────────────────────────────────────────────

/// Source of the current local time.
pub trait Clock: Send + Sync {
    fn now(&self) -> NaiveDateTime;
}

/// The system's local wall clock.
#[derive(Clone, Copy, Debug, Default)]
pub struct SystemClock;

impl Clock for SystemClock {
    fn now(&self) -> NaiveDateTime {
        chrono::Local::now().naive_local()
    }
}

/// A clock stuck at one instant.
#[derive(Clone, Copy, Debug)]
pub struct FixedClock(pub NaiveDateTime);

impl Clock for FixedClock {
    fn now(&self) -> NaiveDateTime {
        self.0
    }
}

// ─────────────────────────────────────────────
// SaveTool
// ─────────────────────────────────────────────

/// Appends timestamped research blocks to a text file.
pub struct SaveTool {
    default_filename: String,
    base_dir: Option<PathBuf>,
    clock: Arc<dyn Clock>,
}

impl SaveTool {
    pub fn new(config: &SaveConfig) -> Self {
        Self {
            default_filename: config.default_filename.clone(),
            base_dir: None,
            clock: Arc::new(SystemClock),
        }
    }

    pub fn with_clock(mut self, clock: Arc<dyn Clock>) -> Self {
        self.clock = clock;
        self
    }

    /// Resolve relative filenames against `dir` instead of the working directory.
    pub fn with_base_dir(mut self, dir: impl Into<PathBuf>) -> Self {
        self.base_dir = Some(dir.into());
        self
    }

    fn resolve(&self, filename: &str) -> PathBuf {
        let path = expand_home(filename);
        match &self.base_dir {
            Some(dir) if path.is_relative() => dir.join(path),
            _ => path,
        }
    }
}

/// The block appended for one save.
pub fn format_block(data: &str, at: NaiveDateTime) -> String {
    format!(
        "--- Research Output ---\nTimestamp: {}\n\n{}\n\n",
        at.format(TIMESTAMP_FORMAT),
        data
    )
}

#[async_trait]
impl Tool for SaveTool {
    fn name(&self) -> &str {
        "save_to_txt"
    }

    fn description(&self) -> &str {
        "Save structured research data to a text file. Appends to the file if it already exists."
    }

    fn parameters(&self) -> Value {
        json!({
            "type": "object",
            "properties": {
                "data": {
                    "type": "string",
                    "description": "The research text to save."
                },
                "filename": {
                    "type": "string",
                    "description": format!("Target file (default {})", self.default_filename)
                }
            },
            "required": ["data"]
        })
    }

    async fn execute(&self, params: HashMap<String, Value>) -> anyhow::Result<String> {
        let data = require_string(&params, "data")?;
        let filename =
            optional_string(&params, "filename").unwrap_or_else(|| self.default_filename.clone());
        let path = self.resolve(&filename);
        let block = format_block(&data, self.clock.now());

        debug!(path = %path.display(), bytes = block.len(), "appending research output");

        let mut file = std::fs::OpenOptions::new()
            .create(true)
            .append(true)
            .open(&path)
            .map_err(|e| anyhow::anyhow!("Failed to open {}: {e}", path.display()))?;
        file.write_all(block.as_bytes())
            .map_err(|e| anyhow::anyhow!("Failed to write {}: {e}", path.display()))?;

        Ok(format!("Data successfully saved to {filename}"))
    }
}

// ─────────────────────────────────────────────
// Tests
// ─────────────────────────────────────────────
