//! Interactive topic prompt.
//!
//! Uses `rustyline` for readline-style editing, with earlier topics kept in
//! a history file so they can be recalled with the arrow keys.

use anyhow::Result;
use colored::Colorize;
use rustyline::config::Configurer;
use rustyline::error::ReadlineError;
use rustyline::history::DefaultHistory;
use rustyline::{DefaultEditor, Editor};
use tracing::debug;

/// Ask for a research topic. Blank input, Ctrl-C and Ctrl-D all pick `default`.
pub fn prompt_topic(default: &str) -> Result<String> {
    let mut editor = create_editor()?;
    let prompt = format!(
        "{} {}: ",
        "Enter your research topic".green().bold(),
        format!("({default})").dimmed()
    );

    let input = match editor.readline(&prompt) {
        Ok(line) => line,
        Err(ReadlineError::Interrupted) | Err(ReadlineError::Eof) => String::new(),
        Err(e) => return Err(e.into()),
    };

    let topic = resolve_topic(&input, default);
    if !input.trim().is_empty() {
        let _ = editor.add_history_entry(input.trim());
        save_history(&mut editor);
    }
    Ok(topic)
}

/// The trimmed input, or `default` when nothing was typed.
fn resolve_topic(input: &str, default: &str) -> String {
    let trimmed = input.trim();
    if trimmed.is_empty() {
        default.to_string()
    } else {
        trimmed.to_string()
    }
}

/// Create a rustyline editor with history.
fn create_editor() -> Result<Editor<(), DefaultHistory>> {
    let mut editor = DefaultEditor::new()?;
    editor.set_max_history_size(200)?;

    let history_path = history_path();
    if history_path.exists() {
        let _ = editor.load_history(&history_path);
        debug!("loaded topic history from {}", history_path.display());
    }

    Ok(editor)
}

/// Save history to disk.
fn save_history(editor: &mut Editor<(), DefaultHistory>) {
    let path = history_path();
    if let Some(parent) = path.parent() {
        let _ = std::fs::create_dir_all(parent);
    }
    if let Err(e) = editor.save_history(&path) {
        debug!("failed to save history: {e}");
    }
}

/// Path to the history file.
fn history_path() -> std::path::PathBuf {
    scholar_core::utils::get_data_path().join("history").join("topics")
}

// ─────────────────────────────────────────────
// Tests
// ─────────────────────────────────────────────

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn blank_input_uses_default() {
        assert_eq!(resolve_topic("   ", "Eiffel Tower"), "Eiffel Tower");
        assert_eq!(resolve_topic("", "Eiffel Tower"), "Eiffel Tower");
    }

    #[test]
    fn typed_input_is_trimmed() {
        assert_eq!(resolve_topic("  Tides of the Bay of Fundy \n", "x"), "Tides of the Bay of Fundy");
    }

    #[test]
    fn history_path_under_data_dir() {
        let path = history_path();
        assert!(path.to_string_lossy().contains(".scholar"));
        assert!(path.ends_with("history/topics"));
    }
}
