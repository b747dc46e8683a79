//! Terminal presentation — panels, the thinking indicator and the live observer.

use colored::{Color, Colorize};

use scholar_agent::{AgentAction, AgentObserver, AgentRun, ResearchResponse};

/// Widest panel drawn when the terminal width is unknown.
const DEFAULT_PANEL_WIDTH: usize = 100;

// ─────────────────────────────────────────────
// Panels
// ─────────────────────────────────────────────

fn panel_width() -> usize {
    std::env::var("COLUMNS")
        .ok()
        .and_then(|c| c.parse::<usize>().ok())
        .filter(|&c| c >= 20)
        .unwrap_or(DEFAULT_PANEL_WIDTH)
}

/// Lay out a bordered panel as plain text lines.
///
/// Long lines are wrapped at `max_width` minus the borders; the panel never
/// gets narrower than its title.
pub fn panel_lines(title: &str, body: &str, max_width: usize) -> Vec<String> {
    let max_inner = max_width.saturating_sub(4).max(8);
    let mut rows: Vec<String> = Vec::new();
    for line in body.lines() {
        let chars: Vec<char> = line.chars().collect();
        if chars.is_empty() {
            rows.push(String::new());
        }
        for chunk in chars.chunks(max_inner) {
            rows.push(chunk.iter().collect());
        }
    }

    let title_len = title.chars().count() + 2;
    let inner = rows
        .iter()
        .map(|r| r.chars().count())
        .max()
        .unwrap_or(0)
        .max(title_len)
        .min(max_inner.max(title_len));

    let mut out = Vec::with_capacity(rows.len() + 2);
    out.push(format!("╭─ {title} {}╮", "─".repeat(inner + 1 - title_len)));
    for row in rows {
        let pad = inner.saturating_sub(row.chars().count());
        out.push(format!("│ {row}{} │", " ".repeat(pad)));
    }
    out.push(format!("╰{}╯", "─".repeat(inner + 2)));
    out
}

/// Print a panel with colored borders.
pub fn print_panel(title: &str, body: &str, color: Color) {
    let lines = panel_lines(title, body, panel_width());
    let last = lines.len().saturating_sub(1);
    for (i, line) in lines.iter().enumerate() {
        if i == 0 || i == last {
            println!("{}", line.color(color));
        } else {
            // Body rows: color only the side borders.
            let inner: String = line.chars().skip(1).take(line.chars().count() - 2).collect();
            println!("{}{}{}", "│".color(color), inner, "│".color(color));
        }
    }
}

/// Body of the structured response panel.
pub fn structured_body(response: &ResearchResponse) -> String {
    format!(
        "Topic: {}\n\nSummary: {}\n\nSources: {}\n\nTools Used: {}",
        response.topic(),
        response.summary(),
        response.sources().join(", "),
        response.tools_used().join(", ")
    )
}

/// Run summary followed by the full transcript.
pub fn run_body(run: &AgentRun) -> String {
    format!("{run}\n\n{}", run.transcript)
}

/// Show the raw run: summary of the run, then the transcript.
pub fn display_agent_output(run: &AgentRun) {
    print_panel("Agent Output", &run_body(run), Color::Green);
}

pub fn display_structured_response(response: &ResearchResponse) {
    print_panel("Structured Research Response", &structured_body(response), Color::Cyan);
}

pub fn display_error(message: &str, run: Option<&AgentRun>) {
    println!("{} {}", "Error during research:".red().bold(), message);
    if let Some(run) = run {
        print_panel("Raw Response", &run_body(run), Color::Red);
    }
}

// ─────────────────────────────────────────────
// Thinking indicator
// ─────────────────────────────────────────────

/// Print a "researching" placeholder on stderr.
pub fn print_thinking() {
    eprint!("{}", "⠿ Agent is researching...".blue().bold());
}

/// Clear the placeholder line.
pub fn clear_thinking() {
    eprint!("\r{}\r", " ".repeat(40));
}

// ─────────────────────────────────────────────
// ConsoleObserver
// ─────────────────────────────────────────────

/// Prints each tool call and its output as the agent works.
pub struct ConsoleObserver {
    /// Redraw the thinking indicator after each event.
    show_thinking: bool,
}

impl ConsoleObserver {
    pub fn new(show_thinking: bool) -> Self {
        Self { show_thinking }
    }
}

impl AgentObserver for ConsoleObserver {
    fn on_agent_action(&self, action: &AgentAction) {
        if self.show_thinking {
            clear_thinking();
        }
        println!("\n{}", "→ Agent is taking an action...".bold());
        print_panel(
            "Agent Action",
            &format!("Tool: {}\nInput: {}", action.tool_name, action.tool_input),
            Color::Yellow,
        );
    }

    fn on_tool_end(&self, output: &str) {
        print_panel("Tool Output", output, Color::Magenta);
        if self.show_thinking {
            print_thinking();
        }
    }
}

// ─────────────────────────────────────────────
// Tests
// ─────────────────────────────────────────────
