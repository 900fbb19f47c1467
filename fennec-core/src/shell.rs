//! Shell contract
//!
//! The terminal front-end implements this trait; the core never talks to a
//! concrete rendering library. The trait covers the rendering primitives
//! the stream processor needs (markdown, dim text, spinner, live view),
//! the interactive input collectors, and the collapsed-results buffer tied
//! to the expand key binding.

use crate::completer::Completer;
use crate::error::ShellError;
use crate::event::InputResponse;
use async_trait::async_trait;
use parking_lot::Mutex;
use std::sync::Arc;

/// Terminal shell surface used by the REPL and the stream processor.
#[async_trait]
pub trait Shell: Send + Sync {
    /// Prompt for one line of input. May suspend indefinitely.
    async fn read_line(&self) -> Result<String, ShellError>;

    /// Render markdown-formatted text in the output area.
    fn print_markdown(&self, text: &str);

    /// Render an informational message.
    fn print_info(&self, message: &str);

    /// Render an error message in the themed error style.
    fn print_error(&self, message: &str);

    /// Render dim text.
    fn print_dim(&self, text: &str);

    /// Render a tool invocation: the name, then an optional compact
    /// single-line summary of its input in dim style.
    fn print_tool_use(&self, name: &str, summary: Option<&str>);

    /// Render a tool result header with a success/error glyph.
    fn print_tool_result_header(&self, name: &str, is_error: bool);

    /// Render tool result body text verbatim in dim style, with terminal
    /// markup interpretation disabled.
    fn print_tool_body(&self, body: &str);

    fn start_spinner(&self);
    fn stop_spinner(&self);

    /// Begin a live view for streaming assistant text.
    fn start_live(&self);

    /// Append a fragment to the live view.
    fn append_live(&self, text: &str);

    /// Finalize the live view, rendering the accumulated text as markdown.
    fn finish_live(&self);

    /// Record a full tool-result body for on-demand expansion
    /// (most-recent last).
    fn push_collapsed(&self, body: String);

    /// Drop all recorded collapsed results.
    fn clear_collapsed(&self);

    /// Collect an approve/reject decision. Interrupt maps to reject.
    async fn prompt_approval(&self, prompt: &str, choices: &[String]) -> InputResponse;

    /// Collect a 1..N choice (or reject). Interrupt maps to reject.
    async fn prompt_choice(&self, prompt: &str, choices: &[String]) -> InputResponse;

    /// Collect non-empty free text (or reject). Interrupt maps to reject.
    async fn prompt_text(&self, prompt: &str) -> InputResponse;

    /// Wire the completion engine into the input prompt.
    fn bind_completer(&self, completer: Arc<Mutex<Completer>>);
}

/// Interpret one line as an approval answer.
///
/// `a`/`1` approve, `r`/`2` reject, case-insensitive; anything else asks
/// the collector to re-prompt.
pub fn parse_approval_input(line: &str) -> Option<InputResponse> {
    match line.trim().to_ascii_lowercase().as_str() {
        "a" | "1" => Some(InputResponse::Approve),
        "r" | "2" => Some(InputResponse::Reject),
        _ => None,
    }
}

/// Interpret one line as a choice answer against N choices.
///
/// `r` rejects; a number `1..=N` selects. Out-of-range or non-numeric input
/// asks the collector to re-prompt.
pub fn parse_choice_input(line: &str, choices: &[String]) -> Option<InputResponse> {
    let trimmed = line.trim();
    if trimmed.eq_ignore_ascii_case("r") {
        return Some(InputResponse::Reject);
    }
    let n: usize = trimmed.parse().ok()?;
    if n >= 1 && n <= choices.len() {
        Some(InputResponse::Choice {
            index: n - 1,
            value: choices[n - 1].clone(),
        })
    } else {
        None
    }
}

/// Interpret one line as a text answer.
///
/// `r` or `/reject` alone rejects; empty input asks the collector to
/// re-prompt; anything else is the answer.
pub fn parse_text_input(line: &str) -> Option<InputResponse> {
    let trimmed = line.trim();
    if trimmed.is_empty() {
        return None;
    }
    if trimmed.eq_ignore_ascii_case("r") || trimmed.eq_ignore_ascii_case("/reject") {
        return Some(InputResponse::Reject);
    }
    Some(InputResponse::Text(trimmed.to_string()))
}
