//! Terminal shell
//!
//! ANSI rendering over stdout/stderr with tokio stdin input. Chrome
//! (spinner, tool headers, info lines) goes to stderr; assistant text and
//! markdown go to stdout. Key bindings work at line granularity: a lone
//! Ctrl+Y submits `/copy`, a lone Ctrl+O expands the most recent collapsed
//! tool result, and ESC dismisses completions for the current (empty)
//! input.

use async_trait::async_trait;
use fennec_core::completer::Completer;
use fennec_core::error::ShellError;
use fennec_core::event::InputResponse;
use fennec_core::shell::{
    parse_approval_input, parse_choice_input, parse_text_input, Shell,
};
use parking_lot::Mutex;
use std::collections::VecDeque;
use std::io::{self, IsTerminal, Write};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use tokio::io::{AsyncBufReadExt, BufReader, Lines, Stdin};
use tokio::task::JoinHandle;

// ── ANSI escape codes ───────────────────────────────────────────────────

const RESET: &str = "\x1b[0m";
const BOLD: &str = "\x1b[1m";
const DIM: &str = "\x1b[2m";
const ITALIC: &str = "\x1b[3m";
const RED: &str = "\x1b[31m";
const GREEN: &str = "\x1b[32m";
const BLUE: &str = "\x1b[34m";
const MAGENTA: &str = "\x1b[35m";

/// Gutter drawn left of assistant output.
const GUTTER: &str = "▎ ";

/// Control characters recognized as line-level key bindings.
const CTRL_Y: &str = "\u{19}";
const CTRL_O: &str = "\u{0f}";
const ESC: &str = "\u{1b}";

struct LiveState {
    active: bool,
    trailing_newline: bool,
}

/// ANSI terminal implementation of the shell contract.
pub struct TerminalShell {
    ansi: bool,
    lines: tokio::sync::Mutex<Lines<BufReader<Stdin>>>,
    spinner_running: Arc<AtomicBool>,
    spinner_task: Mutex<Option<JoinHandle<()>>>,
    live: Mutex<LiveState>,
    collapsed: Mutex<VecDeque<String>>,
    completer: Mutex<Option<Arc<Mutex<Completer>>>>,
}

impl TerminalShell {
    pub fn new() -> Self {
        Self {
            ansi: io::stderr().is_terminal(),
            lines: tokio::sync::Mutex::new(BufReader::new(tokio::io::stdin()).lines()),
            spinner_running: Arc::new(AtomicBool::new(false)),
            spinner_task: Mutex::new(None),
            live: Mutex::new(LiveState {
                active: false,
                trailing_newline: true,
            }),
            collapsed: Mutex::new(VecDeque::new()),
            completer: Mutex::new(None),
        }
    }

    fn style<'a>(&self, code: &'a str) -> &'a str {
        if self.ansi {
            code
        } else {
            ""
        }
    }

    fn reset(&self) -> &'static str {
        if self.ansi {
            RESET
        } else {
            ""
        }
    }

    /// Write a chrome line to stderr.
    fn chrome(&self, message: &str) {
        let mut stderr = io::stderr().lock();
        let _ = writeln!(stderr, "{message}");
        let _ = stderr.flush();
    }

    fn prompt_marker(&self) {
        let mut stdout = io::stdout().lock();
        let _ = writeln!(
            stdout,
            "{}{}{}",
            self.style(DIM),
            "─".repeat(40),
            self.reset()
        );
        let _ = write!(stdout, "{}> {}", self.style(GREEN), self.reset());
        let _ = stdout.flush();
    }

    async fn next_raw_line(&self) -> Result<String, ShellError> {
        let mut lines = self.lines.lock().await;
        tokio::select! {
            line = lines.next_line() => match line {
                Ok(Some(line)) => Ok(line),
                Ok(None) => Err(ShellError::Eof),
                Err(_) => Err(ShellError::Eof),
            },
            _ = tokio::signal::ctrl_c() => Err(ShellError::Interrupted),
        }
    }

    /// Pop and print the most recent collapsed tool result.
    fn expand_last_collapsed(&self) {
        let body = self.collapsed.lock().pop_back();
        match body {
            Some(body) => {
                for line in body.lines() {
                    self.chrome(&format!("  {}{line}{}", self.style(DIM), self.reset()));
                }
            }
            None => self.print_info("No collapsed tool output."),
        }
    }
}

impl Default for TerminalShell {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl Shell for TerminalShell {
    async fn read_line(&self) -> Result<String, ShellError> {
        loop {
            self.prompt_marker();
            let line = self.next_raw_line().await?;
            match line.as_str() {
                // Ctrl+Y: copy the last assistant response.
                CTRL_Y => return Ok("/copy".to_string()),
                // Ctrl+O: expand the most recent collapsed result, then
                // prompt again.
                CTRL_O => self.expand_last_collapsed(),
                // ESC: dismiss completions for the current input.
                ESC => {
                    if let Some(completer) = self.completer.lock().as_ref() {
                        completer.lock().dismiss("");
                    }
                }
                _ => return Ok(line),
            }
        }
    }

    fn print_markdown(&self, text: &str) {
        let mut stdout = io::stdout().lock();
        for line in text.lines() {
            let _ = writeln!(
                stdout,
                "{}{GUTTER}{}{line}",
                self.style(BLUE),
                self.reset()
            );
        }
        let _ = stdout.flush();
    }

    fn print_info(&self, message: &str) {
        self.chrome(&format!("{}{message}{}", self.style(DIM), self.reset()));
    }

    fn print_error(&self, message: &str) {
        self.chrome(&format!(
            "{}{}Error:{} {message}",
            self.style(BOLD),
            self.style(RED),
            self.reset()
        ));
    }

    fn print_dim(&self, text: &str) {
        self.chrome(&format!("{}{text}{}", self.style(DIM), self.reset()));
    }

    fn print_tool_use(&self, name: &str, summary: Option<&str>) {
        self.chrome(&format!(
            "{}{}tool{} {}{name}{}",
            self.style(ITALIC),
            self.style(MAGENTA),
            self.reset(),
            self.style(BOLD),
            self.reset()
        ));
        if let Some(summary) = summary {
            self.chrome(&format!("  {}{summary}{}", self.style(DIM), self.reset()));
        }
    }

    fn print_tool_result_header(&self, name: &str, is_error: bool) {
        let (glyph, color) = if is_error { ("✗", RED) } else { ("✓", GREEN) };
        self.chrome(&format!(
            "{}{glyph}{} {}{name}{}",
            self.style(color),
            self.reset(),
            self.style(BOLD),
            self.reset()
        ));
    }

    fn print_tool_body(&self, body: &str) {
        // Verbatim: the body is never reinterpreted as markup.
        let mut stderr = io::stderr().lock();
        for line in body.lines() {
            let _ = writeln!(stderr, "  {}{line}{}", self.style(DIM), self.reset());
        }
        let _ = stderr.flush();
    }

    fn start_spinner(&self) {
        if self.spinner_running.swap(true, Ordering::SeqCst) {
            return;
        }
        let running = Arc::clone(&self.spinner_running);
        let ansi = self.ansi;
        let task = tokio::spawn(async move {
            let frames = ["⠋", "⠙", "⠹", "⠸", "⠼", "⠴", "⠦", "⠧", "⠇", "⠏"];
            let mut idx = 0usize;
            while running.load(Ordering::SeqCst) {
                if ansi {
                    let mut stderr = io::stderr().lock();
                    let _ = write!(stderr, "\r{} Thinking...", frames[idx]);
                    let _ = stderr.flush();
                }
                idx = (idx + 1) % frames.len();
                tokio::time::sleep(std::time::Duration::from_millis(100)).await;
            }
        });
        *self.spinner_task.lock() = Some(task);
    }

    fn stop_spinner(&self) {
        if !self.spinner_running.swap(false, Ordering::SeqCst) {
            return;
        }
        if let Some(task) = self.spinner_task.lock().take() {
            task.abort();
        }
        if self.ansi {
            let mut stderr = io::stderr().lock();
            let _ = write!(stderr, "\r\x1b[K");
            let _ = stderr.flush();
        }
    }

    fn start_live(&self) {
        let mut live = self.live.lock();
        live.active = true;
        live.trailing_newline = true;
        let mut stdout = io::stdout().lock();
        let _ = write!(stdout, "{}{GUTTER}{}", self.style(BLUE), self.reset());
        let _ = stdout.flush();
    }

    fn append_live(&self, text: &str) {
        let mut live = self.live.lock();
        if !live.active {
            return;
        }
        // Re-draw the gutter at each line start.
        let gutter = format!("\n{}{GUTTER}{}", self.style(BLUE), self.reset());
        let rendered = text.replace('\n', &gutter);
        live.trailing_newline = text.ends_with('\n');

        let mut stdout = io::stdout().lock();
        let _ = write!(stdout, "{rendered}");
        let _ = stdout.flush();
    }

    fn finish_live(&self) {
        let mut live = self.live.lock();
        if !live.active {
            return;
        }
        live.active = false;
        let mut stdout = io::stdout().lock();
        if !live.trailing_newline {
            let _ = writeln!(stdout);
        }
        let _ = stdout.flush();
    }

    fn push_collapsed(&self, body: String) {
        self.collapsed.lock().push_back(body);
    }

    fn clear_collapsed(&self) {
        self.collapsed.lock().clear();
    }

    async fn prompt_approval(&self, prompt: &str, choices: &[String]) -> InputResponse {
        let labels = if choices.len() == 2 {
            format!("[a] {}  [r] {}", choices[0], choices[1])
        } else {
            "[a]pprove  [r]eject".to_string()
        };
        loop {
            self.chrome(&format!("{}{prompt}{}", self.style(BOLD), self.reset()));
            self.print_dim(&labels);
            let line = match self.next_raw_line().await {
                Ok(line) => line,
                Err(_) => return InputResponse::Reject,
            };
            if let Some(response) = parse_approval_input(&line) {
                return response;
            }
            self.print_dim("Enter a (approve) or r (reject).");
        }
    }

    async fn prompt_choice(&self, prompt: &str, choices: &[String]) -> InputResponse {
        loop {
            self.chrome(&format!("{}{prompt}{}", self.style(BOLD), self.reset()));
            for (idx, choice) in choices.iter().enumerate() {
                self.print_dim(&format!("  [{}] {choice}", idx + 1));
            }
            self.print_dim("  [r] reject");
            let line = match self.next_raw_line().await {
                Ok(line) => line,
                Err(_) => return InputResponse::Reject,
            };
            if let Some(response) = parse_choice_input(&line, choices) {
                return response;
            }
            self.print_dim(&format!("Enter 1..{} or r.", choices.len()));
        }
    }

    async fn prompt_text(&self, prompt: &str) -> InputResponse {
        loop {
            self.chrome(&format!("{}{prompt}{}", self.style(BOLD), self.reset()));
            let line = match self.next_raw_line().await {
                Ok(line) => line,
                Err(_) => return InputResponse::Reject,
            };
            if let Some(response) = parse_text_input(&line) {
                return response;
            }
            self.print_dim("Enter a response, or r to reject.");
        }
    }

    fn bind_completer(&self, completer: Arc<Mutex<Completer>>) {
        *self.completer.lock() = Some(completer);
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    #[test]
    fn test_collapsed_buffer_is_fifo_most_recent_last() {
        let shell = TerminalShell::new();
        shell.push_collapsed("first".to_string());
        shell.push_collapsed("second".to_string());

        assert_eq!(shell.collapsed.lock().back().map(|s| s.as_str()), Some("second"));

        shell.clear_collapsed();
        assert!(shell.collapsed.lock().is_empty());
    }

    #[test]
    fn test_styles_disabled_without_tty() {
        let shell = TerminalShell {
            ansi: false,
            ..TerminalShell::new()
        };
        assert_eq!(shell.style(BOLD), "");
        assert_eq!(shell.reset(), "");
    }
}
