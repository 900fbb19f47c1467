//! Desktop notification backend
//!
//! `osascript` on macOS, `notify-send` on Linux. `send` spawns the
//! subprocess without waiting: best effort, bounded latency, never raises.

use crate::clipboard::find_in_path;
use fennec_core::notify::{ForegroundProbe, NotifyBackend};
use std::path::PathBuf;
use std::process::{Command, Stdio};

enum BackendKind {
    MacOs,
    Linux,
}

/// Subprocess-backed desktop notifications.
pub struct DesktopBackend {
    program: PathBuf,
    kind: BackendKind,
}

impl DesktopBackend {
    /// Detect a usable backend on this machine.
    pub fn detect() -> Option<Self> {
        if cfg!(target_os = "macos") {
            return find_in_path("osascript").map(|program| Self {
                program,
                kind: BackendKind::MacOs,
            });
        }
        if cfg!(target_os = "linux") {
            return find_in_path("notify-send").map(|program| Self {
                program,
                kind: BackendKind::Linux,
            });
        }
        None
    }

    fn build_command(&self, title: &str, message: &str, sound: Option<&str>) -> Command {
        let mut command = Command::new(&self.program);
        match self.kind {
            BackendKind::MacOs => {
                let mut script = format!(
                    "display notification {} with title {}",
                    applescript_string(message),
                    applescript_string(title)
                );
                if let Some(sound) = sound {
                    script.push_str(&format!(" sound name {}", applescript_string(sound)));
                }
                command.arg("-e").arg(script);
            }
            BackendKind::Linux => {
                command.arg(title).arg(message);
            }
        }
        command
    }
}

impl NotifyBackend for DesktopBackend {
    fn is_available(&self) -> bool {
        self.program.is_file()
    }

    fn send(&self, title: &str, message: &str, sound: Option<&str>) {
        let result = self
            .build_command(title, message, sound)
            .stdin(Stdio::null())
            .stdout(Stdio::null())
            .stderr(Stdio::null())
            .spawn();
        if let Err(err) = result {
            tracing::debug!("notification dispatch failed: {err}");
        }
    }
}

/// Quote a string for embedding in an AppleScript literal.
fn applescript_string(text: &str) -> String {
    format!("\"{}\"", text.replace('\\', "\\\\").replace('"', "\\\""))
}

/// Foreground detection.
///
/// On macOS the frontmost process name is compared against the terminal
/// identified by `TERM_PROGRAM`. Elsewhere foreground state is not
/// detectable, so delivery is never suppressed.
pub struct TerminalForeground;

impl ForegroundProbe for TerminalForeground {
    fn terminal_is_foreground(&self) -> bool {
        if !cfg!(target_os = "macos") {
            return false;
        }
        let Some(term_app) = terminal_process_name() else {
            return false;
        };
        let Some(osascript) = find_in_path("osascript") else {
            return false;
        };
        let output = Command::new(osascript)
            .arg("-e")
            .arg(
                "tell application \"System Events\" to get name of first \
                 application process whose frontmost is true",
            )
            .output();
        match output {
            Ok(output) => {
                let frontmost = String::from_utf8_lossy(&output.stdout).trim().to_string();
                !frontmost.is_empty() && frontmost == term_app
            }
            Err(_) => false,
        }
    }
}

fn terminal_process_name() -> Option<String> {
    match std::env::var("TERM_PROGRAM").ok()?.as_str() {
        "Apple_Terminal" => Some("Terminal".to_string()),
        "iTerm.app" => Some("iTerm2".to_string()),
        other if !other.is_empty() => Some(other.to_string()),
        _ => None,
    }
}
