//! Platform clipboard via subprocess
//!
//! `pbcopy` on macOS, `wl-copy` on Wayland, `xclip` on X11. The utility
//! is looked up on PATH before spawning so a missing tool surfaces as a
//! distinct error kind.

use fennec_core::clipboard::Clipboard;
use fennec_core::error::ClipboardError;
use std::io::Write;
use std::path::PathBuf;
use std::process::{Command, Stdio};

/// Subprocess-backed clipboard.
#[derive(Debug, Default)]
pub struct CommandClipboard;

impl CommandClipboard {
    pub fn new() -> Self {
        Self
    }
}

impl Clipboard for CommandClipboard {
    fn copy(&self, text: &str) -> Result<(), ClipboardError> {
        let command = clipboard_command()?;
        let utility = command[0].clone();
        let program = find_in_path(&utility).ok_or(ClipboardError::MissingUtility {
            utility: utility.clone(),
        })?;

        let mut child = Command::new(program)
            .args(&command[1..])
            .stdin(Stdio::piped())
            .stdout(Stdio::null())
            .stderr(Stdio::piped())
            .spawn()
            .map_err(|err| ClipboardError::Subprocess {
                detail: err.to_string(),
            })?;

        if let Some(stdin) = child.stdin.as_mut() {
            stdin
                .write_all(text.as_bytes())
                .map_err(|err| ClipboardError::Subprocess {
                    detail: err.to_string(),
                })?;
        }

        let output = child
            .wait_with_output()
            .map_err(|err| ClipboardError::Subprocess {
                detail: err.to_string(),
            })?;
        if !output.status.success() {
            let stderr = String::from_utf8_lossy(&output.stderr).trim().to_string();
            return Err(ClipboardError::Subprocess { detail: stderr });
        }
        Ok(())
    }
}

/// Clipboard command line for the current platform.
fn clipboard_command() -> Result<Vec<String>, ClipboardError> {
    if cfg!(target_os = "macos") {
        return Ok(vec!["pbcopy".to_string()]);
    }
    if cfg!(target_os = "linux") {
        let wayland = std::env::var_os("WAYLAND_DISPLAY").is_some()
            || std::env::var("XDG_SESSION_TYPE").as_deref() == Ok("wayland");
        if wayland {
            return Ok(vec!["wl-copy".to_string()]);
        }
        return Ok(vec![
            "xclip".to_string(),
            "-selection".to_string(),
            "clipboard".to_string(),
        ]);
    }
    Err(ClipboardError::UnsupportedPlatform {
        platform: std::env::consts::OS.to_string(),
    })
}

/// Locate an executable on PATH.
pub fn find_in_path(name: &str) -> Option<PathBuf> {
    let path = std::env::var_os("PATH")?;
    for dir in std::env::split_paths(&path) {
        let candidate = dir.join(name);
        if candidate.is_file() {
            return Some(candidate);
        }
    }
    None
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    #[test]
    fn test_platform_command_selection() {
        match clipboard_command() {
            Ok(command) => {
                assert!(matches!(
                    command[0].as_str(),
                    "pbcopy" | "wl-copy" | "xclip"
                ));
            }
            Err(ClipboardError::UnsupportedPlatform { .. }) => {}
            Err(other) => panic!("unexpected error: {other}"),
        }
    }

    #[test]
    fn test_find_in_path_missing() {
        assert!(find_in_path("definitely-not-a-real-utility-name").is_none());
    }
}
