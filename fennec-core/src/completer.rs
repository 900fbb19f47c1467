//! Completion engine
//!
//! UI-neutral state machine behind the slash command dropdown. On a bare
//! `/` only the pinned subset is offered; on `/<prefix>` all commands whose
//! names start with the prefix. An explicit dismiss (ESC) suppresses
//! completions for the exact current input; any edit restores them.

use crate::command::CommandRegistry;
use parking_lot::Mutex;
use std::sync::Arc;

/// Maximum number of pinned entries shown before any typing.
pub const MAX_PINNED_DISPLAY: usize = 6;

/// One completion candidate.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CompletionItem {
    pub name: String,
    pub description: String,
}

/// Slash command completer with an ESC-suppression lifecycle.
#[derive(Debug)]
pub struct Completer {
    commands: Arc<Mutex<CommandRegistry>>,
    pinned_names: Vec<String>,
    max_pinned_display: usize,
    suppressed_at: Option<String>,
}

impl Completer {
    pub fn new(commands: Arc<Mutex<CommandRegistry>>, pinned_names: Vec<String>) -> Self {
        Self {
            commands,
            pinned_names,
            max_pinned_display: MAX_PINNED_DISPLAY,
            suppressed_at: None,
        }
    }

    pub fn with_max_pinned_display(mut self, max: usize) -> Self {
        self.max_pinned_display = max;
        self
    }

    /// Completions for the live input text.
    ///
    /// Output is a pure function of the suppression state and the input.
    pub fn complete(&mut self, input: &str) -> Vec<CompletionItem> {
        if let Some(suppressed) = &self.suppressed_at {
            if suppressed == input {
                return Vec::new();
            }
            // Any edit leaves the suppressed state.
            self.suppressed_at = None;
        }

        let Some(prefix) = input.strip_prefix('/') else {
            return Vec::new();
        };

        let registry = self.commands.lock();
        let matches = if prefix.is_empty() {
            registry.get_pinned(&self.pinned_names, self.max_pinned_display)
        } else {
            registry.complete(prefix)
        };

        matches
            .into_iter()
            .map(|c| CompletionItem {
                name: c.name,
                description: c.description,
            })
            .collect()
    }

    /// Explicit dismiss (ESC): suppress completions for this exact input.
    pub fn dismiss(&mut self, input: &str) {
        self.suppressed_at = Some(input.to_string());
    }
}
