//! Slash command registry
//!
//! Name-to-command map with last-writer-wins registration, sorted listing,
//! prefix completion, and pinned-subset resolution for the completer.

use crate::context::CommandContext;
use crate::error::CommandError;
use std::collections::HashMap;
use std::fmt;
use std::future::Future;
use std::pin::Pin;
use std::sync::Arc;

/// Boxed future returned by a command handler.
pub type CommandFuture = Pin<Box<dyn Future<Output = Result<(), CommandError>> + Send>>;

/// A command handler. Handlers receive a context carrying non-owning
/// references to every subsystem and may be async.
pub type CommandHandler = Arc<dyn Fn(CommandContext) -> CommandFuture + Send + Sync>;

/// A registered `/` command.
///
/// Names are ASCII, non-empty, and whitespace-free by convention; the
/// registry does not police this beyond exact-match lookup.
#[derive(Clone)]
pub struct SlashCommand {
    pub name: String,
    pub description: String,
    pub help_text: String,
    pub handler: CommandHandler,
    /// Reachable as `--<name>` from the CLI front-end.
    pub cli_exposed: bool,
    /// Surfaced first in the default completion dropdown.
    pub pinned: bool,
}

impl SlashCommand {
    pub fn new(
        name: impl Into<String>,
        description: impl Into<String>,
        help_text: impl Into<String>,
        handler: CommandHandler,
    ) -> Self {
        Self {
            name: name.into(),
            description: description.into(),
            help_text: help_text.into(),
            handler,
            cli_exposed: false,
            pinned: false,
        }
    }

    pub fn cli_exposed(mut self) -> Self {
        self.cli_exposed = true;
        self
    }

    pub fn pinned(mut self) -> Self {
        self.pinned = true;
        self
    }
}

impl fmt::Debug for SlashCommand {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("SlashCommand")
            .field("name", &self.name)
            .field("description", &self.description)
            .field("cli_exposed", &self.cli_exposed)
            .field("pinned", &self.pinned)
            .finish_non_exhaustive()
    }
}

/// Registry of slash commands.
#[derive(Debug, Default)]
pub struct CommandRegistry {
    commands: HashMap<String, SlashCommand>,
}

impl CommandRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a command. A name collision overwrites the prior command,
    /// which is what lets plugins override built-ins.
    pub fn register(&mut self, command: SlashCommand) {
        self.commands.insert(command.name.clone(), command);
    }

    /// Exact lookup by name.
    pub fn get(&self, name: &str) -> Option<&SlashCommand> {
        self.commands.get(name)
    }

    /// All commands, lexicographic by name.
    pub fn list_all(&self) -> Vec<SlashCommand> {
        let mut all: Vec<SlashCommand> = self.commands.values().cloned().collect();
        all.sort_by(|a, b| a.name.cmp(&b.name));
        all
    }

    /// Commands whose name starts with `prefix`, lexicographic.
    pub fn complete(&self, prefix: &str) -> Vec<SlashCommand> {
        let mut matches: Vec<SlashCommand> = self
            .commands
            .values()
            .filter(|c| c.name.starts_with(prefix))
            .cloned()
            .collect();
        matches.sort_by(|a, b| a.name.cmp(&b.name));
        matches
    }

    /// Resolve the pinned subset: `names` in their given order restricted to
    /// registered commands, then registered commands flagged `pinned` that
    /// were not already taken, deduplicated, truncated to `max`.
    pub fn get_pinned(&self, names: &[String], max: usize) -> Vec<SlashCommand> {
        let mut seen: Vec<&str> = Vec::new();
        let mut result: Vec<SlashCommand> = Vec::new();

        for name in names {
            if seen.contains(&name.as_str()) {
                continue;
            }
            if let Some(cmd) = self.commands.get(name) {
                seen.push(name.as_str());
                result.push(cmd.clone());
            }
        }

        let mut declarative: Vec<&SlashCommand> = self
            .commands
            .values()
            .filter(|c| c.pinned && !seen.contains(&c.name.as_str()))
            .collect();
        declarative.sort_by(|a, b| a.name.cmp(&b.name));
        for cmd in declarative {
            result.push(cmd.clone());
        }

        result.truncate(max);
        result
    }

    pub fn len(&self) -> usize {
        self.commands.len()
    }

    pub fn is_empty(&self) -> bool {
        self.commands.is_empty()
    }
}
