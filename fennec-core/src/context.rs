//! Shared application context
//!
//! Non-owning references to every subsystem, handed to command handlers
//! and plugin `on_load`. There are no cycles: the context carries `Arc`s
//! downward and nothing points back at the application.

use crate::app::AppConfig;
use crate::audit::AuditLogger;
use crate::clipboard::Clipboard;
use crate::command::CommandRegistry;
use crate::notify::Notifier;
use crate::plugin::PluginRegistry;
use crate::session::Session;
use crate::shell::Shell;
use parking_lot::Mutex;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

/// Cooperative termination flag. `/quit` requests it; the REPL loop
/// observes it between dispatches.
#[derive(Debug, Clone, Default)]
pub struct ShutdownSignal(Arc<AtomicBool>);

impl ShutdownSignal {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn request(&self) {
        self.0.store(true, Ordering::SeqCst);
    }

    pub fn is_requested(&self) -> bool {
        self.0.load(Ordering::SeqCst)
    }
}

/// References to every subsystem, shared across the cooperative task.
#[derive(Clone)]
pub struct AppContext {
    pub config: Arc<AppConfig>,
    pub session: Arc<Mutex<Session>>,
    pub commands: Arc<Mutex<CommandRegistry>>,
    pub plugins: Arc<Mutex<PluginRegistry>>,
    pub shell: Arc<dyn Shell>,
    pub clipboard: Arc<dyn Clipboard>,
    pub notifier: Arc<Notifier>,
    pub audit: Arc<AuditLogger>,
    pub shutdown: ShutdownSignal,
}

impl std::fmt::Debug for AppContext {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("AppContext")
            .field("config", &self.config)
            .field("shutdown", &self.shutdown)
            .finish_non_exhaustive()
    }
}

/// Context handed to a slash command handler.
#[derive(Clone)]
pub struct CommandContext {
    /// Raw argument string after the command name.
    pub args: String,
    pub app: AppContext,
}
