//! fennec-core - Interactive conversational REPL framework for AI agents
//!
//! The framework turns user keystrokes into two kinds of actions: local
//! slash commands dispatched to registered handlers, and free-text
//! messages forwarded to an active agent whose streamed response is
//! rendered incrementally. This crate contains every subsystem except the
//! concrete terminal shell and agent backend, which embedding
//! applications supply through the [`shell::Shell`] and
//! [`plugin::AgentPlugin`] contracts.

pub mod app;
pub mod audit;
pub mod builtin;
pub mod clipboard;
pub mod command;
pub mod completer;
pub mod config;
pub mod context;
pub mod error;
pub mod event;
pub mod file_context;
pub mod loader;
pub mod notify;
pub mod parser;
pub mod plugin;
pub mod repl;
pub mod session;
pub mod shell;
pub mod spawn;
pub mod stream;
pub mod testing;
pub mod types;

// Re-export main types at crate root
pub use app::{AgentFactory, App, AppConfig};
pub use audit::{AuditKind, AuditLogger};
pub use clipboard::{Clipboard, NullClipboard};
pub use command::{CommandFuture, CommandHandler, CommandRegistry, SlashCommand};
pub use completer::{Completer, CompletionItem, MAX_PINNED_DISPLAY};
pub use config::{FileConfig, NotificationsSection, PluginsSection, CONFIG_DIR, CONFIG_FILE};
pub use context::{AppContext, CommandContext, ShutdownSignal};
pub use error::{
    AgentError, ClipboardError, CommandError, PluginError, ShellError, SpawnError,
};
pub use event::{
    event_channel, EventSink, EventStream, InputKind, InputRequest, InputResponse,
    ResponseHandle, StreamEvent,
};
pub use file_context::{FileContextResolver, DEFAULT_MAX_FILE_SIZE};
pub use loader::{PluginFactory, PluginLoader};
pub use notify::{
    ForegroundProbe, NeverForeground, Notifier, NotifierOptions, NotifyBackend,
};
pub use parser::{parse, ParsedInput};
pub use plugin::{AgentPlugin, Plugin, PluginRegistry};
pub use repl::ReplCore;
pub use session::Session;
pub use shell::{parse_approval_input, parse_choice_input, parse_text_input, Shell};
pub use spawn::{SessionSpawner, SpawnAgentFactory, SpawnConfig, SpawnHook};
pub use stream::{format_tool_input, StreamProcessor};
pub use types::{
    ConversationTurn, FileContext, FileContextPayload, MessageContext, Role, SessionId,
    TokenStatistics, TokenUsage, ToolUse,
};
