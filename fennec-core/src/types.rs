//! Core value types for Fennec
//!
//! These types form the representation boundary between the REPL, the
//! session history, and agent plugins.

use serde::{Deserialize, Serialize};
use std::fmt;
use uuid::Uuid;

/// Unique identifier for a session.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct SessionId(pub Uuid);

impl SessionId {
    /// Generate a fresh random id.
    pub fn new() -> Self {
        Self(Uuid::new_v4())
    }
}

impl Default for SessionId {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Display for SessionId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Role of a conversation turn.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Role {
    User,
    Assistant,
    System,
}

/// Token usage reported by a single agent response.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct TokenUsage {
    pub input_tokens: u64,
    pub output_tokens: u64,
}

impl TokenUsage {
    pub fn new(input_tokens: u64, output_tokens: u64) -> Self {
        Self {
            input_tokens,
            output_tokens,
        }
    }

    /// Add another usage record into this one.
    pub fn add(&mut self, other: &TokenUsage) {
        self.input_tokens += other.input_tokens;
        self.output_tokens += other.output_tokens;
    }

    /// True when both counters are zero.
    pub fn is_zero(&self) -> bool {
        self.input_tokens == 0 && self.output_tokens == 0
    }
}

/// Cumulative token statistics for a session.
///
/// Invariant: totals equal the sum of all accumulated [`TokenUsage`] values.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct TokenStatistics {
    pub total_input_tokens: u64,
    pub total_output_tokens: u64,
}

impl TokenStatistics {
    /// Fold one usage record into the totals.
    pub fn accumulate(&mut self, usage: &TokenUsage) {
        self.total_input_tokens += usage.input_tokens;
        self.total_output_tokens += usage.output_tokens;
    }

    pub fn total_tokens(&self) -> u64 {
        self.total_input_tokens + self.total_output_tokens
    }
}

/// Result of resolving one `@`-mention: file content or the reason it could
/// not be read. The two outcomes are mutually exclusive.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum FileContextPayload {
    Content { content: String },
    Error { error: String },
}

/// One materialized `@`-mention record.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FileContext {
    pub path: String,
    #[serde(flatten)]
    pub payload: FileContextPayload,
}

impl FileContext {
    pub fn content(path: impl Into<String>, content: impl Into<String>) -> Self {
        Self {
            path: path.into(),
            payload: FileContextPayload::Content {
                content: content.into(),
            },
        }
    }

    pub fn error(path: impl Into<String>, error: impl Into<String>) -> Self {
        Self {
            path: path.into(),
            payload: FileContextPayload::Error {
                error: error.into(),
            },
        }
    }

    /// The file content, if this record resolved successfully.
    pub fn as_content(&self) -> Option<&str> {
        match &self.payload {
            FileContextPayload::Content { content } => Some(content),
            FileContextPayload::Error { .. } => None,
        }
    }

    /// The error reason, if resolution failed.
    pub fn as_error(&self) -> Option<&str> {
        match &self.payload {
            FileContextPayload::Error { error } => Some(error),
            FileContextPayload::Content { .. } => None,
        }
    }
}

/// One recorded tool invocation inside an assistant turn.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ToolUse {
    pub name: String,
    pub input: serde_json::Value,
    pub result: String,
    pub is_error: bool,
}

/// One logical exchange unit stored in a session.
///
/// Turns are mutable only until they are appended to a session; afterwards
/// callers only ever see snapshot copies.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ConversationTurn {
    pub role: Role,
    pub content: String,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub file_contexts: Vec<FileContext>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub tool_uses: Vec<ToolUse>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub usage: Option<TokenUsage>,
}

impl ConversationTurn {
    /// A plain turn with no file contexts, tool uses, or usage.
    pub fn new(role: Role, content: impl Into<String>) -> Self {
        Self {
            role,
            content: content.into(),
            file_contexts: Vec::new(),
            tool_uses: Vec::new(),
            usage: None,
        }
    }

    pub fn user(content: impl Into<String>) -> Self {
        Self::new(Role::User, content)
    }

    pub fn assistant(content: impl Into<String>) -> Self {
        Self::new(Role::Assistant, content)
    }

    pub fn system(content: impl Into<String>) -> Self {
        Self::new(Role::System, content)
    }

    pub fn with_file_contexts(mut self, contexts: Vec<FileContext>) -> Self {
        self.file_contexts = contexts;
        self
    }

    pub fn with_usage(mut self, usage: TokenUsage) -> Self {
        self.usage = Some(usage);
        self
    }
}

/// Context handed to an agent's `send_message`.
#[derive(Debug, Clone, Default)]
pub struct MessageContext {
    pub message: String,
    pub file_contexts: Vec<FileContext>,
    pub history: Vec<ConversationTurn>,
}

impl MessageContext {
    pub fn new(message: impl Into<String>) -> Self {
        Self {
            message: message.into(),
            file_contexts: Vec::new(),
            history: Vec::new(),
        }
    }
}
