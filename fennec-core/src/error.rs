//! Error types for Fennec
//!
//! One enum per failure domain, mirroring the policy table in the design:
//! command and agent failures surface to the user and the loop continues;
//! plugin failures are logged and the plugin skipped; only a second agent
//! registration is raised to the caller at boot.

/// Agent interaction failures (connection, protocol, fatal stream errors).
#[derive(Debug, Clone, thiserror::Error)]
pub enum AgentError {
    /// The agent could not be constructed (missing credentials, bad config).
    #[error("agent unavailable: {reason}")]
    Unavailable { reason: String },

    /// A request to the agent backend failed.
    #[error("agent request failed: {message}")]
    Request { message: String },

    /// History compaction failed.
    #[error("compaction failed: {message}")]
    Compaction { message: String },
}

impl AgentError {
    pub fn unavailable(reason: impl Into<String>) -> Self {
        Self::Unavailable {
            reason: reason.into(),
        }
    }

    pub fn request(message: impl Into<String>) -> Self {
        Self::Request {
            message: message.into(),
        }
    }

    pub fn compaction(message: impl Into<String>) -> Self {
        Self::Compaction {
            message: message.into(),
        }
    }
}

/// Failure inside a slash command handler. Displayed, never fatal to the loop.
#[derive(Debug, Clone, thiserror::Error)]
#[error("{message}")]
pub struct CommandError {
    pub message: String,
}

impl CommandError {
    pub fn new(message: impl Into<String>) -> Self {
        Self {
            message: message.into(),
        }
    }
}

impl From<AgentError> for CommandError {
    fn from(err: AgentError) -> Self {
        Self::new(err.to_string())
    }
}

impl From<ClipboardError> for CommandError {
    fn from(err: ClipboardError) -> Self {
        Self::new(err.to_string())
    }
}

/// Plugin load and registration failures.
#[derive(Debug, Clone, thiserror::Error)]
pub enum PluginError {
    /// No factory is registered under the requested module identifier.
    #[error("unknown plugin module: {module}")]
    UnknownModule { module: String },

    /// The plugin factory itself failed.
    #[error("plugin factory for {module} failed: {message}")]
    Factory { module: String, message: String },

    /// `on_load` failed; the plugin is skipped.
    #[error("plugin {name} failed to load: {message}")]
    OnLoad { name: String, message: String },

    /// A second agent plugin was registered. The first remains active.
    #[error("agent plugin {name} rejected: an active agent is already registered")]
    AgentAlreadyRegistered { name: String },
}

impl PluginError {
    pub fn unknown_module(module: impl Into<String>) -> Self {
        Self::UnknownModule {
            module: module.into(),
        }
    }

    pub fn factory(module: impl Into<String>, message: impl Into<String>) -> Self {
        Self::Factory {
            module: module.into(),
            message: message.into(),
        }
    }

    pub fn on_load(name: impl Into<String>, message: impl Into<String>) -> Self {
        Self::OnLoad {
            name: name.into(),
            message: message.into(),
        }
    }
}

/// How the input prompt ended without producing a line.
#[derive(Debug, Clone, Copy, PartialEq, Eq, thiserror::Error)]
pub enum ShellError {
    /// The user interrupted the prompt (Ctrl+C).
    #[error("interrupted")]
    Interrupted,
    /// End of input (Ctrl+D / closed stdin).
    #[error("end of input")]
    Eof,
}

/// Clipboard collaborator failures.
#[derive(Debug, Clone, thiserror::Error)]
pub enum ClipboardError {
    #[error("clipboard utility not found: {utility}")]
    MissingUtility { utility: String },

    #[error("clipboard not supported on this platform: {platform}")]
    UnsupportedPlatform { platform: String },

    #[error("clipboard copy failed: {detail}")]
    Subprocess { detail: String },
}

/// Spawned-session failures, keeping the pre/post hook masking rules.
#[derive(Debug, Clone, thiserror::Error)]
pub enum SpawnError {
    /// The pre-hook failed; the spawn was aborted and no post-hook ran.
    #[error("pre-hook failed: {message}")]
    PreHook { message: String },

    /// The agent failed; the post-hook still ran.
    #[error("spawned agent session failed: {message}")]
    Agent { message: String },
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_display() {
        let err = PluginError::unknown_module("demo.plugin");
        assert_eq!(err.to_string(), "unknown plugin module: demo.plugin");

        let err = AgentError::request("connection refused");
        assert_eq!(err.to_string(), "agent request failed: connection refused");

        let err = ClipboardError::MissingUtility {
            utility: "xclip".to_string(),
        };
        assert_eq!(err.to_string(), "clipboard utility not found: xclip");
    }
}
