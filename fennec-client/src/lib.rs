//! fennec-client - Claude agent plugin for Fennec
//!
//! Implements the `AgentPlugin` contract against Anthropic's Messages
//! API and contributes the `/clear` and `/compact` commands.

mod anthropic;
mod plugin;

pub use anthropic::{
    AnthropicClient, AnthropicClientBuilder, ApiUsage, ContentBlock, MessagesRequest,
    MessagesResponse, DEFAULT_CLAUDE_MODEL,
};
pub use plugin::ClaudeAgent;
