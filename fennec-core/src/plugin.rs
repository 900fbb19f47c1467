//! Plugin capability traits and registry
//!
//! A plugin contributes slash commands and status hints. An agent plugin
//! additionally speaks the message/compaction contract; at most one agent
//! is active per registry, and attempting to adopt a second is a
//! recoverable configuration error raised to the caller.

use crate::command::{CommandRegistry, SlashCommand};
use crate::context::AppContext;
use crate::error::{AgentError, PluginError};
use crate::event::EventStream;
use crate::types::{ConversationTurn, MessageContext};
use async_trait::async_trait;
use std::sync::Arc;

/// Minimum plugin capability set.
#[async_trait]
pub trait Plugin: Send + Sync {
    fn name(&self) -> &str;

    fn description(&self) -> &str;

    /// Commands this plugin contributes. Registered on plugin registration;
    /// name collisions override earlier commands.
    fn commands(&self) -> Vec<SlashCommand> {
        Vec::new()
    }

    /// Called once before registration. Failure skips the plugin.
    async fn on_load(&self, _ctx: &AppContext) -> Result<(), PluginError> {
        Ok(())
    }

    async fn on_unload(&self) {}

    /// Short lines surfaced by `/agent` and the banner.
    fn status_hints(&self) -> Vec<String> {
        Vec::new()
    }

    /// Agent capability detection. Plugins that implement [`AgentPlugin`]
    /// return themselves here.
    fn as_agent(self: Arc<Self>) -> Option<Arc<dyn AgentPlugin>> {
        None
    }
}

/// The agent capability set on top of [`Plugin`].
#[async_trait]
pub trait AgentPlugin: Plugin {
    /// Send a message and obtain the lazy event sequence of the response.
    ///
    /// Implementations may suspend at any await point and must honour
    /// cooperative cancellation (the receiver being dropped).
    async fn send_message(&self, ctx: MessageContext) -> Result<EventStream, AgentError>;

    /// Summarize a conversation history into a single string.
    async fn compact_history(&self, history: &[ConversationTurn]) -> Result<String, AgentError>;

    fn default_model(&self) -> &str;
}

/// Owns loaded plugins and the single active agent reference.
#[derive(Default)]
pub struct PluginRegistry {
    plugins: Vec<Arc<dyn Plugin>>,
    agent: Option<Arc<dyn AgentPlugin>>,
}

impl PluginRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a plugin: adopt its agent capability (if unclaimed) and
    /// route its commands into the command registry.
    ///
    /// A second agent plugin is rejected before any of its commands are
    /// registered; the first agent remains active.
    pub fn register(
        &mut self,
        plugin: Arc<dyn Plugin>,
        commands: &mut CommandRegistry,
    ) -> Result<(), PluginError> {
        if let Some(agent) = Arc::clone(&plugin).as_agent() {
            if self.agent.is_some() {
                return Err(PluginError::AgentAlreadyRegistered {
                    name: plugin.name().to_string(),
                });
            }
            self.agent = Some(agent);
        }

        for command in plugin.commands() {
            commands.register(command);
        }
        self.plugins.push(plugin);
        Ok(())
    }

    /// Non-owning reference to the active agent, if any.
    pub fn active_agent(&self) -> Option<Arc<dyn AgentPlugin>> {
        self.agent.clone()
    }

    pub fn plugins(&self) -> &[Arc<dyn Plugin>] {
        &self.plugins
    }

    /// Per-plugin hints concatenated in registration order.
    pub fn status_hints(&self) -> Vec<String> {
        self.plugins
            .iter()
            .flat_map(|p| p.status_hints())
            .collect()
    }
}
