//! Claude agent plugin
//!
//! Wraps [`AnthropicClient`] in the framework's agent contract and
//! contributes the `/clear` and `/compact` history commands.

use crate::anthropic::{AnthropicClient, MessagesRequest, DEFAULT_CLAUDE_MODEL};
use async_trait::async_trait;
use fennec_core::command::SlashCommand;
use fennec_core::context::CommandContext;
use fennec_core::error::{AgentError, CommandError};
use fennec_core::event::{event_channel, EventStream, StreamEvent};
use fennec_core::plugin::{AgentPlugin, Plugin};
use fennec_core::types::{ConversationTurn, MessageContext, TokenUsage};
use std::sync::Arc;

const COMPACT_PROMPT: &str = "Please provide a concise summary of our conversation so far. \
     Focus on key topics, decisions, and context that would be needed to \
     continue the conversation.";

/// Agent plugin backed by Anthropic's Messages API.
#[derive(Debug)]
pub struct ClaudeAgent {
    client: Arc<AnthropicClient>,
    model: String,
}

impl ClaudeAgent {
    pub fn new(client: AnthropicClient, model: impl Into<String>) -> Self {
        Self {
            client: Arc::new(client),
            model: model.into(),
        }
    }

    /// Construct from environment credentials with the given model, or the
    /// default model when `model` is empty.
    pub fn from_env(model: &str) -> Result<Self, AgentError> {
        let client = AnthropicClient::from_env()?;
        let model = if model.trim().is_empty() {
            DEFAULT_CLAUDE_MODEL
        } else {
            model
        };
        Ok(Self::new(client, model))
    }
}

#[async_trait]
impl Plugin for ClaudeAgent {
    fn name(&self) -> &str {
        "claude"
    }

    fn description(&self) -> &str {
        "Claude agent backed by the Anthropic API"
    }

    fn commands(&self) -> Vec<SlashCommand> {
        vec![
            SlashCommand::new(
                "clear",
                "Clear conversation history",
                "Reset the conversation history and collapsed tool results.",
                Arc::new(|ctx| Box::pin(handle_clear(ctx))),
            ),
            SlashCommand::new(
                "compact",
                "Compact conversation history",
                "Summarize the conversation and replace the history with the summary.",
                Arc::new(|ctx| Box::pin(handle_compact(ctx))),
            ),
        ]
    }

    fn status_hints(&self) -> Vec<String> {
        vec![format!("model: {}", self.model)]
    }

    fn as_agent(self: Arc<Self>) -> Option<Arc<dyn AgentPlugin>> {
        Some(self)
    }
}

#[async_trait]
impl AgentPlugin for ClaudeAgent {
    async fn send_message(&self, ctx: MessageContext) -> Result<EventStream, AgentError> {
        let request =
            MessagesRequest::from_conversation(&ctx.history, &ctx.message, &ctx.file_contexts);
        let client = Arc::clone(&self.client);
        let model = self.model.clone();

        let (tx, rx) = event_channel();
        tokio::spawn(async move {
            match client.complete(&model, request).await {
                Ok(response) => {
                    for block in &response.content {
                        if let crate::anthropic::ContentBlock::Text { text } = block {
                            if tx.send(StreamEvent::text(text.clone())).await.is_err() {
                                return;
                            }
                        }
                    }
                    if let Some(usage) = response.usage {
                        let _ = tx
                            .send(StreamEvent::usage(TokenUsage::new(
                                usage.input_tokens,
                                usage.output_tokens,
                            )))
                            .await;
                    }
                }
                Err(err) => {
                    let _ = tx.send(StreamEvent::error(err.to_string(), true)).await;
                }
            }
        });

        Ok(rx)
    }

    async fn compact_history(&self, history: &[ConversationTurn]) -> Result<String, AgentError> {
        let request = MessagesRequest::from_conversation(history, COMPACT_PROMPT, &[]);
        let response = self
            .client
            .complete(&self.model, request)
            .await
            .map_err(|err| AgentError::compaction(err.to_string()))?;

        let summary = response.text().trim().to_string();
        if summary.is_empty() {
            Ok("(No summary generated)".to_string())
        } else {
            Ok(summary)
        }
    }

    fn default_model(&self) -> &str {
        &self.model
    }
}

async fn handle_clear(ctx: CommandContext) -> Result<(), CommandError> {
    ctx.app.session.lock().clear();
    ctx.app.shell.clear_collapsed();
    ctx.app.shell.print_info("Conversation history cleared.");
    Ok(())
}

async fn handle_compact(ctx: CommandContext) -> Result<(), CommandError> {
    let history = ctx.app.session.lock().history();
    if history.is_empty() {
        ctx.app.shell.print_info("Nothing to compact.");
        return Ok(());
    }

    let agent = ctx.app.plugins.lock().active_agent();
    let Some(agent) = agent else {
        ctx.app.shell.print_info("No agent configured.");
        return Ok(());
    };

    let summary = agent.compact_history(&history).await?;
    ctx.app.session.lock().replace_with_summary(summary);
    ctx.app.shell.print_info("History compacted.");
    Ok(())
}
