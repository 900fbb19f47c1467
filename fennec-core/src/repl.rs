//! REPL dispatcher
//!
//! The main cooperative loop: prompt, parse, dispatch. Command handler
//! failures and agent failures surface as user-visible messages and the
//! loop continues; only `/quit`, EOF at idle, or an interrupt at idle end
//! the loop.

use crate::audit::AuditKind;
use crate::context::{AppContext, CommandContext};
use crate::error::ShellError;
use crate::file_context::FileContextResolver;
use crate::parser::{self, ParsedInput};
use crate::stream::StreamProcessor;
use crate::types::{ConversationTurn, MessageContext};
use std::sync::Arc;
use tokio::sync::watch;

/// The read-eval-print loop.
pub struct ReplCore {
    ctx: AppContext,
    resolver: FileContextResolver,
}

impl ReplCore {
    pub fn new(ctx: AppContext) -> Self {
        Self {
            ctx,
            resolver: FileContextResolver::new(),
        }
    }

    /// Run until `/quit`, EOF, or an interrupt at the idle prompt.
    pub async fn run_loop(&mut self) {
        while !self.ctx.shutdown.is_requested() {
            match self.ctx.shell.read_line().await {
                Ok(line) => self.handle_input(&line).await,
                // No task is in flight while the prompt is open, so both
                // interrupt and EOF end the loop here.
                Err(ShellError::Interrupted) | Err(ShellError::Eof) => break,
            }
        }
    }

    /// Parse and dispatch a single raw input line.
    pub async fn handle_input(&mut self, raw: &str) {
        match parser::parse(raw) {
            ParsedInput::Empty => {}
            ParsedInput::Command { name, args } => {
                self.ctx
                    .audit
                    .log(AuditKind::Command, &format!("/{name} {args}"));
                self.dispatch_command(&name, args).await;
            }
            ParsedInput::FreeText { text, mentions } => {
                self.ctx.audit.log(AuditKind::Input, &text);
                self.dispatch_free_text(text, &mentions).await;
            }
        }
    }

    async fn dispatch_command(&self, name: &str, args: String) {
        let handler = {
            let commands = self.ctx.commands.lock();
            commands.get(name).map(|cmd| cmd.handler.clone())
        };

        let Some(handler) = handler else {
            self.ctx
                .shell
                .print_error(&format!("Unknown command: /{name}"));
            return;
        };

        let cmd_ctx = CommandContext {
            args,
            app: self.ctx.clone(),
        };
        if let Err(err) = handler(cmd_ctx).await {
            self.ctx
                .shell
                .print_error(&format!("Command /{name} failed: {err}"));
            self.ctx.audit.log(AuditKind::Error, &err.to_string());
        }
    }

    async fn dispatch_free_text(&self, text: String, mentions: &[String]) {
        let agent = self.ctx.plugins.lock().active_agent();
        let Some(agent) = agent else {
            self.ctx.shell.print_error("No agent configured.");
            return;
        };

        let file_contexts = self.resolver.resolve(mentions);
        for context in &file_contexts {
            if let Some(error) = context.as_error() {
                self.ctx
                    .shell
                    .print_info(&format!("@{}: {error}", context.path));
            }
        }

        // Snapshot history before the new user turn so the agent sees the
        // current message exactly once.
        let history = self.ctx.session.lock().history();
        self.ctx.session.lock().add_turn(
            ConversationTurn::user(text.clone()).with_file_contexts(file_contexts.clone()),
        );

        let message_ctx = MessageContext {
            message: text,
            file_contexts,
            history,
        };

        let stream = match agent.send_message(message_ctx).await {
            Ok(stream) => stream,
            Err(err) => {
                self.ctx.shell.print_error(&format!("Agent error: {err}"));
                self.ctx.audit.log(AuditKind::Error, &err.to_string());
                return;
            }
        };

        let (cancel_tx, cancel_rx) = watch::channel(false);
        let processor = StreamProcessor::new(
            Arc::clone(&self.ctx.shell),
            Some(Arc::clone(&self.ctx.notifier)),
        );

        let session = Arc::clone(&self.ctx.session);
        let process = processor.process(stream, &session, cancel_rx);
        tokio::pin!(process);

        let turn = loop {
            tokio::select! {
                turn = &mut process => break turn,
                _ = tokio::signal::ctrl_c() => {
                    // In-flight stream: cancel cooperatively, keep looping
                    // until the processor finalizes the partial turn.
                    let _ = cancel_tx.send(true);
                    self.ctx.shell.print_info("Agent request cancelled.");
                }
            }
        };

        self.ctx.audit.log(AuditKind::Agent, &turn.content);
        for tool_use in &turn.tool_uses {
            self.ctx.audit.log(
                AuditKind::ToolResult,
                &format!("{}: {}", tool_use.name, tool_use.result),
            );
        }
    }
}
