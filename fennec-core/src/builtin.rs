//! Built-in slash commands
//!
//! `/help`, `/quit`, `/version`, `/copy`, `/agent`, `/stats`, `/notify`,
//! and `/audit`. `help` and `quit` are pinned; `help` and `version` are
//! exposed on the CLI flag surface.

use crate::audit::AuditKind;
use crate::command::SlashCommand;
use crate::context::CommandContext;
use crate::error::CommandError;
use std::sync::Arc;

pub fn create_help_command() -> SlashCommand {
    SlashCommand::new(
        "help",
        "Show available commands",
        "Display a list of all available slash commands with descriptions.",
        Arc::new(|ctx| Box::pin(handle_help(ctx))),
    )
    .pinned()
    .cli_exposed()
}

pub fn create_quit_command() -> SlashCommand {
    SlashCommand::new(
        "quit",
        "Exit the REPL",
        "Cancel any running agent request and exit the application.",
        Arc::new(|ctx| Box::pin(handle_quit(ctx))),
    )
    .pinned()
}

pub fn create_version_command() -> SlashCommand {
    SlashCommand::new(
        "version",
        "Show version",
        "Display the application version.",
        Arc::new(|ctx| Box::pin(handle_version(ctx))),
    )
    .cli_exposed()
}

pub fn create_copy_command() -> SlashCommand {
    SlashCommand::new(
        "copy",
        "Copy last response to clipboard",
        "Copy the most recent assistant response to the system clipboard.",
        Arc::new(|ctx| Box::pin(handle_copy(ctx))),
    )
}

pub fn create_agent_command() -> SlashCommand {
    SlashCommand::new(
        "agent",
        "Show active agent",
        "Display the active agent, its model, and plugin status hints.",
        Arc::new(|ctx| Box::pin(handle_agent(ctx))),
    )
}

pub fn create_stats_command() -> SlashCommand {
    SlashCommand::new(
        "stats",
        "Show token statistics",
        "Display cumulative token usage for this session.",
        Arc::new(|ctx| Box::pin(handle_stats(ctx))),
    )
}

pub fn create_notify_command() -> SlashCommand {
    SlashCommand::new(
        "notify",
        "Toggle desktop notifications",
        "Toggle notifications at runtime: /notify [on|off].",
        Arc::new(|ctx| Box::pin(handle_notify(ctx))),
    )
}

pub fn create_audit_command() -> SlashCommand {
    SlashCommand::new(
        "audit",
        "Toggle the audit log",
        "Start or stop the session audit log: /audit [on|off].",
        Arc::new(|ctx| Box::pin(handle_audit(ctx))),
    )
}

/// All built-in commands in registration order.
pub fn builtin_commands() -> Vec<SlashCommand> {
    vec![
        create_help_command(),
        create_quit_command(),
        create_version_command(),
        create_copy_command(),
        create_agent_command(),
        create_stats_command(),
        create_notify_command(),
        create_audit_command(),
    ]
}

async fn handle_help(ctx: CommandContext) -> Result<(), CommandError> {
    let commands = ctx.app.commands.lock().list_all();
    let mut lines = vec!["**Available commands:**".to_string(), String::new()];
    for cmd in commands {
        lines.push(format!("- `/{}`: {}", cmd.name, cmd.description));
    }
    ctx.app.shell.print_markdown(&lines.join("\n"));
    Ok(())
}

async fn handle_quit(ctx: CommandContext) -> Result<(), CommandError> {
    ctx.app.shutdown.request();
    Ok(())
}

async fn handle_version(ctx: CommandContext) -> Result<(), CommandError> {
    let config = &ctx.app.config;
    ctx.app
        .shell
        .print_info(&format!("{} v{}", config.app_name, config.app_version));
    Ok(())
}

async fn handle_copy(ctx: CommandContext) -> Result<(), CommandError> {
    let text = ctx.app.session.lock().last_assistant_response();
    let Some(text) = text else {
        ctx.app.shell.print_info("No agent output to copy.");
        return Ok(());
    };
    ctx.app.clipboard.copy(&text)?;
    ctx.app.shell.print_info("Copied to clipboard.");
    Ok(())
}

async fn handle_agent(ctx: CommandContext) -> Result<(), CommandError> {
    let (agent, hints) = {
        let plugins = ctx.app.plugins.lock();
        (plugins.active_agent(), plugins.status_hints())
    };
    match agent {
        Some(agent) => {
            ctx.app.shell.print_info(&format!(
                "Agent: {} ({})",
                agent.name(),
                agent.default_model()
            ));
            for hint in hints {
                ctx.app.shell.print_dim(&hint);
            }
        }
        None => ctx.app.shell.print_info("No agent configured."),
    }
    Ok(())
}

async fn handle_stats(ctx: CommandContext) -> Result<(), CommandError> {
    let stats = ctx.app.session.lock().stats();
    ctx.app.shell.print_info(&format!(
        "Tokens: {} in / {} out ({} total)",
        stats.total_input_tokens,
        stats.total_output_tokens,
        stats.total_tokens()
    ));
    Ok(())
}

async fn handle_notify(ctx: CommandContext) -> Result<(), CommandError> {
    let notifier = &ctx.app.notifier;
    let enabled = match ctx.args.trim() {
        "on" => true,
        "off" => false,
        "" => !notifier.is_enabled(),
        other => {
            return Err(CommandError::new(format!(
                "unknown argument: {other} (expected on or off)"
            )))
        }
    };
    notifier.set_enabled(enabled);
    let state = if enabled { "enabled" } else { "disabled" };
    ctx.app.shell.print_info(&format!("Notifications {state}."));
    Ok(())
}

async fn handle_audit(ctx: CommandContext) -> Result<(), CommandError> {
    let audit = &ctx.app.audit;
    let turn_on = match ctx.args.trim() {
        "on" => true,
        "off" => false,
        "" => !audit.is_active(),
        other => {
            return Err(CommandError::new(format!(
                "unknown argument: {other} (expected on or off)"
            )))
        }
    };

    if turn_on {
        if audit.is_active() {
            ctx.app.shell.print_info("Audit log already active.");
            return Ok(());
        }
        let path = audit
            .start()
            .map_err(|err| CommandError::new(format!("could not start audit log: {err}")))?;
        ctx.app
            .shell
            .print_info(&format!("Audit started: {}", path.display()));
    } else {
        if !audit.is_active() {
            ctx.app.shell.print_info("Audit log is not active.");
            return Ok(());
        }
        audit.log(AuditKind::Info, "Audit stop requested");
        audit.stop();
        ctx.app.shell.print_info("Audit stopped.");
    }
    Ok(())
}
