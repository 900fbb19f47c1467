//! fennec - terminal REPL for AI agents

mod clipboard;
mod notify_backend;
mod term;

use clap::Parser;
use clipboard::CommandClipboard;
use fennec_client::{ClaudeAgent, DEFAULT_CLAUDE_MODEL};
use fennec_core::plugin::AgentPlugin;
use fennec_core::{App, AppConfig};
use notify_backend::{DesktopBackend, TerminalForeground};
use std::process::ExitCode;
use std::sync::Arc;
use term::TerminalShell;

const EXIT_SUCCESS: u8 = 0;
const EXIT_ERROR: u8 = 1;

/// Interactive terminal REPL for AI agents.
///
/// With no arguments, starts the interactive session. Any command marked
/// `cli_exposed` is also reachable as `fennec --<name> [args...]`, one
/// flag per invocation.
#[derive(Parser)]
#[command(
    name = "fennec",
    about,
    // `--help` and `--version` route through the command registry so the
    // flag surface matches the interactive one.
    disable_help_flag = true,
    disable_version_flag = true
)]
struct Cli {
    /// Model for the default Claude agent.
    #[arg(long)]
    model: Option<String>,

    /// Plugin module identifier to load (repeatable).
    #[arg(long = "plugin")]
    plugins: Vec<String>,

    /// `--<command> [args...]` dispatch, captured verbatim.
    #[arg(trailing_var_arg = true, allow_hyphen_values = true)]
    rest: Vec<String>,
}

fn build_app(cli: &Cli) -> App {
    let mut config = AppConfig::new(
        "fennec",
        env!("CARGO_PKG_VERSION"),
        cli.model.as_deref().unwrap_or(DEFAULT_CLAUDE_MODEL),
    );
    config.plugins = cli.plugins.clone();

    let mut app = App::new(config, Arc::new(TerminalShell::new()))
        .with_clipboard(Arc::new(CommandClipboard::new()))
        .with_foreground_probe(Arc::new(TerminalForeground))
        .with_agent_factory(Arc::new(|config| {
            ClaudeAgent::from_env(&config.default_model)
                .map(|agent| Arc::new(agent) as Arc<dyn AgentPlugin>)
        }));

    if let Some(backend) = DesktopBackend::detect() {
        app = app.with_notify_backend(Arc::new(backend));
    }
    app
}

#[tokio::main]
async fn main() -> ExitCode {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("warn")),
        )
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();
    let app = build_app(&cli);

    // One-shot flag dispatch: `fennec --version`, `fennec --help`.
    if let Some(first) = cli.rest.first() {
        let Some(name) = first.strip_prefix("--") else {
            eprintln!("unexpected argument: {first}");
            return ExitCode::from(EXIT_ERROR);
        };
        let args = cli.rest[1..].join(" ");
        return match app.run_command(name, &args).await {
            Ok(()) => ExitCode::from(EXIT_SUCCESS),
            Err(err) => {
                eprintln!("{err}");
                ExitCode::from(EXIT_ERROR)
            }
        };
    }

    match app.run().await {
        Ok(()) => ExitCode::from(EXIT_SUCCESS),
        Err(err) => {
            eprintln!("{err}");
            ExitCode::from(EXIT_ERROR)
        }
    }
}
