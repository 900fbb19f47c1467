//! Orchestrator boot sequence tests.

use fennec_core::testing::{FailingPlugin, RecordingShell, ScriptedAgent, ShellCall};
use fennec_core::{AgentPlugin, App, AppConfig, PluginError, StreamEvent};
use std::sync::Arc;
use tempfile::TempDir;

fn test_app(shell: Arc<RecordingShell>, root: &TempDir) -> App {
    let config = AppConfig::new("fennec", "0.1.0", "scripted-model");
    App::new(config, shell).with_config_root(root.path())
}

fn scripted_agent_factory(agent: Arc<ScriptedAgent>) -> fennec_core::AgentFactory {
    Arc::new(move |_config| Ok(Arc::clone(&agent) as Arc<dyn AgentPlugin>))
}

#[tokio::test]
async fn boot_registers_builtin_commands() {
    let tmp = TempDir::new().unwrap();
    let shell = Arc::new(RecordingShell::new());
    let app = test_app(shell, &tmp);

    let ctx = app.boot().await.unwrap();
    let commands = ctx.commands.lock();
    for name in ["help", "quit", "version", "copy", "agent", "stats", "notify", "audit"] {
        assert!(commands.get(name).is_some(), "missing builtin /{name}");
    }
    assert!(commands.get("help").unwrap().pinned);
    assert!(commands.get("quit").unwrap().pinned);
}

#[tokio::test]
async fn boot_creates_default_config_file() {
    let tmp = TempDir::new().unwrap();
    let shell = Arc::new(RecordingShell::new());
    let app = test_app(shell, &tmp);

    app.boot().await.unwrap();
    assert!(tmp.path().join(".fennec/config.toml").exists());
}

#[tokio::test]
async fn boot_loads_config_declared_plugins() {
    let tmp = TempDir::new().unwrap();
    std::fs::create_dir_all(tmp.path().join(".fennec")).unwrap();
    std::fs::write(
        tmp.path().join(".fennec/config.toml"),
        "[plugins]\npaths = [\"demo.agent\"]\n",
    )
    .unwrap();

    let shell = Arc::new(RecordingShell::new());
    let mut app = test_app(shell, &tmp);
    app.register_plugin_factory(
        "demo.agent",
        Arc::new(|| Ok(Arc::new(ScriptedAgent::new("demo")))),
    );

    let ctx = app.boot().await.unwrap();
    assert_eq!(ctx.plugins.lock().active_agent().unwrap().name(), "demo");
}

#[tokio::test]
async fn on_load_failure_skips_plugin() {
    let tmp = TempDir::new().unwrap();
    let shell = Arc::new(RecordingShell::new());
    let mut app = test_app(shell, &tmp);
    app.register_plugin_factory(
        "demo.broken",
        Arc::new(|| {
            Ok(Arc::new(FailingPlugin {
                name: "broken".to_string(),
            }))
        }),
    );
    std::fs::create_dir_all(tmp.path().join(".fennec")).unwrap();
    std::fs::write(
        tmp.path().join(".fennec/config.toml"),
        "[plugins]\npaths = [\"demo.broken\"]\n",
    )
    .unwrap();

    let ctx = app.boot().await.unwrap();
    assert!(ctx.plugins.lock().plugins().is_empty());
}

#[tokio::test]
async fn second_agent_plugin_raises_at_boot() {
    let tmp = TempDir::new().unwrap();
    std::fs::create_dir_all(tmp.path().join(".fennec")).unwrap();
    std::fs::write(
        tmp.path().join(".fennec/config.toml"),
        "[plugins]\npaths = [\"agent.one\", \"agent.two\"]\n",
    )
    .unwrap();

    let shell = Arc::new(RecordingShell::new());
    let mut app = test_app(shell, &tmp);
    app.register_plugin_factory("agent.one", Arc::new(|| Ok(Arc::new(ScriptedAgent::new("one")))));
    app.register_plugin_factory("agent.two", Arc::new(|| Ok(Arc::new(ScriptedAgent::new("two")))));

    let err = app.boot().await.unwrap_err();
    assert!(matches!(
        err,
        PluginError::AgentAlreadyRegistered { ref name } if name == "two"
    ));
}

#[tokio::test]
async fn factory_agent_skipped_when_plugin_agent_active() {
    let tmp = TempDir::new().unwrap();
    std::fs::create_dir_all(tmp.path().join(".fennec")).unwrap();
    std::fs::write(
        tmp.path().join(".fennec/config.toml"),
        "[plugins]\npaths = [\"agent.plugin\"]\n",
    )
    .unwrap();

    let shell = Arc::new(RecordingShell::new());
    let factory_agent = Arc::new(ScriptedAgent::new("factory"));
    let mut app = test_app(shell, &tmp).with_agent_factory(scripted_agent_factory(factory_agent));
    app.register_plugin_factory(
        "agent.plugin",
        Arc::new(|| Ok(Arc::new(ScriptedAgent::new("from-plugin")))),
    );

    let ctx = app.boot().await.unwrap();
    assert_eq!(
        ctx.plugins.lock().active_agent().unwrap().name(),
        "from-plugin"
    );
}

#[tokio::test]
async fn run_exits_on_eof_and_shows_banner() {
    let tmp = TempDir::new().unwrap();
    let shell = Arc::new(RecordingShell::new());
    let agent = Arc::new(ScriptedAgent::new("banner-agent"));
    let app = test_app(Arc::clone(&shell), &tmp)
        .with_agent_factory(scripted_agent_factory(agent));

    // No scripted lines: read_line reports EOF immediately.
    app.run().await.unwrap();

    assert_eq!(
        shell.count(|c| matches!(c, ShellCall::Info(msg) if msg == "fennec v0.1.0")),
        1
    );
    assert_eq!(
        shell.count(|c| matches!(c, ShellCall::Info(msg)
            if msg == "Agent: banner-agent (scripted-model)")),
        1
    );
    assert_eq!(
        shell.count(|c| matches!(c, ShellCall::Info(msg)
            if msg == "Type /help to see available commands.")),
        1
    );
}

#[tokio::test]
async fn run_command_dispatches_cli_exposed() {
    let tmp = TempDir::new().unwrap();
    let shell = Arc::new(RecordingShell::new());
    let app = test_app(Arc::clone(&shell), &tmp);

    app.run_command("version", "").await.unwrap();
    assert_eq!(
        shell.count(|c| matches!(c, ShellCall::Info(msg) if msg == "fennec v0.1.0")),
        1
    );
}

#[tokio::test]
async fn run_command_rejects_unexposed_and_unknown() {
    let tmp = TempDir::new().unwrap();
    let shell = Arc::new(RecordingShell::new());
    let app = test_app(shell, &tmp);

    // /stats exists but is not cli_exposed.
    assert!(app.run_command("stats", "").await.is_err());
    assert!(app.run_command("nonsense", "").await.is_err());
}

#[tokio::test]
async fn scripted_agent_events_flow_through_run() {
    let tmp = TempDir::new().unwrap();
    let shell = Arc::new(RecordingShell::new());
    shell.push_line("hello agent");
    shell.push_line("/quit");

    let agent = Arc::new(ScriptedAgent::new("flow"));
    agent.script(vec![StreamEvent::text("hello user")]);

    let app = test_app(Arc::clone(&shell), &tmp)
        .with_agent_factory(scripted_agent_factory(Arc::clone(&agent)));
    app.run().await.unwrap();

    // The agent saw the message with empty prior history.
    let contexts = agent.contexts();
    assert_eq!(contexts.len(), 1);
    assert_eq!(contexts[0].message, "hello agent");
    assert!(contexts[0].history.is_empty());

    // The response streamed into the live view.
    assert_eq!(
        shell.count(|c| matches!(c, ShellCall::AppendLive(text) if text == "hello user")),
        1
    );
}
