//! Dispatcher behavior: error boundaries, unknown commands, mention flow.

use async_trait::async_trait;
use fennec_core::testing::{RecordingShell, ScriptedAgent, ShellCall};
use fennec_core::{
    AgentPlugin, App, AppConfig, CommandError, Plugin, ReplCore, Role, SlashCommand, StreamEvent,
};
use std::sync::Arc;
use tempfile::TempDir;

struct GrumpyPlugin;

#[async_trait]
impl Plugin for GrumpyPlugin {
    fn name(&self) -> &str {
        "grumpy"
    }

    fn description(&self) -> &str {
        "plugin whose command always fails"
    }

    fn commands(&self) -> Vec<SlashCommand> {
        vec![SlashCommand::new(
            "grump",
            "Always fails",
            "",
            Arc::new(|_ctx| Box::pin(async { Err(CommandError::new("bad mood")) })),
        )]
    }
}

async fn booted_repl(
    tmp: &TempDir,
    shell: Arc<RecordingShell>,
    agent: Option<Arc<ScriptedAgent>>,
) -> ReplCore {
    let mut app = App::new(AppConfig::new("fennec", "0.1.0", "scripted-model"), shell)
        .with_config_root(tmp.path());
    if let Some(agent) = agent {
        app = app.with_agent_factory(Arc::new(move |_config| {
            Ok(Arc::clone(&agent) as Arc<dyn AgentPlugin>)
        }));
    }
    app.register_plugin_factory("test.grumpy", Arc::new(|| Ok(Arc::new(GrumpyPlugin))));
    let ctx = app.boot().await.unwrap();
    ReplCore::new(ctx)
}

#[tokio::test]
async fn unknown_command_displays_and_continues() {
    let tmp = TempDir::new().unwrap();
    let shell = Arc::new(RecordingShell::new());
    let mut repl = booted_repl(&tmp, Arc::clone(&shell), None).await;

    repl.handle_input("/doesnotexist").await;
    assert_eq!(
        shell.count(|c| matches!(c, ShellCall::Error(msg)
            if msg == "Unknown command: /doesnotexist")),
        1
    );
}

#[tokio::test]
async fn handler_failure_is_caught() {
    let tmp = TempDir::new().unwrap();
    std::fs::create_dir_all(tmp.path().join(".fennec")).unwrap();
    std::fs::write(
        tmp.path().join(".fennec/config.toml"),
        "[plugins]\npaths = [\"test.grumpy\"]\n",
    )
    .unwrap();

    let shell = Arc::new(RecordingShell::new());
    let mut repl = booted_repl(&tmp, Arc::clone(&shell), None).await;

    repl.handle_input("/grump").await;
    assert_eq!(
        shell.count(|c| matches!(c, ShellCall::Error(msg)
            if msg == "Command /grump failed: bad mood")),
        1
    );
}

#[tokio::test]
async fn free_text_without_agent_reports_error() {
    let tmp = TempDir::new().unwrap();
    let shell = Arc::new(RecordingShell::new());
    let mut repl = booted_repl(&tmp, Arc::clone(&shell), None).await;

    repl.handle_input("hello?").await;
    assert_eq!(
        shell.count(|c| matches!(c, ShellCall::Error(msg) if msg == "No agent configured.")),
        1
    );
}

#[tokio::test]
async fn empty_input_is_ignored() {
    let tmp = TempDir::new().unwrap();
    let shell = Arc::new(RecordingShell::new());
    let mut repl = booted_repl(&tmp, Arc::clone(&shell), None).await;

    repl.handle_input("   ").await;
    // Only the boot-time info lines, no errors and no agent traffic.
    assert_eq!(shell.count(|c| matches!(c, ShellCall::Error(_))), 0);
}

#[tokio::test]
async fn mentions_resolve_into_message_context() {
    let tmp = TempDir::new().unwrap();
    let note = tmp.path().join("note.txt");
    std::fs::write(&note, "remember this").unwrap();

    let shell = Arc::new(RecordingShell::new());
    let agent = Arc::new(ScriptedAgent::new("reader"));
    agent.script(vec![StreamEvent::text("noted")]);

    let mut repl = booted_repl(&tmp, Arc::clone(&shell), Some(Arc::clone(&agent))).await;
    repl.handle_input(&format!("summarize @{}", note.display()))
        .await;

    let contexts = agent.contexts();
    assert_eq!(contexts.len(), 1);
    assert_eq!(contexts[0].file_contexts.len(), 1);
    assert_eq!(
        contexts[0].file_contexts[0].as_content(),
        Some("remember this")
    );
}

#[tokio::test]
async fn missing_mention_is_reported_but_message_still_sent() {
    let tmp = TempDir::new().unwrap();
    let shell = Arc::new(RecordingShell::new());
    let agent = Arc::new(ScriptedAgent::new("reader"));
    agent.script(vec![StreamEvent::text("ok")]);

    let mut repl = booted_repl(&tmp, Arc::clone(&shell), Some(Arc::clone(&agent))).await;
    repl.handle_input("see @/nowhere/missing.txt").await;

    assert_eq!(
        shell.count(|c| matches!(c, ShellCall::Info(msg)
            if msg == "@/nowhere/missing.txt: not found")),
        1
    );
    assert_eq!(agent.contexts().len(), 1);
    assert_eq!(
        agent.contexts()[0].file_contexts[0].as_error(),
        Some("not found")
    );
}

#[tokio::test]
async fn conversation_turns_append_in_order() {
    let tmp = TempDir::new().unwrap();
    let shell = Arc::new(RecordingShell::new());
    let agent = Arc::new(ScriptedAgent::new("echo"));
    agent.script(vec![StreamEvent::text("first reply")]);
    agent.script(vec![StreamEvent::text("second reply")]);

    let mut app = App::new(
        AppConfig::new("fennec", "0.1.0", "scripted-model"),
        Arc::clone(&shell) as Arc<dyn fennec_core::Shell>,
    )
    .with_config_root(tmp.path());
    let factory_agent = Arc::clone(&agent);
    app = app.with_agent_factory(Arc::new(move |_config| {
        Ok(Arc::clone(&factory_agent) as Arc<dyn AgentPlugin>)
    }));
    let ctx = app.boot().await.unwrap();
    let mut repl = ReplCore::new(ctx.clone());

    repl.handle_input("one").await;
    repl.handle_input("two").await;

    let history = ctx.session.lock().history();
    let roles: Vec<Role> = history.iter().map(|t| t.role).collect();
    assert_eq!(
        roles,
        vec![Role::User, Role::Assistant, Role::User, Role::Assistant]
    );
    assert_eq!(history[1].content, "first reply");
    assert_eq!(history[3].content, "second reply");

    // The second send saw the first exchange as history.
    let contexts = agent.contexts();
    assert_eq!(contexts[1].history.len(), 2);
}

#[tokio::test]
async fn send_failure_surfaces_as_agent_error() {
    let tmp = TempDir::new().unwrap();
    let shell = Arc::new(RecordingShell::new());
    let agent = Arc::new(ScriptedAgent::new("flaky"));
    agent.fail_next_send("socket closed");

    let mut repl = booted_repl(&tmp, Arc::clone(&shell), Some(agent)).await;
    repl.handle_input("are you there?").await;

    assert_eq!(
        shell.count(|c| matches!(c, ShellCall::Error(msg)
            if msg.contains("Agent error") && msg.contains("socket closed"))),
        1
    );
}
