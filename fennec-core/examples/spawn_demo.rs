//! Drive an isolated spawned session against a scripted agent.
//!
//! Run with: cargo run -p fennec-core --example spawn_demo

use fennec_core::testing::{RecordingShell, ScriptedAgent};
use fennec_core::{AgentPlugin, SessionSpawner, SpawnConfig, StreamEvent};
use std::sync::Arc;

#[tokio::main(flavor = "current_thread")]
async fn main() {
    let agent = Arc::new(ScriptedAgent::new("demo"));
    agent.script(vec![StreamEvent::text("Hello from a spawned session.")]);

    let shell = Arc::new(RecordingShell::new());
    let spawner = SessionSpawner::new(
        Arc::new(move || Ok(Arc::clone(&agent) as Arc<dyn AgentPlugin>)),
        shell,
        None,
    );

    let turn = spawner
        .spawn(
            SpawnConfig::new("say hello")
                .with_pre_hook(Box::new(|| {
                    println!("pre-hook: preparing scratch space");
                    Ok(())
                }))
                .with_post_hook(Box::new(|| {
                    println!("post-hook: cleaning up");
                    Ok(())
                })),
        )
        .await
        .expect("spawned session");

    println!("spawned agent said: {}", turn.content);
}
