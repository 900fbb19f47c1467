//! Spawned agent sessions
//!
//! An isolated agent interaction with pre/post hooks that shares no
//! history with the primary session. The primary session remains usable
//! throughout, and multiple spawns may coexist.

use crate::error::{AgentError, SpawnError};
use crate::notify::Notifier;
use crate::plugin::AgentPlugin;
use crate::session::Session;
use crate::shell::Shell;
use crate::stream::StreamProcessor;
use crate::types::{ConversationTurn, MessageContext};
use parking_lot::Mutex;
use std::sync::Arc;
use tokio::sync::watch;

/// Synchronous hook run in the cooperative context around a spawn.
pub type SpawnHook = Box<dyn Fn() -> Result<(), String> + Send + Sync>;

/// Factory producing the fresh agent for each spawn.
pub type SpawnAgentFactory =
    Arc<dyn Fn() -> Result<Arc<dyn AgentPlugin>, AgentError> + Send + Sync>;

/// One spawn request.
pub struct SpawnConfig {
    pub prompt: String,
    pub pre_hook: Option<SpawnHook>,
    pub post_hook: Option<SpawnHook>,
}

impl SpawnConfig {
    pub fn new(prompt: impl Into<String>) -> Self {
        Self {
            prompt: prompt.into(),
            pre_hook: None,
            post_hook: None,
        }
    }

    pub fn with_pre_hook(mut self, hook: SpawnHook) -> Self {
        self.pre_hook = Some(hook);
        self
    }

    pub fn with_post_hook(mut self, hook: SpawnHook) -> Self {
        self.post_hook = Some(hook);
        self
    }
}

/// Spawns independent agent sessions with clean context.
pub struct SessionSpawner {
    factory: SpawnAgentFactory,
    shell: Arc<dyn Shell>,
    notifier: Option<Arc<Notifier>>,
}

impl SessionSpawner {
    pub fn new(
        factory: SpawnAgentFactory,
        shell: Arc<dyn Shell>,
        notifier: Option<Arc<Notifier>>,
    ) -> Self {
        Self {
            factory,
            shell,
            notifier,
        }
    }

    /// Run one spawned session.
    ///
    /// Hook semantics: a pre-hook failure aborts the spawn and the
    /// post-hook does not run. An agent failure still runs the post-hook.
    /// A post-hook failure is reported but never masks an earlier success.
    pub async fn spawn(&self, config: SpawnConfig) -> Result<ConversationTurn, SpawnError> {
        if let Some(pre_hook) = &config.pre_hook {
            if let Err(message) = pre_hook() {
                self.shell
                    .print_error(&format!("Pre-hook failed, aborting spawn: {message}"));
                return Err(SpawnError::PreHook { message });
            }
        }

        let result = self.run_agent(&config.prompt).await;
        if let Err(err) = &result {
            self.shell
                .print_error(&format!("Spawned agent session failed: {err}"));
        }

        if let Some(post_hook) = &config.post_hook {
            if let Err(message) = post_hook() {
                self.shell.print_error(&format!("Post-hook failed: {message}"));
            }
        }

        result.map_err(|err| SpawnError::Agent {
            message: err.to_string(),
        })
    }

    async fn run_agent(&self, prompt: &str) -> Result<ConversationTurn, AgentError> {
        let agent = (self.factory)()?;
        let stream = agent.send_message(MessageContext::new(prompt)).await?;

        // Private session and cancellation scope: the primary loop's
        // interrupts never propagate into a spawn.
        let session = Mutex::new(Session::new());
        let (_cancel_tx, cancel_rx) = watch::channel(false);
        let processor = StreamProcessor::new(Arc::clone(&self.shell), self.notifier.clone());
        Ok(processor.process(stream, &session, cancel_rx).await)
    }
}
