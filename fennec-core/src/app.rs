//! Application orchestrator
//!
//! Wires every subsystem together: boot sequence, built-in commands,
//! plugin loading, agent establishment, completer wiring, banner, and the
//! REPL itself. Also exposes the CLI flag surface for commands marked
//! `cli_exposed`.

use crate::audit::AuditLogger;
use crate::builtin::builtin_commands;
use crate::clipboard::{Clipboard, NullClipboard};
use crate::command::CommandRegistry;
use crate::completer::{Completer, MAX_PINNED_DISPLAY};
use crate::config;
use crate::context::{AppContext, CommandContext, ShutdownSignal};
use crate::error::{AgentError, CommandError, PluginError};
use crate::loader::{PluginFactory, PluginLoader};
use crate::notify::{ForegroundProbe, NeverForeground, Notifier, NotifyBackend};
use crate::plugin::{AgentPlugin, Plugin, PluginRegistry};
use crate::repl::ReplCore;
use crate::session::Session;
use crate::shell::Shell;
use parking_lot::Mutex;
use std::path::PathBuf;
use std::sync::Arc;

/// Factory for the active agent, invoked at boot when no plugin has
/// claimed the agent capability.
pub type AgentFactory =
    Arc<dyn Fn(&AppConfig) -> Result<Arc<dyn AgentPlugin>, AgentError> + Send + Sync>;

/// Programmatic application configuration.
#[derive(Debug, Clone)]
pub struct AppConfig {
    pub app_name: String,
    pub app_version: String,
    pub default_model: String,
    /// Module identifiers of plugins declared programmatically; loaded
    /// before those declared in the configuration file.
    pub plugins: Vec<String>,
    /// Commands surfaced on a bare `/`, in order.
    pub pinned_commands: Vec<String>,
}

impl AppConfig {
    pub fn new(
        app_name: impl Into<String>,
        app_version: impl Into<String>,
        default_model: impl Into<String>,
    ) -> Self {
        Self {
            app_name: app_name.into(),
            app_version: app_version.into(),
            default_model: default_model.into(),
            plugins: Vec::new(),
            pinned_commands: vec!["help".to_string(), "quit".to_string()],
        }
    }
}

/// Main application. Construct with a config and a shell, then `run`.
pub struct App {
    config: AppConfig,
    shell: Arc<dyn Shell>,
    clipboard: Arc<dyn Clipboard>,
    notify_backend: Option<Arc<dyn NotifyBackend>>,
    foreground_probe: Arc<dyn ForegroundProbe>,
    agent_factory: Option<AgentFactory>,
    loader: PluginLoader,
    config_root: PathBuf,
}

impl App {
    pub fn new(config: AppConfig, shell: Arc<dyn Shell>) -> Self {
        Self {
            config,
            shell,
            clipboard: Arc::new(NullClipboard),
            notify_backend: None,
            foreground_probe: Arc::new(NeverForeground),
            agent_factory: None,
            loader: PluginLoader::new(),
            config_root: PathBuf::from("."),
        }
    }

    pub fn with_clipboard(mut self, clipboard: Arc<dyn Clipboard>) -> Self {
        self.clipboard = clipboard;
        self
    }

    pub fn with_notify_backend(mut self, backend: Arc<dyn NotifyBackend>) -> Self {
        self.notify_backend = Some(backend);
        self
    }

    pub fn with_foreground_probe(mut self, probe: Arc<dyn ForegroundProbe>) -> Self {
        self.foreground_probe = probe;
        self
    }

    pub fn with_agent_factory(mut self, factory: AgentFactory) -> Self {
        self.agent_factory = Some(factory);
        self
    }

    /// Directory the `.fennec` configuration tree lives under.
    pub fn with_config_root(mut self, root: impl Into<PathBuf>) -> Self {
        self.config_root = root.into();
        self
    }

    /// Register a plugin factory under a module identifier so the
    /// configuration file can refer to it.
    pub fn register_plugin_factory(&mut self, module: impl Into<String>, factory: PluginFactory) {
        self.loader.register_factory(module, factory);
    }

    /// Boot every subsystem and return the shared context.
    pub async fn boot(&self) -> Result<AppContext, PluginError> {
        let file_config = config::load_config(&self.config_root);

        let notifier = Arc::new(Notifier::new(
            self.config.app_name.clone(),
            file_config.notifications.to_options(),
            self.notify_backend.clone(),
            Arc::clone(&self.foreground_probe),
        ));
        let audit = Arc::new(AuditLogger::new(
            self.config_root.join(config::CONFIG_DIR),
        ));

        let ctx = AppContext {
            config: Arc::new(self.config.clone()),
            session: Arc::new(Mutex::new(Session::new())),
            commands: Arc::new(Mutex::new(CommandRegistry::new())),
            plugins: Arc::new(Mutex::new(PluginRegistry::new())),
            shell: Arc::clone(&self.shell),
            clipboard: Arc::clone(&self.clipboard),
            notifier,
            audit,
            shutdown: ShutdownSignal::new(),
        };

        {
            let mut commands = ctx.commands.lock();
            for command in builtin_commands() {
                commands.register(command);
            }
        }

        // Programmatic plugins first, then those from the config file.
        let mut modules = self.config.plugins.clone();
        modules.extend(file_config.plugins.paths.iter().cloned());
        for plugin in self.loader.load(&modules) {
            self.attach_plugin(&ctx, plugin).await?;
        }

        self.establish_agent(&ctx).await?;

        let mut pinned = self.config.pinned_commands.clone();
        pinned.truncate(MAX_PINNED_DISPLAY);
        let completer = Completer::new(Arc::clone(&ctx.commands), pinned);
        ctx.shell.bind_completer(Arc::new(Mutex::new(completer)));

        Ok(ctx)
    }

    /// `on_load` then register. Load failures skip the plugin; a second
    /// agent is a configuration error raised to the caller.
    async fn attach_plugin(
        &self,
        ctx: &AppContext,
        plugin: Arc<dyn Plugin>,
    ) -> Result<(), PluginError> {
        if let Err(err) = plugin.on_load(ctx).await {
            tracing::error!("plugin {} skipped: {err}", plugin.name());
            return Ok(());
        }
        let mut registry = ctx.plugins.lock();
        let mut commands = ctx.commands.lock();
        registry.register(plugin, &mut commands)
    }

    /// Establish the active agent via the factory when no loaded plugin
    /// has claimed the agent capability.
    async fn establish_agent(&self, ctx: &AppContext) -> Result<(), PluginError> {
        if ctx.plugins.lock().active_agent().is_some() {
            return Ok(());
        }
        let Some(factory) = &self.agent_factory else {
            tracing::warn!("no agent factory supplied; continuing without an agent");
            return Ok(());
        };
        match factory(&self.config) {
            Ok(agent) => {
                let plugin: Arc<dyn Plugin> = agent;
                self.attach_plugin(ctx, plugin).await
            }
            Err(err) => {
                tracing::warn!("agent unavailable: {err}");
                self.shell
                    .print_info(&format!("Continuing without an agent: {err}"));
                Ok(())
            }
        }
    }

    fn banner(&self, ctx: &AppContext) {
        let shell = &ctx.shell;
        shell.print_info(&format!(
            "{} v{}",
            self.config.app_name, self.config.app_version
        ));

        let (agent, hints) = {
            let plugins = ctx.plugins.lock();
            (plugins.active_agent(), plugins.status_hints())
        };
        match agent {
            Some(agent) => shell.print_info(&format!(
                "Agent: {} ({})",
                agent.name(),
                agent.default_model()
            )),
            None => shell.print_info("No agent configured."),
        }
        for hint in hints {
            shell.print_dim(&hint);
        }
        shell.print_info("Type /help to see available commands.");
    }

    /// Boot, show the banner, and run the REPL until it exits.
    pub async fn run(&self) -> Result<(), PluginError> {
        let ctx = self.boot().await?;
        self.banner(&ctx);

        let mut repl = ReplCore::new(ctx.clone());
        repl.run_loop().await;

        let plugins: Vec<Arc<dyn Plugin>> = ctx.plugins.lock().plugins().to_vec();
        for plugin in plugins {
            plugin.on_unload().await;
        }
        if ctx.audit.is_active() {
            ctx.audit.stop();
        }
        Ok(())
    }

    /// Run a single `cli_exposed` command and return, without entering the
    /// REPL. Used by the `--<name> args...` front-end surface.
    pub async fn run_command(&self, name: &str, args: &str) -> Result<(), CommandError> {
        let ctx = self
            .boot()
            .await
            .map_err(|err| CommandError::new(err.to_string()))?;

        let handler = {
            let commands = ctx.commands.lock();
            commands
                .get(name)
                .filter(|cmd| cmd.cli_exposed)
                .map(|cmd| cmd.handler.clone())
        };
        let Some(handler) = handler else {
            return Err(CommandError::new(format!("unknown flag: --{name}")));
        };

        handler(CommandContext {
            args: args.to_string(),
            app: ctx,
        })
        .await
    }
}
