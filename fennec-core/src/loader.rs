//! Plugin loading
//!
//! Maps dotted module identifiers from the configuration to registered
//! factory functions. Rust has no runtime module import, so embedding
//! applications register a factory per identifier; configuration entries
//! then resolve against that table. Any failure is logged and the plugin
//! skipped.

use crate::error::PluginError;
use crate::plugin::Plugin;
use std::collections::HashMap;
use std::sync::Arc;

/// Factory producing a plugin instance for one module identifier.
pub type PluginFactory = Arc<dyn Fn() -> Result<Arc<dyn Plugin>, PluginError> + Send + Sync>;

/// Table of plugin factories keyed by module identifier.
#[derive(Default)]
pub struct PluginLoader {
    factories: HashMap<String, PluginFactory>,
}

impl PluginLoader {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a factory under a module identifier (e.g. `demo.weather`).
    pub fn register_factory(&mut self, module: impl Into<String>, factory: PluginFactory) {
        self.factories.insert(module.into(), factory);
    }

    /// Instantiate plugins for the given identifiers.
    ///
    /// Unknown identifiers and factory failures are logged and skipped;
    /// loading continues with the remaining entries.
    pub fn load(&self, modules: &[String]) -> Vec<Arc<dyn Plugin>> {
        let mut plugins = Vec::new();
        for module in modules {
            match self.instantiate(module) {
                Ok(plugin) => plugins.push(plugin),
                Err(err) => tracing::error!("failed to load plugin: {err}"),
            }
        }
        plugins
    }

    fn instantiate(&self, module: &str) -> Result<Arc<dyn Plugin>, PluginError> {
        let factory = self
            .factories
            .get(module)
            .ok_or_else(|| PluginError::unknown_module(module))?;
        factory().map_err(|err| PluginError::factory(module, err.to_string()))
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use async_trait::async_trait;

    struct Stub;

    #[async_trait]
    impl Plugin for Stub {
        fn name(&self) -> &str {
            "stub"
        }

        fn description(&self) -> &str {
            "stub plugin"
        }
    }

    #[test]
    fn test_load_known_module() {
        let mut loader = PluginLoader::new();
        loader.register_factory("demo.stub", Arc::new(|| Ok(Arc::new(Stub))));

        let plugins = loader.load(&["demo.stub".to_string()]);
        assert_eq!(plugins.len(), 1);
        assert_eq!(plugins[0].name(), "stub");
    }

    #[test]
    fn test_unknown_module_is_skipped() {
        let loader = PluginLoader::new();
        let plugins = loader.load(&["missing.module".to_string()]);
        assert!(plugins.is_empty());
    }

    #[test]
    fn test_factory_failure_skips_only_that_plugin() {
        let mut loader = PluginLoader::new();
        loader.register_factory(
            "broken",
            Arc::new(|| Err(PluginError::factory("broken", "boom"))),
        );
        loader.register_factory("ok", Arc::new(|| Ok(Arc::new(Stub))));

        let plugins = loader.load(&["broken".to_string(), "ok".to_string()]);
        assert_eq!(plugins.len(), 1);
        assert_eq!(plugins[0].name(), "stub");
    }
}
