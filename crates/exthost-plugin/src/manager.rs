//! Plugin manager: declarative loading and batch lifecycle over one registry.

use std::collections::HashMap;
use std::future::Future;
use std::path::Path;
use std::sync::Arc;

use serde_json::Value;
use tracing::{error, info, warn};

use exthost_core::config::LifecycleConfig;
use exthost_core::{AppError, AppResult, PluginKind};

use crate::config::PluginConfig;
use crate::discovery::{FactoryCatalog, PluginFactory};
use crate::document::PluginsDocument;
use crate::hooks::{DispatchResult, HookHandler, HookPayload};
use crate::metadata::PluginMetadata;
use crate::registry::{PluginRegistry, PluginState};
use crate::traits::Plugin;

/// A document entry that could not be loaded.
#[derive(Debug, Clone)]
pub struct LoadFailure {
    /// Plugin key from the document.
    pub key: String,
    /// Why it was skipped.
    pub error: AppError,
}

/// Outcome of loading a configuration document.
#[derive(Debug, Clone, Default)]
pub struct LoadSummary {
    /// Number of plugins registered.
    pub loaded: usize,
    /// Keys skipped because they were disabled.
    pub disabled: Vec<String>,
    /// Entries that failed to resolve, construct, validate or register.
    pub failed: Vec<LoadFailure>,
}

impl LoadSummary {
    /// Whether every enabled entry was loaded.
    pub fn is_complete(&self) -> bool {
        self.failed.is_empty()
    }
}

/// Manages the full lifecycle of plugins: load, start, stop, unload.
///
/// Construct one per host and pass it by reference to whatever needs it.
#[derive(Debug)]
pub struct PluginManager {
    /// Plugin registry.
    registry: Arc<PluginRegistry>,
    /// Implementations available to documents and discovery.
    catalog: FactoryCatalog,
    /// Start-up behavior.
    lifecycle: LifecycleConfig,
}

impl PluginManager {
    /// Creates a manager over an empty registry.
    pub fn new(catalog: FactoryCatalog) -> Self {
        Self {
            registry: Arc::new(PluginRegistry::new()),
            catalog,
            lifecycle: LifecycleConfig::default(),
        }
    }

    /// Set start-up behavior.
    pub fn with_lifecycle(mut self, lifecycle: LifecycleConfig) -> Self {
        self.lifecycle = lifecycle;
        self
    }

    /// Returns the plugin registry.
    pub fn registry(&self) -> &Arc<PluginRegistry> {
        &self.registry
    }

    /// Returns the factory catalog.
    pub fn catalog(&self) -> &FactoryCatalog {
        &self.catalog
    }

    /// Returns the factory catalog for registering more implementations.
    pub fn catalog_mut(&mut self) -> &mut FactoryCatalog {
        &mut self.catalog
    }

    /// Returns the start-up behavior.
    pub fn lifecycle(&self) -> &LifecycleConfig {
        &self.lifecycle
    }

    /// Builds a plugin with `factory` and registers it under `key`.
    ///
    /// Returns false if construction fails, the configuration is rejected,
    /// or the key is taken.
    pub async fn load_plugin<F>(&self, factory: &F, key: &str, config: PluginConfig) -> bool
    where
        F: PluginFactory + ?Sized,
    {
        match self.try_load(factory, key, config).await {
            Ok(()) => true,
            Err(e) => {
                warn!(plugin_key = %key, error = %e, "Plugin load failed");
                false
            }
        }
    }

    /// Loads every enabled entry of a document.
    ///
    /// Each entry's config has `${VAR}` placeholders substituted before the
    /// implementation is built. A bad entry is recorded and skipped.
    pub async fn load_plugins_from_config(&self, document: &PluginsDocument) -> LoadSummary {
        let mut summary = LoadSummary::default();

        for (key, definition) in &document.plugins {
            if !definition.enabled {
                info!(plugin_key = %key, "Plugin disabled in configuration");
                summary.disabled.push(key.clone());
                continue;
            }

            let outcome = match self.catalog.resolve(&definition.implementation) {
                Some(factory) => {
                    let config = definition.config.substitute_env();
                    self.try_load(factory.as_ref(), key, config).await
                }
                None => Err(AppError::config_resolution(format!(
                    "No plugin implementation named '{}'",
                    definition.implementation
                ))),
            };

            match outcome {
                Ok(()) => summary.loaded += 1,
                Err(e) => {
                    warn!(
                        plugin_key = %key,
                        implementation = %definition.implementation,
                        error = %e,
                        "Skipping plugin entry"
                    );
                    summary.failed.push(LoadFailure {
                        key: key.clone(),
                        error: e,
                    });
                }
            }
        }

        info!(
            loaded = summary.loaded,
            disabled = summary.disabled.len(),
            failed = summary.failed.len(),
            "Plugin configuration loaded"
        );

        summary
    }

    /// Reads a document from disk and loads it.
    pub async fn load_plugins_from_file(&self, path: impl AsRef<Path>) -> AppResult<LoadSummary> {
        let document = PluginsDocument::from_file(path)?;
        Ok(self.load_plugins_from_config(&document).await)
    }

    /// Registers every catalog implementation in `namespace` not yet loaded.
    pub async fn discover_plugins(&self, namespace: &str) -> usize {
        self.registry
            .discover_plugins(&self.catalog, namespace)
            .await
    }

    /// Initializes all enabled plugins. Failures show up as `false`.
    pub async fn start(&self) -> HashMap<String, bool> {
        let results = self.registry.initialize_all_with(&self.lifecycle).await;

        let mut failed: Vec<&String> = results
            .iter()
            .filter(|(_, ok)| !**ok)
            .map(|(key, _)| key)
            .collect();
        if !failed.is_empty() {
            failed.sort();
            error!(plugins = ?failed, "Some plugins failed to start");
        }

        results
    }

    /// Initializes one plugin under the configured deadline.
    pub async fn initialize_plugin(&self, key: &str) -> AppResult<bool> {
        self.registry
            .initialize_plugin_with(key, &self.lifecycle)
            .await
    }

    /// Cleans up every plugin.
    pub async fn stop(&self) {
        self.registry.cleanup_all().await;
        info!("All plugins stopped");
    }

    /// Cleans up a plugin and removes it. Returns false if it was absent.
    pub async fn unload_plugin(&self, key: &str) -> bool {
        match self.registry.cleanup_plugin(key).await {
            Ok(true) => {}
            Ok(false) => warn!(plugin_key = %key, "Unloading plugin after incomplete cleanup"),
            Err(e) => {
                warn!(plugin_key = %key, error = %e, "Cannot unload plugin");
                return false;
            }
        }
        self.registry.unregister(key).await
    }

    /// Gets a plugin by key.
    pub async fn get_plugin(&self, key: &str) -> Option<Arc<dyn Plugin>> {
        self.registry.get(key).await
    }

    /// Lists metadata, optionally for one kind, by priority then name.
    pub async fn list_plugins(&self, kind: Option<PluginKind>) -> Vec<PluginMetadata> {
        let mut listed: Vec<PluginMetadata> = self
            .registry
            .list()
            .await
            .into_values()
            .filter(|meta| kind.is_none_or(|k| meta.kind == k))
            .collect();
        listed.sort_by(|a, b| a.priority.cmp(&b.priority).then_with(|| a.name.cmp(&b.name)));
        listed
    }

    /// Plugins of one kind in dispatch order.
    pub async fn plugins_of_kind(&self, kind: PluginKind) -> Vec<Arc<dyn Plugin>> {
        self.registry.get_by_kind(kind).await
    }

    /// Lifecycle state of a plugin.
    pub async fn state(&self, key: &str) -> Option<PluginState> {
        self.registry.state(key).await
    }

    /// Appends a hook handler for `event`.
    pub async fn register_hook(&self, event: &str, handler: Arc<dyn HookHandler>) {
        self.registry.register_hook(event, handler).await;
    }

    /// Appends a closure hook handler for `event`.
    pub async fn register_hook_fn<F, Fut>(&self, event: &str, name: &str, handler: F)
    where
        F: Fn(&HookPayload) -> Fut + Send + Sync + 'static,
        Fut: Future<Output = AppResult<Option<Value>>> + Send + 'static,
    {
        self.registry.register_hook_fn(event, name, handler).await;
    }

    /// Fires `event` with `data` at every registered handler.
    pub async fn trigger_hook(&self, event: &str, data: HashMap<String, Value>) -> DispatchResult {
        self.registry.trigger_hook(event, data).await
    }

    async fn try_load<F>(&self, factory: &F, key: &str, config: PluginConfig) -> AppResult<()>
    where
        F: PluginFactory + ?Sized,
    {
        let plugin = factory.create(config)?;
        plugin.validate_config()?;
        if self.registry.register(key, plugin).await {
            Ok(())
        } else if self.registry.contains(key).await {
            Err(AppError::duplicate_key(key))
        } else {
            Err(AppError::validation(format!(
                "Plugin '{key}' has unusable metadata"
            )))
        }
    }
}

impl Default for PluginManager {
    fn default() -> Self {
        Self::new(FactoryCatalog::new())
    }
}
