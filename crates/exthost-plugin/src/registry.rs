//! Plugin registry: stores plugin instances, their captured metadata, and
//! the hook table, and drives the batch lifecycle.
//!
//! Lock order is `plugins` then `metadata`. No lock is held while a plugin's
//! `initialize`/`cleanup` or a hook handler runs.

use std::collections::HashMap;
use std::fmt;
use std::future::Future;
use std::sync::Arc;
use std::sync::atomic::{AtomicU64, Ordering};
use std::time::Duration;

use chrono::{DateTime, Utc};
use futures::future::join_all;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use tokio::sync::RwLock;
use tracing::{debug, info, warn};

use exthost_core::config::LifecycleConfig;
use exthost_core::{AppError, AppResult, PluginKind};

use crate::config::PluginConfig;
use crate::discovery::FactoryCatalog;
use crate::hooks::{
    ClosureHandler, DispatchResult, HookDispatcher, HookHandler, HookPayload, HookRegistry,
};
use crate::metadata::PluginMetadata;
use crate::traits::Plugin;

/// Lifecycle state of a registered plugin.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PluginState {
    /// Registered but not ready.
    Registered,
    /// Configuration is being checked.
    Validating,
    /// `initialize` is running.
    Initializing,
    /// Initialized and ready.
    Active,
    /// `cleanup` is running.
    Cleaning,
}

impl PluginState {
    /// Returns the string representation.
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Registered => "registered",
            Self::Validating => "validating",
            Self::Initializing => "initializing",
            Self::Active => "active",
            Self::Cleaning => "cleaning",
        }
    }
}

impl fmt::Display for PluginState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

#[derive(Debug)]
struct PluginEntry {
    plugin: Arc<dyn Plugin>,
    state: PluginState,
    /// Registration order, used to break priority ties.
    sequence: u64,
    registered_at: DateTime<Utc>,
}

/// A snapshot of one registration, taken so lifecycle calls run unlocked.
#[derive(Debug, Clone)]
struct Slot {
    key: String,
    plugin: Arc<dyn Plugin>,
    metadata: PluginMetadata,
    sequence: u64,
}

/// Registry of all plugins known to the host.
#[derive(Debug)]
pub struct PluginRegistry {
    /// Plugin key → instance and lifecycle bookkeeping.
    plugins: RwLock<HashMap<String, PluginEntry>>,
    /// Plugin key → metadata captured at registration.
    metadata: RwLock<HashMap<String, PluginMetadata>>,
    /// Event name → handlers.
    hooks: Arc<HookRegistry>,
    dispatcher: HookDispatcher,
    next_sequence: AtomicU64,
}

impl Default for PluginRegistry {
    fn default() -> Self {
        Self::new()
    }
}

impl PluginRegistry {
    /// Creates a new empty plugin registry.
    pub fn new() -> Self {
        let hooks = Arc::new(HookRegistry::new());
        Self {
            plugins: RwLock::new(HashMap::new()),
            metadata: RwLock::new(HashMap::new()),
            dispatcher: HookDispatcher::new(hooks.clone()),
            hooks,
            next_sequence: AtomicU64::new(0),
        }
    }

    /// Registers a plugin under `key`.
    ///
    /// Returns false if the key is taken or the plugin's metadata is
    /// unusable. Metadata is captured once, here.
    pub async fn register(&self, key: &str, plugin: Arc<dyn Plugin>) -> bool {
        let meta = plugin.metadata();
        if let Err(e) = meta.check() {
            warn!(plugin_key = %key, error = %e, "Rejecting plugin with invalid metadata");
            return false;
        }

        let mut plugins = self.plugins.write().await;
        let mut metadata = self.metadata.write().await;

        if plugins.contains_key(key) {
            let e = AppError::duplicate_key(key);
            warn!(plugin_key = %key, error = %e, "Rejecting duplicate registration");
            return false;
        }

        info!(
            plugin_key = %key,
            name = %meta.name,
            version = %meta.version,
            kind = %meta.kind,
            priority = meta.priority,
            "Registering plugin"
        );

        let sequence = self.next_sequence.fetch_add(1, Ordering::Relaxed);
        plugins.insert(
            key.to_string(),
            PluginEntry {
                plugin,
                state: PluginState::Registered,
                sequence,
                registered_at: Utc::now(),
            },
        );
        metadata.insert(key.to_string(), meta);

        true
    }

    /// Removes a plugin. Does not call `cleanup`. Returns false if absent.
    pub async fn unregister(&self, key: &str) -> bool {
        let mut plugins = self.plugins.write().await;
        let mut metadata = self.metadata.write().await;

        if plugins.remove(key).is_none() {
            let e = AppError::unknown_key(key);
            debug!(plugin_key = %key, error = %e, "Nothing to unregister");
            return false;
        }
        metadata.remove(key);

        info!(plugin_key = %key, "Plugin unregistered");
        true
    }

    /// Gets a plugin by key.
    pub async fn get(&self, key: &str) -> Option<Arc<dyn Plugin>> {
        let plugins = self.plugins.read().await;
        plugins.get(key).map(|entry| entry.plugin.clone())
    }

    /// Checks whether a key is registered.
    pub async fn contains(&self, key: &str) -> bool {
        let plugins = self.plugins.read().await;
        plugins.contains_key(key)
    }

    /// Returns plugin count.
    pub async fn len(&self) -> usize {
        let plugins = self.plugins.read().await;
        plugins.len()
    }

    /// Whether no plugins are registered.
    pub async fn is_empty(&self) -> bool {
        self.len().await == 0
    }

    /// Plugins of one kind, by ascending priority then registration order.
    pub async fn get_by_kind(&self, kind: PluginKind) -> Vec<Arc<dyn Plugin>> {
        self.ordered_slots()
            .await
            .into_iter()
            .filter(|slot| slot.metadata.kind == kind)
            .map(|slot| slot.plugin)
            .collect()
    }

    /// Snapshot of every key's captured metadata.
    pub async fn list(&self) -> HashMap<String, PluginMetadata> {
        let metadata = self.metadata.read().await;
        metadata.clone()
    }

    /// Captured metadata for one key.
    pub async fn metadata(&self, key: &str) -> Option<PluginMetadata> {
        let metadata = self.metadata.read().await;
        metadata.get(key).cloned()
    }

    /// Current lifecycle state for one key.
    pub async fn state(&self, key: &str) -> Option<PluginState> {
        let plugins = self.plugins.read().await;
        plugins.get(key).map(|entry| entry.state)
    }

    /// When the current registration under `key` was made.
    pub async fn registered_at(&self, key: &str) -> Option<DateTime<Utc>> {
        let plugins = self.plugins.read().await;
        plugins.get(key).map(|entry| entry.registered_at)
    }

    /// Initializes every enabled plugin sequentially in priority order.
    pub async fn initialize_all(&self) -> HashMap<String, bool> {
        self.initialize_all_with(&LifecycleConfig::default()).await
    }

    /// Initializes every enabled plugin in priority order.
    ///
    /// A failing plugin is recorded as `false` and never stops the rest.
    /// Disabled plugins are not invoked and do not appear in the result.
    /// With `concurrent_tiers`, plugins sharing a priority start together;
    /// a tier starts only after the previous tier has fully finished.
    pub async fn initialize_all_with(&self, lifecycle: &LifecycleConfig) -> HashMap<String, bool> {
        let (enabled, disabled): (Vec<Slot>, Vec<Slot>) = self
            .ordered_slots()
            .await
            .into_iter()
            .partition(|slot| slot.metadata.enabled);

        for slot in &disabled {
            debug!(plugin_key = %slot.key, "Skipping disabled plugin");
        }

        let deadline = lifecycle.init_timeout();
        let mut results = HashMap::with_capacity(enabled.len());

        if lifecycle.concurrent_tiers {
            for tier in priority_tiers(&enabled) {
                let outcomes =
                    join_all(tier.iter().map(|slot| self.initialize_slot(slot, deadline))).await;
                for (slot, ok) in tier.iter().zip(outcomes) {
                    results.insert(slot.key.clone(), ok);
                }
            }
        } else {
            for slot in &enabled {
                let ok = self.initialize_slot(slot, deadline).await;
                results.insert(slot.key.clone(), ok);
            }
        }

        let ready = results.values().filter(|ok| **ok).count();
        info!(
            ready = ready,
            failed = results.len() - ready,
            disabled = disabled.len(),
            "Plugin initialization finished"
        );

        results
    }

    /// Initializes one plugin regardless of its enabled flag, with no
    /// deadline.
    pub async fn initialize_plugin(&self, key: &str) -> AppResult<bool> {
        self.initialize_plugin_with(key, &LifecycleConfig::default())
            .await
    }

    /// Initializes one plugin regardless of its enabled flag, bounded by the
    /// lifecycle's init deadline.
    pub async fn initialize_plugin_with(
        &self,
        key: &str,
        lifecycle: &LifecycleConfig,
    ) -> AppResult<bool> {
        let slot = self.slot(key).await?;
        Ok(self.initialize_slot(&slot, lifecycle.init_timeout()).await)
    }

    /// Cleans up every registered plugin in reverse priority order.
    ///
    /// Runs regardless of enabled or ready state. Failures are logged and
    /// never stop the rest.
    pub async fn cleanup_all(&self) {
        let slots = self.ordered_slots().await;
        let mut failed = 0usize;
        for slot in slots.iter().rev() {
            if !self.cleanup_slot(slot).await {
                failed += 1;
            }
        }
        info!(total = slots.len(), failed = failed, "Plugin cleanup finished");
    }

    /// Cleans up one plugin.
    pub async fn cleanup_plugin(&self, key: &str) -> AppResult<bool> {
        let slot = self.slot(key).await?;
        Ok(self.cleanup_slot(&slot).await)
    }

    /// Appends a handler for `event`.
    pub async fn register_hook(&self, event: &str, handler: Arc<dyn HookHandler>) {
        self.hooks.register(event, handler).await;
    }

    /// Appends a closure handler for `event`.
    pub async fn register_hook_fn<F, Fut>(&self, event: &str, name: &str, handler: F)
    where
        F: Fn(&HookPayload) -> Fut + Send + Sync + 'static,
        Fut: Future<Output = AppResult<Option<Value>>> + Send + 'static,
    {
        self.hooks
            .register(event, Arc::new(ClosureHandler::new(name, handler)))
            .await;
    }

    /// Runs every handler for `event` with `data`, in registration order.
    pub async fn trigger_hook(&self, event: &str, data: HashMap<String, Value>) -> DispatchResult {
        self.dispatch(&HookPayload::with_map(event, data)).await
    }

    /// Runs every handler for a prepared payload.
    pub async fn dispatch(&self, payload: &HookPayload) -> DispatchResult {
        self.dispatcher.dispatch(payload).await
    }

    /// Returns the hook registry.
    pub fn hooks(&self) -> &Arc<HookRegistry> {
        &self.hooks
    }

    /// Registers every implementation in `namespace` that is not yet
    /// registered, built with an empty configuration.
    ///
    /// The key is the implementation identifier. Returns how many plugins
    /// were newly registered; existing keys are skipped, never replaced.
    pub async fn discover_plugins(&self, catalog: &FactoryCatalog, namespace: &str) -> usize {
        let mut discovered = 0;

        for (id, factory) in catalog.in_namespace(namespace) {
            if self.contains(&id).await {
                debug!(plugin_key = %id, "Already registered, skipping");
                continue;
            }

            match factory.create(PluginConfig::default()) {
                Ok(plugin) => {
                    if self.register(&id, plugin).await {
                        discovered += 1;
                    }
                }
                Err(e) => {
                    warn!(plugin_key = %id, error = %e, "Discovered plugin failed to construct");
                }
            }
        }

        info!(namespace = %namespace, discovered = discovered, "Plugin discovery finished");
        discovered
    }

    async fn slot(&self, key: &str) -> AppResult<Slot> {
        let plugins = self.plugins.read().await;
        let metadata = self.metadata.read().await;
        let entry = plugins.get(key).ok_or_else(|| AppError::unknown_key(key))?;
        let meta = metadata
            .get(key)
            .cloned()
            .ok_or_else(|| AppError::unknown_key(key))?;
        Ok(Slot {
            key: key.to_string(),
            plugin: entry.plugin.clone(),
            metadata: meta,
            sequence: entry.sequence,
        })
    }

    async fn ordered_slots(&self) -> Vec<Slot> {
        let plugins = self.plugins.read().await;
        let metadata = self.metadata.read().await;

        let mut slots: Vec<Slot> = plugins
            .iter()
            .filter_map(|(key, entry)| {
                metadata.get(key).map(|meta| Slot {
                    key: key.clone(),
                    plugin: entry.plugin.clone(),
                    metadata: meta.clone(),
                    sequence: entry.sequence,
                })
            })
            .collect();
        slots.sort_by_key(|slot| (slot.metadata.priority, slot.sequence));
        slots
    }

    /// Updates state only if `key` still holds the same registration.
    async fn set_state(&self, slot: &Slot, state: PluginState) {
        let mut plugins = self.plugins.write().await;
        if let Some(entry) = plugins.get_mut(&slot.key) {
            if entry.sequence == slot.sequence {
                entry.state = state;
            }
        }
    }

    async fn initialize_slot(&self, slot: &Slot, deadline: Option<Duration>) -> bool {
        let key = slot.key.as_str();

        self.set_state(slot, PluginState::Validating).await;
        if let Err(e) = slot.plugin.validate_config() {
            warn!(plugin_key = %key, error = %e, "Plugin configuration rejected");
            self.set_state(slot, PluginState::Registered).await;
            return false;
        }

        self.set_state(slot, PluginState::Initializing).await;
        debug!(plugin_key = %key, "Initializing plugin");

        let outcome = match deadline {
            None => slot.plugin.initialize().await,
            Some(limit) => match tokio::time::timeout(limit, slot.plugin.initialize()).await {
                Ok(outcome) => outcome,
                Err(_) => {
                    if let Err(e) = slot.plugin.cleanup().await {
                        warn!(plugin_key = %key, error = %e, "Cleanup after timeout failed");
                    }
                    Err(AppError::timeout(format!(
                        "Plugin '{key}' did not initialize within {}s",
                        limit.as_secs()
                    )))
                }
            },
        };

        match outcome {
            Ok(true) => {
                self.set_state(slot, PluginState::Active).await;
                info!(plugin_key = %key, "Plugin initialized");
                true
            }
            Ok(false) => {
                self.set_state(slot, PluginState::Registered).await;
                warn!(plugin_key = %key, "Plugin reported not ready");
                false
            }
            Err(e) => {
                self.set_state(slot, PluginState::Registered).await;
                warn!(plugin_key = %key, error = %e, "Plugin initialization failed");
                false
            }
        }
    }

    async fn cleanup_slot(&self, slot: &Slot) -> bool {
        let key = slot.key.as_str();
        self.set_state(slot, PluginState::Cleaning).await;

        let ok = match slot.plugin.cleanup().await {
            Ok(true) => {
                debug!(plugin_key = %key, "Plugin cleaned up");
                true
            }
            Ok(false) => {
                warn!(plugin_key = %key, "Plugin reported incomplete cleanup");
                false
            }
            Err(e) => {
                warn!(plugin_key = %key, error = %e, "Plugin cleanup failed");
                false
            }
        };

        self.set_state(slot, PluginState::Registered).await;
        ok
    }
}

/// Splits priority-ordered slots into runs of equal priority.
fn priority_tiers(slots: &[Slot]) -> Vec<&[Slot]> {
    slots
        .chunk_by(|a, b| a.metadata.priority == b.metadata.priority)
        .collect()
}
