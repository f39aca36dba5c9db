//! Factory catalog: the explicit identifier → constructor table that backs
//! both discovery and config-driven loading.
//!
//! Crates that provide plugins register their factories once at start-up,
//! usually through [`FactoryCatalog::register_type`]. Identifiers have the
//! shape `namespace::TypeName`.

use std::collections::BTreeMap;
use std::sync::Arc;

use tracing::{debug, warn};

use exthost_core::{AppError, AppResult};

use crate::config::PluginConfig;
use crate::traits::Plugin;

/// Separator between a namespace and a type name inside an identifier.
pub const PATH_SEPARATOR: &str = "::";

/// Constructs plugin instances from a configuration map.
pub trait PluginFactory: Send + Sync {
    /// Builds a new instance. Construction must not acquire resources;
    /// that belongs in `initialize`.
    fn create(&self, config: PluginConfig) -> AppResult<Arc<dyn Plugin>>;
}

impl<F> PluginFactory for F
where
    F: Fn(PluginConfig) -> AppResult<Arc<dyn Plugin>> + Send + Sync,
{
    fn create(&self, config: PluginConfig) -> AppResult<Arc<dyn Plugin>> {
        self(config)
    }
}

/// A plugin type that can be built directly from its configuration.
pub trait FromConfig: Plugin + Sized + 'static {
    /// Type name used as the last segment of the identifier.
    const TYPE_NAME: &'static str;

    /// Builds the plugin from its configuration.
    fn from_config(config: PluginConfig) -> AppResult<Self>;
}

/// Joins a namespace and a type name into an identifier.
pub fn identifier(namespace: &str, type_name: &str) -> String {
    format!("{namespace}{PATH_SEPARATOR}{type_name}")
}

/// Mapping from implementation identifier to factory.
#[derive(Default)]
pub struct FactoryCatalog {
    factories: BTreeMap<String, Arc<dyn PluginFactory>>,
}

impl std::fmt::Debug for FactoryCatalog {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("FactoryCatalog")
            .field("identifiers", &self.factories.keys().collect::<Vec<_>>())
            .finish()
    }
}

impl FactoryCatalog {
    /// Creates an empty catalog.
    pub fn new() -> Self {
        Self::default()
    }

    /// Registers a factory under `id`. Returns false if `id` is taken; the
    /// existing factory is kept.
    pub fn register<F>(&mut self, id: &str, factory: F) -> bool
    where
        F: PluginFactory + 'static,
    {
        if self.factories.contains_key(id) {
            warn!(identifier = %id, "Factory already registered");
            return false;
        }
        self.factories.insert(id.to_string(), Arc::new(factory));
        debug!(identifier = %id, "Factory registered");
        true
    }

    /// Registers `T` as `namespace::T::TYPE_NAME`.
    pub fn register_type<T: FromConfig>(&mut self, namespace: &str) -> bool {
        let id = identifier(namespace, T::TYPE_NAME);
        self.register(&id, |config: PluginConfig| -> AppResult<Arc<dyn Plugin>> {
            Ok(Arc::new(T::from_config(config)?))
        })
    }

    /// Looks up a factory.
    pub fn resolve(&self, id: &str) -> Option<Arc<dyn PluginFactory>> {
        self.factories.get(id).cloned()
    }

    /// Resolves `id` and builds an instance with `config`.
    pub fn create(&self, id: &str, config: PluginConfig) -> AppResult<Arc<dyn Plugin>> {
        let factory = self.resolve(id).ok_or_else(|| {
            AppError::config_resolution(format!("No plugin implementation named '{id}'"))
        })?;
        factory.create(config)
    }

    /// Identifiers whose namespace is exactly `namespace`, in sorted order.
    pub fn in_namespace(&self, namespace: &str) -> Vec<(String, Arc<dyn PluginFactory>)> {
        let prefix = format!("{namespace}{PATH_SEPARATOR}");
        self.factories
            .iter()
            .filter(|(id, _)| {
                id.strip_prefix(&prefix)
                    .is_some_and(|rest| !rest.is_empty() && !rest.contains(PATH_SEPARATOR))
            })
            .map(|(id, factory)| (id.clone(), factory.clone()))
            .collect()
    }

    /// All identifiers, sorted.
    pub fn identifiers(&self) -> Vec<String> {
        self.factories.keys().cloned().collect()
    }

    /// Whether `id` is registered.
    pub fn contains(&self, id: &str) -> bool {
        self.factories.contains_key(id)
    }

    /// Number of factories.
    pub fn len(&self) -> usize {
        self.factories.len()
    }

    /// Whether the catalog is empty.
    pub fn is_empty(&self) -> bool {
        self.factories.is_empty()
    }
}
