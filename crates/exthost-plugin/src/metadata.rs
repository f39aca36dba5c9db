//! Plugin metadata descriptor.

use serde::{Deserialize, Serialize};

use exthost_core::{AppError, AppResult, PluginKind};

use crate::schema::{ConfigField, ConfigSchema};

/// Default dispatch priority.
pub const DEFAULT_PRIORITY: i32 = 100;

/// Immutable descriptor a plugin returns about itself.
///
/// The registry captures one copy at registration time and never re-fetches
/// it, so the kind recorded for a key cannot change while that registration
/// lives.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PluginMetadata {
    /// Human-readable plugin name.
    pub name: String,
    /// Semantic version string.
    pub version: String,
    /// Plugin category.
    pub kind: PluginKind,
    /// Free-text description.
    #[serde(default)]
    pub description: String,
    /// Author or maintainer.
    #[serde(default)]
    pub author: String,
    /// Advisory dependency identifiers. Never resolved by the host.
    #[serde(default)]
    pub dependencies: Vec<String>,
    /// Declared configuration shape.
    #[serde(default)]
    pub config_schema: ConfigSchema,
    /// Disabled plugins stay registered but are skipped at start-up.
    #[serde(default = "default_enabled")]
    pub enabled: bool,
    /// Lower values initialize earlier and list first within a kind.
    #[serde(default = "default_priority")]
    pub priority: i32,
}

impl PluginMetadata {
    /// Create new metadata with defaults for every optional field.
    pub fn new(name: &str, version: &str, kind: PluginKind) -> Self {
        Self {
            name: name.to_string(),
            version: version.to_string(),
            kind,
            description: String::new(),
            author: String::new(),
            dependencies: Vec::new(),
            config_schema: ConfigSchema::new(),
            enabled: true,
            priority: DEFAULT_PRIORITY,
        }
    }

    /// Set description.
    pub fn with_description(mut self, desc: &str) -> Self {
        self.description = desc.to_string();
        self
    }

    /// Set author.
    pub fn with_author(mut self, author: &str) -> Self {
        self.author = author.to_string();
        self
    }

    /// Add dependency.
    pub fn with_dependency(mut self, dep: &str) -> Self {
        self.dependencies.push(dep.to_string());
        self
    }

    /// Declare a configuration field.
    pub fn with_field(mut self, name: &str, field: ConfigField) -> Self {
        self.config_schema = self.config_schema.field(name, field);
        self
    }

    /// Replace the whole schema.
    pub fn with_schema(mut self, schema: ConfigSchema) -> Self {
        self.config_schema = schema;
        self
    }

    /// Set enabled flag.
    pub fn with_enabled(mut self, enabled: bool) -> Self {
        self.enabled = enabled;
        self
    }

    /// Set priority.
    pub fn with_priority(mut self, priority: i32) -> Self {
        self.priority = priority;
        self
    }

    /// Checks the descriptor is usable for registration.
    pub fn check(&self) -> AppResult<()> {
        if self.name.trim().is_empty() {
            return Err(AppError::validation("Plugin name must not be empty"));
        }
        if self.version.trim().is_empty() {
            return Err(AppError::validation(format!(
                "Plugin '{}' has an empty version",
                self.name
            )));
        }
        Ok(())
    }
}

fn default_enabled() -> bool {
    true
}

fn default_priority() -> i32 {
    DEFAULT_PRIORITY
}
