//! Plugin configuration document.
//!
//! A top-level `plugins` table maps each plugin key to the implementation
//! that builds it, an `enabled` flag and an opaque `config` table:
//!
//! ```toml
//! [plugins.payer]
//! implementation = "builtin::MemoryAdapter"
//! config = { system_id = "payer", max_records = 500 }
//!
//! [plugins.mailer]
//! implementation = "builtin::LogNotifier"
//! enabled = false
//! ```

use std::collections::BTreeMap;
use std::path::Path;

use config::{Config, File, FileFormat};
use serde::{Deserialize, Serialize};
use serde_json::Value;

use exthost_core::AppResult;

use crate::config::PluginConfig;

/// Text format of a document held in memory.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DocumentFormat {
    /// TOML.
    Toml,
    /// YAML.
    Yaml,
    /// JSON.
    Json,
}

impl DocumentFormat {
    fn file_format(self) -> FileFormat {
        match self {
            Self::Toml => FileFormat::Toml,
            Self::Yaml => FileFormat::Yaml,
            Self::Json => FileFormat::Json,
        }
    }
}

/// One entry of the `plugins` table.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PluginDefinition {
    /// Catalog identifier of the implementation, e.g. `builtin::LogNotifier`.
    #[serde(alias = "class")]
    pub implementation: String,
    /// Disabled entries are skipped by the loader.
    #[serde(default = "default_enabled")]
    pub enabled: bool,
    /// Handed to the factory after `${VAR}` substitution.
    #[serde(default)]
    pub config: PluginConfig,
}

impl PluginDefinition {
    /// An enabled definition with an empty configuration.
    pub fn new(implementation: &str) -> Self {
        Self {
            implementation: implementation.to_string(),
            enabled: true,
            config: PluginConfig::new(),
        }
    }

    /// Set configuration.
    pub fn with_config(mut self, config: PluginConfig) -> Self {
        self.config = config;
        self
    }

    /// Set enabled flag.
    pub fn with_enabled(mut self, enabled: bool) -> Self {
        self.enabled = enabled;
        self
    }
}

fn default_enabled() -> bool {
    true
}

/// Declarative description of the plugins a host should load.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct PluginsDocument {
    /// Plugin key → definition, iterated in key order.
    #[serde(default)]
    pub plugins: BTreeMap<String, PluginDefinition>,
}

impl PluginsDocument {
    /// Creates an empty document.
    pub fn new() -> Self {
        Self::default()
    }

    /// Adds or replaces an entry.
    pub fn with_plugin(mut self, key: &str, definition: PluginDefinition) -> Self {
        self.plugins.insert(key.to_string(), definition);
        self
    }

    /// Loads a document from disk. The format follows the file extension.
    pub fn from_file(path: impl AsRef<Path>) -> AppResult<Self> {
        let settings = Config::builder()
            .add_source(File::from(path.as_ref()).required(true))
            .build()?;
        Ok(settings.try_deserialize()?)
    }

    /// Parses a document held in memory.
    pub fn from_str(content: &str, format: DocumentFormat) -> AppResult<Self> {
        let settings = Config::builder()
            .add_source(File::from_str(content, format.file_format()))
            .build()?;
        Ok(settings.try_deserialize()?)
    }

    /// Builds a document from an already-parsed value.
    pub fn from_value(value: Value) -> AppResult<Self> {
        Ok(serde_json::from_value(value)?)
    }

    /// Number of entries.
    pub fn len(&self) -> usize {
        self.plugins.len()
    }

    /// Whether the document has no entries.
    pub fn is_empty(&self) -> bool {
        self.plugins.is_empty()
    }
}
