//! Plugin host configuration.

use serde::{Deserialize, Serialize};
use validator::Validate;

/// Where plugins come from and how the fleet is started.
#[derive(Debug, Clone, Default, Serialize, Deserialize, Validate)]
pub struct PluginHostConfig {
    /// Path to a plugin configuration document (TOML, YAML, or JSON).
    #[serde(default)]
    pub document: Option<String>,
    /// Factory namespaces to auto-discover at startup.
    #[serde(default)]
    pub discover: Vec<String>,
    /// Start/stop behavior.
    #[serde(default)]
    #[validate(nested)]
    pub lifecycle: LifecycleConfig,
}

/// Fleet start-up behavior.
#[derive(Debug, Clone, Serialize, Deserialize, Validate)]
pub struct LifecycleConfig {
    /// Deadline for a single plugin's initialize, in seconds. `0` disables it.
    #[serde(default)]
    #[validate(range(max = 3600))]
    pub init_timeout_seconds: u64,
    /// Initialize plugins that share a priority concurrently.
    ///
    /// Tiers still run in ascending priority order.
    #[serde(default)]
    pub concurrent_tiers: bool,
}

impl Default for LifecycleConfig {
    fn default() -> Self {
        Self {
            init_timeout_seconds: 0,
            concurrent_tiers: false,
        }
    }
}

impl LifecycleConfig {
    /// Returns the initialize deadline, if one is configured.
    pub fn init_timeout(&self) -> Option<std::time::Duration> {
        (self.init_timeout_seconds > 0)
            .then(|| std::time::Duration::from_secs(self.init_timeout_seconds))
    }
}
