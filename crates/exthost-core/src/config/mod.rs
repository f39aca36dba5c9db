//! Host configuration schemas.
//!
//! All configuration structs are deserialized via the `config` crate from an
//! optional file plus `EXTHOST__`-prefixed environment variables.

pub mod logging;
pub mod plugin;

use serde::{Deserialize, Serialize};
use validator::Validate;

pub use self::logging::LoggingConfig;
pub use self::plugin::{LifecycleConfig, PluginHostConfig};

use crate::error::AppError;

/// Root host configuration.
#[derive(Debug, Clone, Default, Serialize, Deserialize, Validate)]
pub struct AppConfig {
    /// Logging settings.
    #[serde(default)]
    pub logging: LoggingConfig,
    /// Plugin host settings.
    #[serde(default)]
    #[validate(nested)]
    pub plugins: PluginHostConfig,
}

impl AppConfig {
    /// Load configuration from a file and the environment.
    ///
    /// The file is optional and its format is picked from the extension.
    /// Environment variables prefixed with `EXTHOST__` override file values,
    /// with `__` separating nested sections
    /// (e.g. `EXTHOST__PLUGINS__LIFECYCLE__CONCURRENT_TIERS=true`).
    pub fn load(path: &str) -> Result<Self, AppError> {
        let config = config::Config::builder()
            .add_source(config::File::with_name(path).required(false))
            .add_source(
                config::Environment::with_prefix("EXTHOST")
                    .prefix_separator("__")
                    .separator("__")
                    .try_parsing(true),
            )
            .build()
            .map_err(|e| AppError::configuration(format!("Failed to build config: {e}")))?;

        let app: AppConfig = config
            .try_deserialize()
            .map_err(|e| AppError::configuration(format!("Failed to deserialize config: {e}")))?;

        app.validate()
            .map_err(|e| AppError::validation(format!("Invalid configuration: {e}")))?;

        Ok(app)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_load_missing_file_uses_defaults() {
        let config = AppConfig::load("/nonexistent/exthost").expect("defaults");
        assert_eq!(config.logging.level, "info");
        assert!(config.plugins.document.is_none());
        assert!(config.plugins.discover.is_empty());
    }

    #[test]
    fn test_load_toml_file() {
        let dir = tempfile::tempdir().expect("tempdir");
        let path = dir.path().join("host.toml");
        std::fs::write(
            &path,
            r#"
[logging]
level = "debug"
format = "json"

[plugins]
document = "plugins.yaml"
discover = ["builtin"]

[plugins.lifecycle]
init_timeout_seconds = 15
concurrent_tiers = true
"#,
        )
        .expect("write");

        let config = AppConfig::load(path.to_str().expect("utf8 path")).expect("load");
        assert_eq!(config.logging.format, "json");
        assert_eq!(config.plugins.document.as_deref(), Some("plugins.yaml"));
        assert_eq!(config.plugins.discover, vec!["builtin".to_string()]);
        assert_eq!(config.plugins.lifecycle.init_timeout_seconds, 15);
        assert!(config.plugins.lifecycle.concurrent_tiers);
    }

    #[test]
    fn test_load_rejects_out_of_range_timeout() {
        let dir = tempfile::tempdir().expect("tempdir");
        let path = dir.path().join("host.toml");
        std::fs::write(&path, "[plugins.lifecycle]\ninit_timeout_seconds = 99999\n")
            .expect("write");

        let err = AppConfig::load(path.to_str().expect("utf8 path")).unwrap_err();
        assert_eq!(err.kind, crate::error::ErrorKind::Validation);
    }
}
