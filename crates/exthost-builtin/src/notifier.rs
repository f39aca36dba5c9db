//! Notifier that writes to the log.

use std::sync::atomic::{AtomicU64, Ordering};

use async_trait::async_trait;
use serde_json::json;
use tracing::{info, warn};

use exthost_plugin::prelude::*;

/// Emits each notification as a log event on a named channel.
///
/// Config: `channel` (default `"default"`), `level` (`"info"` or `"warn"`).
#[derive(Debug)]
pub struct LogNotifier {
    config: PluginConfig,
    channel: String,
    warn_level: bool,
    sent: AtomicU64,
    ready: ReadyFlag,
}

impl LogNotifier {
    fn describe() -> PluginMetadata {
        plugin_metadata!(
            name: "Log Notifier",
            version: "1.0.0",
            kind: PluginKind::Notifier,
            description: "Writes notifications to the application log",
            priority: 200
        )
        .with_field(
            "channel",
            ConfigField::optional(FieldType::String).with_default(json!("default")),
        )
        .with_field(
            "level",
            ConfigField::optional(FieldType::String)
                .with_default(json!("info"))
                .one_of(vec![json!("info"), json!("warn")]),
        )
    }

    /// Number of notifications delivered since construction.
    pub fn sent(&self) -> u64 {
        self.sent.load(Ordering::Relaxed)
    }
}

impl FromConfig for LogNotifier {
    const TYPE_NAME: &'static str = "LogNotifier";

    fn from_config(mut config: PluginConfig) -> AppResult<Self> {
        Self::describe().config_schema.apply_defaults(&mut config);
        let channel = config.get_str("channel").unwrap_or("default").to_string();
        let warn_level = config.get_str("level") == Some("warn");
        Ok(Self {
            config,
            channel,
            warn_level,
            sent: AtomicU64::new(0),
            ready: ReadyFlag::new(),
        })
    }
}

#[async_trait]
impl Plugin for LogNotifier {
    fn metadata(&self) -> PluginMetadata {
        Self::describe()
    }

    async fn initialize(&self) -> AppResult<bool> {
        self.ready.set();
        Ok(true)
    }

    async fn cleanup(&self) -> AppResult<bool> {
        self.ready.clear();
        Ok(true)
    }

    fn is_ready(&self) -> bool {
        self.ready.get()
    }

    fn validate_config(&self) -> AppResult<()> {
        Self::describe().config_schema.validate(&self.config)
    }

    fn as_notifier(&self) -> Option<&dyn NotifierPlugin> {
        Some(self)
    }
}

#[async_trait]
impl NotifierPlugin for LogNotifier {
    async fn notify(&self, notification: &Notification) -> AppResult<bool> {
        if !self.is_ready() {
            return Ok(false);
        }

        if self.warn_level {
            warn!(
                channel = %self.channel,
                recipient = %notification.recipient,
                subject = %notification.subject,
                "{}",
                notification.body
            );
        } else {
            info!(
                channel = %self.channel,
                recipient = %notification.recipient,
                subject = %notification.subject,
                "{}",
                notification.body
            );
        }

        self.sent.fetch_add(1, Ordering::Relaxed);
        Ok(true)
    }
}
