//! In-memory adapter.

use async_trait::async_trait;
use serde_json::{Value, json};
use tokio::sync::RwLock;
use tracing::{debug, warn};

use exthost_plugin::prelude::*;

use crate::ensure_ready;

/// Adapter that stores records in memory, grouped by resource type.
///
/// Config: `system_id` (default `"memory"`), `max_records` (default 1000).
#[derive(Debug)]
pub struct MemoryAdapter {
    config: PluginConfig,
    system_id: String,
    max_records: usize,
    records: RwLock<Vec<(String, Value)>>,
    ready: ReadyFlag,
}

impl MemoryAdapter {
    fn describe() -> PluginMetadata {
        plugin_metadata!(
            name: "Memory Adapter",
            version: "1.0.0",
            kind: PluginKind::Adapter,
            description: "Keeps records in process memory"
        )
        .with_field(
            "system_id",
            ConfigField::optional(FieldType::String)
                .with_default(json!("memory"))
                .with_length(Some(1), None),
        )
        .with_field(
            "max_records",
            ConfigField::optional(FieldType::Integer)
                .with_default(json!(1000))
                .with_range(Some(1.0), None),
        )
    }

    /// Number of records currently held.
    pub async fn record_count(&self) -> usize {
        self.records.read().await.len()
    }
}

impl FromConfig for MemoryAdapter {
    const TYPE_NAME: &'static str = "MemoryAdapter";

    fn from_config(mut config: PluginConfig) -> AppResult<Self> {
        Self::describe().config_schema.apply_defaults(&mut config);
        let system_id = config.get_str("system_id").unwrap_or("memory").to_string();
        let max_records = config
            .get_i64("max_records")
            .and_then(|n| usize::try_from(n).ok())
            .unwrap_or(1000);

        Ok(Self {
            config,
            system_id,
            max_records,
            records: RwLock::new(Vec::new()),
            ready: ReadyFlag::new(),
        })
    }
}

#[async_trait]
impl Plugin for MemoryAdapter {
    fn metadata(&self) -> PluginMetadata {
        Self::describe()
    }

    async fn initialize(&self) -> AppResult<bool> {
        self.ready.set();
        debug!(system_id = %self.system_id, "Memory adapter ready");
        Ok(true)
    }

    async fn cleanup(&self) -> AppResult<bool> {
        if self.ready.clear() {
            self.records.write().await.clear();
        }
        Ok(true)
    }

    fn is_ready(&self) -> bool {
        self.ready.get()
    }

    fn validate_config(&self) -> AppResult<()> {
        Self::describe().config_schema.validate(&self.config)
    }

    fn as_adapter(&self) -> Option<&dyn AdapterPlugin> {
        Some(self)
    }
}

#[async_trait]
impl AdapterPlugin for MemoryAdapter {
    fn system_id(&self) -> &str {
        &self.system_id
    }

    /// Returns records of `resource_type` whose fields equal every entry of
    /// `params`. A non-object `params` matches everything.
    async fn fetch(&self, resource_type: &str, params: &Value) -> AppResult<Vec<Value>> {
        ensure_ready(self.is_ready(), "Memory Adapter")?;

        let records = self.records.read().await;
        let matches = records
            .iter()
            .filter(|(kind, _)| kind == resource_type)
            .map(|(_, record)| record)
            .filter(|record| match params.as_object() {
                Some(filters) => filters
                    .iter()
                    .all(|(key, expected)| record.get(key) == Some(expected)),
                None => true,
            })
            .cloned()
            .collect();
        Ok(matches)
    }

    async fn send(&self, resource_type: &str, data: &Value) -> AppResult<bool> {
        ensure_ready(self.is_ready(), "Memory Adapter")?;

        let mut records = self.records.write().await;
        if records.len() >= self.max_records {
            warn!(
                system_id = %self.system_id,
                max_records = self.max_records,
                "Memory adapter is full"
            );
            return Ok(false);
        }
        records.push((resource_type.to_string(), data.clone()));
        Ok(true)
    }
}
