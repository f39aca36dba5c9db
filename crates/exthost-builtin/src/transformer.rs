//! Field-renaming transformer.

use std::collections::HashMap;

use async_trait::async_trait;
use serde_json::{Map, Value, json};

use exthost_plugin::prelude::*;

/// Renames top-level fields of an object record.
///
/// Config: `mapping` (source → target names), `drop_unmapped` (default
/// false) to discard fields that have no mapping.
#[derive(Debug)]
pub struct FieldMapTransformer {
    config: PluginConfig,
    mapping: HashMap<String, String>,
    drop_unmapped: bool,
    ready: ReadyFlag,
}

impl FieldMapTransformer {
    fn describe() -> PluginMetadata {
        plugin_metadata!(
            name: "Field Map Transformer",
            version: "1.0.0",
            kind: PluginKind::Transformer,
            description: "Renames record fields"
        )
        .with_field(
            "mapping",
            ConfigField::optional(FieldType::Object).with_default(json!({})),
        )
        .with_field(
            "drop_unmapped",
            ConfigField::optional(FieldType::Boolean).with_default(json!(false)),
        )
    }
}

impl FromConfig for FieldMapTransformer {
    const TYPE_NAME: &'static str = "FieldMapTransformer";

    fn from_config(mut config: PluginConfig) -> AppResult<Self> {
        Self::describe().config_schema.apply_defaults(&mut config);
        let mapping = config
            .get_as::<HashMap<String, String>>("mapping")
            .unwrap_or_default();
        let drop_unmapped = config.get_bool("drop_unmapped").unwrap_or(false);
        Ok(Self {
            config,
            mapping,
            drop_unmapped,
            ready: ReadyFlag::new(),
        })
    }
}

#[async_trait]
impl Plugin for FieldMapTransformer {
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
        Self::describe().config_schema.validate(&self.config)?;
        if self
            .config
            .get_as::<HashMap<String, String>>("mapping")
            .is_none()
        {
            return Err(AppError::validation(
                "'mapping' must map field names to field names",
            ));
        }
        Ok(())
    }

    fn as_transformer(&self) -> Option<&dyn TransformerPlugin> {
        Some(self)
    }
}

#[async_trait]
impl TransformerPlugin for FieldMapTransformer {
    async fn transform(&self, input: Value) -> AppResult<Value> {
        let Value::Object(fields) = input else {
            return Err(AppError::validation("Field Map Transformer expects an object"));
        };

        let mut output = Map::with_capacity(fields.len());
        for (name, value) in fields {
            match self.mapping.get(&name) {
                Some(target) => {
                    output.insert(target.clone(), value);
                }
                None if self.drop_unmapped => {}
                None => {
                    output.insert(name, value);
                }
            }
        }
        Ok(Value::Object(output))
    }
}
