//! Required-fields validator.

use async_trait::async_trait;
use serde_json::{Value, json};

use exthost_plugin::prelude::*;

/// Reports every configured field that is missing or null in a record.
#[derive(Debug)]
pub struct RequiredFieldsValidator {
    config: PluginConfig,
    fields: Vec<String>,
    ready: ReadyFlag,
}

impl RequiredFieldsValidator {
    fn describe() -> PluginMetadata {
        plugin_metadata!(
            name: "Required Fields Validator",
            version: "1.0.0",
            kind: PluginKind::Validator,
            description: "Checks that records carry the configured fields"
        )
        .with_field(
            "fields",
            ConfigField::optional(FieldType::Array).with_default(json!([])),
        )
    }
}

impl FromConfig for RequiredFieldsValidator {
    const TYPE_NAME: &'static str = "RequiredFieldsValidator";

    fn from_config(mut config: PluginConfig) -> AppResult<Self> {
        Self::describe().config_schema.apply_defaults(&mut config);
        let fields = config.get_as::<Vec<String>>("fields").unwrap_or_default();
        Ok(Self {
            config,
            fields,
            ready: ReadyFlag::new(),
        })
    }
}

#[async_trait]
impl Plugin for RequiredFieldsValidator {
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
        if self.config.get_as::<Vec<String>>("fields").is_none() {
            return Err(AppError::validation("'fields' must be a list of strings"));
        }
        Ok(())
    }

    fn as_validator(&self) -> Option<&dyn ValidatorPlugin> {
        Some(self)
    }
}

#[async_trait]
impl ValidatorPlugin for RequiredFieldsValidator {
    async fn validate(&self, input: &Value) -> AppResult<ValidationReport> {
        let mut report = ValidationReport::valid();

        let Some(record) = input.as_object() else {
            report.push("record must be an object");
            return Ok(report);
        };

        for field in &self.fields {
            if record.get(field).is_none_or(Value::is_null) {
                report.push(format!("'{field}' is required"));
            }
        }
        Ok(report)
    }
}
