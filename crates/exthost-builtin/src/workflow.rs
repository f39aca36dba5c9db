//! Checklist workflow.

use async_trait::async_trait;
use serde_json::{Value, json};

use exthost_plugin::prelude::*;

use crate::ensure_ready;

/// Workflow that reports progress through a fixed list of steps.
///
/// `execute` takes `{"completed": [step, ...]}` and returns which configured
/// steps are completed, which are pending, and whether all are done.
#[derive(Debug)]
pub struct ChecklistWorkflow {
    config: PluginConfig,
    steps: Vec<String>,
    ready: ReadyFlag,
}

impl ChecklistWorkflow {
    fn describe() -> PluginMetadata {
        plugin_metadata!(
            name: "Checklist Workflow",
            version: "1.0.0",
            kind: PluginKind::Workflow,
            description: "Tracks completion of an ordered list of steps"
        )
        .with_field(
            "steps",
            ConfigField::optional(FieldType::Array)
                .with_default(json!(["received", "processed"]))
                .with_length(Some(1), None),
        )
    }

    /// Configured steps in order.
    pub fn steps(&self) -> &[String] {
        &self.steps
    }
}

impl FromConfig for ChecklistWorkflow {
    const TYPE_NAME: &'static str = "ChecklistWorkflow";

    fn from_config(mut config: PluginConfig) -> AppResult<Self> {
        Self::describe().config_schema.apply_defaults(&mut config);
        let steps = config.get_as::<Vec<String>>("steps").unwrap_or_default();
        Ok(Self {
            config,
            steps,
            ready: ReadyFlag::new(),
        })
    }
}

#[async_trait]
impl Plugin for ChecklistWorkflow {
    fn metadata(&self) -> PluginMetadata {
        Self::describe()
    }

    async fn initialize(&self) -> AppResult<bool> {
        if self.steps.is_empty() {
            return Ok(false);
        }
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
        if self.config.get_as::<Vec<String>>("steps").is_none() {
            return Err(AppError::validation("'steps' must be a list of strings"));
        }
        Ok(())
    }

    fn as_workflow(&self) -> Option<&dyn WorkflowPlugin> {
        Some(self)
    }
}

#[async_trait]
impl WorkflowPlugin for ChecklistWorkflow {
    async fn execute(&self, input: &Value) -> AppResult<Value> {
        ensure_ready(self.is_ready(), "Checklist Workflow")?;

        let finished: Vec<&str> = input
            .get("completed")
            .and_then(Value::as_array)
            .map(|items| items.iter().filter_map(Value::as_str).collect())
            .unwrap_or_default();

        let (completed, pending): (Vec<&String>, Vec<&String>) = self
            .steps
            .iter()
            .partition(|step| finished.contains(&step.as_str()));

        Ok(json!({
            "completed": completed,
            "pending": pending,
            "done": pending.is_empty(),
        }))
    }
}
