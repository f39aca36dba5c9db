//! The plugin contract and the kind-specific capability traits.
//!
//! Every plugin implements [`Plugin`]. Kind-specific operations live behind
//! narrower traits reached through the `as_*` capability queries after a
//! lookup, so the registry itself never needs to know concrete types.

use std::collections::HashMap;
use std::sync::atomic::{AtomicBool, Ordering};

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use serde_json::Value;

use exthost_core::AppResult;

use crate::metadata::PluginMetadata;

/// Trait that all plugins must implement.
///
/// Methods take `&self`; a plugin keeps whatever it acquires during
/// `initialize` behind its own interior mutability.
#[async_trait]
pub trait Plugin: Send + Sync + std::fmt::Debug {
    /// Returns plugin metadata. Pure; callable before `initialize`.
    fn metadata(&self) -> PluginMetadata;

    /// Brings the plugin to the ready state.
    ///
    /// `Ok(false)` reports a recoverable "not ready" condition. `Err` is
    /// reserved for configuration or programming errors. Must be safe to call
    /// again after an earlier failure.
    async fn initialize(&self) -> AppResult<bool>;

    /// Releases everything `initialize` acquired.
    ///
    /// Must return `Ok(true)` without side effects when the plugin was never
    /// initialized or initialization failed.
    async fn cleanup(&self) -> AppResult<bool>;

    /// Whether the last `initialize` succeeded and no `cleanup` followed.
    fn is_ready(&self) -> bool;

    /// Checks this plugin's configuration.
    ///
    /// Plugins opt in to schema validation by overriding this, usually with
    /// `self.metadata().config_schema.validate(&self.config)`.
    fn validate_config(&self) -> AppResult<()> {
        Ok(())
    }

    /// Adapter capability.
    fn as_adapter(&self) -> Option<&dyn AdapterPlugin> {
        None
    }

    /// Workflow capability.
    fn as_workflow(&self) -> Option<&dyn WorkflowPlugin> {
        None
    }

    /// Transformer capability.
    fn as_transformer(&self) -> Option<&dyn TransformerPlugin> {
        None
    }

    /// Validator capability.
    fn as_validator(&self) -> Option<&dyn ValidatorPlugin> {
        None
    }

    /// Authenticator capability.
    fn as_authenticator(&self) -> Option<&dyn AuthenticatorPlugin> {
        None
    }

    /// Notifier capability.
    fn as_notifier(&self) -> Option<&dyn NotifierPlugin> {
        None
    }
}

/// Connector to an external system.
#[async_trait]
pub trait AdapterPlugin: Send + Sync {
    /// Identifier of the system this adapter talks to.
    fn system_id(&self) -> &str;

    /// Fetches records of `resource_type` matching `params`.
    async fn fetch(&self, resource_type: &str, params: &Value) -> AppResult<Vec<Value>>;

    /// Sends one record of `resource_type`. Returns whether it was accepted.
    async fn send(&self, resource_type: &str, data: &Value) -> AppResult<bool>;
}

/// Automated multi-step process.
#[async_trait]
pub trait WorkflowPlugin: Send + Sync {
    /// Runs the workflow against `input` and returns its report.
    async fn execute(&self, input: &Value) -> AppResult<Value>;
}

/// Data reshaping step.
#[async_trait]
pub trait TransformerPlugin: Send + Sync {
    /// Transforms one record.
    async fn transform(&self, input: Value) -> AppResult<Value>;
}

/// Data validation step.
#[async_trait]
pub trait ValidatorPlugin: Send + Sync {
    /// Validates one record.
    async fn validate(&self, input: &Value) -> AppResult<ValidationReport>;
}

/// Authentication provider.
#[async_trait]
pub trait AuthenticatorPlugin: Send + Sync {
    /// Returns whether `credentials` are accepted.
    async fn authenticate(&self, credentials: &Value) -> AppResult<bool>;
}

/// Outbound notification channel.
#[async_trait]
pub trait NotifierPlugin: Send + Sync {
    /// Delivers a notification. Returns whether it was sent.
    async fn notify(&self, notification: &Notification) -> AppResult<bool>;
}

/// Outcome of a validator run.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ValidationReport {
    /// Human-readable problems found. Empty means valid.
    pub errors: Vec<String>,
}

impl ValidationReport {
    /// A report with no problems.
    pub fn valid() -> Self {
        Self::default()
    }

    /// Records a problem.
    pub fn push(&mut self, error: impl Into<String>) {
        self.errors.push(error.into());
    }

    /// Whether no problems were recorded.
    pub fn is_valid(&self) -> bool {
        self.errors.is_empty()
    }
}

/// A message handed to a notifier.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Notification {
    /// Who the message is for.
    pub recipient: String,
    /// Short subject line.
    pub subject: String,
    /// Message body.
    pub body: String,
    /// Extra channel-specific fields.
    #[serde(default)]
    pub metadata: HashMap<String, Value>,
}

impl Notification {
    /// Creates a notification.
    pub fn new(recipient: &str, subject: &str, body: &str) -> Self {
        Self {
            recipient: recipient.to_string(),
            subject: subject.to_string(),
            body: body.to_string(),
            metadata: HashMap::new(),
        }
    }

    /// Adds a metadata field.
    pub fn with_metadata(mut self, key: &str, value: Value) -> Self {
        self.metadata.insert(key.to_string(), value);
        self
    }
}

/// Ready flag for plugin implementations.
#[derive(Debug, Default)]
pub struct ReadyFlag(AtomicBool);

impl ReadyFlag {
    /// Creates a flag in the not-ready state.
    pub fn new() -> Self {
        Self::default()
    }

    /// Marks the plugin ready.
    pub fn set(&self) {
        self.0.store(true, Ordering::Release);
    }

    /// Marks the plugin not ready. Returns the previous value.
    pub fn clear(&self) -> bool {
        self.0.swap(false, Ordering::AcqRel)
    }

    /// Reads the flag.
    pub fn get(&self) -> bool {
        self.0.load(Ordering::Acquire)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_ready_flag_transitions() {
        let flag = ReadyFlag::new();
        assert!(!flag.get());
        flag.set();
        assert!(flag.get());
        assert!(flag.clear());
        assert!(!flag.get());
        assert!(!flag.clear());
    }

    #[test]
    fn test_validation_report() {
        let mut report = ValidationReport::valid();
        assert!(report.is_valid());
        report.push("member_id is missing");
        assert!(!report.is_valid());
    }
}
