//! Prelude for convenient imports.

pub use async_trait::async_trait;

pub use exthost_core::{AppError, AppResult, ErrorKind, PluginKind};

pub use crate::config::PluginConfig;
pub use crate::discovery::{FactoryCatalog, FromConfig, PluginFactory};
pub use crate::hooks::{DispatchResult, HookHandler, HookPayload};
pub use crate::metadata::PluginMetadata;
pub use crate::schema::{ConfigField, ConfigSchema, FieldType};
pub use crate::traits::{
    AdapterPlugin, AuthenticatorPlugin, Notification, NotifierPlugin, Plugin, ReadyFlag,
    TransformerPlugin, ValidationReport, ValidatorPlugin, WorkflowPlugin,
};

pub use crate::{hook_payload, plugin_metadata};
