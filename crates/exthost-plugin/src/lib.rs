//! # exthost-plugin
//!
//! Plugin framework for Exthost. Provides:
//!
//! - The plugin contract and kind-specific capability traits
//! - A registry with priority-ordered batch initialize and cleanup
//! - Hook registry and dispatcher with per-handler failure isolation
//! - A factory catalog backing discovery and config-driven loading
//! - A manager facade over all of the above

pub mod config;
pub mod discovery;
pub mod document;
pub mod env;
pub mod hooks;
pub mod macros;
pub mod manager;
pub mod metadata;
pub mod prelude;
pub mod registry;
pub mod schema;
pub mod traits;

pub use config::PluginConfig;
pub use discovery::{FactoryCatalog, FromConfig, PluginFactory};
pub use document::{DocumentFormat, PluginDefinition, PluginsDocument};
pub use hooks::{DispatchResult, HookDispatcher, HookHandler, HookPayload, HookRegistry};
pub use manager::{LoadFailure, LoadSummary, PluginManager};
pub use metadata::PluginMetadata;
pub use registry::{PluginRegistry, PluginState};
pub use traits::Plugin;
