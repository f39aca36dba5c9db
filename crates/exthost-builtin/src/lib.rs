//! # exthost-builtin
//!
//! One small, config-driven plugin per [`PluginKind`](exthost_core::PluginKind).
//! They hold everything in memory and talk to no external system, which
//! makes them useful for wiring checks and as templates for real plugins.
//!
//! Call [`register_builtins`] at start-up, then discover the
//! [`NAMESPACE`] or reference `builtin::<TypeName>` from a configuration
//! document.

pub mod adapter;
pub mod authenticator;
pub mod notifier;
pub mod transformer;
pub mod validator;
pub mod workflow;

use exthost_plugin::FactoryCatalog;

pub use adapter::MemoryAdapter;
pub use authenticator::StaticTokenAuthenticator;
pub use notifier::LogNotifier;
pub use transformer::FieldMapTransformer;
pub use validator::RequiredFieldsValidator;
pub use workflow::ChecklistWorkflow;

/// Namespace every builtin is registered under.
pub const NAMESPACE: &str = "builtin";

/// Registers every builtin implementation. Returns how many were added.
pub fn register_builtins(catalog: &mut FactoryCatalog) -> usize {
    [
        catalog.register_type::<MemoryAdapter>(NAMESPACE),
        catalog.register_type::<ChecklistWorkflow>(NAMESPACE),
        catalog.register_type::<FieldMapTransformer>(NAMESPACE),
        catalog.register_type::<RequiredFieldsValidator>(NAMESPACE),
        catalog.register_type::<StaticTokenAuthenticator>(NAMESPACE),
        catalog.register_type::<LogNotifier>(NAMESPACE),
    ]
    .into_iter()
    .filter(|added| *added)
    .count()
}

/// Fails with an initialization error unless the plugin is ready.
pub(crate) fn ensure_ready(ready: bool, name: &str) -> exthost_core::AppResult<()> {
    if ready {
        Ok(())
    } else {
        Err(exthost_core::AppError::initialization(format!(
            "{name} is not initialized"
        )))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_register_builtins_once() {
        let mut catalog = FactoryCatalog::new();
        assert_eq!(register_builtins(&mut catalog), 6);
        assert_eq!(register_builtins(&mut catalog), 0);
        assert!(catalog.contains("builtin::MemoryAdapter"));
        assert_eq!(catalog.in_namespace(NAMESPACE).len(), 6);
    }
}
