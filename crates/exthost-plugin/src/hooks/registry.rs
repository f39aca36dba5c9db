//! Hook registry: callbacks stored per event name in registration order.

use std::collections::HashMap;
use std::future::Future;
use std::sync::Arc;

use async_trait::async_trait;
use futures::future::BoxFuture;
use serde_json::Value;
use tokio::sync::RwLock;
use tracing::debug;

use exthost_core::AppResult;

use super::definitions::HookPayload;

/// Trait for hook handler implementations.
#[async_trait]
pub trait HookHandler: Send + Sync + std::fmt::Debug {
    /// Name used in logs and failure reports.
    fn name(&self) -> &str;

    /// Handles a hook invocation. An `Err` is reported, never propagated.
    async fn handle(&self, payload: &HookPayload) -> AppResult<Option<Value>>;
}

type HandlerFn = dyn Fn(&HookPayload) -> BoxFuture<'static, AppResult<Option<Value>>> + Send + Sync;

/// A closure-based hook handler for quick handler creation.
pub struct ClosureHandler {
    /// Handler name.
    name: String,
    /// Handler function.
    handler: Arc<HandlerFn>,
}

impl std::fmt::Debug for ClosureHandler {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ClosureHandler")
            .field("name", &self.name)
            .field("handler", &"<closure>")
            .finish()
    }
}

impl ClosureHandler {
    /// Creates a new closure-based handler.
    ///
    /// The closure receives the payload by reference and must return an
    /// owned future, so copy what it needs out of the payload first.
    pub fn new<F, Fut>(name: &str, handler: F) -> Self
    where
        F: Fn(&HookPayload) -> Fut + Send + Sync + 'static,
        Fut: Future<Output = AppResult<Option<Value>>> + Send + 'static,
    {
        Self {
            name: name.to_string(),
            handler: Arc::new(
                move |payload: &HookPayload| -> BoxFuture<'static, AppResult<Option<Value>>> {
                    Box::pin(handler(payload))
                },
            ),
        }
    }
}

#[async_trait]
impl HookHandler for ClosureHandler {
    fn name(&self) -> &str {
        &self.name
    }

    async fn handle(&self, payload: &HookPayload) -> AppResult<Option<Value>> {
        (self.handler)(payload).await
    }
}

/// Registry of hook handlers organized by event name.
#[derive(Debug, Default)]
pub struct HookRegistry {
    /// Event name → handlers in registration order.
    handlers: RwLock<HashMap<String, Vec<Arc<dyn HookHandler>>>>,
}

impl HookRegistry {
    /// Creates a new empty hook registry.
    pub fn new() -> Self {
        Self::default()
    }

    /// Appends a handler for an event. Multiple handlers per event are
    /// allowed and run in the order they were registered.
    pub async fn register(&self, event: &str, handler: Arc<dyn HookHandler>) {
        let name = handler.name().to_string();
        let mut handlers = self.handlers.write().await;
        let entries = handlers.entry(event.to_string()).or_default();
        entries.push(handler);

        debug!(
            event = %event,
            handler = %name,
            position = entries.len(),
            "Hook handler registered"
        );
    }

    /// Removes every handler for an event. Returns how many were removed.
    pub async fn clear(&self, event: &str) -> usize {
        let mut handlers = self.handlers.write().await;
        handlers.remove(event).map(|v| v.len()).unwrap_or(0)
    }

    /// Returns a snapshot of the handlers for an event.
    pub async fn get_handlers(&self, event: &str) -> Vec<Arc<dyn HookHandler>> {
        let handlers = self.handlers.read().await;
        handlers.get(event).cloned().unwrap_or_default()
    }

    /// Returns whether any handlers are registered for an event.
    pub async fn has_handlers(&self, event: &str) -> bool {
        let handlers = self.handlers.read().await;
        handlers.get(event).is_some_and(|entries| !entries.is_empty())
    }

    /// Returns the number of handlers registered for an event.
    pub async fn handler_count(&self, event: &str) -> usize {
        let handlers = self.handlers.read().await;
        handlers.get(event).map(|entries| entries.len()).unwrap_or(0)
    }

    /// Returns all event names with at least one handler, sorted.
    pub async fn registered_events(&self) -> Vec<String> {
        let handlers = self.handlers.read().await;
        let mut events: Vec<String> = handlers.keys().cloned().collect();
        events.sort();
        events
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn noop(name: &str) -> Arc<dyn HookHandler> {
        Arc::new(ClosureHandler::new(name, |_payload: &HookPayload| async {
            Ok(None)
        }))
    }

    #[tokio::test]
    async fn test_register_keeps_order() {
        let registry = HookRegistry::new();
        registry.register("claim.paid", noop("first")).await;
        registry.register("claim.paid", noop("second")).await;
        registry.register("member.added", noop("other")).await;

        let names: Vec<String> = registry
            .get_handlers("claim.paid")
            .await
            .iter()
            .map(|h| h.name().to_string())
            .collect();
        assert_eq!(names, vec!["first", "second"]);
        assert_eq!(
            registry.registered_events().await,
            vec!["claim.paid".to_string(), "member.added".to_string()]
        );
    }

    #[tokio::test]
    async fn test_clear_event() {
        let registry = HookRegistry::new();
        registry.register("x", noop("a")).await;
        registry.register("x", noop("b")).await;

        assert_eq!(registry.clear("x").await, 2);
        assert!(!registry.has_handlers("x").await);
        assert_eq!(registry.handler_count("x").await, 0);
    }
}
