//! Hook dispatcher: runs every handler for an event, in order, to completion.
//!
//! - Handlers run sequentially in registration order.
//! - A handler error is logged and recorded in the [`DispatchResult`]; the
//!   remaining handlers still run.
//! - There is no cancellation: once an event fires, every handler runs.

use std::sync::Arc;

use tracing::{debug, warn};

use super::definitions::{DispatchResult, HookFailure, HookPayload};
use super::registry::HookRegistry;

/// Dispatches hooks to all registered handlers.
#[derive(Debug)]
pub struct HookDispatcher {
    /// Hook registry.
    registry: Arc<HookRegistry>,
}

impl HookDispatcher {
    /// Creates a new hook dispatcher.
    pub fn new(registry: Arc<HookRegistry>) -> Self {
        Self { registry }
    }

    /// Dispatches a payload to every handler registered for its event.
    ///
    /// Handlers are snapshotted first, so a handler may register further
    /// hooks without deadlocking; those run from the next dispatch on.
    pub async fn dispatch(&self, payload: &HookPayload) -> DispatchResult {
        let handlers = self.registry.get_handlers(&payload.event).await;

        if handlers.is_empty() {
            debug!(event = %payload.event, "No handlers for event");
            return DispatchResult::empty(&payload.event);
        }

        debug!(
            event = %payload.event,
            handler_count = handlers.len(),
            "Dispatching hook"
        );

        let mut result = DispatchResult::empty(&payload.event);

        for (index, handler) in handlers.iter().enumerate() {
            result.invoked += 1;
            match handler.handle(payload).await {
                Ok(Some(output)) => result.outputs.push(output),
                Ok(None) => {}
                Err(error) => {
                    warn!(
                        event = %payload.event,
                        handler = %handler.name(),
                        error = %error,
                        "Hook handler failed"
                    );
                    result.failures.push(HookFailure {
                        index,
                        handler: handler.name().to_string(),
                        error,
                    });
                }
            }
        }

        result
    }
}
