//! Hook payload and dispatch result types.

use std::collections::HashMap;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use exthost_core::AppError;

/// Payload passed to hook handlers: an opaque event name plus an open map
/// of named values.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct HookPayload {
    /// Event name. No fixed vocabulary is enforced.
    pub event: String,
    /// Arbitrary data keyed by string.
    pub data: HashMap<String, serde_json::Value>,
    /// Timestamp of the event.
    pub timestamp: DateTime<Utc>,
}

impl HookPayload {
    /// Creates a new hook payload.
    pub fn new(event: &str) -> Self {
        Self {
            event: event.to_string(),
            data: HashMap::new(),
            timestamp: Utc::now(),
        }
    }

    /// Creates a payload carrying an existing data map.
    pub fn with_map(event: &str, data: HashMap<String, serde_json::Value>) -> Self {
        Self {
            data,
            ..Self::new(event)
        }
    }

    /// Inserts a data value.
    pub fn with_data(mut self, key: &str, value: serde_json::Value) -> Self {
        self.data.insert(key.to_string(), value);
        self
    }

    /// Inserts a string value.
    pub fn with_string(self, key: &str, value: &str) -> Self {
        self.with_data(key, serde_json::json!(value))
    }

    /// Inserts an integer value.
    pub fn with_int(self, key: &str, value: i64) -> Self {
        self.with_data(key, serde_json::json!(value))
    }

    /// Inserts a boolean value.
    pub fn with_bool(self, key: &str, value: bool) -> Self {
        self.with_data(key, serde_json::json!(value))
    }

    /// Gets a data value by key.
    pub fn get_data(&self, key: &str) -> Option<&serde_json::Value> {
        self.data.get(key)
    }

    /// Gets a string data value.
    pub fn get_string(&self, key: &str) -> Option<&str> {
        self.data.get(key).and_then(|v| v.as_str())
    }

    /// Gets an i64 data value.
    pub fn get_i64(&self, key: &str) -> Option<i64> {
        self.data.get(key).and_then(|v| v.as_i64())
    }

    /// Gets a bool data value.
    pub fn get_bool(&self, key: &str) -> Option<bool> {
        self.data.get(key).and_then(|v| v.as_bool())
    }
}

/// A handler that returned an error during dispatch.
#[derive(Debug, Clone)]
pub struct HookFailure {
    /// Position of the handler in registration order.
    pub index: usize,
    /// Handler name.
    pub handler: String,
    /// The error it returned.
    pub error: AppError,
}

/// Aggregated result of dispatching one event.
#[derive(Debug, Clone, Default)]
pub struct DispatchResult {
    /// Event name.
    pub event: String,
    /// Number of handlers invoked.
    pub invoked: usize,
    /// Output values returned by handlers, in registration order.
    pub outputs: Vec<serde_json::Value>,
    /// Handlers that failed.
    pub failures: Vec<HookFailure>,
}

impl DispatchResult {
    /// An empty result for an event with no handlers.
    pub fn empty(event: &str) -> Self {
        Self {
            event: event.to_string(),
            ..Default::default()
        }
    }

    /// Whether every invoked handler succeeded.
    pub fn is_clean(&self) -> bool {
        self.failures.is_empty()
    }
}
