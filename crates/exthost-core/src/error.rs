//! Unified application error types for Exthost.
//!
//! All crates map their internal errors into [`AppError`] for consistent
//! propagation through the ? operator. The registry and manager never let an
//! `AppError` escape for a partial failure; they fold it into booleans,
//! per-key maps, or summaries and log it instead.

use std::fmt;
use thiserror::Error;

/// Top-level error kind categorization used across the entire host.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, serde::Serialize, serde::Deserialize)]
pub enum ErrorKind {
    /// A plugin key is already registered.
    DuplicateKey,
    /// No plugin is registered under the requested key.
    UnknownKey,
    /// A plugin failed to reach the ready state.
    Initialization,
    /// A plugin failed to release its resources.
    Cleanup,
    /// A configured implementation could not be resolved or constructed.
    ConfigResolution,
    /// A hook callback returned an error.
    HookCallback,
    /// Plugin configuration does not satisfy the declared schema.
    Validation,
    /// Host configuration could not be loaded.
    Configuration,
    /// A serialization/deserialization error occurred.
    Serialization,
    /// An operation exceeded its deadline.
    Timeout,
    /// An internal error occurred.
    Internal,
}

impl fmt::Display for ErrorKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::DuplicateKey => write!(f, "DUPLICATE_KEY"),
            Self::UnknownKey => write!(f, "UNKNOWN_KEY"),
            Self::Initialization => write!(f, "INITIALIZATION"),
            Self::Cleanup => write!(f, "CLEANUP"),
            Self::ConfigResolution => write!(f, "CONFIG_RESOLUTION"),
            Self::HookCallback => write!(f, "HOOK_CALLBACK"),
            Self::Validation => write!(f, "VALIDATION"),
            Self::Configuration => write!(f, "CONFIGURATION"),
            Self::Serialization => write!(f, "SERIALIZATION"),
            Self::Timeout => write!(f, "TIMEOUT"),
            Self::Internal => write!(f, "INTERNAL"),
        }
    }
}

/// The unified application error used throughout Exthost.
#[derive(Debug, Error)]
#[error("{kind}: {message}")]
pub struct AppError {
    /// The category of error.
    pub kind: ErrorKind,
    /// A human-readable error message.
    pub message: String,
    /// Optional underlying cause.
    #[source]
    pub source: Option<Box<dyn std::error::Error + Send + Sync>>,
}

impl AppError {
    /// Create a new application error.
    pub fn new(kind: ErrorKind, message: impl Into<String>) -> Self {
        Self {
            kind,
            message: message.into(),
            source: None,
        }
    }

    /// Create a new application error with an underlying cause.
    pub fn with_source(
        kind: ErrorKind,
        message: impl Into<String>,
        source: impl std::error::Error + Send + Sync + 'static,
    ) -> Self {
        Self {
            kind,
            message: message.into(),
            source: Some(Box::new(source)),
        }
    }

    /// Create a duplicate-key error.
    pub fn duplicate_key(key: &str) -> Self {
        Self::new(
            ErrorKind::DuplicateKey,
            format!("Plugin '{key}' is already registered"),
        )
    }

    /// Create an unknown-key error.
    pub fn unknown_key(key: &str) -> Self {
        Self::new(ErrorKind::UnknownKey, format!("Plugin '{key}' not found"))
    }

    /// Create an initialization error.
    pub fn initialization(message: impl Into<String>) -> Self {
        Self::new(ErrorKind::Initialization, message)
    }

    /// Create a cleanup error.
    pub fn cleanup(message: impl Into<String>) -> Self {
        Self::new(ErrorKind::Cleanup, message)
    }

    /// Create a config-resolution error.
    pub fn config_resolution(message: impl Into<String>) -> Self {
        Self::new(ErrorKind::ConfigResolution, message)
    }

    /// Create a hook-callback error.
    pub fn hook_callback(message: impl Into<String>) -> Self {
        Self::new(ErrorKind::HookCallback, message)
    }

    /// Create a validation error.
    pub fn validation(message: impl Into<String>) -> Self {
        Self::new(ErrorKind::Validation, message)
    }

    /// Create a configuration error.
    pub fn configuration(message: impl Into<String>) -> Self {
        Self::new(ErrorKind::Configuration, message)
    }

    /// Create a timeout error.
    pub fn timeout(message: impl Into<String>) -> Self {
        Self::new(ErrorKind::Timeout, message)
    }

    /// Create an internal error.
    pub fn internal(message: impl Into<String>) -> Self {
        Self::new(ErrorKind::Internal, message)
    }

    /// Returns true if this error has the given kind.
    pub fn is(&self, kind: ErrorKind) -> bool {
        self.kind == kind
    }
}

impl Clone for AppError {
    fn clone(&self) -> Self {
        Self {
            kind: self.kind,
            message: self.message.clone(),
            source: None,
        }
    }
}

impl From<serde_json::Error> for AppError {
    fn from(err: serde_json::Error) -> Self {
        Self::with_source(
            ErrorKind::Serialization,
            format!("JSON serialization error: {err}"),
            err,
        )
    }
}

impl From<std::io::Error> for AppError {
    fn from(err: std::io::Error) -> Self {
        Self::with_source(ErrorKind::Configuration, format!("I/O error: {err}"), err)
    }
}

impl From<config::ConfigError> for AppError {
    fn from(err: config::ConfigError) -> Self {
        Self::with_source(
            ErrorKind::Configuration,
            format!("Configuration error: {err}"),
            err,
        )
    }
}
