//! The closed set of plugin categories.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::error::AppError;

/// Category a plugin belongs to.
///
/// The set is fixed at compile time; adding a kind is a release, not a
/// configuration change.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PluginKind {
    /// Connector to an external system.
    Adapter,
    /// Automated multi-step process.
    Workflow,
    /// Data reshaping step.
    Transformer,
    /// Data validation step.
    Validator,
    /// Authentication provider.
    Authenticator,
    /// Outbound notification channel.
    Notifier,
}

impl PluginKind {
    /// Every kind, in declaration order.
    pub const ALL: [PluginKind; 6] = [
        Self::Adapter,
        Self::Workflow,
        Self::Transformer,
        Self::Validator,
        Self::Authenticator,
        Self::Notifier,
    ];

    /// Returns the string name of this kind.
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Adapter => "adapter",
            Self::Workflow => "workflow",
            Self::Transformer => "transformer",
            Self::Validator => "validator",
            Self::Authenticator => "authenticator",
            Self::Notifier => "notifier",
        }
    }
}

impl fmt::Display for PluginKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

impl FromStr for PluginKind {
    type Err = AppError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::ALL
            .iter()
            .copied()
            .find(|kind| kind.as_str().eq_ignore_ascii_case(s))
            .ok_or_else(|| AppError::validation(format!("Unknown plugin kind '{s}'")))
    }
}
