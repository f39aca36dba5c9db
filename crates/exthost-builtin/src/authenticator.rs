//! Static shared-token authenticator.

use async_trait::async_trait;
use serde_json::{Value, json};
use tracing::debug;

use exthost_plugin::prelude::*;

/// Accepts credentials whose `header` field equals the configured token.
///
/// Config: `token` (required, usually `${VAR}`), `header` (default
/// `"token"`).
#[derive(Debug)]
pub struct StaticTokenAuthenticator {
    config: PluginConfig,
    token: String,
    header: String,
    ready: ReadyFlag,
}

impl StaticTokenAuthenticator {
    fn describe() -> PluginMetadata {
        plugin_metadata!(
            name: "Static Token Authenticator",
            version: "1.0.0",
            kind: PluginKind::Authenticator,
            description: "Compares a credential field against a shared token",
            priority: 10
        )
        .with_field(
            "token",
            ConfigField::required(FieldType::String).with_length(Some(1), None),
        )
        .with_field(
            "header",
            ConfigField::optional(FieldType::String).with_default(json!("token")),
        )
    }
}

impl FromConfig for StaticTokenAuthenticator {
    const TYPE_NAME: &'static str = "StaticTokenAuthenticator";

    fn from_config(mut config: PluginConfig) -> AppResult<Self> {
        Self::describe().config_schema.apply_defaults(&mut config);
        let token = config.get_str("token").unwrap_or_default().to_string();
        let header = config.get_str("header").unwrap_or("token").to_string();
        Ok(Self {
            config,
            token,
            header,
            ready: ReadyFlag::new(),
        })
    }
}

#[async_trait]
impl Plugin for StaticTokenAuthenticator {
    fn metadata(&self) -> PluginMetadata {
        Self::describe()
    }

    async fn initialize(&self) -> AppResult<bool> {
        if self.token.is_empty() {
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
        Self::describe().config_schema.validate(&self.config)
    }

    fn as_authenticator(&self) -> Option<&dyn AuthenticatorPlugin> {
        Some(self)
    }
}

#[async_trait]
impl AuthenticatorPlugin for StaticTokenAuthenticator {
    async fn authenticate(&self, credentials: &Value) -> AppResult<bool> {
        if !self.is_ready() {
            return Ok(false);
        }
        let Some(presented) = credentials.get(&self.header).and_then(Value::as_str) else {
            debug!(header = %self.header, "Credential field missing");
            return Ok(false);
        };
        Ok(constant_time_eq(presented.as_bytes(), self.token.as_bytes()))
    }
}

/// Compares without short-circuiting on the first differing byte.
fn constant_time_eq(a: &[u8], b: &[u8]) -> bool {
    if a.len() != b.len() {
        return false;
    }
    a.iter().zip(b).fold(0u8, |acc, (x, y)| acc | (x ^ y)) == 0
}
