//! Declarative configuration schema.
//!
//! A schema maps configuration keys to field descriptors. It is data only:
//! validation checks types and constraints, and defaults can be filled in,
//! but nothing declared here is ever executed.

use std::collections::BTreeMap;
use std::fmt;

use serde::{Deserialize, Serialize};
use serde_json::Value;

use exthost_core::{AppError, AppResult};

use crate::config::PluginConfig;

/// Expected JSON type of a configuration field.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FieldType {
    /// A string.
    String,
    /// An integral number.
    Integer,
    /// Any number.
    Number,
    /// `true` or `false`.
    Boolean,
    /// A JSON array.
    Array,
    /// A JSON object.
    Object,
    /// No type check.
    Any,
}

impl FieldType {
    /// Returns the string name of this type.
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::String => "string",
            Self::Integer => "integer",
            Self::Number => "number",
            Self::Boolean => "boolean",
            Self::Array => "array",
            Self::Object => "object",
            Self::Any => "any",
        }
    }

    /// Returns whether `value` has this type.
    pub fn matches(&self, value: &Value) -> bool {
        match self {
            Self::String => value.is_string(),
            Self::Integer => value.is_i64() || value.is_u64(),
            Self::Number => value.is_number(),
            Self::Boolean => value.is_boolean(),
            Self::Array => value.is_array(),
            Self::Object => value.is_object(),
            Self::Any => true,
        }
    }
}

impl fmt::Display for FieldType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// Value constraints attached to a field.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct FieldConstraints {
    /// Inclusive numeric lower bound.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub min: Option<f64>,
    /// Inclusive numeric upper bound.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub max: Option<f64>,
    /// Minimum length of a string (in chars) or an array.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub min_length: Option<usize>,
    /// Maximum length of a string (in chars) or an array.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub max_length: Option<usize>,
    /// Allowed values. Empty means unrestricted.
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub one_of: Vec<Value>,
}

/// Descriptor for a single configuration key.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ConfigField {
    /// Expected type.
    #[serde(rename = "type")]
    pub field_type: FieldType,
    /// Whether the key must be present (and non-null).
    #[serde(default)]
    pub required: bool,
    /// Value used by [`ConfigSchema::apply_defaults`] when the key is absent.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub default: Option<Value>,
    /// Additional constraints.
    #[serde(default)]
    pub constraints: FieldConstraints,
}

impl ConfigField {
    /// A required field of the given type.
    pub fn required(field_type: FieldType) -> Self {
        Self {
            field_type,
            required: true,
            default: None,
            constraints: FieldConstraints::default(),
        }
    }

    /// An optional field of the given type.
    pub fn optional(field_type: FieldType) -> Self {
        Self {
            required: false,
            ..Self::required(field_type)
        }
    }

    /// Sets the default value.
    pub fn with_default(mut self, value: Value) -> Self {
        self.default = Some(value);
        self
    }

    /// Sets the numeric range.
    pub fn with_range(mut self, min: Option<f64>, max: Option<f64>) -> Self {
        self.constraints.min = min;
        self.constraints.max = max;
        self
    }

    /// Sets the length bounds.
    pub fn with_length(mut self, min: Option<usize>, max: Option<usize>) -> Self {
        self.constraints.min_length = min;
        self.constraints.max_length = max;
        self
    }

    /// Restricts the field to a fixed set of values.
    pub fn one_of(mut self, values: Vec<Value>) -> Self {
        self.constraints.one_of = values;
        self
    }

    fn check(&self, value: &Value) -> Option<String> {
        if !self.field_type.matches(value) {
            return Some(format!("expected {}, got {}", self.field_type, type_name(value)));
        }

        let c = &self.constraints;

        if let Some(n) = value.as_f64() {
            if let Some(min) = c.min.filter(|min| n < *min) {
                return Some(format!("{n} is below minimum {min}"));
            }
            if let Some(max) = c.max.filter(|max| n > *max) {
                return Some(format!("{n} is above maximum {max}"));
            }
        }

        let length = match value {
            Value::String(s) => Some(s.chars().count()),
            Value::Array(items) => Some(items.len()),
            _ => None,
        };
        if let Some(len) = length {
            if let Some(min) = c.min_length.filter(|min| len < *min) {
                return Some(format!("length {len} is below minimum {min}"));
            }
            if let Some(max) = c.max_length.filter(|max| len > *max) {
                return Some(format!("length {len} is above maximum {max}"));
            }
        }

        if !c.one_of.is_empty() && !c.one_of.contains(value) {
            return Some(format!("{value} is not one of the allowed values"));
        }

        None
    }
}

/// A single schema violation.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SchemaViolation {
    /// Offending configuration key.
    pub field: String,
    /// What is wrong with it.
    pub reason: String,
}

impl fmt::Display for SchemaViolation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "'{}': {}", self.field, self.reason)
    }
}

/// Mapping from configuration key to field descriptor.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ConfigSchema {
    fields: BTreeMap<String, ConfigField>,
}

impl ConfigSchema {
    /// Creates an empty schema.
    pub fn new() -> Self {
        Self::default()
    }

    /// Adds a field, builder style.
    pub fn field(mut self, name: &str, field: ConfigField) -> Self {
        self.fields.insert(name.to_string(), field);
        self
    }

    /// Gets a field descriptor.
    pub fn get(&self, name: &str) -> Option<&ConfigField> {
        self.fields.get(name)
    }

    /// Iterates over fields in key order.
    pub fn iter(&self) -> impl Iterator<Item = (&String, &ConfigField)> {
        self.fields.iter()
    }

    /// Number of declared fields.
    pub fn len(&self) -> usize {
        self.fields.len()
    }

    /// Returns true when no fields are declared.
    pub fn is_empty(&self) -> bool {
        self.fields.is_empty()
    }

    /// Collects every violation of this schema by `config`.
    ///
    /// Keys not declared in the schema are ignored.
    pub fn violations(&self, config: &PluginConfig) -> Vec<SchemaViolation> {
        self.fields
            .iter()
            .filter_map(|(name, field)| {
                let reason = match config.get(name) {
                    None | Some(Value::Null) if field.required => {
                        Some("required field is missing".to_string())
                    }
                    None | Some(Value::Null) => None,
                    Some(value) => field.check(value),
                };
                reason.map(|reason| SchemaViolation {
                    field: name.clone(),
                    reason,
                })
            })
            .collect()
    }

    /// Validates `config`, folding all violations into one error.
    pub fn validate(&self, config: &PluginConfig) -> AppResult<()> {
        let violations = self.violations(config);
        if violations.is_empty() {
            return Ok(());
        }

        let details = violations
            .iter()
            .map(ToString::to_string)
            .collect::<Vec<_>>()
            .join("; ");
        Err(AppError::validation(format!(
            "Configuration does not match schema: {details}"
        )))
    }

    /// Fills absent keys that declare a default.
    pub fn apply_defaults(&self, config: &mut PluginConfig) {
        for (name, field) in &self.fields {
            if let Some(default) = &field.default {
                if config.get(name).is_none_or(Value::is_null) {
                    config.insert(name, default.clone());
                }
            }
        }
    }
}

fn type_name(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "boolean",
        Value::Number(n) if n.is_f64() => "number",
        Value::Number(_) => "integer",
        Value::String(_) => "string",
        Value::Array(_) => "array",
        Value::Object(_) => "object",
    }
}
