//! `${NAME}` placeholder substitution for configuration values.
//!
//! Only string values are rewritten; object keys are left alone. Unset
//! variables expand to the empty string. Anything that is not a well-formed
//! placeholder, such as `${}` or an unterminated `${`, is kept as is.

use std::sync::LazyLock;

use regex::{Captures, Regex};
use serde_json::Value;

/// Replaces placeholders using the process environment.
pub fn substitute_env(value: &Value) -> Value {
    substitute_with(value, &|name| std::env::var(name).ok())
}

/// Replaces placeholders using an explicit lookup.
pub fn substitute_with(value: &Value, lookup: &dyn Fn(&str) -> Option<String>) -> Value {
    match value {
        Value::String(s) => Value::String(expand(s, lookup)),
        Value::Array(items) => Value::Array(
            items
                .iter()
                .map(|item| substitute_with(item, lookup))
                .collect(),
        ),
        Value::Object(map) => Value::Object(
            map.iter()
                .map(|(k, v)| (k.clone(), substitute_with(v, lookup)))
                .collect(),
        ),
        other => other.clone(),
    }
}

/// `${NAME}` with an identifier name, optionally escaped as `$${NAME}`.
static PLACEHOLDER: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"\$(\$)?\{([A-Za-z_][A-Za-z0-9_]*)\}").expect("placeholder pattern is valid")
});

/// Expands every `${NAME}` occurrence in a single string.
///
/// `$${NAME}` yields the literal text `${NAME}`.
pub fn expand(input: &str, lookup: &dyn Fn(&str) -> Option<String>) -> String {
    PLACEHOLDER
        .replace_all(input, |caps: &Captures| {
            let name = &caps[2];
            if caps.get(1).is_some() {
                format!("${{{name}}}")
            } else {
                lookup(name).unwrap_or_default()
            }
        })
        .into_owned()
}
