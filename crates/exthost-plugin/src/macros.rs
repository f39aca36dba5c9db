//! Convenience macros for plugin development.

/// Builds a `PluginMetadata`.
///
/// # Example
/// ```rust,ignore
/// let meta = plugin_metadata!(
///     name: "Payer Gateway",
///     version: "1.0.0",
///     kind: PluginKind::Adapter,
///     description: "Claims and eligibility",
///     priority: 50
/// );
/// ```
#[macro_export]
macro_rules! plugin_metadata {
    (
        name: $name:expr,
        version: $version:expr,
        kind: $kind:expr
        $(, description: $desc:expr)?
        $(, author: $author:expr)?
        $(, priority: $priority:expr)?
        $(,)?
    ) => {{
        #[allow(unused_mut)]
        let mut meta = $crate::metadata::PluginMetadata::new($name, $version, $kind);
        $( meta = meta.with_description($desc); )?
        $( meta = meta.with_author($author); )?
        $( meta = meta.with_priority($priority); )?
        meta
    }};
}

/// Builds a `HookPayload`.
///
/// # Example
/// ```rust,ignore
/// let payload = hook_payload!("claim.submitted", {
///     "claim_id" => json!("C-1001"),
///     "amount" => json!(420),
/// });
/// ```
#[macro_export]
macro_rules! hook_payload {
    ($event:expr) => {
        $crate::hooks::HookPayload::new($event)
    };
    ($event:expr, { $($key:expr => $value:expr),* $(,)? }) => {{
        let mut payload = $crate::hooks::HookPayload::new($event);
        $(
            payload.data.insert($key.to_string(), $value);
        )*
        payload
    }};
}
