//! Manager behavior: config-driven loading, discovery and lifecycle.

mod common;

use std::collections::HashMap;
use std::io::Write;
use std::sync::{Arc, Mutex};

use std::time::Duration;

use exthost_core::config::LifecycleConfig;
use exthost_plugin::prelude::*;
use exthost_plugin::{PluginDefinition, PluginManager, PluginState, PluginsDocument};
use serde_json::json;

use common::{Journal, Outcome, Recorder};

type Captured = Arc<Mutex<Vec<PluginConfig>>>;

fn catalog(journal: &Journal, captured: &Captured) -> FactoryCatalog {
    let mut catalog = FactoryCatalog::new();

    let j = journal.clone();
    let c = captured.clone();
    catalog.register(
        "test::Alpha",
        move |config: PluginConfig| -> AppResult<Arc<dyn Plugin>> {
            c.lock().expect("capture lock").push(config.clone());
            Ok(Arc::new(
                Recorder::new("Alpha", &j)
                    .kind(PluginKind::Adapter)
                    .priority(20)
                    .config(config),
            ))
        },
    );

    let j = journal.clone();
    catalog.register(
        "test::Beta",
        move |config: PluginConfig| -> AppResult<Arc<dyn Plugin>> {
            Ok(Arc::new(
                Recorder::new("Beta", &j)
                    .kind(PluginKind::Notifier)
                    .priority(10)
                    .config(config),
            ))
        },
    );

    let j = journal.clone();
    catalog.register(
        "test::Strict",
        move |config: PluginConfig| -> AppResult<Arc<dyn Plugin>> {
            Ok(Arc::new(
                Recorder::new("Strict", &j).requires("endpoint").config(config),
            ))
        },
    );

    catalog.register(
        "test::Broken",
        |_config: PluginConfig| -> AppResult<Arc<dyn Plugin>> {
            Err(AppError::configuration("driver not available"))
        },
    );

    let j = journal.clone();
    catalog.register(
        "test::nested::Gamma",
        move |_config: PluginConfig| -> AppResult<Arc<dyn Plugin>> {
            Ok(Arc::new(Recorder::new("Gamma", &j)))
        },
    );

    catalog
}

fn setup() -> (PluginManager, Journal, Captured) {
    let journal = Journal::default();
    let captured = Captured::default();
    let manager = PluginManager::new(catalog(&journal, &captured));
    (manager, journal, captured)
}

#[tokio::test]
async fn env_placeholders_are_substituted_before_construction() {
    unsafe {
        std::env::set_var("EXTHOST_MANAGER_TEST_SECRET", "secret");
        std::env::remove_var("EXTHOST_MANAGER_TEST_UNSET");
    }
    let (manager, _journal, captured) = setup();

    let document = PluginsDocument::from_value(json!({
        "plugins": {
            "gateway": {
                "implementation": "test::Alpha",
                "config": {
                    "token": "${EXTHOST_MANAGER_TEST_SECRET}",
                    "url": "https://${EXTHOST_MANAGER_TEST_UNSET}/v1",
                    "retries": 3
                }
            }
        }
    }))
    .expect("document");

    let summary = manager.load_plugins_from_config(&document).await;
    assert_eq!(summary.loaded, 1);

    let configs = captured.lock().expect("capture lock").clone();
    assert_eq!(configs.len(), 1);
    assert_eq!(configs[0].get_str("token"), Some("secret"));
    assert_eq!(configs[0].get_str("url"), Some("https:///v1"));
    assert_eq!(configs[0].get_i64("retries"), Some(3));
}

#[tokio::test]
async fn bad_entries_are_counted_not_fatal() {
    let (manager, _journal, _captured) = setup();

    let document = PluginsDocument::new()
        .with_plugin("a-good", PluginDefinition::new("test::Beta"))
        .with_plugin("b-off", PluginDefinition::new("test::Alpha").with_enabled(false))
        .with_plugin("c-unknown", PluginDefinition::new("test::Missing"))
        .with_plugin("d-broken", PluginDefinition::new("test::Broken"))
        .with_plugin("e-invalid", PluginDefinition::new("test::Strict"))
        .with_plugin(
            "f-valid",
            PluginDefinition::new("test::Strict").with_config(
                PluginConfig::new().with("endpoint", json!("https://payer.example")),
            ),
        );

    let summary = manager.load_plugins_from_config(&document).await;

    assert_eq!(summary.loaded, 2);
    assert_eq!(summary.disabled, vec!["b-off".to_string()]);
    let failed: Vec<&str> = summary.failed.iter().map(|f| f.key.as_str()).collect();
    assert_eq!(failed, vec!["c-unknown", "d-broken", "e-invalid"]);
    assert!(summary.failed[0].error.is(ErrorKind::ConfigResolution));
    assert!(summary.failed[1].error.is(ErrorKind::Configuration));
    assert!(summary.failed[2].error.is(ErrorKind::Validation));
    assert!(!summary.is_complete());

    assert!(manager.get_plugin("a-good").await.is_some());
    assert!(manager.get_plugin("b-off").await.is_none());
    assert!(manager.get_plugin("f-valid").await.is_some());
}

#[tokio::test]
async fn load_plugin_rejects_duplicate_key() {
    let (manager, journal, _captured) = setup();
    let factory = move |_config: PluginConfig| -> AppResult<Arc<dyn Plugin>> {
        Ok(Arc::new(Recorder::new("Direct", &journal)))
    };

    assert!(manager.load_plugin(&factory, "direct", PluginConfig::new()).await);
    assert!(!manager.load_plugin(&factory, "direct", PluginConfig::new()).await);
}

#[tokio::test]
async fn discovery_registers_each_implementation_once() {
    let (manager, _journal, _captured) = setup();

    let first = manager.discover_plugins("test").await;
    let second = manager.discover_plugins("test").await;

    // Alpha, Beta and Strict; Broken fails to construct and nested::Gamma
    // lives in a child namespace.
    assert_eq!(first, 3);
    assert_eq!(second, 0);
    assert!(manager.get_plugin("test::Alpha").await.is_some());
    assert!(manager.get_plugin("test::nested::Gamma").await.is_none());

    assert_eq!(manager.discover_plugins("test::nested").await, 1);
    assert_eq!(manager.discover_plugins("nowhere").await, 0);
}

#[tokio::test]
async fn discovery_does_not_replace_configured_plugin() {
    let (manager, _journal, captured) = setup();

    let document = PluginsDocument::new().with_plugin(
        "test::Alpha",
        PluginDefinition::new("test::Alpha")
            .with_config(PluginConfig::new().with("system_id", json!("configured"))),
    );
    manager.load_plugins_from_config(&document).await;

    manager.discover_plugins("test").await;

    let configs = captured.lock().expect("capture lock").clone();
    assert_eq!(configs.len(), 1);
    assert_eq!(configs[0].get_str("system_id"), Some("configured"));
}

#[tokio::test]
async fn start_stop_and_unload() {
    let (manager, journal, _captured) = setup();
    let document = PluginsDocument::new()
        .with_plugin("alpha", PluginDefinition::new("test::Alpha"))
        .with_plugin("beta", PluginDefinition::new("test::Beta"));
    manager.load_plugins_from_config(&document).await;

    let results = manager.start().await;
    assert_eq!(
        results,
        HashMap::from([("alpha".to_string(), true), ("beta".to_string(), true)])
    );
    // Beta has the lower priority value.
    assert_eq!(journal.with_prefix("init:"), vec!["Beta", "Alpha"]);
    assert_eq!(manager.state("alpha").await, Some(PluginState::Active));

    assert!(manager.unload_plugin("alpha").await);
    assert!(manager.get_plugin("alpha").await.is_none());
    assert!(!manager.unload_plugin("alpha").await);
    assert_eq!(journal.with_prefix("cleanup:"), vec!["Alpha"]);

    manager.stop().await;
    assert_eq!(journal.with_prefix("cleanup:"), vec!["Alpha", "Beta"]);
    assert_eq!(manager.state("beta").await, Some(PluginState::Registered));
}

#[tokio::test]
async fn start_reports_failures_without_raising() {
    let journal = Journal::default();
    let mut catalog = FactoryCatalog::new();
    let j = journal.clone();
    catalog.register(
        "test::Flaky",
        move |_config: PluginConfig| -> AppResult<Arc<dyn Plugin>> {
            Ok(Arc::new(Recorder::new("Flaky", &j).outcome(Outcome::Fail)))
        },
    );
    let manager = PluginManager::new(catalog);
    manager.discover_plugins("test").await;

    let results = manager.start().await;
    assert_eq!(results.get("test::Flaky"), Some(&false));
}

#[tokio::test]
async fn list_plugins_filters_by_kind() {
    let (manager, _journal, _captured) = setup();
    manager.discover_plugins("test").await;

    let all = manager.list_plugins(None).await;
    let names: Vec<&str> = all.iter().map(|m| m.name.as_str()).collect();
    assert_eq!(names, vec!["Beta", "Alpha", "Strict"]);

    let adapters = manager.list_plugins(Some(PluginKind::Adapter)).await;
    assert_eq!(adapters.len(), 1);
    assert_eq!(adapters[0].name, "Alpha");

    let notifiers = manager.plugins_of_kind(PluginKind::Notifier).await;
    assert_eq!(notifiers.len(), 1);
}

#[tokio::test]
async fn loads_document_from_yaml_file() {
    unsafe {
        std::env::set_var("EXTHOST_MANAGER_TEST_FILE_TOKEN", "from-env");
    }
    let (manager, _journal, captured) = setup();

    let mut file = tempfile::Builder::new()
        .suffix(".yaml")
        .tempfile()
        .expect("temp file");
    writeln!(
        file,
        r#"
plugins:
  gateway:
    implementation: "test::Alpha"
    config:
      token: "${{EXTHOST_MANAGER_TEST_FILE_TOKEN}}"
  mailer:
    class: "test::Beta"
    enabled: false
"#
    )
    .expect("write");

    let summary = manager
        .load_plugins_from_file(file.path())
        .await
        .expect("load file");
    assert_eq!(summary.loaded, 1);
    assert_eq!(summary.disabled, vec!["mailer".to_string()]);

    let configs = captured.lock().expect("capture lock").clone();
    assert_eq!(configs[0].get_str("token"), Some("from-env"));
}

#[tokio::test]
async fn missing_document_file_is_an_error() {
    let (manager, _journal, _captured) = setup();
    assert!(
        manager
            .load_plugins_from_file("/no/such/plugins.yaml")
            .await
            .is_err()
    );
}

#[tokio::test]
async fn manager_hooks_reach_handlers() {
    let (manager, _journal, _captured) = setup();
    manager
        .register_hook_fn("claim.paid", "echo", |p: &HookPayload| {
            let amount = p.get_data("amount").cloned();
            async move { Ok(amount) }
        })
        .await;

    let result = manager
        .trigger_hook("claim.paid", HashMap::from([("amount".to_string(), json!(99))]))
        .await;
    assert!(result.is_clean());
    assert_eq!(result.outputs, vec![json!(99)]);
}

#[tokio::test(start_paused = true)]
async fn manager_initialize_plugin_uses_configured_deadline() {
    let journal = Journal::default();
    let mut catalog = FactoryCatalog::new();
    let j = journal.clone();
    catalog.register(
        "test::Sluggish",
        move |_config: PluginConfig| -> AppResult<Arc<dyn Plugin>> {
            Ok(Arc::new(
                Recorder::new("Sluggish", &j).delay(Duration::from_secs(60)),
            ))
        },
    );
    let manager = PluginManager::new(catalog).with_lifecycle(LifecycleConfig {
        init_timeout_seconds: 2,
        concurrent_tiers: false,
    });
    assert_eq!(manager.lifecycle().init_timeout(), Some(Duration::from_secs(2)));

    manager.discover_plugins("test").await;
    let ok = manager
        .initialize_plugin("test::Sluggish")
        .await
        .expect("known key");

    assert!(!ok);
    assert_eq!(journal.with_prefix("cleanup:"), vec!["Sluggish"]);
    assert_eq!(
        manager.state("test::Sluggish").await,
        Some(PluginState::Registered)
    );
    assert!(manager.initialize_plugin("missing").await.is_err());
}

#[tokio::test]
async fn catalog_can_grow_after_construction() {
    let (mut manager, journal, _captured) = setup();
    assert!(manager.catalog().contains("test::Alpha"));
    assert!(!manager.catalog().contains("extra::Late"));

    let j = journal.clone();
    manager.catalog_mut().register(
        "extra::Late",
        move |_config: PluginConfig| -> AppResult<Arc<dyn Plugin>> {
            Ok(Arc::new(Recorder::new("Late", &j)))
        },
    );

    assert_eq!(manager.discover_plugins("extra").await, 1);
    assert!(manager.registry().contains("extra::Late").await);
    assert_eq!(manager.registry().len().await, 1);
}
