//! Exthost: plugin host for healthcare integration extensions.
//!
//! Loads host configuration, builds one plugin manager, loads and discovers
//! plugins, starts them, and stops them again on Ctrl-C.

use tracing_subscriber::{EnvFilter, fmt};

use exthost_builtin::register_builtins;
use exthost_core::config::AppConfig;
use exthost_core::error::AppError;
use exthost_plugin::{FactoryCatalog, PluginManager};

#[tokio::main]
async fn main() {
    let config = match load_configuration() {
        Ok(c) => c,
        Err(e) => {
            eprintln!("Failed to load configuration: {}", e);
            std::process::exit(1);
        }
    };

    init_logging(&config);

    if let Err(e) = run(config).await {
        tracing::error!("Host error: {}", e);
        std::process::exit(1);
    }
}

/// Load configuration from file and environment
fn load_configuration() -> Result<AppConfig, AppError> {
    let config_path =
        std::env::var("EXTHOST_CONFIG").unwrap_or_else(|_| "config/exthost".to_string());

    AppConfig::load(&config_path)
}

/// Initialize tracing/logging
fn init_logging(config: &AppConfig) {
    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(&config.logging.level));

    match config.logging.format.as_str() {
        "json" => {
            fmt()
                .json()
                .with_env_filter(filter)
                .with_target(true)
                .with_thread_ids(true)
                .init();
        }
        _ => {
            fmt()
                .pretty()
                .with_env_filter(filter)
                .with_target(true)
                .init();
        }
    }
}

/// Main host run function
async fn run(config: AppConfig) -> anyhow::Result<()> {
    tracing::info!("Starting Exthost v{}", env!("CARGO_PKG_VERSION"));

    let mut catalog = FactoryCatalog::new();
    let builtins = register_builtins(&mut catalog);
    tracing::info!(implementations = builtins, "Plugin catalog ready");

    let manager = PluginManager::new(catalog).with_lifecycle(config.plugins.lifecycle.clone());

    if let Some(document) = &config.plugins.document {
        let summary = manager.load_plugins_from_file(document).await?;
        for failure in &summary.failed {
            tracing::warn!(
                plugin_key = %failure.key,
                error = %failure.error,
                "Plugin entry not loaded"
            );
        }
    }

    for namespace in &config.plugins.discover {
        manager.discover_plugins(namespace).await;
    }

    let results = manager.start().await;
    let ready = results.values().filter(|ok| **ok).count();
    tracing::info!(
        ready = ready,
        total = results.len(),
        "Exthost running; press Ctrl-C to stop"
    );

    tokio::signal::ctrl_c().await?;
    tracing::info!("Shutdown signal received");

    manager.stop().await;
    tracing::info!("Exthost stopped");
    Ok(())
}
