//! Shared test plugins.

#![allow(dead_code)]

use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;

use exthost_plugin::prelude::*;

/// What `initialize` does.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Outcome {
    Ready,
    NotReady,
    Fail,
    /// Not ready on the first attempt, ready afterwards.
    NotReadyOnce,
}

/// Shared log of lifecycle calls, in order.
#[derive(Debug, Clone, Default)]
pub struct Journal(Arc<Mutex<Vec<String>>>);

impl Journal {
    pub fn record(&self, entry: String) {
        self.0.lock().expect("journal lock").push(entry);
    }

    pub fn entries(&self) -> Vec<String> {
        self.0.lock().expect("journal lock").clone()
    }

    pub fn with_prefix(&self, prefix: &str) -> Vec<String> {
        self.entries()
            .into_iter()
            .filter_map(|e| e.strip_prefix(prefix).map(str::to_string))
            .collect()
    }
}

#[derive(Debug)]
pub struct Recorder {
    meta: PluginMetadata,
    outcome: Outcome,
    delay: Option<Duration>,
    journal: Journal,
    ready: ReadyFlag,
    pub config: PluginConfig,
    pub cleanups: AtomicUsize,
    attempts: AtomicUsize,
}

impl Recorder {
    pub fn new(name: &str, journal: &Journal) -> Self {
        Self {
            meta: PluginMetadata::new(name, "1.0.0", PluginKind::Workflow),
            outcome: Outcome::Ready,
            delay: None,
            journal: journal.clone(),
            ready: ReadyFlag::new(),
            config: PluginConfig::new(),
            cleanups: AtomicUsize::new(0),
            attempts: AtomicUsize::new(0),
        }
    }

    pub fn kind(mut self, kind: PluginKind) -> Self {
        self.meta.kind = kind;
        self
    }

    pub fn priority(mut self, priority: i32) -> Self {
        self.meta.priority = priority;
        self
    }

    pub fn disabled(mut self) -> Self {
        self.meta.enabled = false;
        self
    }

    pub fn outcome(mut self, outcome: Outcome) -> Self {
        self.outcome = outcome;
        self
    }

    pub fn delay(mut self, delay: Duration) -> Self {
        self.delay = Some(delay);
        self
    }

    pub fn requires(mut self, field: &str) -> Self {
        self.meta = self
            .meta
            .with_field(field, ConfigField::required(FieldType::String));
        self
    }

    pub fn config(mut self, config: PluginConfig) -> Self {
        self.config = config;
        self
    }

    pub fn cleanup_count(&self) -> usize {
        self.cleanups.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl Plugin for Recorder {
    fn metadata(&self) -> PluginMetadata {
        self.meta.clone()
    }

    async fn initialize(&self) -> AppResult<bool> {
        self.journal.record(format!("init:{}", self.meta.name));
        let attempt = self.attempts.fetch_add(1, Ordering::SeqCst);
        if let Some(delay) = self.delay {
            tokio::time::sleep(delay).await;
        }
        match self.outcome {
            Outcome::Ready => {
                self.ready.set();
                Ok(true)
            }
            Outcome::NotReady => Ok(false),
            Outcome::NotReadyOnce if attempt == 0 => Ok(false),
            Outcome::NotReadyOnce => {
                self.ready.set();
                Ok(true)
            }
            Outcome::Fail => Err(AppError::initialization(format!(
                "{} cannot reach its backend",
                self.meta.name
            ))),
        }
    }

    async fn cleanup(&self) -> AppResult<bool> {
        self.journal.record(format!("cleanup:{}", self.meta.name));
        self.cleanups.fetch_add(1, Ordering::SeqCst);
        self.ready.clear();
        Ok(true)
    }

    fn is_ready(&self) -> bool {
        self.ready.get()
    }

    fn validate_config(&self) -> AppResult<()> {
        self.meta.config_schema.validate(&self.config)
    }
}

/// A plugin whose cleanup always errors.
#[derive(Debug)]
pub struct Leaky {
    journal: Journal,
}

impl Leaky {
    pub fn new(journal: &Journal) -> Self {
        Self {
            journal: journal.clone(),
        }
    }
}

#[async_trait]
impl Plugin for Leaky {
    fn metadata(&self) -> PluginMetadata {
        PluginMetadata::new("Leaky", "0.0.1", PluginKind::Adapter)
    }

    async fn initialize(&self) -> AppResult<bool> {
        Ok(true)
    }

    async fn cleanup(&self) -> AppResult<bool> {
        self.journal.record("cleanup:Leaky".to_string());
        Err(AppError::cleanup("socket already closed"))
    }

    fn is_ready(&self) -> bool {
        false
    }
}
