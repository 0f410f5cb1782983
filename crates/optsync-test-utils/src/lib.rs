//! Testing utilities for OptionsSync workspace
//!
//! Shared backends, fixtures and tracing setup.

#![allow(missing_docs)]

use async_trait::async_trait;
use optsync_core::SettingsObject;
use optsync_engine::OptionsSyncConfig;
use optsync_store::{BackendError, BackendResult, MemoryBackend, StorageBackend, StorageEntry};
use parking_lot::Mutex;
use serde_json::{json, Value};
use std::collections::VecDeque;
use std::time::Duration;
use tracing_subscriber::EnvFilter;

/// One call observed by [`RecordingBackend`]
#[derive(Debug, Clone, PartialEq)]
pub enum BackendCall {
    Get(String),
    Set(StorageEntry),
}

/// Memory backend that records every call and can inject failures
#[derive(Debug, Default)]
pub struct RecordingBackend {
    inner: MemoryBackend,
    calls: Mutex<Vec<BackendCall>>,
    get_faults: Mutex<VecDeque<BackendError>>,
    set_faults: Mutex<VecDeque<BackendError>>,
    read_delay: Option<Duration>,
}

impl RecordingBackend {
    pub fn new() -> Self {
        Self::default()
    }

    /// Backend whose `key` already holds `value`
    pub fn seeded(key: &str, value: Value) -> Self {
        let backend = Self::new();
        backend.inner.insert_raw(key, value);
        backend
    }

    /// Delay every `get` response after its snapshot is taken
    pub fn with_read_delay(mut self, delay: Duration) -> Self {
        self.read_delay = Some(delay);
        self
    }

    pub fn fail_next_get(&self, err: BackendError) {
        self.get_faults.lock().push_back(err);
    }

    pub fn fail_next_set(&self, err: BackendError) {
        self.set_faults.lock().push_back(err);
    }

    pub fn calls(&self) -> Vec<BackendCall> {
        self.calls.lock().clone()
    }

    pub fn clear_calls(&self) {
        self.calls.lock().clear();
    }

    pub fn get_count(&self) -> usize {
        self.calls
            .lock()
            .iter()
            .filter(|c| matches!(c, BackendCall::Get(_)))
            .count()
    }

    pub fn set_count(&self) -> usize {
        self.set_payloads().len()
    }

    /// Every entry passed to `set`, in call order
    pub fn set_payloads(&self) -> Vec<StorageEntry> {
        self.calls
            .lock()
            .iter()
            .filter_map(|c| match c {
                BackendCall::Set(entry) => Some(entry.clone()),
                BackendCall::Get(_) => None,
            })
            .collect()
    }

    /// Payload of the first `set` as a JSON object
    pub fn first_set(&self) -> Option<Value> {
        self.set_payloads().into_iter().next().map(Value::Object)
    }

    /// Current raw value at `key`
    pub fn raw(&self, key: &str) -> Option<Value> {
        self.inner.raw(key)
    }
}

#[async_trait]
impl StorageBackend for RecordingBackend {
    async fn get(&self, key: &str) -> BackendResult<StorageEntry> {
        self.calls.lock().push(BackendCall::Get(key.to_string()));
        let fault = self.get_faults.lock().pop_front();
        if let Some(err) = fault {
            return Err(err);
        }
        // snapshot first, then delay the response
        let result = self.inner.get(key).await;
        if let Some(delay) = self.read_delay {
            tokio::time::sleep(delay).await;
        }
        result
    }

    async fn set(&self, entry: StorageEntry) -> BackendResult<()> {
        self.calls.lock().push(BackendCall::Set(entry.clone()));
        let fault = self.set_faults.lock().pop_front();
        if let Some(err) = fault {
            return Err(err);
        }
        self.inner.set(entry).await
    }

    fn name(&self) -> &'static str {
        "recording"
    }
}

/// Build a settings object from a JSON literal
pub fn settings(value: Value) -> SettingsObject {
    SettingsObject::from_value(value)
}

/// `{color: 'red', sound: true}`
pub fn simple_defaults() -> SettingsObject {
    settings(json!({"color": "red", "sound": true}))
}

/// Simple defaults stored under the `settings` namespace
pub fn simple_config() -> OptionsSyncConfig {
    OptionsSyncConfig::new()
        .with_defaults(simple_defaults())
        .with_storage_name("settings")
}

/// Install a test-writer subscriber once; honours `RUST_LOG`
pub fn init_tracing() {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn"));
    let _ = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_test_writer()
        .try_init();
}
