//! File-backed storage area
//!
//! The whole area lives in one JSON object on disk. Each write goes through
//! its own temp file in the same directory that is persisted over the
//! original, so a crash never leaves a half-written area behind.
//!
//! Every instance opened on the same path in this process shares one write
//! lock. Separate processes are not coordinated.

use async_trait::async_trait;
use dashmap::DashMap;
use serde_json::Value as JsonValue;
use std::io::Write;
use std::path::{Path, PathBuf};
use std::sync::{Arc, OnceLock};
use tempfile::NamedTempFile;
use tokio::sync::Mutex;

use crate::backend::{StorageBackend, StorageEntry};
use crate::error::{BackendError, BackendResult};

/// Durable single-file backend
#[derive(Debug)]
pub struct JsonFileBackend {
    path: PathBuf,
    // shared by all instances on `path`
    write_lock: Arc<Mutex<()>>,
}

fn area_lock(path: &Path) -> Arc<Mutex<()>> {
    static LOCKS: OnceLock<DashMap<PathBuf, Arc<Mutex<()>>>> = OnceLock::new();
    LOCKS
        .get_or_init(DashMap::new)
        .entry(path.to_path_buf())
        .or_default()
        .clone()
}

impl JsonFileBackend {
    /// Create backend storing its area at `path`
    ///
    /// The file is created on first write. Instances created with the same
    /// `path` serialize their writes against each other.
    #[must_use]
    pub fn new(path: impl Into<PathBuf>) -> Self {
        let path = path.into();
        Self {
            write_lock: area_lock(&path),
            path,
        }
    }

    /// Path of the area file
    #[inline]
    #[must_use]
    pub fn path(&self) -> &Path {
        &self.path
    }

    async fn load(&self) -> BackendResult<StorageEntry> {
        let bytes = match tokio::fs::read(&self.path).await {
            Ok(bytes) => bytes,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
                return Ok(StorageEntry::new());
            }
            Err(e) => return Err(BackendError::io_error(&self.path, e)),
        };

        if bytes.iter().all(u8::is_ascii_whitespace) {
            return Ok(StorageEntry::new());
        }

        match serde_json::from_slice::<JsonValue>(&bytes) {
            Ok(JsonValue::Object(area)) => Ok(area),
            Ok(other) => Err(BackendError::Corrupt {
                path: self.path.clone(),
                reason: format!("expected object, got {}", optsync_core::json_kind(&other)),
            }),
            Err(e) => Err(BackendError::Corrupt {
                path: self.path.clone(),
                reason: e.to_string(),
            }),
        }
    }

    async fn store(&self, area: &StorageEntry) -> BackendResult<()> {
        let encoded = serde_json::to_vec_pretty(area).map_err(|e| BackendError::Corrupt {
            path: self.path.clone(),
            reason: e.to_string(),
        })?;

        let dir = match self.path.parent() {
            Some(parent) if !parent.as_os_str().is_empty() => parent.to_path_buf(),
            _ => PathBuf::from("."),
        };
        tokio::fs::create_dir_all(&dir)
            .await
            .map_err(|e| BackendError::io_error(&dir, e))?;

        let target = self.path.clone();
        tokio::task::spawn_blocking(move || -> BackendResult<()> {
            let mut tmp =
                NamedTempFile::new_in(&dir).map_err(|e| BackendError::io_error(&dir, e))?;
            tmp.write_all(&encoded)
                .and_then(|()| tmp.as_file().sync_all())
                .map_err(|e| BackendError::io_error(tmp.path(), e))?;
            tmp.persist(&target)
                .map_err(|e| BackendError::io_error(&target, e.error))?;
            Ok(())
        })
        .await
        .map_err(|e| BackendError::io_error(&self.path, std::io::Error::other(e)))?
    }
}

#[async_trait]
impl StorageBackend for JsonFileBackend {
    async fn get(&self, key: &str) -> BackendResult<StorageEntry> {
        let mut area = self.load().await?;
        let mut wrapper = StorageEntry::new();
        if let Some(value) = area.remove(key) {
            wrapper.insert(key.to_string(), value);
        }
        Ok(wrapper)
    }

    async fn set(&self, entry: StorageEntry) -> BackendResult<()> {
        let _guard = self.write_lock.lock().await;
        let mut area = self.load().await?;
        for (key, value) in entry {
            area.insert(key, value);
        }
        self.store(&area).await
    }

    fn name(&self) -> &'static str {
        "json-file"
    }
}
