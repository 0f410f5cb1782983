//! Per-namespace write gate
//!
//! Engines are last-write-wins by default: two concurrent `set` calls on
//! one namespace each read, merge and write back, and one of the updates
//! can be lost. Engines configured with the same [`WriteGate`] instead hold
//! the namespace's lane for the whole read → write sequence.
//!
//! The gate only orders callers that share it. Other processes, or engines
//! built without it, still race.

use dashmap::DashMap;
use std::sync::Arc;
use tokio::sync::{Mutex, OwnedMutexGuard};

/// Shared registry of per-namespace async mutexes
#[derive(Debug, Clone, Default)]
pub struct WriteGate {
    lanes: Arc<DashMap<String, Arc<Mutex<()>>>>,
}

impl WriteGate {
    /// Create empty gate
    #[inline]
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Wait for exclusive use of `namespace`
    pub async fn acquire(&self, namespace: &str) -> OwnedMutexGuard<()> {
        let lane = self.lanes.entry(namespace.to_string()).or_default().clone();
        lane.lock_owned().await
    }

    /// Number of namespaces seen so far
    #[inline]
    #[must_use]
    pub fn lane_count(&self) -> usize {
        self.lanes.len()
    }
}
