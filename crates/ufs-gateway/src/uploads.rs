//! Active upload tracking
//!
//! Uploads append to a temp file keyed by file id, so two requests for the
//! same id must not write at the same time. Each id gets a lock for as long as
//! some request holds or waits for it.

use dashmap::DashMap;
use std::sync::Arc;
use tokio::sync::{Mutex, OwnedMutexGuard};

/// Per-file-id upload locks
#[derive(Clone, Default)]
pub struct UploadTracker {
    locks: Arc<DashMap<String, Arc<Mutex<()>>>>,
}

impl UploadTracker {
    /// Create a new tracker
    pub fn new() -> Self {
        Self::default()
    }

    /// Wait until no other upload for `file_id` is in flight
    pub async fn acquire(&self, file_id: &str) -> UploadPermit {
        let lock = self.locks.entry(file_id.to_string()).or_default().clone();
        let guard = lock.lock_owned().await;
        UploadPermit {
            guard: Some(guard),
            file_id: file_id.to_string(),
            locks: Arc::clone(&self.locks),
        }
    }

    /// Number of file ids with uploads in flight or queued
    pub fn active_count(&self) -> usize {
        self.locks.len()
    }
}

/// Exclusive right to append to one file id's temp file
pub struct UploadPermit {
    guard: Option<OwnedMutexGuard<()>>,
    file_id: String,
    locks: Arc<DashMap<String, Arc<Mutex<()>>>>,
}

impl Drop for UploadPermit {
    fn drop(&mut self) {
        drop(self.guard.take());
        // Only the map still references the lock: nobody holds or waits
        self.locks
            .remove_if(&self.file_id, |_, lock| Arc::strong_count(lock) == 1);
    }
}
