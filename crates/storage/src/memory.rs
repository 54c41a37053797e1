//! In-memory storage backend
//!
//! No disk, no fsync. All records lost when the backend is dropped.
//!
//! # Use Cases
//!
//! - Unit tests (fast, no cleanup needed)
//! - Ephemeral mirrors that only need to survive registry teardown
//! - Simulating a "reload": two registries opened over one shared
//!   `Arc<MemoryBackend>` see the same durable records
//!
//! The backend counts `set` calls so tests can assert that a burst of
//! store writes collapses into a single durable write.

use crate::backend::StorageBackend;
use mirrorkv_core::Result;
use parking_lot::RwLock;
use std::collections::HashMap;
use std::sync::atomic::{AtomicUsize, Ordering};

/// In-memory backend over a RwLock'd map
///
/// # Thread Safety
///
/// Reads take the shared lock, writes the exclusive lock. The write
/// counter is a relaxed atomic; it orders nothing, it only counts.
#[derive(Debug, Default)]
pub struct MemoryBackend {
    records: RwLock<HashMap<String, String>>,
    write_count: AtomicUsize,
}

impl MemoryBackend {
    /// Create an empty in-memory backend
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of `set` calls performed against this backend
    pub fn write_count(&self) -> usize {
        self.write_count.load(Ordering::Relaxed)
    }

    /// Number of records currently held
    pub fn len(&self) -> usize {
        self.records.read().len()
    }

    /// Check if the backend holds no records
    pub fn is_empty(&self) -> bool {
        self.records.read().is_empty()
    }
}

impl StorageBackend for MemoryBackend {
    fn get(&self, key: &str) -> Result<Option<String>> {
        Ok(self.records.read().get(key).cloned())
    }

    fn set(&self, key: &str, value: &str) -> Result<()> {
        self.records
            .write()
            .insert(key.to_string(), value.to_string());
        self.write_count.fetch_add(1, Ordering::Relaxed);
        Ok(())
    }

    fn remove(&self, key: &str) -> Result<()> {
        self.records.write().remove(key);
        Ok(())
    }

    fn keys(&self) -> Result<Vec<String>> {
        Ok(self.records.read().keys().cloned().collect())
    }
}
