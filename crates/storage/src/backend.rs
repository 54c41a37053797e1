//! Storage backend abstraction
//!
//! This module defines the StorageBackend trait that enables swapping the
//! durable facility (in-memory map, single JSON file, or anything else that
//! can hold string records) without breaking the engine layer.

use mirrorkv_core::Result;

/// Durable key/value facility the mirroring layer persists into
///
/// The contract is deliberately small: string keys, string records, plus
/// enumeration of existing keys so orphaned records can be swept. Records
/// are opaque to the backend; the engine owns the snapshot format.
///
/// Thread safety: all methods must be safe to call concurrently from
/// multiple threads (requires Send + Sync). Backends are shared as
/// `Arc<dyn StorageBackend>` between a registry and its flush thread.
pub trait StorageBackend: Send + Sync {
    /// Get the record stored under `key`, or None if absent
    ///
    /// # Errors
    ///
    /// Returns an error if the backend read fails.
    fn get(&self, key: &str) -> Result<Option<String>>;

    /// Store `value` under `key`, overwriting any existing record
    ///
    /// # Errors
    ///
    /// Returns an error if the backend write fails.
    fn set(&self, key: &str, value: &str) -> Result<()>;

    /// Remove the record under `key`; removing an absent key is a no-op
    ///
    /// # Errors
    ///
    /// Returns an error if the backend write fails.
    fn remove(&self, key: &str) -> Result<()>;

    /// Enumerate every key currently holding a record
    ///
    /// The engine's orphan sweep relies on this covering ALL keys in the
    /// backend, not just keys the current process has written.
    ///
    /// # Errors
    ///
    /// Returns an error if the backend read fails.
    fn keys(&self) -> Result<Vec<String>>;
}
