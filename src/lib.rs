//! MirrorKV - embedded key/value mirroring layer
//!
//! MirrorKV exposes named "stores" whose entries are transparently
//! persisted to a durable backend on every mutation and reloaded
//! automatically on provisioning. Writes are debounced: a burst of
//! mutations inside one quiet window collapses into a single durable
//! write of the last-observed state.
//!
//! # Quick Start
//!
//! ```ignore
//! use std::sync::Arc;
//! use mirrorkv::{FileBackend, ProvisionOptions, Registry};
//!
//! // Open a registry over a file-backed durable store
//! let backend = Arc::new(FileBackend::open("mirror.json")?);
//! let registry = Registry::new(backend);
//!
//! // Provision a store; prior state (if any) is loaded automatically
//! let session = registry.get_or_create("session", ProvisionOptions::default())?;
//! session.set("visits", 42i64);
//!
//! // Flush the last debounce window before exit
//! registry.shutdown()?;
//! ```
//!
//! # Architecture
//!
//! The [`Registry`] owns the store map and one background flush thread;
//! each [`Store`] is an ordered map of [`Value`] entries whose every
//! mutation arms a debounced persist. Durable backends implement
//! [`StorageBackend`]; [`MemoryBackend`] and [`FileBackend`] ship in-tree.

pub use mirrorkv_core::{Error, Result, Value};
pub use mirrorkv_engine::{
    record_key, store_name, ProvisionOptions, Registry, RegistryConfig, Store, DEFAULT_DEBOUNCE,
    DEFAULT_STORE_NAME, RECORD_MARKER,
};
pub use mirrorkv_storage::{FileBackend, MemoryBackend, StorageBackend};
