//! Mirroring engine for MirrorKV
//!
//! This crate orchestrates the lower layers:
//! - Registry: explicit store registry with provisioning, orphan sweep,
//!   synchronous flush and shutdown
//! - Store: a named map of entries whose every mutation arms a debounced
//!   persist to the durable backend
//! - Snapshot codec: the JSON record format and its namespaced keys
//! - Flush thread: one background thread per registry that fires persists
//!   once a store's debounce window goes quiet
//!
//! The engine is the only component that knows about:
//! - Debounce scheduling and collapse
//! - The record key namespace
//! - Store lifecycle (provision, clear, destroy, sweep)

#![warn(missing_docs)]
#![warn(clippy::all)]

pub mod config;
pub mod registry;
pub mod snapshot;
pub mod store;

mod flusher;

pub use config::{ProvisionOptions, RegistryConfig, DEFAULT_DEBOUNCE, DEFAULT_STORE_NAME};
pub use registry::Registry;
pub use snapshot::{record_key, store_name, RECORD_MARKER};
pub use store::Store;
