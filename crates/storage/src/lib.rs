//! Durable backends for MirrorKV
//!
//! This crate handles everything that touches the durable key/value
//! facility the mirroring layer persists into:
//!
//! - StorageBackend: the backend abstraction (get/set/remove/keys)
//! - MemoryBackend: in-process backend for tests and ephemeral use
//! - FileBackend: single-file JSON backend with atomic replace

#![warn(missing_docs)]
#![warn(clippy::all)]

pub mod backend;
pub mod file;
pub mod memory;

pub use backend::StorageBackend;
pub use file::FileBackend;
pub use memory::MemoryBackend;
