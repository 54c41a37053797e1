//! Error types for MirrorKV
//!
//! This module defines all error types used throughout the system.
//! We use `thiserror` for automatic `Display` and `Error` trait implementations.

use std::io;
use thiserror::Error;

/// Result type alias for MirrorKV operations
pub type Result<T> = std::result::Result<T, Error>;

/// Error types for the mirroring layer
#[derive(Debug, Error)]
pub enum Error {
    /// I/O error (file operations on the durable backend)
    #[error("I/O error: {0}")]
    Io(#[from] io::Error),

    /// Snapshot serialization/deserialization error
    #[error("serialization error: {0}")]
    Serialization(String),

    /// Durable backend error
    #[error("backend error: {0}")]
    Backend(String),

    /// Operation attempted after the registry was shut down
    #[error("registry is shut down")]
    ShutDown,
}

impl From<serde_json::Error> for Error {
    fn from(e: serde_json::Error) -> Self {
        Error::Serialization(e.to_string())
    }
}
