//! Core types for MirrorKV
//!
//! This crate defines the foundational types used throughout the system:
//! - Value: Unified value enum for everything a store entry can hold
//! - Error: Error type hierarchy and the crate-wide Result alias

#![warn(missing_docs)]
#![warn(clippy::all)]

pub mod error;
pub mod value;

pub use error::{Error, Result};
pub use value::Value;
