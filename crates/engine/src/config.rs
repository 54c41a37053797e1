//! Registry configuration and provisioning options

use std::time::Duration;

/// Store name used when a caller provisions with an empty name
pub const DEFAULT_STORE_NAME: &str = "Default";

/// Default quiet window before a dirty store is persisted
pub const DEFAULT_DEBOUNCE: Duration = Duration::from_millis(50);

/// Configuration for a [`Registry`](crate::Registry)
///
/// # Example
///
/// ```ignore
/// use std::time::Duration;
/// use mirrorkv_engine::{Registry, RegistryConfig};
///
/// let config = RegistryConfig {
///     debounce: Duration::from_millis(200),
/// };
/// let registry = Registry::with_config(backend, config);
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RegistryConfig {
    /// Quiet window a store must go without writes before it is persisted.
    /// Every write restarts the window; bursts collapse into one durable
    /// write of the last-observed state.
    pub debounce: Duration,
}

impl Default for RegistryConfig {
    fn default() -> Self {
        Self {
            debounce: DEFAULT_DEBOUNCE,
        }
    }
}

/// Options bag for [`Registry::get_or_create`](crate::Registry::get_or_create)
///
/// Only consulted the first time a given name is provisioned in a
/// registry's lifetime; later calls for the same name return the live
/// instance and ignore the options.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct ProvisionOptions {
    /// Discard any existing durable record for this name instead of
    /// loading it; the store starts empty.
    pub fresh_start: bool,
}

impl ProvisionOptions {
    /// Options requesting a fresh start
    pub fn fresh_start() -> Self {
        Self { fresh_start: true }
    }
}
