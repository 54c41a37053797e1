//! Store registry
//!
//! An explicit registry object with a defined lifecycle: created over a
//! durable backend, it provisions stores (at most one live instance per
//! name), runs one background flush thread for their debounced persists,
//! and is torn down by [`shutdown`](Registry::shutdown), which stops the
//! thread and flushes every live store synchronously.
//!
//! There is no process-wide global; hosts create a registry at startup,
//! hand it (or clones of its stores) to whoever needs store access, and
//! call `shutdown()` before exit so the last debounce window is not lost.

use crate::config::{ProvisionOptions, RegistryConfig, DEFAULT_STORE_NAME};
use crate::flusher::FlushThread;
use crate::snapshot;
use crate::store::Store;
use mirrorkv_core::{Error, Result};
use mirrorkv_storage::StorageBackend;
use parking_lot::{Condvar, Mutex};
use std::collections::HashMap;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::{Duration, Instant};
use tracing::{debug, warn};

/// State shared between the registry handle and its flush thread
pub(crate) struct RegistryInner {
    backend: Arc<dyn StorageBackend>,
    config: RegistryConfig,
    stores: Mutex<HashMap<String, Arc<Store>>>,
    signal: Mutex<bool>,
    signal_cvar: Condvar,
    shutdown_flag: AtomicBool,
}

impl RegistryInner {
    /// Wake the flush thread (new deadline armed or shutdown requested)
    pub(crate) fn signal_flush(&self) {
        let mut signaled = self.signal.lock();
        *signaled = true;
        self.signal_cvar.notify_one();
    }

    /// Block until signaled or `timeout` elapses; consumes the signal
    pub(crate) fn wait_for_signal(&self, timeout: Duration) {
        let mut signaled = self.signal.lock();
        if !*signaled {
            let _ = self.signal_cvar.wait_for(&mut signaled, timeout);
        }
        *signaled = false;
    }

    pub(crate) fn is_shutting_down(&self) -> bool {
        self.shutdown_flag.load(Ordering::SeqCst)
    }

    /// Remove a store from the live map (used by `Store::destroy`)
    pub(crate) fn deregister(&self, name: &str) {
        self.stores.lock().remove(name);
    }

    fn live_stores(&self) -> Vec<Arc<Store>> {
        self.stores.lock().values().cloned().collect()
    }

    /// Persist every store whose debounce deadline has passed
    ///
    /// Backend failures are logged and dropped here; the flush thread has
    /// no caller to report to, and persistence is best-effort by contract.
    pub(crate) fn persist_due(&self, now: Instant) {
        let due: Vec<Arc<Store>> = self
            .stores
            .lock()
            .values()
            .filter(|s| s.pending_deadline().is_some_and(|d| d <= now))
            .cloned()
            .collect();

        for store in due {
            if let Err(e) = store.persist() {
                warn!(store = %store.name(), error = %e, "debounced persist failed");
            }
        }
    }

    /// How long the flush thread should sleep before the next due persist
    ///
    /// The earliest outstanding deadline wins; with nothing pending the
    /// thread wakes once per debounce interval (a new write signals it
    /// sooner anyway).
    pub(crate) fn next_wait(&self, now: Instant) -> Duration {
        self.stores
            .lock()
            .values()
            .filter_map(|s| s.pending_deadline())
            .min()
            .map(|deadline| deadline.saturating_duration_since(now))
            .unwrap_or(self.config.debounce)
    }
}

/// Registry of mirrored stores over one durable backend
///
/// # Singleton-per-name
///
/// Two `get_or_create` calls for the same name return the same
/// `Arc<Store>` for as long as the instance is live; only
/// [`Store::destroy`] frees the name.
///
/// # Teardown
///
/// `shutdown()` stops the flush thread and synchronously persists every
/// live store, replacing the page-unload hook a browser host would have.
/// Dropping the registry without `shutdown()` stops the thread but skips
/// the final flush (Drop cannot report errors); un-fired debounce windows
/// are lost in that case.
///
/// # Example
///
/// ```ignore
/// use std::sync::Arc;
/// use mirrorkv_engine::{ProvisionOptions, Registry};
/// use mirrorkv_storage::FileBackend;
///
/// let backend = Arc::new(FileBackend::open("mirror.json")?);
/// let registry = Registry::new(backend);
/// let store = registry.get_or_create("session", ProvisionOptions::default())?;
/// store.set("visits", 1i64);
/// registry.shutdown()?;
/// ```
pub struct Registry {
    inner: Arc<RegistryInner>,
    flusher: FlushThread,
}

impl Registry {
    /// Create a registry with the default configuration (50 ms debounce)
    pub fn new(backend: Arc<dyn StorageBackend>) -> Self {
        Self::with_config(backend, RegistryConfig::default())
    }

    /// Create a registry with an explicit configuration
    pub fn with_config(backend: Arc<dyn StorageBackend>, config: RegistryConfig) -> Self {
        let inner = Arc::new(RegistryInner {
            backend,
            config,
            stores: Mutex::new(HashMap::new()),
            signal: Mutex::new(false),
            signal_cvar: Condvar::new(),
            shutdown_flag: AtomicBool::new(false),
        });
        let flusher = FlushThread::start(Arc::clone(&inner));
        Self { inner, flusher }
    }

    /// Provision a store, loading its durable record unless told not to
    ///
    /// An empty `name` maps to [`DEFAULT_STORE_NAME`]. If an instance for
    /// the name is already live, it is returned unchanged and `options`
    /// are ignored. Otherwise a new store is constructed; with
    /// `fresh_start` its durable record is discarded unloaded, else the
    /// record (if present and well-formed) is replayed onto the store.
    /// An initial debounced persist is scheduled either way.
    ///
    /// # Errors
    ///
    /// Returns `Error::ShutDown` after [`shutdown`](Registry::shutdown),
    /// or a backend error if the durable record cannot be read/removed.
    pub fn get_or_create(&self, name: &str, options: ProvisionOptions) -> Result<Arc<Store>> {
        if self.inner.is_shutting_down() {
            return Err(Error::ShutDown);
        }
        let name = if name.is_empty() {
            DEFAULT_STORE_NAME
        } else {
            name
        };

        let mut stores = self.inner.stores.lock();
        if let Some(existing) = stores.get(name) {
            return Ok(Arc::clone(existing));
        }

        let store = Arc::new(Store::new(
            name,
            self.inner.config.debounce,
            Arc::clone(&self.inner.backend),
            Arc::downgrade(&self.inner),
        ));

        let key = snapshot::record_key(name);
        if options.fresh_start {
            self.inner.backend.remove(&key)?;
            debug!(store = name, "provisioned fresh, prior record discarded");
        } else if let Some(text) = self.inner.backend.get(&key)? {
            match snapshot::decode(&text) {
                Some(entries) => {
                    debug!(store = name, entries = entries.len(), "replayed durable record");
                    store.replay(entries);
                }
                None => debug!(store = name, "malformed durable record ignored"),
            }
        }

        stores.insert(name.to_string(), Arc::clone(&store));
        drop(stores);

        // Initial persist rides the normal debounce path
        store.save();
        Ok(store)
    }

    /// Remove durable records whose store is not live in this registry
    ///
    /// Only keys bearing the record marker are considered; unrelated keys
    /// in a shared backend are never touched. Returns how many records
    /// were swept.
    ///
    /// # Errors
    ///
    /// Returns an error if backend enumeration or removal fails.
    pub fn sweep_orphans(&self) -> Result<usize> {
        let keys = self.inner.backend.keys()?;
        let stores = self.inner.stores.lock();
        let mut swept = 0;
        for key in keys {
            if let Some(name) = snapshot::store_name(&key) {
                if !stores.contains_key(name) {
                    self.inner.backend.remove(&key)?;
                    swept += 1;
                }
            }
        }
        if swept > 0 {
            debug!(swept, "swept orphaned records");
        }
        Ok(swept)
    }

    /// Synchronously persist every live store, bypassing the debounce
    ///
    /// Runs queued completion callbacks. All stores are attempted even if
    /// one fails; the first backend error is returned.
    ///
    /// # Errors
    ///
    /// Returns the first backend write error encountered.
    pub fn flush_all(&self) -> Result<()> {
        let mut result = Ok(());
        for store in self.inner.live_stores() {
            if let Err(e) = store.persist() {
                warn!(store = %store.name(), error = %e, "flush failed");
                if result.is_ok() {
                    result = Err(e);
                }
            }
        }
        result
    }

    /// Stop the flush thread and persist everything
    ///
    /// The host environment is responsible for calling this before
    /// process exit; it replaces the browser's unload hook. Idempotent:
    /// later calls just flush again.
    ///
    /// # Errors
    ///
    /// Returns the first backend write error from the final flush.
    pub fn shutdown(&self) -> Result<()> {
        self.inner.shutdown_flag.store(true, Ordering::SeqCst);
        self.inner.signal_flush();
        self.flusher.join();
        self.flush_all()
    }

    /// Check if an instance for `name` is currently live
    pub fn contains(&self, name: &str) -> bool {
        self.inner.stores.lock().contains_key(name)
    }

    /// Number of live stores
    pub fn len(&self) -> usize {
        self.inner.stores.lock().len()
    }

    /// Check if no stores are live
    pub fn is_empty(&self) -> bool {
        self.inner.stores.lock().is_empty()
    }

    /// Configured debounce window
    pub fn debounce(&self) -> Duration {
        self.inner.config.debounce
    }
}

impl Drop for Registry {
    fn drop(&mut self) {
        // Stop the thread; skip the final flush (Drop cannot return
        // errors, shutdown() is the guaranteed-flush path).
        self.inner.shutdown_flag.store(true, Ordering::SeqCst);
        self.inner.signal_flush();
        self.flusher.join();
    }
}

impl std::fmt::Debug for Registry {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Registry")
            .field("stores", &self.len())
            .field("debounce", &self.inner.config.debounce)
            .field("shutdown", &self.inner.is_shutting_down())
            .finish()
    }
}
