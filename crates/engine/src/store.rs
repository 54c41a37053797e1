//! Mirrored store
//!
//! A Store is a named, ordered map of entries. Every mutation funnels
//! through one generic [`set`](Store::set) path that arms a debounced
//! persist, so any write becomes durable within one quiet window without
//! the caller ever asking for a save.
//!
//! ## Data vs operations
//!
//! Entries live in their own map; operations are inherent methods. The two
//! namespaces never meet, so there is no reserved-name blocklist at the API
//! surface (the snapshot codec still drops a few legacy key names found in
//! old records, see [`crate::snapshot`]).
//!
//! ## Thread Safety
//!
//! Store is `Send + Sync` and shared as `Arc<Store>` between the caller,
//! the registry and the flush thread. Lock order is pending -> data ->
//! backend and is never reversed.

use crate::registry::RegistryInner;
use crate::snapshot;
use mirrorkv_core::{Error, Result, Value};
use mirrorkv_storage::StorageBackend;
use parking_lot::Mutex;
use std::collections::BTreeMap;
use std::sync::{Arc, Weak};
use std::time::{Duration, Instant};
use tracing::{trace, warn};

/// Callback invoked once a store's state has landed in the durable backend
pub(crate) type SaveCallback = Box<dyn FnOnce() + Send>;

/// Debounce state: at most one outstanding deadline per store
#[derive(Default)]
struct Pending {
    /// When the current quiet window ends; a new write replaces it
    deadline: Option<Instant>,
    /// Callbacks to run after the next successful durable write
    callbacks: Vec<SaveCallback>,
}

/// A named collection of entries mirrored to durable storage
///
/// Obtained from [`Registry::get_or_create`](crate::Registry::get_or_create).
/// Writes return immediately; the durable write they trigger runs on the
/// registry's flush thread once the debounce window goes quiet. Multiple
/// writes inside one window collapse into a single durable write of the
/// last-observed state.
///
/// # Example
///
/// ```ignore
/// let store = registry.get_or_create("session", ProvisionOptions::default())?;
/// store.set("visits", Value::Int(1));
/// store.set("visits", Value::Int(2)); // same window: one durable write, value 2
/// ```
pub struct Store {
    name: String,
    record_key: String,
    debounce: Duration,
    backend: Arc<dyn StorageBackend>,
    data: Mutex<BTreeMap<String, Value>>,
    pending: Mutex<Pending>,
    registry: Weak<RegistryInner>,
}

impl Store {
    pub(crate) fn new(
        name: &str,
        debounce: Duration,
        backend: Arc<dyn StorageBackend>,
        registry: Weak<RegistryInner>,
    ) -> Self {
        Self {
            name: name.to_string(),
            record_key: snapshot::record_key(name),
            debounce,
            backend,
            data: Mutex::new(BTreeMap::new()),
            pending: Mutex::new(Pending::default()),
            registry,
        }
    }

    /// Name this store was provisioned under
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Namespaced key its durable record lives under
    pub fn record_key(&self) -> &str {
        &self.record_key
    }

    // ========== Entry access ==========

    /// Insert or overwrite an entry and arm the debounced persist
    ///
    /// This is the single mutation funnel; `set_item` and `remove_item`
    /// go through the same scheduling path.
    pub fn set(&self, key: impl Into<String>, value: impl Into<Value>) {
        self.data.lock().insert(key.into(), value.into());
        self.save();
    }

    /// Read an entry without side effects
    pub fn get(&self, key: &str) -> Option<Value> {
        self.data.lock().get(key).cloned()
    }

    /// Insert or overwrite an entry (alias of [`set`](Store::set))
    ///
    /// Existence plays no role here: overwriting an entry whose current
    /// value is `Null`, `false` or `0` behaves exactly like overwriting
    /// any other entry.
    pub fn set_item(&self, key: impl Into<String>, value: impl Into<Value>) {
        self.set(key, value);
    }

    /// Like [`set_item`](Store::set_item), with a completion callback
    ///
    /// The callback runs once the write actually lands in the durable
    /// backend, after the debounce window fires. If that persist attempt
    /// is abandoned (serialization failure), the callback is dropped with
    /// it; there is no retry.
    pub fn set_item_with(
        &self,
        key: impl Into<String>,
        value: impl Into<Value>,
        callback: impl FnOnce() + Send + 'static,
    ) {
        self.data.lock().insert(key.into(), value.into());
        self.save_with(callback);
    }

    /// Materializing read: a missing key is created as `Null`
    ///
    /// Reading a key that was never set inserts it with a `Null` value and
    /// returns `Null`; the entry rides along with the next persist. This
    /// side effect on read is an intentional part of the contract: every
    /// key a caller has touched exists afterwards.
    pub fn get_item(&self, key: &str) -> Value {
        self.data
            .lock()
            .entry(key.to_string())
            .or_insert(Value::Null)
            .clone()
    }

    /// Delete an entry and arm the debounced persist
    ///
    /// Returns the removed value, `None` if the key was absent. The
    /// persist is scheduled either way.
    pub fn remove_item(&self, key: &str) -> Option<Value> {
        let removed = self.data.lock().remove(key);
        self.save();
        removed
    }

    /// Number of entries
    pub fn len(&self) -> usize {
        self.data.lock().len()
    }

    /// Check if the store has no entries
    pub fn is_empty(&self) -> bool {
        self.data.lock().is_empty()
    }

    /// Check if an entry exists (regardless of its value)
    pub fn contains_key(&self, key: &str) -> bool {
        self.data.lock().contains_key(key)
    }

    /// Entry keys in order
    pub fn keys(&self) -> Vec<String> {
        self.data.lock().keys().cloned().collect()
    }

    /// Point-in-time copy of all entries
    pub fn entries(&self) -> BTreeMap<String, Value> {
        self.data.lock().clone()
    }

    // ========== Lifecycle ==========

    /// Arm (or re-arm) the debounced persist for this store
    ///
    /// Cancels any outstanding deadline and starts a new quiet window.
    /// Called automatically by every mutation; calling it by hand only
    /// postpones the next durable write.
    pub fn save(&self) {
        self.arm(None);
    }

    /// Like [`save`](Store::save), with a completion callback
    pub fn save_with(&self, callback: impl FnOnce() + Send + 'static) {
        self.arm(Some(Box::new(callback)));
    }

    /// Wipe all entries and the durable record; the store stays registered
    ///
    /// The pending persist is cancelled (its callbacks dropped) so the
    /// record just removed is not immediately re-created as an empty
    /// object. The name remains retrievable and future writes persist
    /// normally.
    ///
    /// # Errors
    ///
    /// Returns an error if the backend removal fails.
    pub fn clear(&self) -> Result<()> {
        self.cancel_pending();
        self.data.lock().clear();
        self.backend.remove(&self.record_key)
    }

    /// Tear the store down: wipe entries, deregister, remove the record
    ///
    /// After destroy the name is free; provisioning it again yields a new,
    /// empty instance. The durable record is removed under the namespaced
    /// key.
    ///
    /// # Errors
    ///
    /// Returns `Error::ShutDown` if the owning registry is gone, or the
    /// backend error if record removal fails.
    pub fn destroy(&self) -> Result<()> {
        let registry = self.registry.upgrade().ok_or(Error::ShutDown)?;
        self.cancel_pending();
        self.data.lock().clear();
        registry.deregister(&self.name);
        self.backend.remove(&self.record_key)
    }

    // ========== Persistence internals ==========

    fn arm(&self, callback: Option<SaveCallback>) {
        {
            let mut pending = self.pending.lock();
            pending.deadline = Some(Instant::now() + self.debounce);
            if let Some(cb) = callback {
                pending.callbacks.push(cb);
            }
        }
        trace!(store = %self.name, "armed debounce window");
        if let Some(registry) = self.registry.upgrade() {
            registry.signal_flush();
        }
    }

    fn cancel_pending(&self) {
        let mut pending = self.pending.lock();
        pending.deadline = None;
        pending.callbacks.clear();
    }

    /// Deadline of the outstanding persist, if any
    pub(crate) fn pending_deadline(&self) -> Option<Instant> {
        self.pending.lock().deadline
    }

    /// Serialize current state and write it to the durable backend
    ///
    /// Clears the pending deadline and runs queued callbacks after the
    /// write. A serialization failure is recovered locally: logged as a
    /// warning naming the store, the attempt abandoned, callbacks dropped,
    /// `Ok(())` returned. Backend I/O errors propagate.
    pub(crate) fn persist(&self) -> Result<()> {
        let callbacks = {
            let mut pending = self.pending.lock();
            pending.deadline = None;
            std::mem::take(&mut pending.callbacks)
        };

        let encoded = {
            let data = self.data.lock();
            snapshot::encode(&data)
        };

        let text = match encoded {
            Ok(text) => text,
            Err(e) => {
                warn!(store = %self.name, error = %e, "cannot mirror store, write abandoned");
                return Ok(());
            }
        };

        self.backend.set(&self.record_key, &text)?;
        trace!(store = %self.name, bytes = text.len(), "mirrored store");

        for callback in callbacks {
            callback();
        }
        Ok(())
    }

    /// Replay loaded entries onto a freshly provisioned store
    ///
    /// Used only during provisioning, before the store is visible to any
    /// caller; does not arm a persist by itself.
    pub(crate) fn replay(&self, entries: BTreeMap<String, Value>) {
        let mut data = self.data.lock();
        debug_assert!(data.is_empty());
        *data = entries;
    }
}

impl std::fmt::Debug for Store {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Store")
            .field("name", &self.name)
            .field("entries", &self.data.lock().len())
            .field("pending", &self.pending.lock().deadline.is_some())
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use mirrorkv_storage::MemoryBackend;

    // A store detached from any registry: arm() finds no flush thread to
    // signal, so tests drive persist() by hand.
    fn detached_store(backend: Arc<MemoryBackend>) -> Store {
        Store::new(
            "test",
            Duration::from_millis(50),
            backend,
            Weak::<RegistryInner>::new(),
        )
    }

    #[test]
    fn test_set_and_get() {
        let store = detached_store(Arc::new(MemoryBackend::new()));
        store.set("a", 1i64);
        assert_eq!(store.get("a"), Some(Value::Int(1)));
        assert_eq!(store.get("missing"), None);
    }

    #[test]
    fn test_set_arms_deadline() {
        let store = detached_store(Arc::new(MemoryBackend::new()));
        assert!(store.pending_deadline().is_none());
        store.set("a", 1i64);
        assert!(store.pending_deadline().is_some());
    }

    #[test]
    fn test_rewrite_replaces_deadline() {
        let store = detached_store(Arc::new(MemoryBackend::new()));
        store.set("a", 1i64);
        let first = store.pending_deadline().unwrap();
        std::thread::sleep(Duration::from_millis(5));
        store.set("a", 2i64);
        let second = store.pending_deadline().unwrap();
        assert!(second > first);
    }

    #[test]
    fn test_set_item_overwrites_falsy_values() {
        let store = detached_store(Arc::new(MemoryBackend::new()));
        store.set_item("flag", false);
        store.set_item("flag", true);
        assert_eq!(store.get("flag"), Some(Value::Bool(true)));

        store.set_item("count", 0i64);
        store.set_item("count", 7i64);
        assert_eq!(store.get("count"), Some(Value::Int(7)));
    }

    #[test]
    fn test_get_item_materializes_missing_key() {
        let store = detached_store(Arc::new(MemoryBackend::new()));
        assert!(!store.contains_key("neverSet"));

        assert_eq!(store.get_item("neverSet"), Value::Null);
        assert!(store.contains_key("neverSet"));

        // Stable on subsequent reads, both materializing and plain
        assert_eq!(store.get_item("neverSet"), Value::Null);
        assert_eq!(store.get("neverSet"), Some(Value::Null));
    }

    #[test]
    fn test_get_item_does_not_arm_deadline() {
        let store = detached_store(Arc::new(MemoryBackend::new()));
        store.get_item("neverSet");
        assert!(store.pending_deadline().is_none());
    }

    #[test]
    fn test_remove_item_returns_removed_value() {
        let store = detached_store(Arc::new(MemoryBackend::new()));
        store.set("a", "x");
        assert_eq!(store.remove_item("a"), Some(Value::String("x".into())));
        assert_eq!(store.remove_item("a"), None);
        assert!(store.pending_deadline().is_some());
    }

    #[test]
    fn test_persist_writes_record_and_clears_deadline() {
        let backend = Arc::new(MemoryBackend::new());
        let store = detached_store(backend.clone());
        store.set("a", 1i64);

        store.persist().unwrap();
        assert!(store.pending_deadline().is_none());
        assert_eq!(
            backend.get("_MC_test").unwrap(),
            Some(r#"{"a":1}"#.to_string())
        );
    }

    #[test]
    fn test_persist_runs_callbacks_after_write() {
        use std::sync::atomic::{AtomicBool, Ordering};

        let backend = Arc::new(MemoryBackend::new());
        let store = detached_store(backend.clone());
        let fired = Arc::new(AtomicBool::new(false));

        let flag = fired.clone();
        store.set_item_with("a", 1i64, move || {
            flag.store(true, Ordering::SeqCst);
        });
        assert!(!fired.load(Ordering::SeqCst));

        store.persist().unwrap();
        assert!(fired.load(Ordering::SeqCst));

        // Callbacks are one-shot
        store.set("a", 2i64);
        store.persist().unwrap();
        assert!(fired.load(Ordering::SeqCst));
    }

    #[test]
    fn test_persist_abandons_on_serialization_failure() {
        use std::sync::atomic::{AtomicBool, Ordering};

        let backend = Arc::new(MemoryBackend::new());
        let store = detached_store(backend.clone());
        let fired = Arc::new(AtomicBool::new(false));

        let flag = fired.clone();
        store.set_item_with("bad", f64::NAN, move || {
            flag.store(true, Ordering::SeqCst);
        });

        // Abandoned: no backend write, no callback, no error to the caller
        store.persist().unwrap();
        assert_eq!(backend.write_count(), 0);
        assert!(!fired.load(Ordering::SeqCst));

        // Store stays usable; a later valid state persists
        store.set("bad", 1.5f64);
        store.persist().unwrap();
        assert_eq!(backend.write_count(), 1);
        assert_eq!(
            backend.get("_MC_test").unwrap(),
            Some(r#"{"bad":1.5}"#.to_string())
        );
    }

    #[test]
    fn test_clear_wipes_entries_and_record() {
        let backend = Arc::new(MemoryBackend::new());
        let store = detached_store(backend.clone());
        store.set("a", 1i64);
        store.persist().unwrap();

        store.clear().unwrap();
        assert!(store.is_empty());
        assert_eq!(backend.get("_MC_test").unwrap(), None);
        // Pending persist cancelled: the record must not reappear
        assert!(store.pending_deadline().is_none());
    }

    #[test]
    fn test_destroy_without_registry_is_shutdown_error() {
        let store = detached_store(Arc::new(MemoryBackend::new()));
        assert!(matches!(store.destroy(), Err(Error::ShutDown)));
    }

    #[test]
    fn test_replay_populates_without_arming() {
        let store = detached_store(Arc::new(MemoryBackend::new()));
        let entries = [("a".to_string(), Value::Int(1))].into_iter().collect();
        store.replay(entries);
        assert_eq!(store.get("a"), Some(Value::Int(1)));
        assert!(store.pending_deadline().is_none());
    }

    #[test]
    fn test_entries_is_point_in_time_copy() {
        let store = detached_store(Arc::new(MemoryBackend::new()));
        store.set("a", 1i64);
        let copy = store.entries();
        store.set("a", 2i64);
        assert_eq!(copy.get("a"), Some(&Value::Int(1)));
    }
}
