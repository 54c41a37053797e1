//! Background flush thread
//!
//! One thread per registry. It sleeps until the earliest debounce deadline
//! (or one debounce interval when idle), wakes on every armed write via
//! the registry's condvar, and persists whichever stores have gone quiet.
//! Shutdown is flag + signal + join; the final flush is the registry's
//! job so it can report errors.

use crate::registry::RegistryInner;
use parking_lot::Mutex;
use std::sync::Arc;
use std::thread::{self, JoinHandle};
use std::time::Instant;
use tracing::{trace, warn};

pub(crate) struct FlushThread {
    handle: Mutex<Option<JoinHandle<()>>>,
}

impl FlushThread {
    pub(crate) fn start(inner: Arc<RegistryInner>) -> Self {
        let handle = thread::Builder::new()
            .name("mirrorkv-flush".to_string())
            .spawn(move || flush_loop(inner));
        let handle = match handle {
            Ok(h) => Some(h),
            Err(e) => {
                warn!(error = %e, "flush thread failed to start; only flush_all/shutdown persist");
                None
            }
        };
        Self {
            handle: Mutex::new(handle),
        }
    }

    /// Wait for the thread to observe the shutdown flag and exit
    pub(crate) fn join(&self) {
        if let Some(handle) = self.handle.lock().take() {
            let _ = handle.join();
        }
    }
}

fn flush_loop(inner: Arc<RegistryInner>) {
    trace!("flush thread started");
    loop {
        if inner.is_shutting_down() {
            break;
        }

        let now = Instant::now();
        inner.persist_due(now);

        // A deadline armed between persist_due and here sets the signal
        // flag, so wait_for_signal returns immediately and we recompute.
        let wait = inner.next_wait(Instant::now());
        inner.wait_for_signal(wait);
    }
    trace!("flush thread stopped");
}
