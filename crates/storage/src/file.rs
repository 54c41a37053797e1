//! Single-file JSON storage backend
//!
//! Records live in one JSON object file (`record key -> record text`). The
//! whole map is cached in memory and rewritten on every mutation via a
//! temp-file-then-rename replace, so a crash mid-write leaves either the
//! old file or the new one, never a torn record.
//!
//! # Use Cases
//!
//! - Mirrors that must survive process restarts
//! - Hosts without any platform key/value facility of their own
//!
//! Throughput is not the point here; a mirror holds a handful of small
//! stores and the engine already debounces writes before they reach us.

use crate::backend::StorageBackend;
use mirrorkv_core::Result;
use parking_lot::Mutex;
use std::collections::HashMap;
use std::fs;
use std::path::{Path, PathBuf};
use tracing::{debug, warn};

/// File-backed durable backend
///
/// # Thread Safety
///
/// A single mutex guards both the cache and the file; every mutation
/// rewrites the file before the lock is released, so the cache and the
/// file never diverge while the backend is alive.
#[derive(Debug)]
pub struct FileBackend {
    path: PathBuf,
    records: Mutex<HashMap<String, String>>,
}

impl FileBackend {
    /// Open (or create) a file backend at `path`
    ///
    /// A missing file starts empty. A malformed file is treated as empty
    /// with a warning; the first mutation replaces it.
    ///
    /// # Errors
    ///
    /// Returns an error if an existing file cannot be read.
    pub fn open(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref().to_path_buf();
        let records = if path.exists() {
            let text = fs::read_to_string(&path)?;
            match serde_json::from_str::<HashMap<String, String>>(&text) {
                Ok(map) => {
                    debug!(path = %path.display(), records = map.len(), "opened file backend");
                    map
                }
                Err(e) => {
                    warn!(path = %path.display(), error = %e, "malformed backend file, starting empty");
                    HashMap::new()
                }
            }
        } else {
            HashMap::new()
        };

        Ok(Self {
            path,
            records: Mutex::new(records),
        })
    }

    /// Path of the underlying file
    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Rewrite the file from `records` via temp file + rename
    fn replace_file(&self, records: &HashMap<String, String>) -> Result<()> {
        let tmp = self.path.with_extension("tmp");
        let text = serde_json::to_string(records)?;
        fs::write(&tmp, text)?;
        fs::rename(&tmp, &self.path)?;
        Ok(())
    }
}

impl StorageBackend for FileBackend {
    fn get(&self, key: &str) -> Result<Option<String>> {
        Ok(self.records.lock().get(key).cloned())
    }

    fn set(&self, key: &str, value: &str) -> Result<()> {
        let mut records = self.records.lock();
        records.insert(key.to_string(), value.to_string());
        self.replace_file(&records)
    }

    fn remove(&self, key: &str) -> Result<()> {
        let mut records = self.records.lock();
        if records.remove(key).is_some() {
            self.replace_file(&records)?;
        }
        Ok(())
    }

    fn keys(&self) -> Result<Vec<String>> {
        Ok(self.records.lock().keys().cloned().collect())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    fn backend_in(dir: &TempDir) -> FileBackend {
        FileBackend::open(dir.path().join("records.json")).unwrap()
    }

    #[test]
    fn test_file_starts_empty() {
        let dir = TempDir::new().unwrap();
        let backend = backend_in(&dir);
        assert_eq!(backend.get("k").unwrap(), None);
        assert!(backend.keys().unwrap().is_empty());
    }

    #[test]
    fn test_file_set_get_remove() {
        let dir = TempDir::new().unwrap();
        let backend = backend_in(&dir);

        backend.set("k", "v").unwrap();
        assert_eq!(backend.get("k").unwrap(), Some("v".to_string()));

        backend.remove("k").unwrap();
        assert_eq!(backend.get("k").unwrap(), None);
    }

    #[test]
    fn test_file_survives_reopen() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("records.json");

        {
            let backend = FileBackend::open(&path).unwrap();
            backend.set("a", "1").unwrap();
            backend.set("b", "2").unwrap();
            backend.remove("b").unwrap();
        }

        let reopened = FileBackend::open(&path).unwrap();
        assert_eq!(reopened.get("a").unwrap(), Some("1".to_string()));
        assert_eq!(reopened.get("b").unwrap(), None);
        assert_eq!(reopened.keys().unwrap(), vec!["a".to_string()]);
    }

    #[test]
    fn test_file_malformed_starts_empty() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("records.json");
        fs::write(&path, "{definitely not json").unwrap();

        let backend = FileBackend::open(&path).unwrap();
        assert!(backend.keys().unwrap().is_empty());

        // First write replaces the bad file
        backend.set("k", "v").unwrap();
        let reopened = FileBackend::open(&path).unwrap();
        assert_eq!(reopened.get("k").unwrap(), Some("v".to_string()));
    }

    #[test]
    fn test_file_no_tmp_left_behind() {
        let dir = TempDir::new().unwrap();
        let backend = backend_in(&dir);
        backend.set("k", "v").unwrap();
        assert!(!dir.path().join("records.tmp").exists());
    }
}
