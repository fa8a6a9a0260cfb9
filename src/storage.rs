//! Persistent slot storage.
//!
//! A [`Storage`] holds named slots, each containing one serialized document.
//! Cache buckets and the session record live in separate slots of the same
//! store. Implementations are internally synchronized per operation only;
//! there is no cross-operation transaction (last writer wins per slot).

use std::collections::HashMap;
use std::fs;
use std::io::ErrorKind;
use std::path::PathBuf;
use std::sync::{Arc, RwLock};

use tracing::warn;

/// Named-slot string storage.
///
/// Reads never fail: an unreadable slot is reported as absent. Writes that
/// fail are logged and dropped; callers still proceed with the in-memory
/// value they were about to persist.
pub trait Storage: Send + Sync {
    /// Read a slot's contents, if present.
    fn read(&self, slot: &str) -> Option<String>;

    /// Replace a slot's contents wholesale.
    fn write(&self, slot: &str, contents: &str);

    /// Delete a slot, returning the contents that were present.
    fn remove(&self, slot: &str) -> Option<String>;
}

/// In-memory storage backed by a shared map.
///
/// Clones share the same underlying slots, so a client and its endpoints all
/// observe each other's writes. This is the default backend and the one to
/// use in tests.
#[derive(Debug, Clone, Default)]
pub struct MemoryStorage {
    inner: Arc<RwLock<HashMap<String, String>>>,
}

impl MemoryStorage {
    /// Create an empty store.
    pub fn new() -> Self {
        Self::default()
    }
}

impl Storage for MemoryStorage {
    fn read(&self, slot: &str) -> Option<String> {
        self.inner.read().unwrap().get(slot).cloned()
    }

    fn write(&self, slot: &str, contents: &str) {
        self.inner
            .write()
            .unwrap()
            .insert(slot.to_string(), contents.to_string());
    }

    fn remove(&self, slot: &str) -> Option<String> {
        self.inner.write().unwrap().remove(slot)
    }
}

/// File-backed storage: one file per slot under a base directory.
#[derive(Debug, Clone)]
pub struct FileStorage {
    dir: PathBuf,
}

impl FileStorage {
    /// Create a store rooted at `dir`, creating the directory if needed.
    pub fn new(dir: impl Into<PathBuf>) -> std::io::Result<Self> {
        let dir = dir.into();
        fs::create_dir_all(&dir)?;
        Ok(Self { dir })
    }

    fn slot_path(&self, slot: &str) -> PathBuf {
        // Slot names may contain dots and separators; keep file names tame.
        let safe: String = slot
            .chars()
            .map(|c| {
                if c.is_ascii_alphanumeric() || c == '.' || c == '-' || c == '_' {
                    c
                } else {
                    '_'
                }
            })
            .collect();
        self.dir.join(format!("{safe}.json"))
    }
}

impl Storage for FileStorage {
    fn read(&self, slot: &str) -> Option<String> {
        let path = self.slot_path(slot);
        match fs::read_to_string(&path) {
            Ok(contents) => Some(contents),
            Err(err) => {
                if err.kind() != ErrorKind::NotFound {
                    warn!(slot, error = %err, "failed to read storage slot");
                }
                None
            }
        }
    }

    fn write(&self, slot: &str, contents: &str) {
        let path = self.slot_path(slot);
        if let Err(err) = fs::write(&path, contents) {
            warn!(slot, error = %err, "failed to write storage slot");
        }
    }

    fn remove(&self, slot: &str) -> Option<String> {
        let path = self.slot_path(slot);
        let previous = self.read(slot);
        if let Err(err) = fs::remove_file(&path) {
            if err.kind() != ErrorKind::NotFound {
                warn!(slot, error = %err, "failed to remove storage slot");
            }
        }
        previous
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn memory_storage_round_trip() {
        let storage = MemoryStorage::new();
        assert_eq!(storage.read("slot"), None);

        storage.write("slot", "contents");
        assert_eq!(storage.read("slot").as_deref(), Some("contents"));

        storage.write("slot", "replaced");
        assert_eq!(storage.read("slot").as_deref(), Some("replaced"));

        assert_eq!(storage.remove("slot").as_deref(), Some("replaced"));
        assert_eq!(storage.read("slot"), None);
        assert_eq!(storage.remove("slot"), None);
    }

    #[test]
    fn memory_storage_clones_share_slots() {
        let storage = MemoryStorage::new();
        let clone = storage.clone();

        storage.write("shared", "value");
        assert_eq!(clone.read("shared").as_deref(), Some("value"));
    }

    #[test]
    fn file_storage_round_trip() {
        let dir = tempfile::tempdir().unwrap();
        let storage = FileStorage::new(dir.path()).unwrap();

        assert_eq!(storage.read("accounts"), None);
        storage.write("accounts", "{}");
        assert_eq!(storage.read("accounts").as_deref(), Some("{}"));
        assert_eq!(storage.remove("accounts").as_deref(), Some("{}"));
        assert_eq!(storage.read("accounts"), None);
    }

    #[test]
    fn file_storage_sanitizes_slot_names() {
        let dir = tempfile::tempdir().unwrap();
        let storage = FileStorage::new(dir.path()).unwrap();

        storage.write("api/session:current", "data");
        assert_eq!(
            storage.read("api/session:current").as_deref(),
            Some("data")
        );
        assert!(dir.path().join("api_session_current.json").exists());
    }
}
