//! Slot-level cache bucket handling.

use std::collections::HashMap;
use std::sync::Arc;

use tracing::{debug, warn};

use crate::entry::CacheEntry;
use crate::storage::Storage;

/// One slot's deserialized contents: cache key to entry.
pub type Bucket = HashMap<String, CacheEntry>;

/// Reads and writes whole cache buckets against a [`Storage`] slot.
///
/// Every write serializes and replaces the entire bucket; `put` is a
/// read-modify-write without any cross-caller transaction, so concurrent
/// writers to one slot resolve to last-writer-wins at slot granularity.
#[derive(Clone)]
pub struct CacheStore {
    storage: Arc<dyn Storage>,
}

impl CacheStore {
    /// Create a store over the given storage backend.
    pub fn new(storage: Arc<dyn Storage>) -> Self {
        Self { storage }
    }

    /// Load a slot's bucket.
    ///
    /// An absent slot and unparsable slot contents both yield an empty
    /// bucket, and an unparsable or `null` entry inside an otherwise intact
    /// bucket reads as no entry; corrupt data is recovered from, never
    /// surfaced.
    pub fn load(&self, slot: &str) -> Bucket {
        let Some(raw) = self.storage.read(slot) else {
            return Bucket::new();
        };

        let parsed: HashMap<String, serde_json::Value> = match serde_json::from_str(&raw) {
            Ok(map) => map,
            Err(err) => {
                warn!(slot, error = %err, "discarding malformed cache bucket");
                return Bucket::new();
            }
        };

        let mut bucket = Bucket::with_capacity(parsed.len());
        for (key, value) in parsed {
            match serde_json::from_value(value) {
                Ok(entry) => {
                    bucket.insert(key, entry);
                }
                Err(err) => warn!(slot, key = %key, error = %err, "dropping malformed cache entry"),
            }
        }
        bucket
    }

    /// Serialize and write a bucket back, replacing prior slot contents.
    pub fn save(&self, slot: &str, bucket: &Bucket) {
        match serde_json::to_string(bucket) {
            Ok(raw) => self.storage.write(slot, &raw),
            Err(err) => warn!(slot, error = %err, "failed to serialize cache bucket"),
        }
    }

    /// Look up a single entry.
    pub fn get(&self, slot: &str, key: &str) -> Option<CacheEntry> {
        self.load(slot).remove(key)
    }

    /// Insert or overwrite a single entry.
    pub fn put(&self, slot: &str, key: &str, entry: CacheEntry) {
        let mut bucket = self.load(slot);
        bucket.insert(key.to_string(), entry);
        self.save(slot, &bucket);
        debug!(slot, key, "stored cache entry");
    }

    /// Remove the slot and everything in it.
    pub fn clear(&self, slot: &str) {
        self.storage.remove(slot);
        debug!(slot, "cleared cache slot");
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::storage::MemoryStorage;
    use serde_json::json;

    fn store() -> (CacheStore, Arc<MemoryStorage>) {
        let storage = Arc::new(MemoryStorage::new());
        (CacheStore::new(storage.clone()), storage)
    }

    #[test]
    fn missing_slot_loads_empty() {
        let (store, _) = store();
        assert!(store.load("nothing").is_empty());
        assert_eq!(store.get("nothing", "[1]"), None);
    }

    #[test]
    fn put_then_get_round_trips() {
        let (store, _) = store();
        let entry = CacheEntry::with_time(1_000, 15_000, json!({"id": 7}));

        store.put("accounts", "[7]", entry.clone());
        assert_eq!(store.get("accounts", "[7]"), Some(entry));
        assert_eq!(store.get("accounts", "[8]"), None);
    }

    #[test]
    fn put_preserves_other_keys() {
        let (store, _) = store();
        store.put("accounts", "[1]", CacheEntry::with_time(0, 100, json!("a")));
        store.put("accounts", "[2]", CacheEntry::with_time(0, 100, json!("b")));

        let bucket = store.load("accounts");
        assert_eq!(bucket.len(), 2);
        assert_eq!(bucket["[1]"].value, json!("a"));
        assert_eq!(bucket["[2]"].value, json!("b"));
    }

    #[test]
    fn null_or_malformed_entries_read_as_absent() {
        let (store, storage) = store();
        storage.write(
            "accounts",
            r#"{"[1]": null, "[2]": {"bogus": true}, "[3]": {"cached_at": 0, "lifetime": 100, "value": "ok"}}"#,
        );

        let bucket = store.load("accounts");
        assert_eq!(bucket.len(), 1);
        assert_eq!(store.get("accounts", "[1]"), None);
        assert_eq!(store.get("accounts", "[3]").unwrap().value, json!("ok"));
    }

    #[test]
    fn malformed_bucket_reads_as_empty() {
        let (store, storage) = store();
        storage.write("accounts", "not json {{{");

        assert!(store.load("accounts").is_empty());

        // A write heals the slot.
        store.put("accounts", "[1]", CacheEntry::with_time(0, 100, json!(1)));
        assert_eq!(store.load("accounts").len(), 1);
    }

    #[test]
    fn clear_removes_the_slot() {
        let (store, storage) = store();
        store.put("accounts", "[1]", CacheEntry::with_time(0, 100, json!(1)));

        store.clear("accounts");
        assert_eq!(storage.read("accounts"), None);
        assert!(store.load("accounts").is_empty());
    }

    #[test]
    fn save_overwrites_wholesale() {
        let (store, _) = store();
        store.put("accounts", "[1]", CacheEntry::with_time(0, 100, json!(1)));

        store.save("accounts", &Bucket::new());
        assert!(store.load("accounts").is_empty());
    }
}
