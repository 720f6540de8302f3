//! The record store.
//!
//! A flat, append-only collection of [`Record`]s persisted as one JSON array
//! through a [`StorageBackend`]. Every mutation rewrites the full array
//! synchronously before returning, and the whole read-modify-write cycle runs
//! under an internal mutex so overlapping inserts issued from concurrent call
//! sites cannot interleave and lose updates.

use parking_lot::Mutex;
use tracing::{debug, warn};

use crate::backend::{FileBackend, StorageBackend};
use crate::error::Result;
use crate::record::Record;

// ─────────────────────────────────────────────────────────────────────────────
// Record Store
// ─────────────────────────────────────────────────────────────────────────────

/// Append-only record store over a pluggable storage medium.
pub struct RecordStore {
    backend: Mutex<Box<dyn StorageBackend>>,
}

impl std::fmt::Debug for RecordStore {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("RecordStore").finish_non_exhaustive()
    }
}

impl RecordStore {
    /// Create a store over the given backend.
    pub fn new(backend: impl StorageBackend + 'static) -> Self {
        Self {
            backend: Mutex::new(Box::new(backend)),
        }
    }

    /// Create a store persisting to a JSON file at the given path.
    pub fn open(path: impl Into<std::path::PathBuf>) -> Self {
        Self::new(FileBackend::new(path))
    }

    /// Insert a new record and durably persist the updated collection
    /// before returning.
    pub fn insert(&self, collection: impl Into<String>, data: serde_json::Value) -> Result<Record> {
        let backend = self.backend.lock();
        let mut records = Self::load_records(backend.as_ref());

        let record = Record::new(collection, data);
        records.push(record.clone());
        backend.save(&serde_json::to_string(&records)?)?;

        debug!(id = %record.id, collection = %record.collection, "inserted record");
        Ok(record)
    }

    /// Find records whose collection label or serialized data contains the
    /// query, case-insensitively, in insertion order.
    ///
    /// An empty store yields an empty vec, never an error.
    pub fn find(&self, query: &str) -> Result<Vec<Record>> {
        let backend = self.backend.lock();
        let records = Self::load_records(backend.as_ref());
        Ok(records.into_iter().filter(|r| r.matches(query)).collect())
    }

    /// All records, insertion order.
    pub fn all(&self) -> Result<Vec<Record>> {
        let backend = self.backend.lock();
        Ok(Self::load_records(backend.as_ref()))
    }

    /// Number of records in the store.
    pub fn len(&self) -> Result<usize> {
        Ok(self.all()?.len())
    }

    /// Whether the store holds no records.
    pub fn is_empty(&self) -> Result<bool> {
        Ok(self.len()? == 0)
    }

    /// Distinct collection labels, in first-seen order.
    pub fn collections(&self) -> Result<Vec<String>> {
        let records = self.all()?;
        let mut seen = Vec::new();
        for record in records {
            if !seen.contains(&record.collection) {
                seen.push(record.collection);
            }
        }
        Ok(seen)
    }

    /// Destructively remove every record. Irreversible; call sites that face
    /// a user must confirm first.
    pub fn clear(&self) -> Result<()> {
        let backend = self.backend.lock();
        backend.save("[]")?;
        debug!("cleared record store");
        Ok(())
    }

    /// Load the full record list, treating an absent or malformed payload as
    /// an empty store.
    fn load_records(backend: &dyn StorageBackend) -> Vec<Record> {
        let payload = match backend.load() {
            Ok(Some(payload)) => payload,
            Ok(None) => return Vec::new(),
            Err(e) => {
                warn!(error = %e, "storage read failed, treating store as empty");
                return Vec::new();
            }
        };

        match serde_json::from_str(&payload) {
            Ok(records) => records,
            Err(e) => {
                warn!(error = %e, "malformed store payload, treating store as empty");
                Vec::new()
            }
        }
    }
}

// ─────────────────────────────────────────────────────────────────────────────
// Tests
// ─────────────────────────────────────────────────────────────────────────────

#[cfg(test)]
mod tests {
    use super::*;
    use crate::backend::MemoryBackend;
    use serde_json::json;

    fn memory_store() -> RecordStore {
        RecordStore::new(MemoryBackend::new())
    }

    #[test]
    fn insert_returns_stored_record() {
        let store = memory_store();
        let record = store.insert("notes", json!("buy milk")).unwrap();
        assert_eq!(record.collection, "notes");
        assert_eq!(record.data, json!("buy milk"));

        let all = store.all().unwrap();
        assert_eq!(all, vec![record]);
    }

    #[test]
    fn find_matches_collection_or_data_in_insertion_order() {
        let store = memory_store();
        let a = store.insert("notes", json!("buy milk")).unwrap();
        let b = store.insert("tasks", json!("call the dentist")).unwrap();
        let c = store.insert("notes", json!("milk the cows")).unwrap();

        let milk = store.find("MILK").unwrap();
        assert_eq!(milk, vec![a.clone(), c.clone()]);

        let notes = store.find("notes").unwrap();
        assert_eq!(notes, vec![a, c]);

        let dentist = store.find("dentist").unwrap();
        assert_eq!(dentist, vec![b]);
    }

    #[test]
    fn find_on_empty_store_returns_empty() {
        let store = memory_store();
        assert!(store.find("anything").unwrap().is_empty());
    }

    #[test]
    fn find_does_not_mutate() {
        let store = memory_store();
        store.insert("notes", json!("a")).unwrap();
        store.find("zzz").unwrap();
        assert_eq!(store.len().unwrap(), 1);
    }

    #[test]
    fn insert_then_find_by_data_substring() {
        let store = memory_store();
        let record = store
            .insert("journal", json!({"entry": "saw a kingfisher today"}))
            .unwrap();
        let found = store.find("kingfisher").unwrap();
        assert_eq!(found, vec![record]);
    }

    #[test]
    fn clear_then_all_is_empty() {
        let store = memory_store();
        store.insert("notes", json!("a")).unwrap();
        store.insert("tasks", json!("b")).unwrap();
        store.clear().unwrap();
        assert!(store.all().unwrap().is_empty());
        assert!(store.is_empty().unwrap());
    }

    #[test]
    fn clear_on_empty_store_is_fine() {
        let store = memory_store();
        store.clear().unwrap();
        assert!(store.all().unwrap().is_empty());
    }

    #[test]
    fn malformed_payload_treated_as_empty() {
        let store = RecordStore::new(MemoryBackend::with_payload("not json at all {"));
        assert!(store.all().unwrap().is_empty());

        // And the store recovers on the next insert
        store.insert("notes", json!("fresh start")).unwrap();
        assert_eq!(store.len().unwrap(), 1);
    }

    #[test]
    fn collections_are_derived_first_seen_order() {
        let store = memory_store();
        store.insert("notes", json!("a")).unwrap();
        store.insert("tasks", json!("b")).unwrap();
        store.insert("notes", json!("c")).unwrap();
        assert_eq!(store.collections().unwrap(), vec!["notes", "tasks"]);
    }

    #[test]
    fn file_backed_store_round_trips() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("records.json");

        let record = {
            let store = RecordStore::open(&path);
            store.insert("notes", json!("persisted")).unwrap()
        };

        // A fresh store over the same file sees the record
        let store = RecordStore::open(&path);
        assert_eq!(store.all().unwrap(), vec![record]);
    }

    #[test]
    fn concurrent_inserts_lose_no_records() {
        let store = std::sync::Arc::new(memory_store());

        let threads: Vec<_> = (0..8)
            .map(|t| {
                let store = std::sync::Arc::clone(&store);
                std::thread::spawn(move || {
                    for i in 0..10 {
                        store
                            .insert("notes", json!(format!("t{t}-{i}")))
                            .unwrap();
                    }
                })
            })
            .collect();
        for handle in threads {
            handle.join().unwrap();
        }

        // Every read-modify-write cycle serialized: nothing overwritten
        let all = store.all().unwrap();
        assert_eq!(all.len(), 80);
        for t in 0..8 {
            for i in 0..10 {
                let wanted = json!(format!("t{t}-{i}"));
                assert!(all.iter().any(|r| r.data == wanted));
            }
        }
    }

    #[test]
    fn persisted_layout_is_a_json_array() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("records.json");
        let store = RecordStore::open(&path);
        store.insert("notes", json!("a")).unwrap();

        let raw = std::fs::read_to_string(&path).unwrap();
        let parsed: serde_json::Value = serde_json::from_str(&raw).unwrap();
        let array = parsed.as_array().unwrap();
        assert_eq!(array.len(), 1);
        assert_eq!(array[0]["collection"], "notes");
        assert!(array[0]["id"].is_string());
        assert!(array[0]["created_at"].is_string());
    }
}
