//! The persisted record type.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

// ─────────────────────────────────────────────────────────────────────────────
// Record ID
// ─────────────────────────────────────────────────────────────────────────────

/// Unique identifier for a stored record.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct RecordId(Uuid);

impl RecordId {
    /// Generate a fresh random ID.
    pub fn new() -> Self {
        Self(Uuid::new_v4())
    }

    /// Get the underlying UUID.
    pub fn as_uuid(&self) -> &Uuid {
        &self.0
    }
}

impl Default for RecordId {
    fn default() -> Self {
        Self::new()
    }
}

impl std::fmt::Display for RecordId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

// ─────────────────────────────────────────────────────────────────────────────
// Record
// ─────────────────────────────────────────────────────────────────────────────

/// One unit of remembered data.
///
/// Records are append-only: created by an insert, never updated in place,
/// removed only when the whole store is flushed. The `collection` label is
/// free text with no schema of its own; a collection exists exactly as long
/// as at least one record carries it.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Record {
    /// Unique ID, generated at insert time.
    pub id: RecordId,
    /// Free-text grouping label.
    pub collection: String,
    /// Arbitrary JSON payload (string or structured value).
    pub data: serde_json::Value,
    /// Insertion timestamp; doubles as the logical ordering key.
    pub created_at: DateTime<Utc>,
}

impl Record {
    /// Construct a record with a fresh ID and the current time.
    pub fn new(collection: impl Into<String>, data: serde_json::Value) -> Self {
        Self {
            id: RecordId::new(),
            collection: collection.into(),
            data,
            created_at: Utc::now(),
        }
    }

    /// Case-insensitive substring match against the collection label or the
    /// serialized data payload.
    pub fn matches(&self, query: &str) -> bool {
        let needle = query.to_lowercase();
        if self.collection.to_lowercase().contains(&needle) {
            return true;
        }
        self.data.to_string().to_lowercase().contains(&needle)
    }
}

// ─────────────────────────────────────────────────────────────────────────────
// Tests
// ─────────────────────────────────────────────────────────────────────────────

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn matches_collection_case_insensitive() {
        let record = Record::new("Notes", json!("buy milk"));
        assert!(record.matches("notes"));
        assert!(record.matches("OTE"));
    }

    #[test]
    fn matches_serialized_data() {
        let record = Record::new("tasks", json!({"title": "Water the Plants"}));
        assert!(record.matches("water"));
        assert!(record.matches("PLANTS"));
        assert!(!record.matches("laundry"));
    }

    #[test]
    fn serde_round_trip() {
        let record = Record::new("notes", json!("remember this"));
        let json = serde_json::to_string(&record).unwrap();
        let restored: Record = serde_json::from_str(&json).unwrap();
        assert_eq!(record, restored);
    }
}
