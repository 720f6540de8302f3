//! Tool dispatch: executing record-store requests emitted mid-stream.
//!
//! The model asks for `db_insert` or `db_find`; the dispatcher runs the
//! operation against the store and synthesizes a short human-readable status
//! that is spliced into the visible assistant content as an inline
//! annotation. The result is never round-tripped to the model as a
//! structured tool response.

use std::sync::Arc;

use prism_gemini::ToolCallRequest;
use prism_store::RecordStore;

/// Tool name for inserting a record.
pub const TOOL_DB_INSERT: &str = "db_insert";

/// Tool name for searching records.
pub const TOOL_DB_FIND: &str = "db_find";

/// Sentinel status when a find matches nothing.
pub const NO_RECORDS_FOUND: &str = "No records found.";

// ─────────────────────────────────────────────────────────────────────────────
// Tool Dispatcher
// ─────────────────────────────────────────────────────────────────────────────

/// Executes tool-call requests against the record store.
#[derive(Clone)]
pub struct ToolDispatcher {
    store: Arc<RecordStore>,
}

impl ToolDispatcher {
    /// Create a dispatcher over the given store.
    pub fn new(store: Arc<RecordStore>) -> Self {
        Self { store }
    }

    /// The store this dispatcher writes to.
    pub fn store(&self) -> &Arc<RecordStore> {
        &self.store
    }

    /// Execute one request and return its status text.
    ///
    /// Unrecognized operation names return `None` and leave the store
    /// untouched; the turn carries on. Argument and storage failures are
    /// caught here and rendered as a readable status, never raised.
    pub fn dispatch(&self, call: &ToolCallRequest) -> Option<String> {
        match call.name.as_str() {
            TOOL_DB_INSERT => Some(self.insert(call)),
            TOOL_DB_FIND => Some(self.find(call)),
            other => {
                tracing::debug!(tool = other, "ignoring unrecognized tool call");
                None
            }
        }
    }

    fn insert(&self, call: &ToolCallRequest) -> String {
        let Some(collection) = call.args.get("collection").and_then(|v| v.as_str()) else {
            return "insert failed: missing 'collection' argument".to_string();
        };
        let Some(document) = call.args.get("document") else {
            return "insert failed: missing 'document' argument".to_string();
        };

        // The declaration says string, but any JSON payload is storable.
        // String documents are stored verbatim, never re-parsed.
        match self.store.insert(collection, document.clone()) {
            Ok(record) => {
                tracing::info!(collection = %record.collection, id = %record.id, "tool insert");
                format!("Successfully stored in {collection}")
            }
            Err(e) => format!("insert failed: {e}"),
        }
    }

    fn find(&self, call: &ToolCallRequest) -> String {
        let Some(query) = call.args.get("query").and_then(|v| v.as_str()) else {
            return "find failed: missing 'query' argument".to_string();
        };

        match self.store.find(query) {
            Ok(records) if records.is_empty() => NO_RECORDS_FOUND.to_string(),
            Ok(records) => serde_json::to_string(&records)
                .unwrap_or_else(|e| format!("find failed: {e}")),
            Err(e) => format!("find failed: {e}"),
        }
    }
}

/// Wrap a dispatch status as the inline transcript annotation.
pub fn annotate(status: &str) -> String {
    format!("\n*[memory: {status}]*\n")
}

// ─────────────────────────────────────────────────────────────────────────────
// Tests
// ─────────────────────────────────────────────────────────────────────────────

#[cfg(test)]
mod tests {
    use super::*;
    use prism_store::MemoryBackend;
    use serde_json::json;

    fn dispatcher() -> ToolDispatcher {
        ToolDispatcher::new(Arc::new(RecordStore::new(MemoryBackend::new())))
    }

    fn call(name: &str, args: serde_json::Value) -> ToolCallRequest {
        ToolCallRequest {
            name: name.to_string(),
            args,
        }
    }

    #[test]
    fn insert_stores_record_and_names_collection() {
        let dispatcher = dispatcher();
        let status = dispatcher
            .dispatch(&call(
                TOOL_DB_INSERT,
                json!({"collection": "notes", "document": "buy milk"}),
            ))
            .unwrap();
        assert_eq!(status, "Successfully stored in notes");

        let records = dispatcher.store().all().unwrap();
        assert_eq!(records.len(), 1);
        assert_eq!(records[0].collection, "notes");
        assert_eq!(records[0].data, json!("buy milk"));
    }

    #[test]
    fn find_returns_serialized_matches() {
        let dispatcher = dispatcher();
        dispatcher
            .dispatch(&call(
                TOOL_DB_INSERT,
                json!({"collection": "notes", "document": "buy milk"}),
            ))
            .unwrap();

        let status = dispatcher
            .dispatch(&call(TOOL_DB_FIND, json!({"query": "milk"})))
            .unwrap();
        let parsed: serde_json::Value = serde_json::from_str(&status).unwrap();
        assert_eq!(parsed.as_array().unwrap().len(), 1);
        assert_eq!(parsed[0]["collection"], "notes");
    }

    #[test]
    fn find_with_no_matches_uses_sentinel() {
        let dispatcher = dispatcher();
        let status = dispatcher
            .dispatch(&call(TOOL_DB_FIND, json!({"query": "nothing"})))
            .unwrap();
        assert_eq!(status, NO_RECORDS_FOUND);
    }

    #[test]
    fn unknown_tool_is_ignored_and_store_unchanged() {
        let dispatcher = dispatcher();
        let result = dispatcher.dispatch(&call("db_drop_everything", json!({})));
        assert!(result.is_none());
        assert!(dispatcher.store().all().unwrap().is_empty());
    }

    #[test]
    fn missing_arguments_render_readable_status() {
        let dispatcher = dispatcher();

        let status = dispatcher
            .dispatch(&call(TOOL_DB_INSERT, json!({"document": "orphan"})))
            .unwrap();
        assert!(status.contains("missing 'collection'"));

        let status = dispatcher.dispatch(&call(TOOL_DB_FIND, json!({}))).unwrap();
        assert!(status.contains("missing 'query'"));

        assert!(dispatcher.store().all().unwrap().is_empty());
    }

    #[test]
    fn structured_documents_are_stored_as_is() {
        let dispatcher = dispatcher();
        dispatcher
            .dispatch(&call(
                TOOL_DB_INSERT,
                json!({"collection": "tasks", "document": {"title": "water plants", "due": "friday"}}),
            ))
            .unwrap();
        let records = dispatcher.store().all().unwrap();
        assert_eq!(records[0].data["title"], "water plants");
    }

    #[test]
    fn annotation_format() {
        assert_eq!(
            annotate("Successfully stored in notes"),
            "\n*[memory: Successfully stored in notes]*\n"
        );
    }
}
