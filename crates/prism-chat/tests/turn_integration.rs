//! End-to-end turn flow tests.
//!
//! These drive a full session over a scripted gateway and a file-backed
//! record store, checking the transcript and the store after each turn.

use std::sync::Arc;

use anyhow::Result;
use futures::StreamExt;
use serde_json::json;

use prism_chat::{ChatSession, Role, TurnEvent, TurnState};
use prism_gemini::{ChatChunk, GatewayError, MockGateway};
use prism_store::{FileBackend, RecordStore};

async fn run_turn(session: &ChatSession, prompt: &str) -> Vec<TurnEvent> {
    let mut stream = session.send(prompt).expect("turn should start");
    let mut events = Vec::new();
    while let Some(event) = stream.next().await {
        events.push(event);
    }
    events
}

#[tokio::test]
async fn test_full_turn_with_tool_call_persists_and_splices() -> Result<()> {
    let dir = tempfile::tempdir()?;
    let path = dir.path().join("records.json");

    let mock = MockGateway::with_turn(vec![
        Ok(ChatChunk::text("Hello")),
        Ok(ChatChunk::tool_call(
            "db_insert",
            json!({"collection": "notes", "document": "water the plants"}),
        )),
        Ok(ChatChunk::text(" Done.")),
    ]);
    let store = Arc::new(RecordStore::new(FileBackend::new(&path)));
    let session = ChatSession::new(Arc::new(mock), Arc::clone(&store));

    let events = run_turn(&session, "remember to water the plants").await;
    assert!(matches!(events.last(), Some(TurnEvent::Done)));

    let messages = session.messages();
    let assistant = messages.last().expect("assistant message");
    assert_eq!(assistant.role, Role::Assistant);
    assert_eq!(
        assistant.content,
        "Hello\n*[memory: Successfully stored in notes]*\n Done."
    );
    assert_eq!(assistant.state, TurnState::Finalized);

    // The record reached disk before the annotation was emitted
    let reloaded = RecordStore::new(FileBackend::new(&path));
    let found = reloaded.find("plants")?;
    assert_eq!(found.len(), 1);
    assert_eq!(found[0].collection, "notes");

    Ok(())
}

#[tokio::test]
async fn test_find_results_flow_back_as_status() -> Result<()> {
    let dir = tempfile::tempdir()?;
    let path = dir.path().join("records.json");

    let store = Arc::new(RecordStore::new(FileBackend::new(&path)));
    store.insert("notes", json!("water the plants"))?;

    let mock = MockGateway::with_turn(vec![Ok(ChatChunk::tool_call(
        "db_find",
        json!({"query": "plants"}),
    ))]);
    let session = ChatSession::new(Arc::new(mock), store);

    let events = run_turn(&session, "what did I save about plants?").await;
    let status = events.iter().find_map(|e| match e {
        TurnEvent::ToolStatus { status, .. } => Some(status.clone()),
        _ => None,
    });
    let status = status.expect("find should produce a status");
    assert!(status.contains("water the plants"));

    Ok(())
}

#[tokio::test]
async fn test_turns_share_history_across_the_session() -> Result<()> {
    let mock = MockGateway::new();
    mock.push_turn(vec![Ok(ChatChunk::text("first answer"))]);
    mock.push_turn(vec![Ok(ChatChunk::text("second answer"))]);
    let mock = Arc::new(mock);

    let dir = tempfile::tempdir()?;
    let store = Arc::new(RecordStore::new(FileBackend::new(
        dir.path().join("records.json"),
    )));
    let gateway: prism_gemini::SharedGateway = mock.clone();
    let session = ChatSession::new(gateway, store);

    run_turn(&session, "first question").await;
    run_turn(&session, "second question").await;

    assert_eq!(
        mock.prompts(),
        vec!["first question".to_string(), "second question".to_string()]
    );

    let messages = session.messages();
    // greeting + two user/assistant pairs
    assert_eq!(messages.len(), 5);
    assert_eq!(messages[2].content, "first answer");
    assert_eq!(messages[4].content, "second answer");

    Ok(())
}

#[tokio::test]
async fn test_mid_stream_failure_keeps_partial_output() -> Result<()> {
    let mock = MockGateway::with_turn(vec![
        Ok(ChatChunk::text("The capital of France")),
        Err(GatewayError::Api {
            status: 500,
            message: "backend unavailable".to_string(),
        }),
    ]);

    let dir = tempfile::tempdir()?;
    let store = Arc::new(RecordStore::new(FileBackend::new(
        dir.path().join("records.json"),
    )));
    let session = ChatSession::new(Arc::new(mock), store);

    let events = run_turn(&session, "capital of France?").await;
    assert!(matches!(events.last(), Some(TurnEvent::Error { .. })));

    let messages = session.messages();
    let assistant = &messages[2];
    assert_eq!(assistant.content, "The capital of France");
    assert_eq!(assistant.state, TurnState::Errored);
    assert_eq!(messages.last().unwrap().role, Role::System);

    // The session accepts a new turn after the failure
    assert!(!session.is_in_flight());

    Ok(())
}
