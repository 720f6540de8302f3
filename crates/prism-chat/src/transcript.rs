//! Transcript types: messages, citation sources, and the ordered message
//! list a renderer observes.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use prism_gemini::{Citation, HistoryEntry};

use crate::turn::TurnState;

// ─────────────────────────────────────────────────────────────────────────────
// Message ID
// ─────────────────────────────────────────────────────────────────────────────

/// Unique identifier for a transcript message.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct MessageId(Uuid);

impl MessageId {
    /// Create a new random message ID.
    pub fn new() -> Self {
        Self(Uuid::new_v4())
    }
}

impl Default for MessageId {
    fn default() -> Self {
        Self::new()
    }
}

impl std::fmt::Display for MessageId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

// ─────────────────────────────────────────────────────────────────────────────
// Roles and Sources
// ─────────────────────────────────────────────────────────────────────────────

/// The author of a transcript message.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    User,
    Assistant,
    /// Out-of-band notices (stream failures, status); never sent as history.
    System,
}

/// A citation attached to an assistant message: where a claim came from.
pub type MessageSource = Citation;

// ─────────────────────────────────────────────────────────────────────────────
// Message
// ─────────────────────────────────────────────────────────────────────────────

/// One exchange unit in the transcript.
///
/// For an in-flight assistant message, `content` is only ever appended to
/// and `sources` only ever grows, until the turn finalizes or errors.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Message {
    /// Unique ID.
    pub id: MessageId,
    /// Author role.
    pub role: Role,
    /// Accumulated text.
    pub content: String,
    /// Creation time.
    pub timestamp: DateTime<Utc>,
    /// Citation sources, insertion-ordered, unique by URI.
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub sources: Vec<MessageSource>,
    /// Rendering state of the turn this message belongs to.
    #[serde(default)]
    pub state: TurnState,
}

impl Message {
    fn new(role: Role, content: impl Into<String>, state: TurnState) -> Self {
        Self {
            id: MessageId::new(),
            role,
            content: content.into(),
            timestamp: Utc::now(),
            sources: Vec::new(),
            state,
        }
    }

    /// A finished user message.
    pub fn user(content: impl Into<String>) -> Self {
        Self::new(Role::User, content, TurnState::Finalized)
    }

    /// A finished assistant message.
    pub fn assistant(content: impl Into<String>) -> Self {
        Self::new(Role::Assistant, content, TurnState::Finalized)
    }

    /// An empty assistant shell for a turn that is about to stream.
    pub fn assistant_pending() -> Self {
        Self::new(Role::Assistant, "", TurnState::Pending)
    }

    /// A system-role notice.
    pub fn system(content: impl Into<String>) -> Self {
        Self::new(Role::System, content, TurnState::Finalized)
    }
}

// ─────────────────────────────────────────────────────────────────────────────
// Transcript
// ─────────────────────────────────────────────────────────────────────────────

/// The ordered message list for one conversation.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Transcript {
    messages: Vec<Message>,
}

impl Transcript {
    /// An empty transcript.
    pub fn new() -> Self {
        Self::default()
    }

    /// A transcript seeded with an opening assistant greeting.
    pub fn with_greeting(greeting: impl Into<String>) -> Self {
        let mut transcript = Self::new();
        transcript.push(Message::assistant(greeting));
        transcript
    }

    /// Append a message, returning its ID.
    pub fn push(&mut self, message: Message) -> MessageId {
        let id = message.id;
        self.messages.push(message);
        id
    }

    /// All messages in order.
    pub fn messages(&self) -> &[Message] {
        &self.messages
    }

    /// Number of messages.
    pub fn len(&self) -> usize {
        self.messages.len()
    }

    /// Whether the transcript is empty.
    pub fn is_empty(&self) -> bool {
        self.messages.is_empty()
    }

    /// Look up a message by ID.
    pub fn get(&self, id: MessageId) -> Option<&Message> {
        self.messages.iter().find(|m| m.id == id)
    }

    /// Mutably look up a message by ID (used to update the in-flight
    /// assistant message in place).
    pub fn get_mut(&mut self, id: MessageId) -> Option<&mut Message> {
        self.messages.iter_mut().find(|m| m.id == id)
    }

    /// Map the transcript to gateway history entries.
    ///
    /// System notices are local to the transcript and excluded; the
    /// in-flight assistant shell (empty, pending) is excluded as well.
    pub fn history(&self) -> Vec<HistoryEntry> {
        self.messages
            .iter()
            .filter(|m| !(m.role == Role::Assistant && m.state == TurnState::Pending))
            .filter_map(|m| match m.role {
                Role::User => Some(HistoryEntry::user(&m.content)),
                Role::Assistant => Some(HistoryEntry::assistant(&m.content)),
                Role::System => None,
            })
            .collect()
    }
}

/// Merge new citations into a source list, keeping insertion order and
/// dropping URIs already present. The first-seen title wins. Returns the
/// sources that were actually added.
pub fn merge_sources(existing: &mut Vec<MessageSource>, incoming: Vec<Citation>) -> Vec<MessageSource> {
    let mut added = Vec::new();
    for citation in incoming {
        if existing.iter().any(|s| s.uri == citation.uri) {
            continue;
        }
        existing.push(citation.clone());
        added.push(citation);
    }
    added
}

// ─────────────────────────────────────────────────────────────────────────────
// Tests
// ─────────────────────────────────────────────────────────────────────────────

#[cfg(test)]
mod tests {
    use super::*;

    fn citation(uri: &str, title: &str) -> Citation {
        Citation {
            uri: uri.to_string(),
            title: title.to_string(),
        }
    }

    #[test]
    fn merge_sources_dedups_by_uri_first_seen_title_wins() {
        let mut sources = Vec::new();

        let added = merge_sources(
            &mut sources,
            vec![citation("https://a", "First"), citation("https://b", "B")],
        );
        assert_eq!(added.len(), 2);

        // Same URI again, different title: no new entry, first title kept
        let added = merge_sources(&mut sources, vec![citation("https://a", "Second")]);
        assert!(added.is_empty());
        assert_eq!(sources.len(), 2);
        assert_eq!(sources[0].title, "First");
    }

    #[test]
    fn merge_sources_preserves_insertion_order() {
        let mut sources = Vec::new();
        merge_sources(&mut sources, vec![citation("https://c", "C")]);
        merge_sources(&mut sources, vec![citation("https://a", "A")]);
        merge_sources(&mut sources, vec![citation("https://b", "B")]);
        let uris: Vec<&str> = sources.iter().map(|s| s.uri.as_str()).collect();
        assert_eq!(uris, vec!["https://c", "https://a", "https://b"]);
    }

    #[test]
    fn history_skips_system_and_pending_messages() {
        let mut transcript = Transcript::with_greeting("Online.");
        transcript.push(Message::user("hello"));
        transcript.push(Message::system("Stream failed"));
        transcript.push(Message::assistant_pending());

        let history = transcript.history();
        assert_eq!(history.len(), 2);
        assert_eq!(history[0].text, "Online.");
        assert_eq!(history[1].text, "hello");
    }

    #[test]
    fn get_mut_updates_in_place() {
        let mut transcript = Transcript::new();
        let id = transcript.push(Message::assistant_pending());
        {
            let message = transcript.get_mut(id).unwrap();
            message.content.push_str("partial");
            message.state = TurnState::Streaming;
        }
        assert_eq!(transcript.get(id).unwrap().content, "partial");
        assert_eq!(transcript.get(id).unwrap().state, TurnState::Streaming);
    }
}
