//! Per-turn accumulation state.
//!
//! Each streamed turn owns a [`TurnAccumulator`]: content is only appended,
//! sources only grow, and the state machine moves
//! `Pending -> Streaming -> Finalized` (or `Errored`). The accumulator is
//! published into the shared transcript at defined checkpoints, never
//! mutated from outside the turn.

use serde::{Deserialize, Serialize};

use prism_gemini::Citation;

use crate::transcript::{MessageId, MessageSource, merge_sources};

// ─────────────────────────────────────────────────────────────────────────────
// Turn State
// ─────────────────────────────────────────────────────────────────────────────

/// Lifecycle of one streamed turn.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TurnState {
    /// Message shell created, stream not yet producing.
    Pending,
    /// Chunks are being drained.
    Streaming,
    /// Stream exhausted; content and sources are frozen.
    #[default]
    Finalized,
    /// Stream failed; partial content is preserved, not rolled back.
    Errored,
}

// ─────────────────────────────────────────────────────────────────────────────
// Turn Accumulator
// ─────────────────────────────────────────────────────────────────────────────

/// Growing state for one in-flight assistant turn.
#[derive(Debug, Clone)]
pub struct TurnAccumulator {
    /// ID of the assistant message this turn feeds.
    pub message_id: MessageId,
    /// Accumulated assistant text, monotonically appended.
    pub content: String,
    /// Deduplicated citation sources, insertion-ordered.
    pub sources: Vec<MessageSource>,
    /// Current lifecycle state.
    pub state: TurnState,
}

impl TurnAccumulator {
    /// Start a turn feeding the given assistant message.
    pub fn new(message_id: MessageId) -> Self {
        Self {
            message_id,
            content: String::new(),
            sources: Vec::new(),
            state: TurnState::Pending,
        }
    }

    /// Mark the turn as actively streaming.
    pub fn begin_streaming(&mut self) {
        self.state = TurnState::Streaming;
    }

    /// Append a text delta.
    pub fn append_text(&mut self, text: &str) {
        self.content.push_str(text);
    }

    /// Merge incoming citations, returning only the newly added ones.
    pub fn merge_sources(&mut self, incoming: Vec<Citation>) -> Vec<MessageSource> {
        merge_sources(&mut self.sources, incoming)
    }

    /// Freeze the turn successfully.
    pub fn finalize(&mut self) {
        self.state = TurnState::Finalized;
    }

    /// Terminate the turn on error, keeping whatever accumulated.
    pub fn fail(&mut self) {
        self.state = TurnState::Errored;
    }
}

// ─────────────────────────────────────────────────────────────────────────────
// Tests
// ─────────────────────────────────────────────────────────────────────────────
