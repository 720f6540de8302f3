//! Streaming chat turns.
//!
//! One [`ChatSession`] owns the transcript, the gateway, the tool
//! dispatcher, and the one-turn-at-a-time guard. A turn is driven by the
//! stream returned from [`ChatSession::send`]: chunks are processed strictly
//! in delivery order, tool calls are dispatched before the stream continues,
//! and the shared transcript is republished before each event is yielded so
//! a renderer can reflect incremental progress.

use std::pin::Pin;
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};

use futures::{Stream, StreamExt};
use parking_lot::RwLock;
use tokio::sync::watch;

use prism_gemini::{HistoryEntry, SharedGateway};
use prism_store::RecordStore;

use crate::dispatch::{ToolDispatcher, annotate};
use crate::error::{ChatError, Result};
use crate::transcript::{Message, MessageId, MessageSource, Transcript};
use crate::turn::{TurnAccumulator, TurnState};

/// Opening assistant greeting seeded into a fresh transcript.
const GREETING: &str =
    "System initialized. Prism AI is online. Database connected. How can I assist you today?";

// ─────────────────────────────────────────────────────────────────────────────
// Turn Events
// ─────────────────────────────────────────────────────────────────────────────

/// A progress event emitted while a turn streams.
#[derive(Debug, Clone, PartialEq)]
pub enum TurnEvent {
    /// Text content appended to the assistant message.
    Text {
        /// The text delta.
        content: String,
    },
    /// A tool call was dispatched; its annotation was appended.
    ToolStatus {
        /// Name of the dispatched tool.
        name: String,
        /// Human-readable status synthesized by the dispatcher.
        status: String,
    },
    /// New citation sources were merged into the turn.
    Sources {
        /// The sources that were added (already deduplicated).
        added: Vec<MessageSource>,
    },
    /// The turn completed; the assistant message is frozen.
    Done,
    /// The turn failed; partial content is preserved.
    Error {
        /// Error message (also appended to the transcript as a system
        /// notice).
        message: String,
    },
}

/// A boxed stream of turn events.
pub type TurnStream = Pin<Box<dyn Stream<Item = TurnEvent> + Send + 'static>>;

// ─────────────────────────────────────────────────────────────────────────────
// In-Flight Guard
// ─────────────────────────────────────────────────────────────────────────────

/// Releases the session's in-flight flag when the turn stream is dropped,
/// so an abandoned turn does not wedge the session. If the assistant
/// message never reached a terminal state, the guard marks it errored and
/// republishes, so abandonment does not leave a pending shell behind.
struct InFlightGuard {
    flag: Arc<AtomicBool>,
    transcript: Arc<RwLock<Transcript>>,
    publisher: watch::Sender<Vec<Message>>,
    message_id: MessageId,
}

impl Drop for InFlightGuard {
    fn drop(&mut self) {
        {
            let mut transcript = self.transcript.write();
            if let Some(message) = transcript.get_mut(self.message_id) {
                if matches!(message.state, TurnState::Pending | TurnState::Streaming) {
                    message.state = TurnState::Errored;
                    self.publisher.send_replace(transcript.messages().to_vec());
                }
            }
        }
        self.flag.store(false, Ordering::SeqCst);
    }
}

// ─────────────────────────────────────────────────────────────────────────────
// Chat Session
// ─────────────────────────────────────────────────────────────────────────────

/// A conversation with the assistant, one streamed turn at a time.
pub struct ChatSession {
    gateway: SharedGateway,
    dispatcher: ToolDispatcher,
    transcript: Arc<RwLock<Transcript>>,
    publisher: watch::Sender<Vec<Message>>,
    in_flight: Arc<AtomicBool>,
}

impl ChatSession {
    /// Create a session over the given gateway and record store, seeded
    /// with the opening greeting.
    pub fn new(gateway: SharedGateway, store: Arc<RecordStore>) -> Self {
        let transcript = Transcript::with_greeting(GREETING);
        let (publisher, _) = watch::channel(transcript.messages().to_vec());
        Self {
            gateway,
            dispatcher: ToolDispatcher::new(store),
            transcript: Arc::new(RwLock::new(transcript)),
            publisher,
            in_flight: Arc::new(AtomicBool::new(false)),
        }
    }

    /// Snapshot of the current transcript.
    pub fn messages(&self) -> Vec<Message> {
        self.transcript.read().messages().to_vec()
    }

    /// Subscribe to transcript snapshots, refreshed as the turn advances.
    pub fn subscribe(&self) -> watch::Receiver<Vec<Message>> {
        self.publisher.subscribe()
    }

    /// Whether a turn is currently streaming.
    pub fn is_in_flight(&self) -> bool {
        self.in_flight.load(Ordering::SeqCst)
    }

    /// The dispatcher's record store.
    pub fn store(&self) -> &Arc<RecordStore> {
        self.dispatcher.store()
    }

    /// Open a new streaming turn for `prompt`.
    ///
    /// Rejected with [`ChatError::TurnInFlight`] if a turn is already
    /// active; sends are never queued. The returned stream must be drained
    /// for the turn to make progress; dropping it abandons the turn
    /// (best-effort, no rollback) and releases the in-flight flag.
    pub fn send(&self, prompt: &str) -> Result<TurnStream> {
        self.in_flight
            .compare_exchange(false, true, Ordering::SeqCst, Ordering::SeqCst)
            .map_err(|_| ChatError::TurnInFlight)?;

        // History covers everything said before this turn; then the user
        // message and the empty assistant shell join the transcript.
        let (history, message_id) = {
            let mut transcript = self.transcript.write();
            let history = transcript.history();
            transcript.push(Message::user(prompt));
            let message_id = transcript.push(Message::assistant_pending());
            self.publisher.send_replace(transcript.messages().to_vec());
            (history, message_id)
        };

        let guard = InFlightGuard {
            flag: Arc::clone(&self.in_flight),
            transcript: Arc::clone(&self.transcript),
            publisher: self.publisher.clone(),
            message_id,
        };

        Ok(create_turn_stream(TurnContext {
            gateway: Arc::clone(&self.gateway),
            dispatcher: self.dispatcher.clone(),
            transcript: Arc::clone(&self.transcript),
            publisher: self.publisher.clone(),
            prompt: prompt.to_string(),
            history,
            message_id,
            _guard: guard,
        }))
    }
}

// ─────────────────────────────────────────────────────────────────────────────
// Turn Stream
// ─────────────────────────────────────────────────────────────────────────────

/// Everything one turn needs, moved into the stream.
struct TurnContext {
    gateway: SharedGateway,
    dispatcher: ToolDispatcher,
    transcript: Arc<RwLock<Transcript>>,
    publisher: watch::Sender<Vec<Message>>,
    prompt: String,
    history: Vec<HistoryEntry>,
    message_id: MessageId,
    _guard: InFlightGuard,
}

impl TurnContext {
    /// Write the accumulator into the shared transcript and republish.
    fn publish(&self, turn: &TurnAccumulator) {
        let mut transcript = self.transcript.write();
        if let Some(message) = transcript.get_mut(self.message_id) {
            message.content = turn.content.clone();
            message.sources = turn.sources.clone();
            message.state = turn.state;
        }
        self.publisher.send_replace(transcript.messages().to_vec());
    }

    /// Append a system-role failure notice and republish.
    fn publish_failure(&self, message: &str) {
        let mut transcript = self.transcript.write();
        transcript.push(Message::system(message));
        self.publisher.send_replace(transcript.messages().to_vec());
    }
}

/// Drive one assistant turn, yielding progress events.
fn create_turn_stream(ctx: TurnContext) -> TurnStream {
    Box::pin(async_stream::stream! {
        let mut turn = TurnAccumulator::new(ctx.message_id);

        let mut chunks = match ctx.gateway.chat_stream(&ctx.prompt, &ctx.history).await {
            Ok(stream) => stream,
            Err(e) => {
                tracing::error!(error = %e, "failed to open chat stream");
                turn.fail();
                ctx.publish(&turn);
                let notice = format!("System Error: {e}");
                ctx.publish_failure(&notice);
                yield TurnEvent::Error { message: notice };
                return;
            }
        };

        turn.begin_streaming();
        ctx.publish(&turn);

        while let Some(result) = chunks.next().await {
            let chunk = match result {
                Ok(chunk) => chunk,
                Err(e) => {
                    tracing::error!(error = %e, "chat stream failed mid-turn");
                    turn.fail();
                    ctx.publish(&turn);
                    let notice = format!("System Error: {e}");
                    ctx.publish_failure(&notice);
                    yield TurnEvent::Error { message: notice };
                    return;
                }
            };

            // Tool calls first, then text, then sources; strictly in
            // delivery order with no buffering beyond the current chunk.
            // The transcript is republished before each event is yielded,
            // so a subscriber that reacts to an event sees a snapshot that
            // already contains it.
            for call in &chunk.tool_calls {
                if let Some(status) = ctx.dispatcher.dispatch(call) {
                    turn.append_text(&annotate(&status));
                    ctx.publish(&turn);
                    yield TurnEvent::ToolStatus {
                        name: call.name.clone(),
                        status,
                    };
                }
            }

            if let Some(text) = chunk.text {
                turn.append_text(&text);
                ctx.publish(&turn);
                yield TurnEvent::Text { content: text };
            }

            if !chunk.sources.is_empty() {
                let added = turn.merge_sources(chunk.sources);
                if !added.is_empty() {
                    ctx.publish(&turn);
                    yield TurnEvent::Sources { added };
                }
            }
        }

        turn.finalize();
        ctx.publish(&turn);
        yield TurnEvent::Done;
    })
}

// ─────────────────────────────────────────────────────────────────────────────
// Tests
// ─────────────────────────────────────────────────────────────────────────────
