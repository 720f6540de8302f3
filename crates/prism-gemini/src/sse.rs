//! SSE stream parsing for `streamGenerateContent?alt=sse`.
//!
//! Gemini's streaming surface emits `data: {json}` lines, one full
//! `GenerateContentResponse` per event, and ends the turn by closing the
//! connection. The parser buffers incoming bytes, cuts complete lines, and
//! maps each data payload to a [`ChatChunk`].

use bytes::Bytes;
use futures::{Stream, StreamExt};
use std::pin::Pin;

use crate::backend::ChatStream;
use crate::error::{GatewayError, Result};
use crate::types::{ChatChunk, GenerateContentResponse};

/// Parse an SSE byte stream into a chunk stream.
pub(crate) fn parse_sse_stream(
    byte_stream: impl Stream<Item = reqwest::Result<Bytes>> + Send + 'static,
) -> ChatStream {
    Box::pin(futures::stream::unfold(
        SseState {
            byte_stream: Box::pin(byte_stream),
            buffer: String::new(),
            done: false,
        },
        |mut state| async move {
            if state.done {
                return None;
            }

            loop {
                // Drain complete lines already buffered
                while let Some(line_end) = state.buffer.find('\n') {
                    let line = state.buffer[..line_end].trim().to_string();
                    state.buffer = state.buffer[line_end + 1..].to_string();

                    match parse_event_line(&line) {
                        None => continue,
                        Some(Ok(chunk)) => return Some((Ok(chunk), state)),
                        Some(Err(e)) => {
                            state.done = true;
                            return Some((Err(e), state));
                        }
                    }
                }

                // Need more bytes
                match state.byte_stream.next().await {
                    Some(Ok(bytes)) => {
                        state.buffer.push_str(&String::from_utf8_lossy(&bytes));
                    }
                    Some(Err(e)) => {
                        state.done = true;
                        return Some((Err(GatewayError::Network(e.to_string())), state));
                    }
                    None => {
                        // Connection closed: the turn is over. An unterminated
                        // final data line still counts as an event.
                        state.done = true;
                        let residual = std::mem::take(&mut state.buffer);
                        return parse_event_line(residual.trim()).map(|result| (result, state));
                    }
                }
            }
        },
    ))
}

/// Parse one SSE line.
///
/// `None` means the line carries no chunk (comments, event names, blank
/// separators, and payloads with nothing usable in them).
fn parse_event_line(line: &str) -> Option<Result<ChatChunk>> {
    let payload = line.strip_prefix("data:")?.trim();
    if payload.is_empty() {
        return None;
    }

    match serde_json::from_str::<GenerateContentResponse>(payload) {
        Ok(response) => {
            let chunk = response.into_chunk();
            if chunk.is_empty() { None } else { Some(Ok(chunk)) }
        }
        Err(e) => Some(Err(GatewayError::Serialization(format!(
            "bad stream event: {e}"
        )))),
    }
}

struct SseState {
    byte_stream: Pin<Box<dyn Stream<Item = reqwest::Result<Bytes>> + Send>>,
    buffer: String,
    done: bool,
}

// ─────────────────────────────────────────────────────────────────────────────
// Tests
// ─────────────────────────────────────────────────────────────────────────────
