//! Gemini API gateway for Prism.
//!
//! Exposes the generative capabilities the rest of the system consumes
//! through the [`Gateway`] trait: one streaming chat turn at a time (with
//! search grounding and record-store tool declarations enabled), single-shot
//! image and speech generation, and a start/poll pair for long-running video
//! generation.

pub mod backend;
pub mod client;
pub mod error;
mod sse;
pub mod types;

pub use backend::{ChatStream, Gateway, SharedGateway, with_retry};
pub use client::{GeminiClient, GeminiConfig};
pub use error::{GatewayError, Result};
pub use types::{
    AspectRatio, ChatChunk, ChatRole, Citation, HistoryEntry, ImageData, SPEECH_BITS_PER_SAMPLE,
    SPEECH_CHANNELS, SPEECH_SAMPLE_RATE, SpeechData, ToolCallRequest, VideoOperation,
};

#[cfg(any(test, feature = "testing"))]
pub use backend::MockGateway;
