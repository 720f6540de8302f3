//! Conversation layer: transcript state, streaming turns, tool dispatch,
//! and the video polling loop.
//!
//! The [`ChatSession`] is the entry point. It owns a [`Transcript`] plus a
//! gateway and a [`ToolDispatcher`], and streams one turn at a time as a
//! sequence of [`TurnEvent`]s.

pub mod dispatch;
pub mod error;
pub mod session;
pub mod transcript;
pub mod turn;
pub mod video;

pub use dispatch::{NO_RECORDS_FOUND, TOOL_DB_FIND, TOOL_DB_INSERT, ToolDispatcher, annotate};
pub use error::{ChatError, Result};
pub use session::{ChatSession, TurnEvent, TurnStream};
pub use transcript::{Message, MessageId, MessageSource, Role, Transcript, merge_sources};
pub use turn::{TurnAccumulator, TurnState};
pub use video::await_video;
