//! Error types for the chat crate.

use thiserror::Error;

/// Result type alias using the chat error type.
pub type Result<T> = std::result::Result<T, ChatError>;

/// Errors from the conversation loop.
#[derive(Debug, Error)]
pub enum ChatError {
    /// The gateway call failed.
    #[error(transparent)]
    Gateway(#[from] prism_gemini::GatewayError),

    /// A record store operation failed.
    #[error(transparent)]
    Store(#[from] prism_store::StoreError),

    /// A new turn was requested while one is still in flight. Sends are
    /// rejected, not queued.
    #[error("a turn is already in flight")]
    TurnInFlight,

    /// A long-running operation's credential expired; the caller should
    /// re-prompt for a key and resume.
    #[error("credential expired while polling operation '{operation}'")]
    CredentialExpired { operation: String },

    /// The configured poll bound was hit before the operation completed.
    #[error("video generation did not complete within {polls} polls")]
    VideoPollLimit { polls: u32 },
}
