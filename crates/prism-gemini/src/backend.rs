//! Gateway trait and shared helpers.
//!
//! [`Gateway`] is the abstraction the rest of the system consumes: streaming
//! chat with tool-call interleaving, single-shot image and speech generation,
//! and the start/poll pair for long-running video generation. The concrete
//! Gemini client lives in [`crate::client`]; a scriptable mock for tests is
//! exposed behind the `testing` feature.

use std::pin::Pin;
use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use futures::Stream;

use crate::error::{GatewayError, Result};
use crate::types::{
    AspectRatio, ChatChunk, HistoryEntry, ImageData, SpeechData, VideoOperation,
};

// ─────────────────────────────────────────────────────────────────────────────
// Retry Helper
// ─────────────────────────────────────────────────────────────────────────────

/// Execute an async operation with exponential backoff retry.
///
/// Retries only on transient errors (network failures, 429s, 5xx).
/// Non-retryable errors are returned immediately.
pub async fn with_retry<F, Fut, T>(
    max_retries: u32,
    initial_backoff: Duration,
    operation: &str,
    mut f: F,
) -> Result<T>
where
    F: FnMut() -> Fut,
    Fut: std::future::Future<Output = Result<T>>,
{
    let mut last_error = None;
    let mut backoff = initial_backoff;

    for attempt in 0..=max_retries {
        match f().await {
            Ok(result) => return Ok(result),
            Err(e) => {
                if !e.is_retryable() {
                    return Err(e);
                }

                last_error = Some(e);

                if attempt < max_retries {
                    tracing::warn!(
                        operation,
                        attempt = attempt + 1,
                        max_retries,
                        backoff_ms = backoff.as_millis() as u64,
                        "Request failed, retrying"
                    );
                    tokio::time::sleep(backoff).await;
                    backoff *= 2;
                }
            }
        }
    }

    Err(last_error
        .unwrap_or_else(|| GatewayError::Internal("retry loop without attempts".to_string())))
}

// ─────────────────────────────────────────────────────────────────────────────
// Gateway Trait
// ─────────────────────────────────────────────────────────────────────────────

/// A lazily produced, ordered, finite sequence of chat chunks for one turn.
///
/// Not restartable; a new `chat_stream` call is required per turn. Consumers
/// should drain it to completion.
pub type ChatStream = Pin<Box<dyn Stream<Item = Result<ChatChunk>> + Send + 'static>>;

/// The generative-AI capability surface consumed by the rest of the system.
#[async_trait]
pub trait Gateway: Send + Sync {
    /// Open one streaming assistant turn for `prompt`, given the role-tagged
    /// prior history.
    async fn chat_stream(&self, prompt: &str, history: &[HistoryEntry]) -> Result<ChatStream>;

    /// Generate a single image. Fails with an empty-response error if the
    /// provider returns no image payload.
    async fn generate_image(&self, prompt: &str, aspect_ratio: AspectRatio) -> Result<ImageData>;

    /// Synthesize speech for `text`. Fails with an empty-response error if
    /// the provider returns no audio payload.
    async fn generate_speech(&self, text: &str) -> Result<SpeechData>;

    /// Start a long-running video generation and return its handle.
    async fn start_video(&self, prompt: &str) -> Result<VideoOperation>;

    /// Poll a video operation once, returning the refreshed handle.
    ///
    /// An expired or invalid credential surfaces as
    /// [`GatewayError::OperationNotFound`].
    async fn poll_video(&self, operation: &VideoOperation) -> Result<VideoOperation>;

    /// Backend name for logging.
    fn name(&self) -> &str;
}

/// A shared, dynamically dispatched gateway.
pub type SharedGateway = Arc<dyn Gateway>;

// ─────────────────────────────────────────────────────────────────────────────
// Mock Gateway
// ─────────────────────────────────────────────────────────────────────────────

#[cfg(any(test, feature = "testing"))]
pub use mock::MockGateway;

#[cfg(any(test, feature = "testing"))]
mod mock {
    use super::*;
    use std::sync::Mutex;

    /// A scripted gateway for deterministic testing of the chat loop.
    ///
    /// Each `chat_stream` call pops the next scripted turn: a sequence of
    /// chunk results yielded in order. Prompts are logged for inspection.
    #[derive(Default)]
    pub struct MockGateway {
        turns: Mutex<Vec<Vec<Result<ChatChunk>>>>,
        prompts: Mutex<Vec<String>>,
        image: Mutex<Option<Result<ImageData>>>,
        speech: Mutex<Option<Result<SpeechData>>>,
        video_polls: Mutex<Vec<Result<VideoOperation>>>,
    }

    impl MockGateway {
        /// Create a mock with no scripted turns.
        pub fn new() -> Self {
            Self::default()
        }

        /// Create a mock whose next turn yields the given chunks.
        pub fn with_turn(chunks: Vec<Result<ChatChunk>>) -> Self {
            let mock = Self::default();
            mock.push_turn(chunks);
            mock
        }

        /// Queue another scripted turn.
        pub fn push_turn(&self, chunks: Vec<Result<ChatChunk>>) {
            self.turns.lock().unwrap().push(chunks);
        }

        /// Script the image response.
        pub fn set_image(&self, result: Result<ImageData>) {
            *self.image.lock().unwrap() = Some(result);
        }

        /// Script the speech response.
        pub fn set_speech(&self, result: Result<SpeechData>) {
            *self.speech.lock().unwrap() = Some(result);
        }

        /// Queue poll results, returned in order.
        pub fn push_poll(&self, result: Result<VideoOperation>) {
            self.video_polls.lock().unwrap().push(result);
        }

        /// Prompts passed to `chat_stream` so far.
        pub fn prompts(&self) -> Vec<String> {
            self.prompts.lock().unwrap().clone()
        }
    }

    #[async_trait]
    impl Gateway for MockGateway {
        async fn chat_stream(
            &self,
            prompt: &str,
            _history: &[HistoryEntry],
        ) -> Result<ChatStream> {
            self.prompts.lock().unwrap().push(prompt.to_string());

            let mut turns = self.turns.lock().unwrap();
            if turns.is_empty() {
                return Err(GatewayError::Internal(
                    "MockGateway: no scripted turns remaining".to_string(),
                ));
            }
            let chunks = turns.remove(0);
            Ok(Box::pin(futures::stream::iter(chunks)))
        }

        async fn generate_image(
            &self,
            _prompt: &str,
            _aspect_ratio: AspectRatio,
        ) -> Result<ImageData> {
            self.image
                .lock()
                .unwrap()
                .take()
                .unwrap_or(Err(GatewayError::EmptyResponse { what: "image" }))
        }

        async fn generate_speech(&self, _text: &str) -> Result<SpeechData> {
            self.speech
                .lock()
                .unwrap()
                .take()
                .unwrap_or(Err(GatewayError::EmptyResponse { what: "audio" }))
        }

        async fn start_video(&self, _prompt: &str) -> Result<VideoOperation> {
            Ok(VideoOperation::pending("operations/mock"))
        }

        async fn poll_video(&self, operation: &VideoOperation) -> Result<VideoOperation> {
            let mut polls = self.video_polls.lock().unwrap();
            if polls.is_empty() {
                return Ok(operation.clone());
            }
            polls.remove(0)
        }

        fn name(&self) -> &str {
            "mock"
        }
    }
}

// ─────────────────────────────────────────────────────────────────────────────
// Tests
// ─────────────────────────────────────────────────────────────────────────────

#[cfg(test)]
mod tests {
    use super::*;
    use futures::StreamExt;
    use std::sync::atomic::{AtomicU32, Ordering};

    #[tokio::test]
    async fn with_retry_returns_first_success() {
        let calls = AtomicU32::new(0);
        let result = with_retry(3, Duration::from_millis(1), "test", || {
            calls.fetch_add(1, Ordering::SeqCst);
            async { Ok::<_, GatewayError>(7) }
        })
        .await
        .unwrap();
        assert_eq!(result, 7);
        assert_eq!(calls.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn with_retry_retries_transient_errors() {
        let calls = AtomicU32::new(0);
        let result = with_retry(3, Duration::from_millis(1), "test", || {
            let attempt = calls.fetch_add(1, Ordering::SeqCst);
            async move {
                if attempt < 2 {
                    Err(GatewayError::Network("flaky".to_string()))
                } else {
                    Ok(42)
                }
            }
        })
        .await
        .unwrap();
        assert_eq!(result, 42);
        assert_eq!(calls.load(Ordering::SeqCst), 3);
    }

    #[tokio::test]
    async fn with_retry_fails_fast_on_permanent_errors() {
        let calls = AtomicU32::new(0);
        let result: Result<()> = with_retry(3, Duration::from_millis(1), "test", || {
            calls.fetch_add(1, Ordering::SeqCst);
            async { Err(GatewayError::Auth("bad key".to_string())) }
        })
        .await;
        assert!(matches!(result, Err(GatewayError::Auth(_))));
        assert_eq!(calls.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn mock_gateway_yields_scripted_chunks_in_order() {
        let mock = MockGateway::with_turn(vec![
            Ok(ChatChunk::text("Hello")),
            Ok(ChatChunk::text(" world")),
        ]);

        let mut stream = mock.chat_stream("hi", &[]).await.unwrap();
        let mut text = String::new();
        while let Some(chunk) = stream.next().await {
            if let Some(t) = chunk.unwrap().text {
                text.push_str(&t);
            }
        }
        assert_eq!(text, "Hello world");
        assert_eq!(mock.prompts(), vec!["hi"]);
    }

    #[tokio::test]
    async fn mock_gateway_stream_is_not_restartable() {
        let mock = MockGateway::with_turn(vec![Ok(ChatChunk::text("once"))]);
        let _ = mock.chat_stream("first", &[]).await.unwrap();
        assert!(mock.chat_stream("second", &[]).await.is_err());
    }
}
