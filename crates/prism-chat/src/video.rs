//! Polling loop for long-running video generation operations.

use std::time::Duration;

use prism_gemini::{Gateway, VideoOperation};

use crate::error::{ChatError, Result};

/// Poll `operation` at a fixed interval until it reports done.
///
/// The interval never backs off. When `max_polls` is reached before the
/// operation completes, the loop stops with [`ChatError::VideoPollLimit`]
/// rather than waiting forever. A gateway report that the operation is
/// unknown surfaces as [`ChatError::CredentialExpired`] so the caller can
/// obtain a fresh credential and resume polling the same operation name.
pub async fn await_video(
    gateway: &dyn Gateway,
    operation: &VideoOperation,
    interval: Duration,
    max_polls: Option<u32>,
) -> Result<VideoOperation> {
    let mut current = operation.clone();
    let mut polls: u32 = 0;

    while !current.done {
        if let Some(limit) = max_polls {
            if polls >= limit {
                tracing::warn!(operation = %current.name, polls, "video poll limit reached");
                return Err(ChatError::VideoPollLimit { polls });
            }
        }

        tokio::time::sleep(interval).await;
        polls += 1;

        current = match gateway.poll_video(&current).await {
            Ok(op) => op,
            Err(e) if e.is_credential_expired() => {
                return Err(ChatError::CredentialExpired {
                    operation: current.name.clone(),
                });
            }
            Err(e) => return Err(ChatError::Gateway(e)),
        };
        tracing::debug!(operation = %current.name, done = current.done, polls, "video poll");
    }

    Ok(current)
}
