//! Language model providers
//!
//! Implementations of [`CompletionModel`](reportqa_kernel::rag::CompletionModel)
//! plus the timeout and retry policy shared by every outbound provider call.

pub mod openai;

pub use openai::{OpenAiChatConfig, OpenAiChatModel};

use backoff::{ExponentialBackoff, ExponentialBackoffBuilder};
use reportqa_kernel::error::ProviderError;
use std::future::Future;
use std::time::Duration;

/// Backoff policy for `async_openai` clients that gives up after the first
/// attempt. Provider failures surface to the caller as-is.
pub fn no_retry_backoff() -> ExponentialBackoff {
    ExponentialBackoffBuilder::new()
        .with_max_elapsed_time(Some(Duration::ZERO))
        .build()
}

/// Run a provider call, failing with [`ProviderError::Timeout`] once
/// `timeout` elapses. `None` waits indefinitely.
pub async fn call_with_timeout<T, F>(
    endpoint: &str,
    timeout: Option<Duration>,
    call: F,
) -> Result<T, ProviderError>
where
    F: Future<Output = Result<T, ProviderError>>,
{
    match timeout {
        Some(limit) => match tokio::time::timeout(limit, call).await {
            Ok(result) => result,
            Err(_) => {
                tracing::warn!(endpoint, timeout_ms = limit.as_millis() as u64, "Provider call timed out");
                Err(ProviderError::Timeout {
                    endpoint: endpoint.to_string(),
                    elapsed: limit,
                })
            }
        },
        None => call.await,
    }
}
