//! Exponential-backoff retry shared by the HTTP clients

use std::future::Future;
use std::time::Duration;
use tokio::time::sleep;

use crate::error::{Error, Result};

/// Retry `operation` up to `max_retries` extra times, sleeping 2^attempt seconds between tries
pub async fn retry_request<F, Fut, T>(label: &str, max_retries: u32, operation: F) -> Result<T>
where
    F: Fn() -> Fut,
    Fut: Future<Output = Result<T>>,
{
    retry_with_base(label, max_retries, Duration::from_secs(1), operation).await
}

/// Same as `retry_request` with a custom base delay
pub async fn retry_with_base<F, Fut, T>(
    label: &str,
    max_retries: u32,
    base_delay: Duration,
    operation: F,
) -> Result<T>
where
    F: Fn() -> Fut,
    Fut: Future<Output = Result<T>>,
{
    let mut last_error = None;

    for attempt in 0..=max_retries {
        match operation().await {
            Ok(result) => return Ok(result),
            Err(e) => {
                if attempt < max_retries {
                    let delay = base_delay.saturating_mul(2u32.saturating_pow(attempt));
                    tracing::warn!(
                        "{} request failed (attempt {}/{}): {}, retrying in {:?}",
                        label,
                        attempt + 1,
                        max_retries.saturating_add(1),
                        e,
                        delay
                    );
                    sleep(delay).await;
                }
                last_error = Some(e);
            }
        }
    }

    Err(last_error.unwrap_or_else(|| Error::internal(format!("{} retry loop exited without a result", label))))
}
