//! Fixed-interval retry for throttled model calls.

use crate::config::RetryPolicy;
use crate::ports::model_invoker::InvocationError;
use std::future::Future;
use tokio::time::sleep;
use tracing::warn;

/// Run `operation`, retrying only throttling failures.
///
/// Sleeps `policy.backoff` before each retry and gives up after
/// `policy.max_retries` retries, returning the last error. Any other error is
/// returned immediately.
pub async fn retry_on_throttle<F, Fut, T>(
    policy: &RetryPolicy,
    mut operation: F,
) -> Result<T, InvocationError>
where
    F: FnMut() -> Fut,
    Fut: Future<Output = Result<T, InvocationError>>,
{
    let mut attempt = 0;
    loop {
        match operation().await {
            Ok(value) => return Ok(value),
            Err(e) if e.is_throttling() && attempt < policy.max_retries => {
                attempt += 1;
                warn!(
                    attempt,
                    max_retries = policy.max_retries,
                    delay_secs = policy.backoff.as_secs_f64(),
                    "Throttled, waiting before retry"
                );
                sleep(policy.backoff).await;
            }
            Err(e) => return Err(e),
        }
    }
}
