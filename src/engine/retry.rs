//! Retry on connection failure

use async_trait::async_trait;
use std::future::Future;
use std::time::Duration;

use super::request::DispatchError;

/// Waits between attempts
#[async_trait]
pub trait Pause: Send + Sync {
    async fn pause(&self, duration: Duration);
}

/// Real wall-clock pause
pub struct TokioPause;

#[async_trait]
impl Pause for TokioPause {
    async fn pause(&self, duration: Duration) {
        tokio::time::sleep(duration).await;
    }
}

/// Attempt budget for one request
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RetryPolicy {
    /// Total attempts, including the first
    pub attempts: u32,
    pub backoff: Duration,
}

/// Run `op`, retrying only connection failures until the budget runs out
///
/// Any other outcome, success or not, is returned immediately.
pub async fn with_retry<T, F, Fut>(
    policy: RetryPolicy,
    pause: &dyn Pause,
    title: &str,
    mut op: F,
) -> Result<T, DispatchError>
where
    F: FnMut() -> Fut,
    Fut: Future<Output = Result<T, DispatchError>>,
{
    let attempts = policy.attempts.max(1);
    let mut attempt = 1;
    loop {
        match op().await {
            Err(DispatchError::Connection(reason)) if attempt < attempts => {
                tracing::error!(
                    "API: {} >> connection failed ({}), attempt {}/{}, retrying in {}s",
                    title,
                    reason,
                    attempt,
                    attempts,
                    policy.backoff.as_secs()
                );
                pause.pause(policy.backoff).await;
                attempt += 1;
            }
            result => return result,
        }
    }
}
