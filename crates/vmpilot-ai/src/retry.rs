//! Bounded retry with exponential backoff around a `Sampler`.

use std::time::Duration;

use tracing::warn;

use crate::{AiError, Completion, DeltaFn, SampleRequest, Sampler};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RetryPolicy {
    /// Total attempts, including the first one.
    pub max_attempts: u32,
    pub initial_backoff: Duration,
    pub max_backoff: Duration,
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self {
            max_attempts: 3,
            initial_backoff: Duration::from_millis(500),
            max_backoff: Duration::from_secs(8),
        }
    }
}

impl RetryPolicy {
    /// Delay before retry number `attempt` (1-based), doubling up to the cap.
    pub fn backoff_for(&self, attempt: u32) -> Duration {
        let shift = attempt.saturating_sub(1).min(16);
        self.initial_backoff
            .saturating_mul(1u32 << shift)
            .min(self.max_backoff)
    }
}

/// Sample, retrying transient failures per `policy`.
///
/// Deltas from a failed attempt may already have reached `on_delta`; the
/// returned completion is always from a single attempt.
pub async fn sample_with_retry(
    sampler: &dyn Sampler,
    request: &SampleRequest<'_>,
    on_delta: &DeltaFn,
    policy: &RetryPolicy,
) -> Result<Completion, AiError> {
    let max_attempts = policy.max_attempts.max(1);
    let mut attempt = 1;
    loop {
        match sampler.sample(request, on_delta).await {
            Ok(completion) => return Ok(completion),
            Err(e) if e.is_retryable() && attempt < max_attempts => {
                let delay = policy.backoff_for(attempt);
                warn!(
                    error = %e,
                    attempt,
                    max_attempts,
                    delay_ms = delay.as_millis() as u64,
                    "Sampling failed, retrying"
                );
                tokio::time::sleep(delay).await;
                attempt += 1;
            }
            Err(e) => return Err(e),
        }
    }
}
