//! Retry-on-throttle policy for the structured protocol.

use serde::{Deserialize, Serialize};
use std::time::Duration;

pub const DEFAULT_MAX_RETRIES: u32 = 4;
pub const DEFAULT_BACKOFF: Duration = Duration::from_secs(65);

/// Fixed-interval retry budget.
///
/// A call is attempted at most `max_retries + 1` times, sleeping `backoff`
/// between attempts. Only throttling failures are retried.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct RetryPolicy {
    pub max_retries: u32,
    pub backoff: Duration,
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self {
            max_retries: DEFAULT_MAX_RETRIES,
            backoff: DEFAULT_BACKOFF,
        }
    }
}

impl RetryPolicy {
    /// Single attempt, no retries.
    pub fn none() -> Self {
        Self {
            max_retries: 0,
            ..Self::default()
        }
    }

    // ==================== Builder Methods ====================

    pub fn with_max_retries(mut self, max_retries: u32) -> Self {
        self.max_retries = max_retries;
        self
    }

    pub fn with_backoff(mut self, backoff: Duration) -> Self {
        self.backoff = backoff;
        self
    }

    pub fn with_backoff_secs(self, secs: u64) -> Self {
        self.with_backoff(Duration::from_secs(secs))
    }

    /// Upper bound on time spent sleeping between attempts.
    pub fn worst_case_delay(&self) -> Duration {
        self.backoff * self.max_retries
    }
}
