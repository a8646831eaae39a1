//! `[retry]` section

use converse_application::RetryPolicy;
use converse_application::config::retry_policy::{DEFAULT_BACKOFF, DEFAULT_MAX_RETRIES};
use converse_domain::{ConfigIssue, ConfigIssueCode};
use serde::{Deserialize, Serialize};

/// Raw retry configuration from TOML
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct FileRetryConfig {
    /// Retries after the first throttled attempt
    pub max_retries: u32,
    /// Fixed wait between attempts, in seconds
    pub backoff_secs: u64,
}

impl Default for FileRetryConfig {
    fn default() -> Self {
        Self {
            max_retries: DEFAULT_MAX_RETRIES,
            backoff_secs: DEFAULT_BACKOFF.as_secs(),
        }
    }
}

impl FileRetryConfig {
    pub fn to_retry_policy(&self) -> RetryPolicy {
        RetryPolicy::default()
            .with_max_retries(self.max_retries)
            .with_backoff_secs(self.backoff_secs)
    }

    pub fn validate(&self) -> Vec<ConfigIssue> {
        if self.max_retries > 0 && self.backoff_secs == 0 {
            return vec![ConfigIssue::warning(
                ConfigIssueCode::Zero {
                    field: "retry.backoff_secs".to_string(),
                },
                "retry.backoff_secs is 0: throttled calls will be retried immediately",
            )];
        }
        Vec::new()
    }
}
