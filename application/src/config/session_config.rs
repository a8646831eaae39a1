//! Per-session settings for the dispatcher.

use super::retry_policy::RetryPolicy;
use converse_domain::session::history::DEFAULT_MAX_MESSAGES;
use serde::{Deserialize, Serialize};

/// Settings fixed for the lifetime of a conversation session.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SessionConfig {
    /// Bound on retained non-system history messages.
    pub max_history_messages: usize,
    /// Whether turns include history unless the caller says otherwise.
    pub include_history: bool,
    pub retry: RetryPolicy,
}

impl Default for SessionConfig {
    fn default() -> Self {
        Self {
            max_history_messages: DEFAULT_MAX_MESSAGES,
            include_history: true,
            retry: RetryPolicy::default(),
        }
    }
}

impl SessionConfig {
    // ==================== Builder Methods ====================

    pub fn with_max_history_messages(mut self, max: usize) -> Self {
        self.max_history_messages = max;
        self
    }

    pub fn with_include_history(mut self, include: bool) -> Self {
        self.include_history = include;
        self
    }

    pub fn with_retry(mut self, retry: RetryPolicy) -> Self {
        self.retry = retry;
        self
    }
}
