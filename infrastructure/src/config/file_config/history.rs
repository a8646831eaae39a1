//! `[history]` section

use converse_domain::session::history::DEFAULT_MAX_MESSAGES;
use converse_domain::{ConfigIssue, ConfigIssueCode};
use serde::{Deserialize, Serialize};

/// Raw conversation history configuration from TOML
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct FileHistoryConfig {
    /// Bound on retained user/assistant messages
    pub max_messages: usize,
    /// Send history with each turn
    pub include: bool,
}

impl Default for FileHistoryConfig {
    fn default() -> Self {
        Self {
            max_messages: DEFAULT_MAX_MESSAGES,
            include: true,
        }
    }
}

impl FileHistoryConfig {
    pub fn validate(&self) -> Vec<ConfigIssue> {
        if self.max_messages == 0 {
            return vec![ConfigIssue::warning(
                ConfigIssueCode::Zero {
                    field: "history.max_messages".to_string(),
                },
                "history.max_messages is 0: no conversation history will be kept",
            )];
        }
        Vec::new()
    }
}
