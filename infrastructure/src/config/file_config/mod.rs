//! Raw TOML configuration data types
//!
//! These structs represent the exact structure of the TOML config file.
//! They are deserialized directly and converted into runtime types on demand.

mod bedrock;
mod history;
mod logging;
mod model;
mod retry;

pub use bedrock::FileBedrockConfig;
pub use history::FileHistoryConfig;
pub use logging::FileLoggingConfig;
pub use model::{DEFAULT_MODEL_ID, FileModelConfig};
pub use retry::FileRetryConfig;

use converse_application::SessionConfig;
use converse_domain::ConfigIssue;
use serde::{Deserialize, Serialize};

/// Complete file configuration (raw TOML structure)
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct FileConfig {
    /// Default model and sampling settings
    pub model: FileModelConfig,
    /// Throttling retry budget
    pub retry: FileRetryConfig,
    /// Conversation history settings
    pub history: FileHistoryConfig,
    /// AWS client settings
    pub bedrock: FileBedrockConfig,
    /// Transcript logging
    pub logging: FileLoggingConfig,
}

impl FileConfig {
    /// Validate the entire configuration, returning all detected issues.
    pub fn validate(&self) -> Vec<ConfigIssue> {
        let mut issues = Vec::new();
        issues.extend(self.model.validate());
        issues.extend(self.retry.validate());
        issues.extend(self.history.validate());
        issues.extend(self.bedrock.validate());
        issues
    }

    pub fn to_session_config(&self) -> SessionConfig {
        SessionConfig::default()
            .with_max_history_messages(self.history.max_messages)
            .with_include_history(self.history.include)
            .with_retry(self.retry.to_retry_policy())
    }
}
