//! `[bedrock]` section

use converse_domain::{ConfigIssue, ConfigIssueCode};
use serde::{Deserialize, Serialize};

/// AWS Bedrock client configuration.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct FileBedrockConfig {
    /// AWS region (default: "us-east-1")
    pub region: String,
    /// AWS profile name for credentials
    pub profile: Option<String>,
}

impl Default for FileBedrockConfig {
    fn default() -> Self {
        Self {
            region: "us-east-1".to_string(),
            profile: None,
        }
    }
}

impl FileBedrockConfig {
    pub fn validate(&self) -> Vec<ConfigIssue> {
        let mut issues = Vec::new();
        if self.region.trim().is_empty() {
            issues.push(ConfigIssue::error(
                ConfigIssueCode::EmptyValue {
                    field: "bedrock.region".to_string(),
                },
                "bedrock.region cannot be empty",
            ));
        }
        if self.profile.as_deref().is_some_and(|p| p.trim().is_empty()) {
            issues.push(ConfigIssue::warning(
                ConfigIssueCode::EmptyValue {
                    field: "bedrock.profile".to_string(),
                },
                "bedrock.profile is empty and will be ignored",
            ));
        }
        issues
    }

    /// Profile name, if one is set and non-empty.
    pub fn profile_name(&self) -> Option<&str> {
        self.profile.as_deref().filter(|p| !p.trim().is_empty())
    }
}
