//! `[model]` section

use converse_domain::core::model::{DEFAULT_MAX_TOKENS, DEFAULT_TEMPERATURE, DEFAULT_TOP_P};
use converse_domain::{ConfigIssue, ConfigIssueCode, ModelConfig};
use serde::{Deserialize, Serialize};

pub const DEFAULT_MODEL_ID: &str = "anthropic.claude-3-haiku-20240307-v1:0";

/// Raw model configuration from TOML
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct FileModelConfig {
    /// Bedrock model identifier
    pub id: String,
    pub max_tokens: u32,
    pub temperature: f64,
    pub top_p: f64,
}

impl Default for FileModelConfig {
    fn default() -> Self {
        Self {
            id: DEFAULT_MODEL_ID.to_string(),
            max_tokens: DEFAULT_MAX_TOKENS,
            temperature: DEFAULT_TEMPERATURE,
            top_p: DEFAULT_TOP_P,
        }
    }
}

impl FileModelConfig {
    pub fn to_model_config(&self) -> ModelConfig {
        ModelConfig::new(self.id.trim())
            .with_max_tokens(self.max_tokens)
            .with_temperature(self.temperature)
            .with_top_p(self.top_p)
    }

    pub fn validate(&self) -> Vec<ConfigIssue> {
        let mut issues = Vec::new();
        if self.id.trim().is_empty() {
            issues.push(ConfigIssue::error(
                ConfigIssueCode::EmptyValue {
                    field: "model.id".to_string(),
                },
                "model.id cannot be empty",
            ));
        }
        if self.max_tokens == 0 {
            issues.push(ConfigIssue::error(
                ConfigIssueCode::Zero {
                    field: "model.max_tokens".to_string(),
                },
                "model.max_tokens must be greater than 0",
            ));
        }
        for (field, value) in [("model.temperature", self.temperature), ("model.top_p", self.top_p)] {
            if !(0.0..=1.0).contains(&value) {
                issues.push(ConfigIssue::error(
                    ConfigIssueCode::OutOfRange {
                        field: field.to_string(),
                        value: value.to_string(),
                    },
                    format!("{field} must be within [0, 1], got {value}"),
                ));
            }
        }
        issues
    }
}
