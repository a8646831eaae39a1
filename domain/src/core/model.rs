//! Per-call model configuration (Value Object)

use super::error::DomainError;
use crate::vendor::family::VendorFamily;
use serde::{Deserialize, Serialize};

pub const DEFAULT_MAX_TOKENS: u32 = 512;
pub const DEFAULT_TEMPERATURE: f64 = 0.01;
pub const DEFAULT_TOP_P: f64 = 0.99;

/// Inference settings for a single call.
///
/// Every vendor receives the same three knobs (output length, temperature,
/// nucleus-sampling threshold) under its own field names.
///
/// # Example
///
/// ```
/// use converse_domain::{ModelConfig, VendorFamily};
///
/// let config = ModelConfig::new("meta.llama3-70b-instruct-v1:0")
///     .with_max_tokens(1024)
///     .with_temperature(0.5);
///
/// assert_eq!(config.family(), VendorFamily::Llama3);
/// assert!(config.validate().is_ok());
/// ```
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ModelConfig {
    /// Provider model identifier, e.g. `anthropic.claude-3-haiku-20240307-v1:0`.
    pub model_id: String,
    /// Maximum number of generated tokens.
    pub max_tokens: u32,
    /// Sampling temperature in `[0, 1]`.
    pub temperature: f64,
    /// Nucleus-sampling threshold in `[0, 1]`.
    pub top_p: f64,
}

impl ModelConfig {
    pub fn new(model_id: impl Into<String>) -> Self {
        Self {
            model_id: model_id.into(),
            max_tokens: DEFAULT_MAX_TOKENS,
            temperature: DEFAULT_TEMPERATURE,
            top_p: DEFAULT_TOP_P,
        }
    }

    // ==================== Builder Methods ====================

    pub fn with_max_tokens(mut self, max_tokens: u32) -> Self {
        self.max_tokens = max_tokens;
        self
    }

    pub fn with_temperature(mut self, temperature: f64) -> Self {
        self.temperature = temperature;
        self
    }

    pub fn with_top_p(mut self, top_p: f64) -> Self {
        self.top_p = top_p;
        self
    }

    /// Vendor family of the configured model.
    pub fn family(&self) -> VendorFamily {
        VendorFamily::classify(&self.model_id)
    }

    /// Reject configurations that no backend would accept.
    pub fn validate(&self) -> Result<(), DomainError> {
        if self.model_id.trim().is_empty() {
            return Err(DomainError::InvalidModelConfig(
                "model identifier must not be empty".to_string(),
            ));
        }
        if !(0.0..=1.0).contains(&self.temperature) {
            return Err(DomainError::InvalidModelConfig(format!(
                "temperature must be within [0, 1], got {}",
                self.temperature
            )));
        }
        if !(0.0..=1.0).contains(&self.top_p) {
            return Err(DomainError::InvalidModelConfig(format!(
                "top_p must be within [0, 1], got {}",
                self.top_p
            )));
        }
        Ok(())
    }
}
