//! Domain error types

use crate::vendor::family::VendorFamily;
use thiserror::Error;

/// Domain-level errors
///
/// Everything except [`DomainError::Decode`] is a validation failure and is
/// raised before any model invocation is attempted.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum DomainError {
    #[error("Missing required variables: {}", .0.join(", "))]
    MissingVariables(Vec<String>),

    #[error("Prompt template {0} is required")]
    EmptyTemplateField(&'static str),

    #[error("Unknown role tag <<{0}>> (expected system, user or assistant)")]
    UnknownTag(String),

    #[error("Invalid model config: {0}")]
    InvalidModelConfig(String),

    #[error("Failed to parse {family} response: {reason} (envelope: {envelope})")]
    Decode {
        family: VendorFamily,
        reason: String,
        envelope: String,
    },
}

impl DomainError {
    /// Check if this error was raised by input validation
    pub fn is_validation(&self) -> bool {
        !matches!(self, DomainError::Decode { .. })
    }
}
