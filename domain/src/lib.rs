//! Domain layer for bedrock-converse
//!
//! Pure logic with no I/O: the role-tag markup language, bounded
//! conversation history, placeholder templates, model configuration and the
//! per-vendor prompt/response encodings.
//!
//! # Core Concepts
//!
//! ## Markup
//!
//! Prompts are flat text with inline `<<system>>`, `<<user>>` and
//! `<<assistant>>` tags, parsed into a [`ParsedPrompt`].
//!
//! ## Vendor families
//!
//! A model identifier classifies into a [`VendorFamily`]. Each family has a
//! [`VendorFormatter`] that knows the vendor's raw prompt convention,
//! request body field names and response envelope.

pub mod core;
pub mod prompt;
pub mod session;
pub mod vendor;

// Re-export commonly used types
pub use core::{
    error::DomainError,
    model::ModelConfig,
    validation::{ConfigIssue, ConfigIssueCode, Severity},
};
pub use prompt::{FewShotTemplate, ParsedPrompt, PromptTemplate, RenderExamples, Variables};
pub use session::{
    entities::{Message, Role},
    history::ConversationHistory,
    request::{ConverseRequest, InferenceConfig},
    stream::StreamEvent,
};
pub use vendor::{VendorFamily, VendorFormatter};
