//! Prompt domain
//!
//! Role-tag markup parsing and placeholder templates.

pub mod markup;
mod template;

pub use markup::ParsedPrompt;
pub use template::{FewShotTemplate, PromptTemplate, RenderExamples, Variables};
