//! Core domain concepts shared across all subdomains.
//!
//! - [`model::ModelConfig`]: per-call inference settings
//! - [`error::DomainError`]: validation and decode failures
//! - [`validation::ConfigIssue`]: structured configuration problems

pub mod error;
pub mod model;
pub mod validation;
