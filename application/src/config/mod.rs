//! Application-level configuration.
//!
//! - [`RetryPolicy`]: throttling retry budget and fixed backoff
//! - [`SessionConfig`]: history bound and per-session defaults

pub mod retry_policy;
pub mod session_config;

pub use retry_policy::RetryPolicy;
pub use session_config::SessionConfig;
