//! Infrastructure layer for bedrock-converse
//!
//! This crate contains adapters that implement the ports defined
//! in the application layer, including configuration file loading.

pub mod config;
pub mod logging;
pub mod providers;

// Re-export commonly used types
pub use config::{
    ConfigLoader, DEFAULT_MODEL_ID, FileBedrockConfig, FileConfig, FileHistoryConfig,
    FileLoggingConfig, FileModelConfig, FileRetryConfig,
};
pub use logging::JsonlConversationLogger;
#[cfg(feature = "bedrock")]
pub use providers::bedrock::BedrockModelInvoker;
